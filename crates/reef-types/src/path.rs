//! [`FullPath`], the primary key of every filer entry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Absolute, slash-delimited path of a file or directory.
///
/// Always starts with `/`, never ends with `/` (except the root itself) and
/// never contains empty, `.` or `..` segments.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullPath(String);

impl FullPath {
    /// Validate and normalize `path`.
    pub fn new(path: impl Into<String>) -> Result<Self, TypesError> {
        let mut path = path.into();
        if !path.starts_with('/') {
            return Err(TypesError::RelativePath(path));
        }
        while path.len() > 1 && path.ends_with('/') {
            path.pop();
        }
        if path.len() > 1 {
            for segment in path[1..].split('/') {
                let reason = match segment {
                    "" => "empty segment",
                    "." | ".." => "relative segment",
                    _ => continue,
                };
                return Err(TypesError::InvalidPath { path, reason });
            }
        }
        Ok(Self(path))
    }

    /// The root directory `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Split into the parent directory and the final name.
    ///
    /// `/a/b` yields `("/a", "b")`, `/a` yields `("/", "a")` and the root
    /// yields `("/", "")`.
    pub fn dir_and_name(&self) -> (&str, &str) {
        // Normalized paths always contain a leading slash.
        let idx = self.0.rfind('/').unwrap_or(0);
        let dir = if idx == 0 { "/" } else { &self.0[..idx] };
        (dir, &self.0[idx + 1..])
    }

    /// Final path component; empty for the root.
    pub fn name(&self) -> &str {
        self.dir_and_name().1
    }

    /// Parent directory, or `None` for the root.
    pub fn parent(&self) -> Option<FullPath> {
        if self.is_root() {
            return None;
        }
        Some(Self(self.dir_and_name().0.to_string()))
    }

    /// Append a single path component.
    pub fn child(&self, name: &str) -> Result<FullPath, TypesError> {
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(TypesError::InvalidPath {
                path: name.to_string(),
                reason: "child name must be a single component",
            });
        }
        if self.is_root() {
            Ok(Self(format!("/{name}")))
        } else {
            Ok(Self(format!("{}/{name}", self.0)))
        }
    }
}

impl fmt::Display for FullPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for FullPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FullPath({:?})", self.0)
    }
}

impl FromStr for FullPath {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for FullPath {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<FullPath> for String {
    fn from(path: FullPath) -> Self {
        path.0
    }
}

impl AsRef<str> for FullPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! Key/value configuration handed to [`FilerStore::initialize`].
//!
//! Parsed from a `filer.toml` with one table per backend:
//!
//! ```toml
//! [memory]
//! enabled = true
//! max_entries = 100000
//! ```
//!
//! Keys are addressed with dots (`"memory.enabled"`). Which keys a section
//! understands is up to the backend that owns it.
//!
//! [`FilerStore::initialize`]: crate::FilerStore::initialize

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::error::FilerError;

/// Opaque, TOML-backed configuration tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    table: Table,
}

impl Configuration {
    /// An empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, FilerError> {
        let table: Table = s
            .parse()
            .map_err(|e| FilerError::Configuration(format!("invalid toml: {e}")))?;
        Ok(Self { table })
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, FilerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FilerError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Find and load `{name}.toml` from the standard search path.
    ///
    /// Looks in the working directory, then `~/.reef/`, then `/etc/reef/`;
    /// the first file found wins.
    pub fn locate(name: &str) -> Result<(PathBuf, Self), FilerError> {
        let candidates = search_paths(name);
        for candidate in &candidates {
            if candidate.is_file() {
                let config = Self::load(candidate)?;
                return Ok((candidate.clone(), config));
            }
        }
        let searched: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
        Err(FilerError::Configuration(format!(
            "{name}.toml not found in: {}",
            searched.join(", ")
        )))
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Names of the top-level tables, in sorted order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.table
            .iter()
            .filter(|(_, v)| v.is_table())
            .map(|(k, _)| k.as_str())
    }

    /// Set a dotted key, creating intermediate tables as needed.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let mut parts: Vec<&str> = key.split('.').collect();
        let Some(last) = parts.pop() else {
            return;
        };
        let mut table = &mut self.table;
        for part in parts {
            let slot = table
                .entry(part.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            if !slot.is_table() {
                *slot = Value::Table(Table::new());
            }
            let Value::Table(inner) = slot else {
                unreachable!("slot was just made a table");
            };
            table = inner;
        }
        table.insert(last.to_string(), value.into());
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let mut value = self.table.get(parts.next()?)?;
        for part in parts {
            value = value.as_table()?.get(part)?;
        }
        Some(value)
    }

    /// String value at `key`; `None` if absent.
    pub fn get_string(&self, key: &str) -> Result<Option<String>, FilerError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(type_mismatch(key, "string", other)),
        }
    }

    /// Boolean value at `key`; `None` if absent.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, FilerError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Value::Boolean(b)) => Ok(Some(*b)),
            Some(other) => Err(type_mismatch(key, "boolean", other)),
        }
    }

    /// Integer value at `key`; `None` if absent.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>, FilerError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Value::Integer(i)) => Ok(Some(*i)),
            Some(other) => Err(type_mismatch(key, "integer", other)),
        }
    }

    /// Array-of-strings value at `key`; `None` if absent.
    pub fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>, FilerError> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(type_mismatch(key, "array of strings", other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(type_mismatch(key, "array of strings", other)),
        }
    }

    /// The table under `prefix` as its own configuration.
    ///
    /// Missing or non-table values yield an empty configuration.
    pub fn sub(&self, prefix: &str) -> Configuration {
        match self.lookup(prefix) {
            Some(Value::Table(table)) => Configuration {
                table: table.clone(),
            },
            _ => Configuration::default(),
        }
    }

    /// The top-level table named `name` as its own configuration.
    ///
    /// Unlike [`sub`](Self::sub) the name is not split on dots, so a quoted
    /// section such as `["a.b"]` is found.
    pub fn section(&self, name: &str) -> Configuration {
        match self.table.get(name) {
            Some(Value::Table(table)) => Configuration {
                table: table.clone(),
            },
            _ => Configuration::default(),
        }
    }

    /// Deserialize the whole tree into a typed section struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, FilerError> {
        Value::Table(self.table.clone())
            .try_into()
            .map_err(|e| FilerError::Configuration(e.to_string()))
    }
}

fn type_mismatch(key: &str, expected: &str, found: &Value) -> FilerError {
    FilerError::Configuration(format!(
        "{key}: expected {expected}, found {}",
        found.type_str()
    ))
}

fn search_paths(name: &str) -> Vec<PathBuf> {
    let file = format!("{name}.toml");
    let mut paths = vec![PathBuf::from(".").join(&file)];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".reef").join(&file));
    }
    paths.push(PathBuf::from("/etc/reef").join(&file));
    paths
}

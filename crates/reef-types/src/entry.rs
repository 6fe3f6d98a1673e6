//! Entries, attributes and chunk references.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::path::FullPath;

/// Mode bit marking an entry as a directory.
pub const MODE_DIR: u32 = 1 << 31;

// ---------------------------------------------------------------------------
// File ids
// ---------------------------------------------------------------------------

/// Structured location of a chunk on a volume server.
///
/// The canonical text form is `<volume_id>,<file_key hex><cookie as 8 hex>`,
/// e.g. `3,01637037d6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId {
    /// Volume holding the needle.
    pub volume_id: u32,
    /// Needle key within the volume.
    pub file_key: u64,
    /// Random cookie guarding against key guessing.
    pub cookie: u32,
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{:x}{:08x}", self.volume_id, self.file_key, self.cookie)
    }
}

impl FromStr for FileId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidFileId(s.to_string());

        let (volume, rest) = s.split_once(',').ok_or_else(invalid)?;
        // At least one key digit followed by the 8-digit cookie.
        if rest.len() <= 8 || !rest.is_ascii() {
            return Err(invalid());
        }
        let (key_hex, cookie_hex) = rest.split_at(rest.len() - 8);

        Ok(Self {
            volume_id: volume.parse().map_err(|_| invalid())?,
            file_key: u64::from_str_radix(key_hex, 16).map_err(|_| invalid())?,
            cookie: u32::from_str_radix(cookie_hex, 16).map_err(|_| invalid())?,
        })
    }
}

// ---------------------------------------------------------------------------
// Chunks
// ---------------------------------------------------------------------------

/// A contiguous byte range of a file and where its bytes live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChunk {
    /// Textual chunk location used by callers.
    pub file_id: String,
    /// Byte offset of this chunk within the file.
    pub offset: u64,
    /// Length of the chunk in bytes.
    pub size: u64,
    /// Unix timestamp (nanoseconds) when the chunk was written.
    pub mtime: i64,
    /// Content hash reported by the volume server.
    pub e_tag: String,
    /// Compact location, only populated in the persisted form.
    pub fid: Option<FileId>,
}

impl FileChunk {
    /// Create a chunk reference with no timestamp or etag.
    pub fn new(file_id: impl Into<String>, offset: u64, size: u64) -> Self {
        Self {
            file_id: file_id.into(),
            offset,
            size,
            ..Default::default()
        }
    }

    /// End offset (exclusive) of this chunk within the file.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// POSIX-ish attributes carried by every entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    /// Last modification time (unix seconds).
    pub mtime: i64,
    /// Creation time (unix seconds).
    pub crtime: i64,
    /// Permission bits, plus [`MODE_DIR`] for directories.
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub mime: String,
    /// Replication placement string, e.g. `"001"`.
    pub replication: String,
    pub collection: String,
    /// Time-to-live in seconds; 0 means forever.
    pub ttl_sec: i32,
}

impl Attr {
    pub fn is_directory(&self) -> bool {
        self.mode & MODE_DIR != 0
    }
}

/// Metadata record for one file or directory.
///
/// An entry is always stored and replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Primary key of the entry.
    pub full_path: FullPath,
    pub attr: Attr,
    /// Extended attributes.
    pub extended: BTreeMap<String, Vec<u8>>,
    /// Chunks in byte-offset order; empty for directories and empty files.
    pub chunks: Vec<FileChunk>,
}

impl Entry {
    /// A regular file entry with no chunks, timestamped now.
    pub fn new(full_path: FullPath) -> Self {
        let now = now_secs();
        Self {
            full_path,
            attr: Attr {
                mtime: now,
                crtime: now,
                mode: 0o644,
                ..Default::default()
            },
            extended: BTreeMap::new(),
            chunks: Vec::new(),
        }
    }

    /// A directory entry, timestamped now.
    pub fn directory(full_path: FullPath) -> Self {
        let mut entry = Self::new(full_path);
        entry.attr.mode = MODE_DIR | 0o755;
        entry
    }

    /// Replace the chunk list.
    pub fn with_chunks(mut self, chunks: Vec<FileChunk>) -> Self {
        self.chunks = chunks;
        self
    }

    /// Replace the attributes.
    pub fn with_attr(mut self, attr: Attr) -> Self {
        self.attr = attr;
        self
    }

    /// Final component of the entry's path.
    pub fn name(&self) -> &str {
        self.full_path.name()
    }

    pub fn is_directory(&self) -> bool {
        self.attr.is_directory()
    }

    /// Logical file size: the furthest byte covered by any chunk.
    pub fn size(&self) -> u64 {
        self.chunks.iter().map(FileChunk::end).max().unwrap_or(0)
    }
}

fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

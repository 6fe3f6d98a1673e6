//! Byte encoding of entries for backends that persist opaque blobs.
//!
//! The path is the storage key, so it is not repeated inside the record:
//! only attributes, extended attributes and chunks are serialized (postcard),
//! behind a one-byte format version.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entry::{Attr, Entry, FileChunk};
use crate::error::TypesError;
use crate::path::FullPath;

/// Current entry record format version.
pub const ENTRY_RECORD_VERSION: u8 = 1;

#[derive(Serialize)]
struct EntryRecordRef<'a> {
    version: u8,
    attr: &'a Attr,
    extended: &'a BTreeMap<String, Vec<u8>>,
    chunks: &'a [FileChunk],
}

#[derive(Deserialize)]
struct EntryRecord {
    version: u8,
    attr: Attr,
    extended: BTreeMap<String, Vec<u8>>,
    chunks: Vec<FileChunk>,
}

/// Serialize everything but the path of `entry`.
pub fn encode_entry(entry: &Entry) -> Result<Vec<u8>, TypesError> {
    let record = EntryRecordRef {
        version: ENTRY_RECORD_VERSION,
        attr: &entry.attr,
        extended: &entry.extended,
        chunks: &entry.chunks,
    };
    Ok(postcard::to_allocvec(&record)?)
}

/// Rebuild the entry stored under `full_path`.
///
/// Rejects records with unknown version numbers.
pub fn decode_entry(full_path: FullPath, bytes: &[u8]) -> Result<Entry, TypesError> {
    let record: EntryRecord = postcard::from_bytes(bytes)?;
    if record.version != ENTRY_RECORD_VERSION {
        return Err(TypesError::UnsupportedVersion {
            found: record.version,
            supported: ENTRY_RECORD_VERSION,
        });
    }
    Ok(Entry {
        full_path,
        attr: record.attr,
        extended: record.extended,
        chunks: record.chunks,
    })
}

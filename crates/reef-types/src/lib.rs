//! Shared types for the reef filer store.
//!
//! This crate defines the data model every backend stores:
//! paths ([`FullPath`]), metadata records ([`Entry`], [`Attr`]),
//! chunk references ([`FileChunk`], [`FileId`]), and the byte encoding
//! backends may use to persist entries ([`encode_entry`], [`decode_entry`]).

mod codec;
mod entry;
mod error;
mod path;

pub use codec::{ENTRY_RECORD_VERSION, decode_entry, encode_entry};
pub use entry::{Attr, Entry, FileChunk, FileId, MODE_DIR};
pub use error::TypesError;
pub use path::FullPath;

//! Chunk list transforms applied between callers and backends.
//!
//! A [`ChunkTransform`] is a pair of pure functions: `encode` turns the
//! in-memory chunk list into the form a backend persists, `decode` turns it
//! back. For every list `c`, `decode(encode(c)) == c`, order included.

use reef_types::{FileChunk, FileId};

/// Encode/decode pair for a file's chunk list.
pub trait ChunkTransform: Send + Sync {
    /// In-memory form to persisted form.
    fn encode(&self, chunks: Vec<FileChunk>) -> Vec<FileChunk>;

    /// Persisted form to in-memory form.
    fn decode(&self, chunks: Vec<FileChunk>) -> Vec<FileChunk>;
}

/// Leaves chunk lists untouched in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl ChunkTransform for IdentityTransform {
    fn encode(&self, chunks: Vec<FileChunk>) -> Vec<FileChunk> {
        chunks
    }

    fn decode(&self, chunks: Vec<FileChunk>) -> Vec<FileChunk> {
        chunks
    }
}

/// Adapts two plain functions into a [`ChunkTransform`].
pub struct FnTransform<E, D> {
    encode: E,
    decode: D,
}

impl<E, D> FnTransform<E, D>
where
    E: Fn(Vec<FileChunk>) -> Vec<FileChunk> + Send + Sync,
    D: Fn(Vec<FileChunk>) -> Vec<FileChunk> + Send + Sync,
{
    pub fn new(encode: E, decode: D) -> Self {
        Self { encode, decode }
    }
}

impl<E, D> ChunkTransform for FnTransform<E, D>
where
    E: Fn(Vec<FileChunk>) -> Vec<FileChunk> + Send + Sync,
    D: Fn(Vec<FileChunk>) -> Vec<FileChunk> + Send + Sync,
{
    fn encode(&self, chunks: Vec<FileChunk>) -> Vec<FileChunk> {
        (self.encode)(chunks)
    }

    fn decode(&self, chunks: Vec<FileChunk>) -> Vec<FileChunk> {
        (self.decode)(chunks)
    }
}

/// Marks a persisted chunk whose `fid` was set by the caller rather than by
/// compaction. Its `file_id` is stored behind this prefix.
const CALLER_FID_MARK: char = '=';

/// Persists chunk locations as structured [`FileId`]s instead of text.
///
/// Encoding moves a canonical `file_id` string into `fid` and clears the
/// string; decoding does the reverse. A `file_id` that does not parse, or
/// whose canonical rendering differs from the original text (leading zeros,
/// a `+` sign), is left as text.
///
/// A chunk that already carries a `fid` is not compacted. Its `file_id`
/// (possibly empty) is persisted behind a `=` prefix so decode can tell it
/// apart from a compacted chunk, whose `file_id` is always empty. This keeps
/// `decode(encode(chunks)) == chunks` for every chunk list.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileIdTransform;

impl ChunkTransform for FileIdTransform {
    fn encode(&self, mut chunks: Vec<FileChunk>) -> Vec<FileChunk> {
        for chunk in &mut chunks {
            if chunk.fid.is_some() {
                chunk.file_id.insert(0, CALLER_FID_MARK);
                continue;
            }
            if let Ok(fid) = chunk.file_id.parse::<FileId>() {
                if fid.to_string() == chunk.file_id {
                    chunk.fid = Some(fid);
                    chunk.file_id.clear();
                }
            }
        }
        chunks
    }

    fn decode(&self, mut chunks: Vec<FileChunk>) -> Vec<FileChunk> {
        for chunk in &mut chunks {
            if chunk.fid.is_none() {
                continue;
            }
            if chunk.file_id.is_empty() {
                if let Some(fid) = chunk.fid.take() {
                    chunk.file_id = fid.to_string();
                }
            } else if chunk.file_id.starts_with(CALLER_FID_MARK) {
                chunk.file_id.remove(0);
            }
        }
        chunks
    }
}

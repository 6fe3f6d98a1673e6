//! Error types for path parsing and entry encoding.

/// Errors produced while building paths, parsing file ids, or decoding
/// persisted entry records.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The path does not start with `/`.
    #[error("path must be absolute: {0:?}")]
    RelativePath(String),

    /// The path is absolute but malformed.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A file id string is not of the form `<volume>,<key hex><cookie hex>`.
    #[error("invalid file id: {0:?}")]
    InvalidFileId(String),

    /// Serialization or deserialization of an entry record failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The persisted record was written by an incompatible encoder.
    #[error("unsupported entry record version {found}, this node supports version {supported}")]
    UnsupportedVersion {
        /// Version found in the record.
        found: u8,
        /// Version this build understands.
        supported: u8,
    },
}

impl From<postcard::Error> for TypesError {
    fn from(e: postcard::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

//! Error types shared by every filer store backend.

use reef_types::TypesError;

/// Errors returned by [`FilerStore`](crate::FilerStore) operations.
///
/// [`FilerError::NotFound`] is the only way a backend may report that a path
/// has no entry. Callers must branch on the variant, never on the message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilerError {
    /// No entry exists at the requested path.
    #[error("filer: no entry is found in filer store")]
    NotFound,

    /// The backend could not be configured or made ready.
    ///
    /// Only raised during startup ([`initialize`](crate::FilerStore::initialize)
    /// and store selection); never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Any other backend failure, passed through to the caller unchanged.
    #[error("backend error: {0}")]
    Backend(String),
}

impl FilerError {
    /// Whether this is the not-found sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Wrap any displayable backend failure.
    pub fn backend(e: impl std::fmt::Display) -> Self {
        Self::Backend(e.to_string())
    }
}

impl From<TypesError> for FilerError {
    fn from(e: TypesError) -> Self {
        Self::Backend(e.to_string())
    }
}

use thiserror::Error;

/// Errors surfaced by repository implementations. Infrastructure details
/// (driver errors, constraint names) are flattened into these variants at
/// the repository boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("resource not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("unexpected repository error: {0}")]
    Unexpected(String),
}

impl RepositoryError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

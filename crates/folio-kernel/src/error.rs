//! Error types for persistence and sessions.

use folio_types::DocumentId;
use thiserror::Error;

/// Errors from a [`DocumentRepository`](crate::DocumentRepository).
#[derive(Debug, Error)]
pub enum RepoError {
    /// No document with this id.
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// SQLite rejected the statement.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored content could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl RepoError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors opening an edit session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open document: {0}")]
    Open(#[from] RepoError),
}

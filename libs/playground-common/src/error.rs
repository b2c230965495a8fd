// Error types shared by the playground crates

use thiserror::Error;

/// A language key that is absent from the language table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

/// Failures of the persistence backend itself
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures surfaced by the snippet/folder/execution library
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Must be authenticated")]
    Unauthenticated,
    /// Covers both missing resources and resources owned by someone else
    #[error("{0} not found or unauthorized")]
    NotFound(&'static str),
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

//! Storage-access error types.
//!
//! Every adapter operation returns [`DbError`] on failure. The adapter never
//! retries and never masks an engine failure as success; the underlying
//! engine diagnostic is carried in the error source.

use thiserror::Error;

/// Errors that can occur in the storage access layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Read-time engine fault: malformed statement, type mismatch, etc.
    #[error("query error: {0}")]
    Query(#[source] sqlx::Error),

    /// Write-time engine fault, including constraint violations.
    #[error("mutation error: {0}")]
    Mutation(#[source] sqlx::Error),

    /// Engine unreachable or misconfigured at startup. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A fetched row did not decode to the expected shape.
    #[error("invalid row data: {0}")]
    InvalidData(String),
}

impl DbError {
    /// True when the underlying engine reported a uniqueness conflict.
    ///
    /// Callers use this to translate write failures into domain-level
    /// conflict responses (e.g., "username already taken").
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Query(e) | Self::Mutation(e) => match e {
                sqlx::Error::Database(db) => db.is_unique_violation(),
                _ => false,
            },
            _ => false,
        }
    }
}

/*!
 * Error types for the message-db library.
 *
 * Library operations return `MessageStoreError`. Collaborator failures
 * (SQL driver, cache backend) travel as `anyhow::Error` and are surfaced
 * unchanged through the transparent `Storage` variant.
 */

use thiserror::Error;

/// Errors raised by the schema manager and the message store
#[derive(Error, Debug)]
pub enum MessageStoreError {
    /// Malformed message payload, identifier or locale.
    /// Raised before any database interaction.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The executor reports a driver that has no DDL profile
    #[error("Database driver `{0}` is not supported.")]
    UnsupportedDialect(String),

    /// A DDL statement failed while creating or dropping the schema
    #[error("Schema statement failed: {statement}: {source}")]
    Schema {
        /// The statement that was rejected
        statement: String,
        /// Driver error
        #[source]
        source: anyhow::Error,
    },

    /// An insert did not yield a key or affected no rows
    #[error("Write failed: {0}")]
    Write(String),

    /// Error from the SQL executor or the cache backend
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl MessageStoreError {
    /// Whether the caller can fix the input and retry
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<rusqlite::Error> for MessageStoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Storage(error.into())
    }
}

/// Result alias used across the library
pub type Result<T, E = MessageStoreError> = std::result::Result<T, E>;

//! SQLite-specific error types.

use stagesql_core::EngineError;
use thiserror::Error;

/// Errors raised by the SQLite backend.
#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("Transaction error: {0}")]
    Transaction(&'static str),
}

impl From<SqliteError> for EngineError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Transaction(msg) => EngineError::Transaction(msg.to_string()),
            other => EngineError::Backend(Box::new(other)),
        }
    }
}

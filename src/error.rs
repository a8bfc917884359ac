//! Error types for the stagesql driver.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for driver operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The staging operator failed
    #[error("Operator error: {0}")]
    Operator(#[from] stagesql_core::Error),

    /// Malformed input event
    #[error("Input error: {0}")]
    Event(#[from] EventError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading the driver configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no query given in config or on the command line")]
    MissingQuery,
}

/// Errors in the NDJSON event stream.
#[derive(Error, Debug)]
pub enum EventError {
    /// Line is not a valid event
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, Error>;

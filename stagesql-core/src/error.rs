//! Error types for stagesql-core.
//!
//! Failures are grouped by the lifecycle phase they abort:
//!
//! - [`SetupError`] - staging schema or statement preparation; the operator
//!   cannot start
//! - [`IngestError`] - binding or inserting a tuple; fatal to the window
//! - [`QueryError`] - evaluating the window query; fatal to the window
//! - [`TransactionError`] - opening, committing, purging or rolling back a
//!   window; fatal to the window
//! - [`TeardownError`] - closing the connection
//! - [`LifecycleError`] - an operation called in the wrong window state
//!
//! Backends report their own failures as [`EngineError`], which the operator
//! wraps with the phase and table it was working on. Nothing is retried.

use thiserror::Error;

use crate::engine::StatementId;

/// Main error type for staging operator operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Setup failed; the operator cannot run
    #[error("Setup failure: {0}")]
    Setup(#[from] SetupError),

    /// A tuple could not be staged
    #[error("Ingest failure: {0}")]
    Ingest(#[from] IngestError),

    /// The window query failed
    #[error("Query failure: {0}")]
    Query(#[from] QueryError),

    /// A window boundary operation failed
    #[error("Transaction failure: {0}")]
    Transaction(#[from] TransactionError),

    /// Closing the connection failed
    #[error("Teardown failure: {0}")]
    Teardown(#[from] TeardownError),

    /// Operation called out of order
    #[error("Lifecycle violation: {0}")]
    Lifecycle(#[from] LifecycleError),
}

impl Error {
    /// Whether this error leaves the current window unusable.
    ///
    /// The host is expected to call `abort_window` and replay.
    pub fn aborts_window(&self) -> bool {
        matches!(
            self,
            Error::Ingest(_) | Error::Query(_) | Error::Transaction(_)
        )
    }
}

/// Errors reported by an embedded engine backend.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Statement text did not compile
    #[error("failed to prepare `{sql}`: {reason}")]
    Prepare { sql: String, reason: String },

    /// Handle not issued by this engine
    #[error("unknown statement handle {0}")]
    UnknownStatement(StatementId),

    /// Wrong number of bound values
    #[error("statement expects {expected} parameters, got {actual}")]
    ParameterCount { expected: usize, actual: usize },

    /// Execution or cursor read failed
    #[error("execution failed: {0}")]
    Execution(String),

    /// BEGIN/COMMIT/ROLLBACK failed
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Backend-specific error
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Errors while building the staging schema.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Staging namespace could not be prepared
    #[error("cannot prepare staging namespace {namespace}: {cause}")]
    Namespace {
        namespace: String,
        #[source]
        cause: EngineError,
    },

    /// Declared type cannot be used in DDL
    #[error("{table}.{column}: invalid column type: {reason}")]
    InvalidColumnType {
        table: String,
        column: String,
        reason: String,
    },

    /// DEFAULT expression cannot be used in DDL
    #[error("{table}.{column}: invalid default: {reason}")]
    InvalidDefault {
        table: String,
        column: String,
        reason: String,
    },

    /// Same column declared twice
    #[error("{table}: duplicate column {column}")]
    DuplicateColumn { table: String, column: String },

    /// Two sources map to the same staging table
    #[error("duplicate staging table {table}")]
    DuplicateTable { table: String },

    /// CREATE failed
    #[error("cannot create staging table {table}: {cause}")]
    CreateTable {
        table: String,
        #[source]
        cause: EngineError,
    },

    /// Insert or delete statement did not prepare
    #[error("cannot prepare {kind} statement for {table}: {cause}")]
    PrepareStatement {
        table: String,
        kind: &'static str,
        #[source]
        cause: EngineError,
    },

    /// Window query did not prepare
    #[error("cannot prepare window query: {0}")]
    PrepareQuery(#[source] EngineError),
}

/// Errors while staging a tuple.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Index outside the schema registry
    #[error("unknown source index {0}")]
    UnknownSource(usize),

    /// Name not in the schema registry
    #[error("unknown source {0}")]
    UnknownSourceName(String),

    /// Source exists but has no columns, so no table was created
    #[error("source {index} ({table}) has no staging table")]
    NoStagingTable { index: usize, table: String },

    /// Field with no bound column, rejected by policy
    #[error("{table}: field {field} does not map to a bound column")]
    UnmappedField { table: String, field: String },

    /// Record lacks a value for a bound column
    #[error("{table}: no value for bound column {column}")]
    MissingValue { table: String, column: String },

    /// INSERT failed
    #[error("insert into {table} failed: {cause}")]
    Insert {
        table: String,
        #[source]
        cause: EngineError,
    },
}

/// Errors while evaluating the window query.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("window {window_id}: {cause}")]
    Execute {
        window_id: u64,
        #[source]
        cause: EngineError,
    },
}

/// Errors at window boundaries.
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("cannot open transaction for window {window_id}: {cause}")]
    Begin {
        window_id: u64,
        #[source]
        cause: EngineError,
    },

    #[error("cannot commit window {window_id}: {cause}")]
    Commit {
        window_id: u64,
        #[source]
        cause: EngineError,
    },

    #[error("cannot purge {table}: {cause}")]
    Purge {
        table: String,
        #[source]
        cause: EngineError,
    },

    #[error("cannot roll back window {window_id}: {cause}")]
    Rollback {
        window_id: u64,
        #[source]
        cause: EngineError,
    },
}

/// Errors while shutting down.
#[derive(Error, Debug)]
pub enum TeardownError {
    #[error("cannot close connection: {0}")]
    Close(#[source] EngineError),
}

/// Operations invoked in the wrong state.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("window {current} is still open, cannot begin window {requested}")]
    WindowAlreadyOpen { current: u64, requested: u64 },

    #[error("{operation} called with no open window")]
    NoOpenWindow { operation: &'static str },

    #[error("window {window_id} failed and must be aborted first")]
    WindowFailed { window_id: u64 },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

//! # stagesql-core
//!
//! Engine-agnostic windowed staging operator.
//!
//! This crate buffers a windowed stream of tuples into per-source staging
//! tables inside an embedded SQL engine, evaluates one parameterized query
//! per window against the staged rows, emits the result rows downstream, and
//! purges the tables for the next window. The engine is only a scratchpad:
//! nothing survives teardown.
//!
//! The engine itself is injected through the [`SqlEngine`] trait, so this
//! crate has no database dependency. See `stagesql-sqlite` for an in-memory
//! SQLite backend, and `test_utils::RecordingEngine` (feature `test-utils`)
//! for a fake.
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        stagesql-core                                |
//! +---------------------------------------------------------------------+
//! |  schema/     - SchemaRegistry, SourceDescriptor, bind indices       |
//! |  operator/   - staging tables, window state, ingest, window query   |
//! |  engine      - SqlEngine trait (prepare/execute/transactions)       |
//! |  emit        - ResultRow, Emitter                                   |
//! |  value       - Value, Record                                        |
//! |  error       - Error taxonomy                                       |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! setup -> [ begin_window -> process* -> end_window ]* -> teardown
//! ```

pub mod emit;
pub mod engine;
pub mod error;
pub mod operator;
pub mod prelude;
pub mod schema;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod value;

// Re-export commonly used types at crate root for convenience
pub use emit::{Emitter, ResultRow};
pub use engine::{EngineResult, SqlEngine, StatementId};
pub use error::{
    EngineError, Error, IngestError, LifecycleError, QueryError, Result, SetupError,
    TeardownError, TransactionError,
};
pub use operator::{
    BindMode, OperatorConfig, StagingOperator, StagingTable, UnmappedFieldPolicy, WindowState,
    WindowSummary, DEFAULT_NAMESPACE,
};
pub use schema::{ColumnDescriptor, SchemaRegistry, SourceDescriptor, TypeAffinity};
pub use value::{record, Record, Value};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! The windowed staging operator.
//!
//! # How It Works
//!
//! 1. **Setup** creates one staging table per non-empty source and prepares
//!    its insert/delete statements, then prepares the window query.
//! 2. **begin_window** opens a transaction.
//! 3. **process** binds a tuple's fields by bind index and inserts it into
//!    its source's staging table.
//! 4. **end_window** binds the window's parameters (if any), runs the query,
//!    emits each row as the cursor yields it, commits, then purges every
//!    staging table.
//! 5. **teardown** closes the engine.
//!
//! Staging tables are empty outside `begin_window`..`end_window`. Failures
//! are returned as-is; after one, the host calls
//! [`abort_window`](StagingOperator::abort_window) before continuing.
//!
//! # Example
//!
//! ```rust
//! use stagesql_core::prelude::*;
//! use stagesql_core::test_utils::RecordingEngine;
//!
//! let registry = SchemaRegistry::new()
//!     .with_source(SourceDescriptor::new("orders").column("id", "INT"));
//!
//! let mut op = StagingOperator::setup(
//!     RecordingEngine::new(),
//!     registry,
//!     "SELECT COUNT(*) AS n FROM SESSION.orders",
//!     OperatorConfig::default(),
//! )?;
//!
//! op.begin_window(1)?;
//! op.process(0, &record([("id", Value::from(7))]))?;
//! let summary = op.end_window(&mut |row: ResultRow| println!("{row:?}"))?;
//! assert_eq!(summary.rows_staged, 1);
//!
//! op.teardown()?;
//! # Ok::<(), stagesql_core::Error>(())
//! ```

mod config;
mod ingest;
mod query;
mod staging;
mod window;

pub use config::{BindMode, OperatorConfig, UnmappedFieldPolicy, DEFAULT_NAMESPACE};
pub use staging::{column_spec, delete_sql, insert_sql, qualified_table, StagingTable};
pub use window::{WindowState, WindowSummary};

use tracing::{info, warn};

use crate::engine::SqlEngine;
use crate::error::{Result, TeardownError};
use crate::schema::SchemaRegistry;
use crate::value::Value;

use query::WindowQuery;

/// Bridges a windowed tuple stream to an embedded SQL engine.
///
/// Owns the engine exclusively from setup to teardown. Every operation takes
/// `&mut self`, so calls can never overlap.
pub struct StagingOperator<E: SqlEngine> {
    engine: E,
    registry: SchemaRegistry,
    config: OperatorConfig,
    /// Indexed like the registry; `None` for skipped sources
    tables: Vec<Option<StagingTable>>,
    query: WindowQuery,
    state: WindowState,
    /// Tuples staged in the current window
    rows_staged: u64,
}

impl<E: SqlEngine> StagingOperator<E> {
    /// Build the staging schema and prepare the window query.
    ///
    /// Any failure here is a setup failure; the engine is dropped with the
    /// partially built operator.
    pub fn setup(
        mut engine: E,
        registry: SchemaRegistry,
        query: &str,
        config: OperatorConfig,
    ) -> Result<Self> {
        info!(
            engine = engine.name(),
            sources = registry.len(),
            namespace = %config.namespace,
            "Setting up staging operator"
        );

        let tables = staging::create_staging_tables(&mut engine, &registry, &config)?;
        let query = WindowQuery::prepare(&mut engine, query)?;

        Ok(Self {
            engine,
            registry,
            config,
            tables,
            query,
            state: WindowState::Idle,
            rows_staged: 0,
        })
    }

    /// Supply the window query's positional parameters.
    ///
    /// May be called any time before `end_window`; the list is used by the
    /// next evaluation only. A second call in the same window replaces the
    /// first.
    pub fn set_bindings(&mut self, values: Vec<Value>) {
        self.query.set_bindings(values);
    }

    /// Parameters waiting for the next evaluation.
    pub fn pending_bindings(&self) -> Option<&[Value]> {
        self.query.pending_bindings()
    }

    /// Close the engine connection.
    ///
    /// A window left open is not committed.
    pub fn teardown(self) -> Result<()> {
        if let Some(window_id) = self.state.window_id() {
            warn!(window_id, "Tearing down with window still open; staged rows are discarded");
        }

        let name = self.engine.name();
        match self.engine.close() {
            Ok(()) => {
                info!(engine = name, "Staging operator closed");
                Ok(())
            }
            Err(cause) => {
                warn!(engine = name, error = %cause, "Failed to close engine");
                Err(TeardownError::Close(cause).into())
            }
        }
    }

    /// Current window state.
    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Window query text.
    pub fn query_sql(&self) -> &str {
        self.query.sql()
    }

    /// Staging table for a source index, if one was created.
    pub fn staging_table(&self, source_index: usize) -> Option<&StagingTable> {
        self.tables.get(source_index).and_then(Option::as_ref)
    }

    /// All created staging tables, in source order.
    pub fn staging_tables(&self) -> impl Iterator<Item = &StagingTable> {
        self.tables.iter().flatten()
    }

    /// The owned engine, for inspection.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable access to the owned engine.
    ///
    /// Statements run through this bypass the window state machine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

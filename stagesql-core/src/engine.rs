//! The embedded relational engine, as seen by the staging operator.
//!
//! The operator never talks to a database library directly. It drives an
//! [`SqlEngine`]: something that can compile statements once, run them many
//! times with positional parameters, and bracket work in transactions. The
//! engine is opened by the caller and handed to the operator, which then owns
//! it exclusively until teardown.
//!
//! Statements are referred to by [`StatementId`] handles rather than borrowed
//! statement objects, so an engine can keep its compiled statements next to
//! its connection without tying their lifetimes to the operator.

use std::fmt;

use crate::emit::ResultRow;
use crate::error::EngineError;
use crate::value::Value;

/// Result type for engine calls.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Handle to a statement prepared by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementId(pub usize);

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Core trait an embedded engine backend must implement.
///
/// All calls are synchronous. The operator guarantees a single caller and
/// never overlaps calls.
pub trait SqlEngine {
    /// Short backend name for logging (e.g., "sqlite").
    fn name(&self) -> &'static str;

    /// Make the staging namespace addressable before any table is created.
    ///
    /// Engines with a built-in session schema need do nothing.
    fn prepare_namespace(&mut self, _namespace: &str) -> EngineResult<()> {
        Ok(())
    }

    /// DDL declaring a session-scoped, non-logged staging table.
    ///
    /// `table` is already qualified and quoted; `column_spec` is the
    /// comma-separated column definition list.
    fn staging_table_ddl(&self, table: &str, column_spec: &str) -> String {
        format!("DECLARE GLOBAL TEMPORARY TABLE {table} ({column_spec}) NOT LOGGED")
    }

    /// Run one or more statements that take no parameters and return no rows.
    fn execute_batch(&mut self, sql: &str) -> EngineResult<()>;

    /// Compile a statement for repeated use.
    fn prepare(&mut self, sql: &str) -> EngineResult<StatementId>;

    /// Number of positional placeholders in a prepared statement.
    fn parameter_count(&mut self, stmt: StatementId) -> EngineResult<usize>;

    /// Execute a prepared statement as an update, returning affected rows.
    fn execute_update(&mut self, stmt: StatementId, params: &[Value]) -> EngineResult<usize>;

    /// Execute a prepared statement as a query.
    ///
    /// Every row is handed to `on_row` as soon as the cursor produces it, in
    /// cursor order. Returns the number of rows produced.
    fn execute_query(
        &mut self,
        stmt: StatementId,
        params: &[Value],
        on_row: &mut dyn FnMut(ResultRow),
    ) -> EngineResult<usize>;

    /// Turn auto-commit off until the next commit or rollback.
    fn begin_transaction(&mut self) -> EngineResult<()>;

    /// Commit the open transaction.
    fn commit(&mut self) -> EngineResult<()>;

    /// Roll back the open transaction, if there is one.
    fn rollback(&mut self) -> EngineResult<()>;

    /// Release prepared statements and close the connection.
    fn close(self) -> EngineResult<()>
    where
        Self: Sized;
}

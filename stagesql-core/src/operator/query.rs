//! The window query: prepared once, bound and evaluated once per window.

use tracing::trace;

use crate::emit::Emitter;
use crate::engine::{SqlEngine, StatementId};
use crate::error::{QueryError, SetupError};
use crate::value::Value;

use super::BindMode;

#[derive(Debug)]
pub(crate) struct WindowQuery {
    sql: String,
    stmt: StatementId,
    bindings: Option<Vec<Value>>,
}

impl WindowQuery {
    pub(crate) fn prepare<E: SqlEngine>(engine: &mut E, sql: &str) -> Result<Self, SetupError> {
        let stmt = engine.prepare(sql).map_err(SetupError::PrepareQuery)?;
        Ok(Self {
            sql: sql.to_string(),
            stmt,
            bindings: None,
        })
    }

    pub(crate) fn sql(&self) -> &str {
        &self.sql
    }

    /// Replace the binding list for the current window.
    pub(crate) fn set_bindings(&mut self, values: Vec<Value>) {
        self.bindings = Some(values);
    }

    pub(crate) fn pending_bindings(&self) -> Option<&[Value]> {
        self.bindings.as_deref()
    }

    /// Drop the binding list without evaluating.
    pub(crate) fn discard_bindings(&mut self) {
        self.bindings = None;
    }

    /// Bind, execute and stream every result row to `emitter`.
    ///
    /// The binding list is consumed whether or not execution succeeds.
    pub(crate) fn evaluate<E: SqlEngine>(
        &mut self,
        engine: &mut E,
        window_id: u64,
        mode: BindMode,
        emitter: &mut dyn Emitter,
    ) -> Result<usize, QueryError> {
        let params: Vec<Value> = match (self.bindings.take(), mode) {
            (None, _) => Vec::new(),
            (Some(values), BindMode::Typed) => values,
            (Some(values), BindMode::Text) => values.iter().map(Value::to_text).collect(),
        };
        trace!(window_id, params = params.len(), "Evaluating window query");

        engine
            .execute_query(self.stmt, &params, &mut |row| emitter.emit(row))
            .map_err(|cause| QueryError::Execute { window_id, cause })
    }
}

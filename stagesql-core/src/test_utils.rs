//! Test utilities for the staging operator.
//!
//! [`RecordingEngine`] is an in-memory stand-in for an embedded database. It
//! does not evaluate SQL. It records every call, checks parameter counts
//! against the `?` placeholders of each statement, keeps a row count per
//! staging table (inserts add, deletes clear, rollback restores), and answers
//! queries with scripted rows. Failures can be injected per statement.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::emit::{Emitter, ResultRow};
use crate::engine::{EngineResult, SqlEngine, StatementId};
use crate::error::EngineError;
use crate::value::Value;

/// One call made against a [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Namespace(String),
    Batch(String),
    Prepare(String),
    Update { sql: String, params: Vec<Value> },
    Query { sql: String, params: Vec<Value> },
    Begin,
    Commit,
    Rollback,
    Close,
}

/// Shared view of the call log, still readable after the engine is closed.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<EngineCall>>>);

impl CallLog {
    fn push(&self, call: EngineCall) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }

    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.0.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// SQL of every executed update, in order.
    pub fn updates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Update { sql, .. } => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.0.lock() {
            calls.clear();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailPoint {
    Prepare,
    Execute,
    Begin,
    Commit,
    Close,
}

/// In-memory fake engine.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    statements: Vec<String>,
    log: CallLog,
    results: Vec<(String, Vec<ResultRow>)>,
    failures: Vec<(FailPoint, String)>,
    rows: HashMap<String, usize>,
    snapshot: Option<HashMap<String, usize>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries whose SQL contains `pattern` with `rows`.
    pub fn with_rows(mut self, pattern: &str, rows: Vec<ResultRow>) -> Self {
        self.results.push((pattern.to_string(), rows));
        self
    }

    /// Fail `prepare` for SQL containing `pattern`.
    pub fn fail_prepare(mut self, pattern: &str) -> Self {
        self.failures.push((FailPoint::Prepare, pattern.to_string()));
        self
    }

    /// Fail execution (update, query or batch) of SQL containing `pattern`.
    pub fn fail_execute(mut self, pattern: &str) -> Self {
        self.failures.push((FailPoint::Execute, pattern.to_string()));
        self
    }

    pub fn fail_begin(mut self) -> Self {
        self.failures.push((FailPoint::Begin, String::new()));
        self
    }

    pub fn fail_commit(mut self) -> Self {
        self.failures.push((FailPoint::Commit, String::new()));
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.failures.push((FailPoint::Close, String::new()));
        self
    }

    /// Handle on the call log.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Rows currently held by a table, keyed as it appears in SQL.
    pub fn staged_rows(&self, table: &str) -> usize {
        self.rows.get(table).copied().unwrap_or(0)
    }

    /// Whether a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    /// SQL text of a prepared statement.
    pub fn statement_sql(&self, stmt: StatementId) -> Option<&str> {
        self.statements.get(stmt.0).map(String::as_str)
    }

    fn should_fail(&self, point: FailPoint, sql: &str) -> bool {
        self.failures
            .iter()
            .any(|(p, pattern)| *p == point && sql.contains(pattern.as_str()))
    }

    fn lookup(&self, stmt: StatementId) -> EngineResult<String> {
        self.statements
            .get(stmt.0)
            .cloned()
            .ok_or(EngineError::UnknownStatement(stmt))
    }

    fn check_params(sql: &str, params: &[Value]) -> EngineResult<()> {
        let expected = placeholder_count(sql);
        if expected != params.len() {
            return Err(EngineError::ParameterCount {
                expected,
                actual: params.len(),
            });
        }
        Ok(())
    }

    /// Track table row counts for INSERT/DELETE statements.
    fn apply(&mut self, sql: &str) -> usize {
        let mut words = sql.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some(verb), Some(_), Some(table)) if verb.eq_ignore_ascii_case("INSERT") => {
                *self.rows.entry(table.to_string()).or_insert(0) += 1;
                1
            }
            (Some(verb), Some(_), Some(table)) if verb.eq_ignore_ascii_case("DELETE") => {
                self.rows.insert(table.to_string(), 0).unwrap_or(0)
            }
            _ => 0,
        }
    }
}

/// Count `?` placeholders outside string literals.
fn placeholder_count(sql: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for c in sql.chars() {
        match c {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}

impl SqlEngine for RecordingEngine {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn prepare_namespace(&mut self, namespace: &str) -> EngineResult<()> {
        self.log.push(EngineCall::Namespace(namespace.to_string()));
        Ok(())
    }

    fn execute_batch(&mut self, sql: &str) -> EngineResult<()> {
        self.log.push(EngineCall::Batch(sql.to_string()));
        if self.should_fail(FailPoint::Execute, sql) {
            return Err(EngineError::Execution(format!("injected failure: {sql}")));
        }
        Ok(())
    }

    fn prepare(&mut self, sql: &str) -> EngineResult<StatementId> {
        self.log.push(EngineCall::Prepare(sql.to_string()));
        if self.should_fail(FailPoint::Prepare, sql) {
            return Err(EngineError::Prepare {
                sql: sql.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        self.statements.push(sql.to_string());
        Ok(StatementId(self.statements.len() - 1))
    }

    fn parameter_count(&mut self, stmt: StatementId) -> EngineResult<usize> {
        self.lookup(stmt).map(|sql| placeholder_count(&sql))
    }

    fn execute_update(&mut self, stmt: StatementId, params: &[Value]) -> EngineResult<usize> {
        let sql = self.lookup(stmt)?;
        self.log.push(EngineCall::Update {
            sql: sql.clone(),
            params: params.to_vec(),
        });
        Self::check_params(&sql, params)?;
        if self.should_fail(FailPoint::Execute, &sql) {
            return Err(EngineError::Execution(format!("injected failure: {sql}")));
        }
        Ok(self.apply(&sql))
    }

    fn execute_query(
        &mut self,
        stmt: StatementId,
        params: &[Value],
        on_row: &mut dyn FnMut(ResultRow),
    ) -> EngineResult<usize> {
        let sql = self.lookup(stmt)?;
        self.log.push(EngineCall::Query {
            sql: sql.clone(),
            params: params.to_vec(),
        });
        Self::check_params(&sql, params)?;
        if self.should_fail(FailPoint::Execute, &sql) {
            return Err(EngineError::Execution(format!("injected failure: {sql}")));
        }

        let rows = self
            .results
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        let n = rows.len();
        for row in rows {
            on_row(row);
        }
        Ok(n)
    }

    fn begin_transaction(&mut self) -> EngineResult<()> {
        self.log.push(EngineCall::Begin);
        if self.should_fail(FailPoint::Begin, "") {
            return Err(EngineError::Transaction("injected begin failure".to_string()));
        }
        if self.snapshot.is_some() {
            return Err(EngineError::Transaction(
                "cannot start a transaction within a transaction".to_string(),
            ));
        }
        self.snapshot = Some(self.rows.clone());
        Ok(())
    }

    fn commit(&mut self) -> EngineResult<()> {
        self.log.push(EngineCall::Commit);
        if self.should_fail(FailPoint::Commit, "") {
            return Err(EngineError::Transaction("injected commit failure".to_string()));
        }
        match self.snapshot.take() {
            Some(_) => Ok(()),
            None => Err(EngineError::Transaction("no transaction is active".to_string())),
        }
    }

    fn rollback(&mut self) -> EngineResult<()> {
        self.log.push(EngineCall::Rollback);
        if let Some(rows) = self.snapshot.take() {
            self.rows = rows;
        }
        Ok(())
    }

    fn close(self) -> EngineResult<()> {
        self.log.push(EngineCall::Close);
        if self.should_fail(FailPoint::Close, "") {
            return Err(EngineError::Execution("injected close failure".to_string()));
        }
        Ok(())
    }
}

/// Emitter that keeps every row it receives.
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    pub rows: Vec<ResultRow>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the collected rows, leaving the emitter empty.
    pub fn drain(&mut self) -> Vec<ResultRow> {
        std::mem::take(&mut self.rows)
    }
}

impl Emitter for CollectingEmitter {
    fn emit(&mut self, row: ResultRow) {
        self.rows.push(row);
    }
}

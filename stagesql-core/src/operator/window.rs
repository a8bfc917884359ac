//! Window boundaries: transaction open, evaluate, commit, purge.

use tracing::{debug, warn};

use crate::emit::Emitter;
use crate::engine::SqlEngine;
use crate::error::{Error, LifecycleError, Result, TransactionError};

use super::StagingOperator;

/// Where the operator is in the window cycle.
///
/// ```text
/// Idle --begin_window--> Open --query--> Evaluated --commit+purge--> Idle
///                          \                 \
///                           +-- any error ----+--> Failed --abort_window--> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// No window open; staging tables are empty.
    Idle,
    /// Transaction open, tuples being staged.
    Open { window_id: u64 },
    /// Query evaluated and rows emitted; commit and purge pending.
    Evaluated { window_id: u64 },
    /// A window operation failed; must be aborted.
    Failed { window_id: u64 },
}

impl WindowState {
    /// Window id, unless idle.
    pub fn window_id(&self) -> Option<u64> {
        match self {
            WindowState::Idle => None,
            WindowState::Open { window_id }
            | WindowState::Evaluated { window_id }
            | WindowState::Failed { window_id } => Some(*window_id),
        }
    }

    /// Window id of the open window, or the reason there is none.
    pub(crate) fn require_open(&self, operation: &'static str) -> Result<u64> {
        match self {
            WindowState::Open { window_id } => Ok(*window_id),
            WindowState::Failed { window_id } => Err(LifecycleError::WindowFailed {
                window_id: *window_id,
            }
            .into()),
            _ => Err(LifecycleError::NoOpenWindow { operation }.into()),
        }
    }
}

/// What one window did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSummary {
    pub window_id: u64,
    /// Tuples inserted into staging tables
    pub rows_staged: u64,
    /// Result rows handed to the emitter
    pub rows_emitted: u64,
}

impl<E: SqlEngine> StagingOperator<E> {
    /// Open a window: start a transaction for its inserts and query.
    pub fn begin_window(&mut self, window_id: u64) -> Result<()> {
        match self.state {
            WindowState::Idle => {}
            WindowState::Open { window_id: current }
            | WindowState::Evaluated { window_id: current } => {
                return Err(LifecycleError::WindowAlreadyOpen {
                    current,
                    requested: window_id,
                }
                .into());
            }
            WindowState::Failed { window_id } => {
                return Err(LifecycleError::WindowFailed { window_id }.into());
            }
        }

        if let Err(cause) = self.engine.begin_transaction() {
            self.state = WindowState::Failed { window_id };
            return Err(TransactionError::Begin { window_id, cause }.into());
        }

        self.rows_staged = 0;
        self.state = WindowState::Open { window_id };
        debug!(window_id, "Window opened");
        Ok(())
    }

    /// Close the window.
    ///
    /// Runs the window query once, emitting every row to `emitter` in cursor
    /// order, then commits and purges all staging tables.
    pub fn end_window(&mut self, emitter: &mut dyn Emitter) -> Result<WindowSummary> {
        let window_id = self.state.require_open("end_window")?;

        let emitted = self
            .query
            .evaluate(&mut self.engine, window_id, self.config.bind_mode, emitter);
        let rows_emitted = match emitted {
            Ok(n) => n as u64,
            Err(e) => return Err(self.fail(window_id, e.into())),
        };
        self.state = WindowState::Evaluated { window_id };

        if let Err(cause) = self.engine.commit() {
            let err = TransactionError::Commit { window_id, cause };
            return Err(self.fail(window_id, err.into()));
        }
        if let Err(e) = self.purge() {
            return Err(self.fail(window_id, e));
        }

        let summary = WindowSummary {
            window_id,
            rows_staged: self.rows_staged,
            rows_emitted,
        };
        self.rows_staged = 0;
        self.state = WindowState::Idle;

        debug!(
            window_id,
            rows_staged = summary.rows_staged,
            rows_emitted = summary.rows_emitted,
            "Window closed"
        );
        Ok(summary)
    }

    /// Delete every row from every staging table.
    ///
    /// Idempotent; safe to run against empty tables.
    pub fn purge(&mut self) -> Result<()> {
        for table in self.tables.iter().flatten() {
            self.engine
                .execute_update(table.delete_statement(), &[])
                .map_err(|cause| TransactionError::Purge {
                    table: table.name().to_string(),
                    cause,
                })?;
        }
        Ok(())
    }

    /// Abandon the current window after a failure.
    ///
    /// Rolls back the open transaction, purges staging tables and drops any
    /// pending bindings, returning the operator to `Idle` so the host can
    /// replay the window. A no-op when idle.
    pub fn abort_window(&mut self) -> Result<()> {
        let Some(window_id) = self.state.window_id() else {
            return Ok(());
        };

        warn!(window_id, rows_staged = self.rows_staged, "Aborting window");

        self.engine
            .rollback()
            .map_err(|cause| TransactionError::Rollback { window_id, cause })?;
        self.purge()?;

        for table in self.tables.iter_mut().flatten() {
            table.clear_params();
        }
        self.query.discard_bindings();
        self.rows_staged = 0;
        self.state = WindowState::Idle;
        Ok(())
    }

    /// Mark the window failed and hand the error back.
    pub(crate) fn fail(&mut self, window_id: u64, err: Error) -> Error {
        warn!(window_id, error = %err, "Window failed");
        self.state = WindowState::Failed { window_id };
        err
    }
}

//! [`SqlEngine`] over a single rusqlite connection.

use rusqlite::{params_from_iter, Connection};
use stagesql_core::{EngineError, EngineResult, ResultRow, SqlEngine, StatementId, Value};
use tracing::{debug, trace};

use crate::error::SqliteError;
use crate::params::{from_value_ref, SqlParam};

/// Initial statement cache size; doubled when more statements are prepared.
const INITIAL_CACHE_CAPACITY: usize = 16;

/// Database names SQLite always provides.
const BUILTIN_SCHEMAS: [&str; 2] = ["main", "temp"];

/// Embedded SQLite engine.
///
/// Staging namespaces are attached in-memory databases, so staging tables
/// live only as long as the connection. Prepared statements are held in the
/// connection's statement cache and looked up by their SQL text.
pub struct SqliteEngine {
    conn: Connection,
    /// SQL text per issued handle
    statements: Vec<String>,
    cache_capacity: usize,
}

impl SqliteEngine {
    /// Wrap an open connection.
    pub fn new(conn: Connection) -> Self {
        conn.set_prepared_statement_cache_capacity(INITIAL_CACHE_CAPACITY);
        Self {
            conn,
            statements: Vec::new(),
            cache_capacity: INITIAL_CACHE_CAPACITY,
        }
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn sql(&self, stmt: StatementId) -> EngineResult<&str> {
        self.statements
            .get(stmt.0)
            .map(String::as_str)
            .ok_or(EngineError::UnknownStatement(stmt))
    }

    fn is_attached(&self, namespace: &str) -> Result<bool, SqliteError> {
        let mut stmt = self.conn.prepare("PRAGMA database_list")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        for name in names {
            if name?.eq_ignore_ascii_case(namespace) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn check_params(expected: usize, params: &[Value]) -> EngineResult<()> {
        if expected != params.len() {
            return Err(EngineError::ParameterCount {
                expected,
                actual: params.len(),
            });
        }
        Ok(())
    }
}

fn backend(err: rusqlite::Error) -> EngineError {
    SqliteError::from(err).into()
}

impl SqlEngine for SqliteEngine {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn prepare_namespace(&mut self, namespace: &str) -> EngineResult<()> {
        if namespace.is_empty() {
            return Err(SqliteError::InvalidNamespace(namespace.to_string()).into());
        }
        if BUILTIN_SCHEMAS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(namespace))
        {
            return Ok(());
        }
        if self.is_attached(namespace)? {
            return Ok(());
        }

        let sql = format!(
            "ATTACH DATABASE ':memory:' AS {}",
            stagesql_core::schema::quote_identifier(namespace)
        );
        self.conn.execute_batch(&sql).map_err(backend)?;
        debug!(namespace, "Attached in-memory staging database");
        Ok(())
    }

    fn staging_table_ddl(&self, table: &str, column_spec: &str) -> String {
        format!("CREATE TABLE {table} ({column_spec})")
    }

    fn execute_batch(&mut self, sql: &str) -> EngineResult<()> {
        trace!(sql, "execute_batch");
        self.conn.execute_batch(sql).map_err(backend)
    }

    fn prepare(&mut self, sql: &str) -> EngineResult<StatementId> {
        if self.statements.len() >= self.cache_capacity {
            self.cache_capacity *= 2;
            self.conn
                .set_prepared_statement_cache_capacity(self.cache_capacity);
        }

        self.conn
            .prepare_cached(sql)
            .map_err(|e| EngineError::Prepare {
                sql: sql.to_string(),
                reason: e.to_string(),
            })?;

        self.statements.push(sql.to_string());
        let id = StatementId(self.statements.len() - 1);
        trace!(%id, sql, "Prepared statement");
        Ok(id)
    }

    fn parameter_count(&mut self, stmt: StatementId) -> EngineResult<usize> {
        let sql = self.sql(stmt)?;
        let cached = self.conn.prepare_cached(sql).map_err(backend)?;
        Ok(cached.parameter_count())
    }

    fn execute_update(&mut self, stmt: StatementId, params: &[Value]) -> EngineResult<usize> {
        let sql = self.sql(stmt)?;
        let mut cached = self.conn.prepare_cached(sql).map_err(backend)?;
        Self::check_params(cached.parameter_count(), params)?;

        cached
            .execute(params_from_iter(params.iter().map(SqlParam)))
            .map_err(|e| EngineError::Execution(e.to_string()))
    }

    fn execute_query(
        &mut self,
        stmt: StatementId,
        params: &[Value],
        on_row: &mut dyn FnMut(ResultRow),
    ) -> EngineResult<usize> {
        let sql = self.sql(stmt)?;
        let mut cached = self.conn.prepare_cached(sql).map_err(backend)?;
        Self::check_params(cached.parameter_count(), params)?;

        let names: Vec<String> = cached
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = cached
            .query(params_from_iter(params.iter().map(SqlParam)))
            .map_err(|e| EngineError::Execution(e.to_string()))?;

        let mut count = 0;
        while let Some(row) = rows
            .next()
            .map_err(|e| EngineError::Execution(e.to_string()))?
        {
            let mut out = ResultRow::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                let value = row.get_ref(i).map_err(backend)?;
                out.push(name.clone(), from_value_ref(value));
            }
            on_row(out);
            count += 1;
        }
        Ok(count)
    }

    fn begin_transaction(&mut self) -> EngineResult<()> {
        if !self.conn.is_autocommit() {
            return Err(SqliteError::Transaction(
                "cannot start a transaction within a transaction",
            )
            .into());
        }
        self.conn
            .execute_batch("BEGIN")
            .map_err(|e| EngineError::Transaction(e.to_string()))
    }

    fn commit(&mut self) -> EngineResult<()> {
        if self.conn.is_autocommit() {
            return Err(SqliteError::Transaction("no transaction is active").into());
        }
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| EngineError::Transaction(e.to_string()))
    }

    fn rollback(&mut self) -> EngineResult<()> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| EngineError::Transaction(e.to_string()))
    }

    fn close(self) -> EngineResult<()> {
        self.conn.flush_prepared_statement_cache();
        self.conn
            .close()
            .map_err(|(_, e)| SqliteError::from(e).into())
    }
}

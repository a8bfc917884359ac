//! Staging table creation and per-table statements.
//!
//! Every source with at least one column gets a table in the staging
//! namespace, created with the engine's session-scoped DDL, plus two prepared
//! statements: an insert whose parameters follow the source's bind indices,
//! and an unconditional delete used to purge the table between windows.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::engine::{SqlEngine, StatementId};
use crate::error::SetupError;
use crate::schema::{
    quote_identifier, validate_default_expr, validate_sql_type, SchemaRegistry, SourceDescriptor,
};
use crate::value::Value;

use super::OperatorConfig;

/// A created staging table and its prepared statements.
#[derive(Debug, Clone)]
pub struct StagingTable {
    source_index: usize,
    /// Unquoted `namespace.source`, for messages
    name: String,
    columns: Vec<String>,
    insert: StatementId,
    delete: StatementId,
    placeholders: usize,
    /// Insert parameters for the tuple being staged, by bind index - 1
    params: Vec<Option<Value>>,
}

impl StagingTable {
    /// Index of the source this table stages.
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// `namespace.source`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column names in DDL order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of `?` placeholders in the insert statement.
    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    pub fn insert_statement(&self) -> StatementId {
        self.insert
    }

    pub fn delete_statement(&self) -> StatementId {
        self.delete
    }

    /// Put a value in the parameter slot for a 1-based bind index.
    pub(crate) fn bind(&mut self, bind_index: usize, value: Value) {
        if let Some(slot) = bind_index
            .checked_sub(1)
            .and_then(|i| self.params.get_mut(i))
        {
            *slot = Some(value);
        }
    }

    /// Drain the parameter buffer, leaving every slot unset.
    pub(crate) fn take_params(&mut self) -> Vec<Option<Value>> {
        self.params.iter_mut().map(Option::take).collect()
    }

    /// Unset every parameter slot.
    pub(crate) fn clear_params(&mut self) {
        self.params.iter_mut().for_each(|slot| *slot = None);
    }
}

/// Qualified, quoted table reference: `"namespace"."source"`.
pub fn qualified_table(namespace: &str, source: &str) -> String {
    format!("{}.{}", quote_identifier(namespace), quote_identifier(source))
}

/// Comma-separated column definitions, in declaration order.
pub fn column_spec(source: &SourceDescriptor) -> String {
    source
        .columns()
        .iter()
        .map(|c| c.ddl_fragment())
        .collect::<Vec<_>>()
        .join(", ")
}

/// INSERT with one placeholder per bound column, in bind index order.
pub fn insert_sql(table: &str, source: &SourceDescriptor) -> String {
    if source.bound_count() == 0 {
        return format!("INSERT INTO {table} DEFAULT VALUES");
    }

    let names: Vec<String> = source
        .bound_columns()
        .map(|c| quote_identifier(&c.name))
        .collect();
    let placeholders: Vec<&str> = (0..names.len()).map(|_| "?").collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders.join(", ")
    )
}

/// Unconditional delete of every staged row.
pub fn delete_sql(table: &str) -> String {
    format!("DELETE FROM {table}")
}

fn validate_source(source: &SourceDescriptor) -> Result<(), SetupError> {
    let mut seen = HashSet::new();
    for column in source.columns() {
        validate_sql_type(&column.sql_type).map_err(|reason| SetupError::InvalidColumnType {
            table: source.name().to_string(),
            column: column.name.clone(),
            reason,
        })?;
        if let Some(expr) = &column.default {
            validate_default_expr(expr).map_err(|reason| SetupError::InvalidDefault {
                table: source.name().to_string(),
                column: column.name.clone(),
                reason,
            })?;
        }
        if !seen.insert(column.name.to_ascii_lowercase()) {
            return Err(SetupError::DuplicateColumn {
                table: source.name().to_string(),
                column: column.name.clone(),
            });
        }
    }
    Ok(())
}

/// Create one staging table per non-empty source.
///
/// The returned vector is indexed like the registry; skipped sources leave
/// `None` so tuples for them can be rejected by index.
pub fn create_staging_tables<E: SqlEngine>(
    engine: &mut E,
    registry: &SchemaRegistry,
    config: &OperatorConfig,
) -> Result<Vec<Option<StagingTable>>, SetupError> {
    let namespace = config.namespace.as_str();
    let mut tables = Vec::with_capacity(registry.len());
    let mut names = HashSet::new();
    let mut namespace_ready = false;

    for (index, source) in registry.iter() {
        let source = match source {
            Some(s) if !s.is_empty() => s,
            _ => {
                debug!(index, "Skipping source with no columns");
                tables.push(None);
                continue;
            }
        };

        validate_source(source)?;

        let name = format!("{}.{}", namespace, source.name());
        if !names.insert(name.to_ascii_lowercase()) {
            return Err(SetupError::DuplicateTable { table: name });
        }

        if !namespace_ready {
            engine
                .prepare_namespace(namespace)
                .map_err(|cause| SetupError::Namespace {
                    namespace: namespace.to_string(),
                    cause,
                })?;
            namespace_ready = true;
        }

        let qualified = qualified_table(namespace, source.name());
        let ddl = engine.staging_table_ddl(&qualified, &column_spec(source));
        engine
            .execute_batch(&ddl)
            .map_err(|cause| SetupError::CreateTable {
                table: name.clone(),
                cause,
            })?;

        let insert = engine
            .prepare(&insert_sql(&qualified, source))
            .map_err(|cause| SetupError::PrepareStatement {
                table: name.clone(),
                kind: "insert",
                cause,
            })?;
        let delete = engine
            .prepare(&delete_sql(&qualified))
            .map_err(|cause| SetupError::PrepareStatement {
                table: name.clone(),
                kind: "delete",
                cause,
            })?;

        info!(
            table = %name,
            columns = source.columns().len(),
            bound = source.bound_count(),
            "Created staging table"
        );

        tables.push(Some(StagingTable {
            source_index: index,
            name,
            columns: source.columns().iter().map(|c| c.name.clone()).collect(),
            insert,
            delete,
            placeholders: source.bound_count(),
            params: vec![None; source.bound_count()],
        }));
    }

    Ok(tables)
}

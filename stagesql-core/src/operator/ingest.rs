//! Tuple ingestion into staging tables.

use tracing::trace;

use crate::engine::SqlEngine;
use crate::error::{IngestError, Result};
use crate::schema::ColumnDescriptor;
use crate::value::{Record, Value};

use super::{BindMode, StagingOperator, UnmappedFieldPolicy};

impl<E: SqlEngine> StagingOperator<E> {
    /// Stage one tuple for the source at `source_index`.
    ///
    /// Fields are bound by their column's bind index; fields that name no
    /// bound column follow the configured [`UnmappedFieldPolicy`]. Every
    /// bound column must have a value (NULL is a value).
    pub fn process(&mut self, source_index: usize, record: &Record) -> Result<()> {
        let window_id = self.state.require_open("process")?;

        match self.stage(source_index, record) {
            Ok(()) => {
                self.rows_staged += 1;
                Ok(())
            }
            Err(e) => Err(self.fail(window_id, e.into())),
        }
    }

    /// Stage one tuple, resolving the source by name.
    pub fn process_named(&mut self, source: &str, record: &Record) -> Result<()> {
        let window_id = self.state.require_open("process")?;

        match self.registry.index_of(source) {
            Some(index) => self.process(index, record),
            None => {
                let err = IngestError::UnknownSourceName(source.to_string());
                Err(self.fail(window_id, err.into()))
            }
        }
    }

    fn stage(&mut self, source_index: usize, record: &Record) -> std::result::Result<(), IngestError> {
        let source = self
            .registry
            .get(source_index)
            .ok_or(IngestError::UnknownSource(source_index))?;
        let table = self
            .tables
            .get_mut(source_index)
            .and_then(Option::as_mut)
            .ok_or_else(|| IngestError::NoStagingTable {
                index: source_index,
                table: source.name().to_string(),
            })?;

        for (field, value) in record {
            let bound = source
                .column_named(field)
                .and_then(|c| c.bind_index().map(|i| (c, i)));

            match bound {
                Some((column, bind_index)) => {
                    table.bind(bind_index, bind_value(value, column, self.config.bind_mode));
                }
                None => match self.config.unmapped_fields {
                    UnmappedFieldPolicy::Ignore => {
                        trace!(table = table.name(), field = %field, "Ignoring unmapped field");
                    }
                    UnmappedFieldPolicy::Reject => {
                        table.clear_params();
                        return Err(IngestError::UnmappedField {
                            table: table.name().to_string(),
                            field: field.clone(),
                        });
                    }
                },
            }
        }

        let slots = table.take_params();
        let mut params = Vec::with_capacity(slots.len());
        for (slot, column) in slots.into_iter().zip(source.bound_columns()) {
            match slot {
                Some(value) => params.push(value),
                None => {
                    return Err(IngestError::MissingValue {
                        table: table.name().to_string(),
                        column: column.name.clone(),
                    })
                }
            }
        }

        self.engine
            .execute_update(table.insert_statement(), &params)
            .map_err(|cause| IngestError::Insert {
                table: table.name().to_string(),
                cause,
            })?;
        Ok(())
    }
}

/// Value to bind for a column under the given mode.
fn bind_value(value: &Value, column: &ColumnDescriptor, mode: BindMode) -> Value {
    match mode {
        BindMode::Typed => value.coerce(column.affinity()),
        BindMode::Text => value.to_text(),
    }
}

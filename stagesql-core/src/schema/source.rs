//! Source descriptors: one named input and its ordered columns.

use super::ColumnDescriptor;

/// A named input source and the staging columns derived from it.
///
/// Columns keep insertion order. Bind indices are handed out as columns are
/// added, counting only bound columns, so DDL order, insert column order and
/// parameter positions always agree.
///
/// ```
/// use stagesql_core::schema::SourceDescriptor;
///
/// let orders = SourceDescriptor::new("orders")
///     .column("id", "INT")
///     .column_with_default("received", "TIMESTAMP", "CURRENT_TIMESTAMP")
///     .column("amount", "DECIMAL");
///
/// assert_eq!(orders.column_named("id").unwrap().bind_index(), Some(1));
/// assert_eq!(orders.column_named("received").unwrap().bind_index(), None);
/// assert_eq!(orders.column_named("amount").unwrap().bind_index(), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    name: String,
    columns: Vec<ColumnDescriptor>,
    bound: usize,
}

impl SourceDescriptor {
    /// Create a source with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            bound: 0,
        }
    }

    /// Builder: append a bound column.
    pub fn column(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.bound += 1;
        self.columns.push(ColumnDescriptor {
            name: name.into(),
            sql_type: sql_type.into(),
            default: None,
            bind_index: Some(self.bound),
        });
        self
    }

    /// Builder: append a column filled by a DEFAULT expression.
    ///
    /// The column appears in the staging table but not in the insert
    /// statement, so record values for it are never bound.
    pub fn column_with_default(
        mut self,
        name: impl Into<String>,
        sql_type: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        self.columns.push(ColumnDescriptor {
            name: name.into(),
            sql_type: sql_type.into(),
            default: Some(default.into()),
            bind_index: None,
        });
        self
    }

    /// Source name, used as the staging table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All columns, in declaration order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Columns that take part in the insert statement, in parameter order.
    pub fn bound_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.is_bound())
    }

    /// Number of insert parameters.
    pub fn bound_count(&self) -> usize {
        self.bound
    }

    /// Look up a column by exact name.
    pub fn column_named(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether the source has no columns (and so gets no staging table).
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_indices_follow_order() {
        let src = SourceDescriptor::new("t")
            .column("a", "INT")
            .column("b", "VARCHAR(8)")
            .column("c", "DOUBLE");

        let indices: Vec<_> = src.columns().iter().map(|c| c.bind_index()).collect();
        assert_eq!(indices, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(src.bound_count(), 3);
    }

    #[test]
    fn test_default_columns_skip_indices() {
        let src = SourceDescriptor::new("t")
            .column_with_default("ts", "TIMESTAMP", "CURRENT_TIMESTAMP")
            .column("a", "INT");

        assert_eq!(src.columns().len(), 2);
        assert_eq!(src.bound_count(), 1);
        let bound: Vec<_> = src.bound_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(bound, vec!["a"]);
        assert_eq!(src.column_named("a").unwrap().bind_index(), Some(1));
    }

    #[test]
    fn test_empty_source() {
        let src = SourceDescriptor::new("nothing");
        assert!(src.is_empty());
        assert_eq!(src.bound_count(), 0);
        assert!(src.column_named("x").is_none());
    }
}

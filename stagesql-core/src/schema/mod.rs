//! Staging schema types.
//!
//! The schema registry is supplied by the host before setup and is read-only
//! afterwards. Each entry describes one input source; the operator turns every
//! non-empty entry into a staging table.
//!
//! # Example
//!
//! ```rust
//! use stagesql_core::schema::{SchemaRegistry, SourceDescriptor};
//!
//! let registry = SchemaRegistry::new()
//!     .with_source(SourceDescriptor::new("orders").column("id", "INT"))
//!     .with_absent()
//!     .with_source(SourceDescriptor::new("refunds").column("order_id", "INT"));
//!
//! assert_eq!(registry.len(), 3);
//! assert_eq!(registry.index_of("refunds"), Some(2));
//! ```

mod affinity;
mod column;
mod source;

pub use affinity::TypeAffinity;
pub use column::{quote_identifier, ColumnDescriptor};
pub(crate) use column::{validate_default_expr, validate_sql_type};
pub use source::SourceDescriptor;

/// Ordered collection of input sources, indexed by position.
///
/// Positions matter: tuples arrive tagged with a source index. An entry may
/// be absent, which reserves the index without creating a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    sources: Vec<Option<SourceDescriptor>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a source at the next index.
    pub fn with_source(mut self, source: SourceDescriptor) -> Self {
        self.sources.push(Some(source));
        self
    }

    /// Builder: reserve the next index with no source.
    pub fn with_absent(mut self) -> Self {
        self.sources.push(None);
        self
    }

    /// Append a source, returning its index.
    pub fn push(&mut self, source: Option<SourceDescriptor>) -> usize {
        self.sources.push(source);
        self.sources.len() - 1
    }

    /// Source at an index, if present.
    pub fn get(&self, index: usize) -> Option<&SourceDescriptor> {
        self.sources.get(index).and_then(Option::as_ref)
    }

    /// Index of the first source with this name (ASCII case-insensitive).
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.sources.iter().position(|s| {
            s.as_ref()
                .map(|s| s.name().eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
    }

    /// Number of slots, including absent ones.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Iterate over `(index, source)` for every slot.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&SourceDescriptor>)> {
        self.sources.iter().enumerate().map(|(i, s)| (i, s.as_ref()))
    }
}

impl FromIterator<SourceDescriptor> for SchemaRegistry {
    fn from_iter<T: IntoIterator<Item = SourceDescriptor>>(iter: T) -> Self {
        Self {
            sources: iter.into_iter().map(Some).collect(),
        }
    }
}

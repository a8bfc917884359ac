//! Convenient re-exports for common usage.
//!
//! ```rust
//! use stagesql_core::prelude::*;
//!
//! let registry = SchemaRegistry::new()
//!     .with_source(SourceDescriptor::new("orders").column("id", "INT"));
//! assert_eq!(registry.len(), 1);
//! ```

// Schema types
pub use crate::schema::{SchemaRegistry, SourceDescriptor};

// Operator types
pub use crate::operator::{BindMode, OperatorConfig, StagingOperator, UnmappedFieldPolicy};

// Values and rows
pub use crate::emit::{Emitter, ResultRow};
pub use crate::value::{record, Record, Value};

// Engine seam
pub use crate::engine::SqlEngine;

// Error types
pub use crate::error::{Error, Result};

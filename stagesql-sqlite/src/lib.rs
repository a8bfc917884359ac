//! stagesql-sqlite: embedded SQLite backend for the staging operator.
//!
//! Staging tables are created in an in-memory database attached under the
//! operator's namespace, so a query written against `SESSION.orders` reads
//! the `orders` staging table directly.
//!
//! ## Usage
//!
//! ```rust
//! use stagesql_core::prelude::*;
//! use stagesql_sqlite::SqliteEngine;
//!
//! let registry = SchemaRegistry::new().with_source(
//!     SourceDescriptor::new("orders")
//!         .column("id", "INT")
//!         .column("amount", "DECIMAL"),
//! );
//! let mut op = StagingOperator::setup(
//!     SqliteEngine::open_in_memory()?,
//!     registry,
//!     "SELECT COUNT(*) AS n FROM SESSION.orders",
//!     OperatorConfig::default(),
//! )?;
//!
//! op.begin_window(1)?;
//! op.process(0, &record([("id", Value::from(1)), ("amount", Value::from(9.5))]))?;
//! let mut rows = Vec::new();
//! op.end_window(&mut |row: ResultRow| rows.push(row))?;
//! assert_eq!(rows[0].get("n"), Some(&Value::Integer(1)));
//! op.teardown()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod engine;
mod error;
mod params;

pub use engine::SqliteEngine;
pub use error::SqliteError;
pub use stagesql_core;

//! stagesql - windowed SQL over streaming tuples.
//!
//! The driver reads a staging schema and a window query from a JSON config
//! file, then replays an NDJSON event stream (window boundaries, tuples,
//! query bindings) through a [`StagingOperator`](stagesql_core::StagingOperator)
//! backed by in-memory SQLite. Every result row is written to stdout as one
//! JSON object per line.
//!
//! # Example
//!
//! ```
//! use stagesql::cli::{run_events, DriverConfig, JsonLinesEmitter};
//! use stagesql_core::StagingOperator;
//! use stagesql_sqlite::SqliteEngine;
//!
//! let config: DriverConfig = r#"{
//!     "query": "SELECT COUNT(*) AS n FROM SESSION.clicks",
//!     "sources": [{"name": "clicks", "columns": [{"name": "url", "type": "TEXT"}]}]
//! }"#.parse()?;
//!
//! let mut op = StagingOperator::setup(
//!     SqliteEngine::open_in_memory()?,
//!     config.registry(),
//!     config.query()?,
//!     config.operator_config(),
//! )?;
//!
//! let input = r#"{"op":"begin","window":1}
//! {"op":"tuple","source":"clicks","record":{"url":"/a"}}
//! {"op":"end"}
//! "#;
//! let mut out = JsonLinesEmitter::new(Vec::new());
//! run_events(&mut op, input.as_bytes(), &mut out)?;
//! assert_eq!(String::from_utf8(out.into_inner())?, "{\"n\":1}\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod error;

pub use error::{Error, Result};
pub use stagesql_core;
pub use stagesql_sqlite;

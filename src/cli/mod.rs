//! Command-line driver.
//!
//! This module handles:
//! - Argument parsing via clap
//! - Config file loading (schema, query, operator settings)
//! - The NDJSON event loop
//! - JSON-lines output of result rows

mod args;
mod config;
mod events;
mod output;

pub use args::Args;
pub use config::{BindModeArg, ColumnConfig, DriverConfig, SourceConfig, UnmappedArg};
pub use events::{json_to_value, run_events, Event, SourceRef};
pub use output::{value_to_json, JsonLinesEmitter};

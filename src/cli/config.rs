//! Driver configuration file.
//!
//! ```json
//! {
//!   "query": "SELECT SUM(amount) AS total FROM SESSION.orders",
//!   "namespace": "SESSION",
//!   "bind_mode": "typed",
//!   "unmapped_fields": "ignore",
//!   "sources": [
//!     {"name": "orders", "columns": [
//!       {"name": "id", "type": "INT"},
//!       {"name": "amount", "type": "DECIMAL(10,2)"},
//!       {"name": "seen", "type": "TIMESTAMP", "default": "CURRENT_TIMESTAMP"}
//!     ]},
//!     null
//!   ]
//! }
//! ```
//!
//! A `null` source keeps its index in the registry without creating a table.

use std::path::Path;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;
use stagesql_core::{
    BindMode, OperatorConfig, SchemaRegistry, SourceDescriptor, UnmappedFieldPolicy,
    DEFAULT_NAMESPACE,
};

use crate::error::ConfigError;

/// How tuple fields and bindings are passed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BindModeArg {
    /// Convert values to the declared column type
    #[default]
    Typed,
    /// Bind every value as text
    Text,
}

impl From<BindModeArg> for BindMode {
    fn from(mode: BindModeArg) -> Self {
        match mode {
            BindModeArg::Typed => BindMode::Typed,
            BindModeArg::Text => BindMode::Text,
        }
    }
}

/// What to do with record fields that name no column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedArg {
    #[default]
    Ignore,
    Reject,
}

impl From<UnmappedArg> for UnmappedFieldPolicy {
    fn from(policy: UnmappedArg) -> Self {
        match policy {
            UnmappedArg::Ignore => UnmappedFieldPolicy::Ignore,
            UnmappedArg::Reject => UnmappedFieldPolicy::Reject,
        }
    }
}

/// One column of a source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: String,
    /// DEFAULT expression; the column is then filled by the engine
    #[serde(default)]
    pub default: Option<String>,
}

/// One input source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

impl SourceConfig {
    fn descriptor(&self) -> SourceDescriptor {
        self.columns
            .iter()
            .fold(SourceDescriptor::new(&self.name), |source, column| {
                match &column.default {
                    Some(expr) => source.column_with_default(&column.name, &column.sql_type, expr),
                    None => source.column(&column.name, &column.sql_type),
                }
            })
    }
}

/// Parsed driver configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub bind_mode: BindModeArg,
    #[serde(default)]
    pub unmapped_fields: UnmappedArg,
    #[serde(default)]
    pub sources: Vec<Option<SourceConfig>>,
}

impl DriverConfig {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    /// The window query text.
    pub fn query(&self) -> Result<&str, ConfigError> {
        self.query.as_deref().ok_or(ConfigError::MissingQuery)
    }

    /// Schema registry, in source order.
    pub fn registry(&self) -> SchemaRegistry {
        self.sources
            .iter()
            .fold(SchemaRegistry::new(), |registry, source| match source {
                Some(source) => registry.with_source(source.descriptor()),
                None => registry.with_absent(),
            })
    }

    pub fn operator_config(&self) -> OperatorConfig {
        OperatorConfig::default()
            .with_namespace(self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE))
            .with_bind_mode(self.bind_mode.into())
            .with_unmapped_fields(self.unmapped_fields.into())
    }
}

impl FromStr for DriverConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

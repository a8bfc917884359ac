//! Operator configuration.

/// Default staging namespace. Queries address staged data as `SESSION.<source>`.
pub const DEFAULT_NAMESPACE: &str = "SESSION";

/// How record values are bound into insert statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindMode {
    /// Coerce each value toward its column's declared type affinity.
    #[default]
    Typed,

    /// Bind every non-null value as its textual form and let the engine cast.
    ///
    /// Lossy: blobs are bound as hex text, and engines without implicit
    /// casts may reject or reinterpret values.
    Text,
}

/// What to do with record fields that map to no bound column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmappedFieldPolicy {
    /// Drop the field silently.
    #[default]
    Ignore,

    /// Fail the tuple with an ingest error.
    Reject,
}

/// Configuration for the StagingOperator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Schema/namespace the staging tables live in.
    pub namespace: String,
    /// Value binding for inserts and query parameters.
    pub bind_mode: BindMode,
    /// Handling of record fields without a bound column.
    pub unmapped_fields: UnmappedFieldPolicy,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            bind_mode: BindMode::default(),
            unmapped_fields: UnmappedFieldPolicy::default(),
        }
    }
}

impl OperatorConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_bind_mode(mut self, mode: BindMode) -> Self {
        self.bind_mode = mode;
        self
    }

    pub fn with_unmapped_fields(mut self, policy: UnmappedFieldPolicy) -> Self {
        self.unmapped_fields = policy;
        self
    }
}

//! Type affinity derived from declared SQL type text.

/// Broad storage class a declared column type maps to.
///
/// Declared types are free-form (`INT`, `VARCHAR(32)`, `DECIMAL(10,2)`, ...),
/// so the affinity is found by substring rules, checked in order:
///
/// 1. contains `INT` -> Integer
/// 2. contains `CHAR`, `CLOB` or `TEXT` -> Text
/// 3. contains `BLOB`, or is empty -> Blob
/// 4. contains `REAL`, `FLOA` or `DOUB` -> Real
/// 5. contains `BOOL` -> Boolean
/// 6. anything else (`DECIMAL`, `NUMERIC`, `DATE`, ...) -> Numeric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeAffinity {
    Integer,
    Real,
    Numeric,
    Text,
    Blob,
    Boolean,
}

impl TypeAffinity {
    /// Derive the affinity of a declared SQL type.
    pub fn of(sql_type: &str) -> Self {
        let t = sql_type.to_ascii_uppercase();

        if t.contains("INT") {
            TypeAffinity::Integer
        } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
            TypeAffinity::Text
        } else if t.contains("BLOB") || t.trim().is_empty() {
            TypeAffinity::Blob
        } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
            TypeAffinity::Real
        } else if t.contains("BOOL") {
            TypeAffinity::Boolean
        } else {
            TypeAffinity::Numeric
        }
    }

    /// Lowercase name for display.
    pub fn name(&self) -> &'static str {
        match self {
            TypeAffinity::Integer => "integer",
            TypeAffinity::Real => "real",
            TypeAffinity::Numeric => "numeric",
            TypeAffinity::Text => "text",
            TypeAffinity::Blob => "blob",
            TypeAffinity::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for TypeAffinity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

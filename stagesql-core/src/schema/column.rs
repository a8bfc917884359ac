//! Column descriptor for staging schemas.

use super::TypeAffinity;

/// One column of a source's staging table.
///
/// `bind_index` is assigned by [`SourceDescriptor`](super::SourceDescriptor)
/// when the column is added and never changes afterwards. Columns declared
/// with a default expression are not bound into the insert statement and
/// carry no bind index.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Column name as declared
    pub name: String,

    /// Declared SQL type text, used verbatim in DDL
    pub sql_type: String,

    /// DEFAULT expression for columns the insert statement leaves out
    pub default: Option<String>,

    /// 1-based parameter position in the insert statement
    pub(crate) bind_index: Option<usize>,
}

impl ColumnDescriptor {
    /// 1-based parameter position, or `None` if the column is not bound.
    pub fn bind_index(&self) -> Option<usize> {
        self.bind_index
    }

    /// Whether record values for this column are bound on insert.
    pub fn is_bound(&self) -> bool {
        self.bind_index.is_some()
    }

    /// Affinity of the declared type.
    pub fn affinity(&self) -> TypeAffinity {
        TypeAffinity::of(&self.sql_type)
    }

    /// Column definition fragment for DDL: `"name" TYPE [DEFAULT expr]`.
    pub fn ddl_fragment(&self) -> String {
        match &self.default {
            Some(expr) => format!(
                "{} {} DEFAULT {}",
                quote_identifier(&self.name),
                self.sql_type,
                expr
            ),
            None => format!("{} {}", quote_identifier(&self.name), self.sql_type),
        }
    }
}

/// Quote a SQL identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check that declared type text is safe to splice into DDL.
///
/// Types are not quotable, so anything that could end the column definition
/// early is rejected.
pub(crate) fn validate_sql_type(sql_type: &str) -> Result<(), String> {
    if sql_type.trim().is_empty() {
        return Err("empty type".to_string());
    }
    if sql_type.contains([';', ',', '"', '\'']) && !is_parenthesized_args(sql_type) {
        return Err(format!("unexpected character in type '{sql_type}'"));
    }

    let mut depth = 0i32;
    for c in sql_type.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("unbalanced parentheses in type '{sql_type}'"));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(format!("unbalanced parentheses in type '{sql_type}'"));
    }
    Ok(())
}

/// Check that a DEFAULT expression cannot end the column definition early.
///
/// Outside string literals: no `;`, no comments, commas only inside
/// parentheses, and parentheses balanced.
pub(crate) fn validate_default_expr(expr: &str) -> Result<(), String> {
    if expr.trim().is_empty() {
        return Err("empty default".to_string());
    }

    let mut depth = 0i32;
    let mut in_literal = false;
    let mut chars = expr.chars().peekable();
    while let Some(c) = chars.next() {
        if in_literal {
            if c == '\'' {
                in_literal = false;
            }
            continue;
        }
        match c {
            '\'' => in_literal = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("unbalanced parentheses in default '{expr}'"));
                }
            }
            ';' => return Err(format!("unexpected ';' in default '{expr}'")),
            ',' if depth == 0 => return Err(format!("unexpected ',' in default '{expr}'")),
            '-' if chars.peek() == Some(&'-') => {
                return Err(format!("comment in default '{expr}'"))
            }
            '/' if chars.peek() == Some(&'*') => {
                return Err(format!("comment in default '{expr}'"))
            }
            _ => {}
        }
    }
    if in_literal {
        return Err(format!("unterminated string in default '{expr}'"));
    }
    if depth != 0 {
        return Err(format!("unbalanced parentheses in default '{expr}'"));
    }
    Ok(())
}

/// `DECIMAL(10,2)`: commas are fine inside the argument list, nothing else is.
fn is_parenthesized_args(sql_type: &str) -> bool {
    if sql_type.contains([';', '"', '\'']) {
        return false;
    }
    match (sql_type.find('('), sql_type.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            !sql_type[..open].contains(',') && !sql_type[close..].contains(',')
        }
        _ => false,
    }
}

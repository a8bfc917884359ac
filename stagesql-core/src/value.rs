//! Values flowing through the staging operator.
//!
//! A [`Value`] is what a tuple field carries on the way in, what gets bound
//! into a prepared statement, and what a result column holds on the way out.
//! The variants mirror the storage classes an embedded engine deals in.

use std::collections::HashMap;
use std::fmt;

use crate::schema::TypeAffinity;

/// A single SQL-compatible value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean value
    Boolean(bool),
    /// Signed 64-bit integer
    Integer(i64),
    /// 64-bit floating point
    Real(f64),
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Blob(Vec<u8>),
}

/// An incoming tuple: field name to value.
pub type Record = HashMap<String, Value>;

impl Value {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Boolean(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Try to get as f64. Integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get as str reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bytes reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Textual form used when binding in text mode.
    ///
    /// NULL stays NULL; everything else becomes its display string. This is
    /// lossy: blobs become hex, reals lose their storage class.
    pub fn to_text(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Text(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    /// Coerce this value toward a column's type affinity.
    ///
    /// Conversion is best-effort: a value that does not parse as the target
    /// type, or does not fit it, is passed through unchanged and left for the
    /// engine to judge.
    pub fn coerce(&self, affinity: TypeAffinity) -> Value {
        match (affinity, self) {
            (_, Value::Null) => Value::Null,

            (TypeAffinity::Integer, Value::Boolean(b)) => Value::Integer(*b as i64),
            (TypeAffinity::Integer, Value::Real(f))
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Value::Integer(*f as i64)
            }
            (TypeAffinity::Integer | TypeAffinity::Numeric, Value::Text(s)) => parse_number(s)
                .unwrap_or_else(|| self.clone()),

            (TypeAffinity::Real, Value::Integer(i)) => Value::Real(*i as f64),
            (TypeAffinity::Real, Value::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Real)
                .unwrap_or_else(|_| self.clone()),

            (TypeAffinity::Numeric, Value::Boolean(b)) => Value::Integer(*b as i64),

            (TypeAffinity::Boolean, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Value::Boolean(true),
                "false" | "f" | "0" => Value::Boolean(false),
                _ => self.clone(),
            },
            (TypeAffinity::Boolean, Value::Integer(i)) => Value::Boolean(*i != 0),

            // Reals are left for the engine to render as text
            (TypeAffinity::Text, Value::Boolean(_) | Value::Integer(_)) => {
                Value::Text(self.to_string())
            }

            (TypeAffinity::Blob, Value::Text(s)) => Value::Blob(s.as_bytes().to_vec()),

            _ => self.clone(),
        }
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    s.parse::<f64>().ok().map(Value::Real)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Blob(bytes) => {
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Build a [`Record`] from `(name, value)` pairs.
///
/// ```
/// use stagesql_core::{record, Value};
///
/// let r = record([("id", Value::from(1)), ("name", Value::from("a"))]);
/// assert_eq!(r.len(), 2);
/// ```
pub fn record<K, I>(fields: I) -> Record
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    fields.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Integer(5).to_string(), "5");
        assert_eq!(Value::Real(10.5).to_string(), "10.5");
        assert_eq!(Value::Text("x".into()).to_string(), "x");
        assert_eq!(Value::Blob(vec![0x00, 0xff]).to_string(), "00ff");
    }

    #[test]
    fn test_to_text_keeps_null() {
        assert_eq!(Value::Null.to_text(), Value::Null);
        assert_eq!(Value::Integer(7).to_text(), Value::Text("7".into()));
        assert_eq!(Value::Boolean(true).to_text(), Value::Text("true".into()));
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(Value::from("42").coerce(TypeAffinity::Integer), Value::Integer(42));
        assert_eq!(Value::Real(3.0).coerce(TypeAffinity::Integer), Value::Integer(3));
        // Not integral: left alone
        assert_eq!(Value::Real(3.5).coerce(TypeAffinity::Integer), Value::Real(3.5));
        // Outside the i64 range: left alone rather than saturated
        assert_eq!(Value::Real(1e300).coerce(TypeAffinity::Integer), Value::Real(1e300));
        assert_eq!(
            Value::Real(9.223372036854775807e18).coerce(TypeAffinity::Integer),
            Value::Real(9.223372036854775807e18)
        );
        assert_eq!(
            Value::Real(-9.223372036854775808e18).coerce(TypeAffinity::Integer),
            Value::Integer(i64::MIN)
        );
        assert_eq!(
            Value::Real(f64::INFINITY).coerce(TypeAffinity::Integer),
            Value::Real(f64::INFINITY)
        );
        // Unparseable text is passed through
        assert_eq!(
            Value::from("abc").coerce(TypeAffinity::Integer),
            Value::Text("abc".into())
        );
    }

    #[test]
    fn test_coerce_real_and_numeric() {
        assert_eq!(Value::Integer(2).coerce(TypeAffinity::Real), Value::Real(2.0));
        assert_eq!(Value::from("10.5").coerce(TypeAffinity::Numeric), Value::Real(10.5));
        assert_eq!(Value::from(" 7 ").coerce(TypeAffinity::Numeric), Value::Integer(7));
    }

    #[test]
    fn test_coerce_text_and_boolean() {
        assert_eq!(Value::Integer(5).coerce(TypeAffinity::Text), Value::Text("5".into()));
        assert_eq!(Value::Real(20.0).coerce(TypeAffinity::Text), Value::Real(20.0));
        assert_eq!(Value::from("TRUE").coerce(TypeAffinity::Boolean), Value::Boolean(true));
        assert_eq!(Value::Integer(0).coerce(TypeAffinity::Boolean), Value::Boolean(false));
        assert_eq!(Value::Null.coerce(TypeAffinity::Text), Value::Null);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(3i64)), Value::Integer(3));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Integer(4).as_f64(), Some(4.0));
        assert_eq!(Value::Real(4.5).as_i64(), None);
        assert_eq!(Value::from("s").as_str(), Some("s"));
        assert!(Value::Null.is_null());
    }
}

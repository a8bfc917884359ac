//! JSON-lines output of result rows.

use std::io::{self, Write};

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;
use stagesql_core::{Emitter, ResultRow, Value};

/// Convert a result value to JSON.
///
/// Blobs are rendered as hex strings; non-finite reals become `null`.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Integer(i) => JsonValue::from(*i),
        Value::Real(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Blob(_) => JsonValue::String(value.to_string()),
    }
}

/// Serializes a row as an object with columns in result order.
struct RowObject<'a>(&'a ResultRow);

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0.iter() {
            map.serialize_entry(name, &value_to_json(value))?;
        }
        map.end()
    }
}

/// Writes each emitted row as one JSON object per line.
///
/// The first write error is kept and every later row is dropped; check it
/// with [`take_error`](Self::take_error) after each window.
pub struct JsonLinesEmitter<W: Write> {
    writer: W,
    rows: u64,
    error: Option<io::Error>,
}

impl<W: Write> JsonLinesEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            rows: 0,
            error: None,
        }
    }

    /// Rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// The first write error, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_row(&mut self, row: &ResultRow) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, &RowObject(row))?;
        self.writer.write_all(b"\n")
    }
}

impl<W: Write> Emitter for JsonLinesEmitter<W> {
    fn emit(&mut self, row: ResultRow) {
        if self.error.is_some() {
            return;
        }
        match self.write_row(&row) {
            Ok(()) => self.rows += 1,
            Err(e) => self.error = Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_order_preserved() {
        let mut out = JsonLinesEmitter::new(Vec::new());
        out.emit(ResultRow::new().with("z", 1i64).with("a", "x").with("m", Value::Null));
        out.emit(ResultRow::new().with("b", true));

        assert_eq!(out.rows_written(), 2);
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text, "{\"z\":1,\"a\":\"x\",\"m\":null}\n{\"b\":true}\n");
    }

    #[test]
    fn test_value_to_json() {
        assert_eq!(value_to_json(&Value::Real(1.5)), serde_json::json!(1.5));
        assert_eq!(value_to_json(&Value::Real(f64::NAN)), JsonValue::Null);
        assert_eq!(value_to_json(&Value::Blob(vec![0xab, 0x01])), serde_json::json!("ab01"));
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_error_kept() {
        let mut out = JsonLinesEmitter::new(Broken);
        out.emit(ResultRow::new().with("a", 1i64));
        out.emit(ResultRow::new().with("a", 2i64));
        assert_eq!(out.rows_written(), 0);
        assert_eq!(out.take_error().unwrap().kind(), io::ErrorKind::BrokenPipe);
        assert!(out.take_error().is_none());
    }
}

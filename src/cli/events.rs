//! NDJSON event stream driving the staging operator.
//!
//! One event per line:
//!
//! ```text
//! {"op":"begin","window":1}
//! {"op":"bind","values":[2]}
//! {"op":"tuple","source":"orders","record":{"id":1,"amount":10.5}}
//! {"op":"tuple","source":0,"record":{"id":2,"amount":20}}
//! {"op":"end"}
//! ```

use std::io::BufRead;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use stagesql_core::{Record, SqlEngine, StagingOperator, Value, WindowState, WindowSummary};
use tracing::{info, trace, warn};

use super::JsonLinesEmitter;
use crate::error::{EventError, Result};

/// Source named by index or by name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SourceRef {
    Index(usize),
    Name(String),
}

/// One input event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Event {
    Begin {
        window: u64,
    },
    Tuple {
        source: SourceRef,
        #[serde(default)]
        record: Map<String, JsonValue>,
    },
    Bind {
        values: Vec<JsonValue>,
    },
    End,
}

impl Event {
    /// Parse one input line.
    pub fn parse(line: &str, line_no: usize) -> std::result::Result<Self, EventError> {
        serde_json::from_str(line).map_err(|source| EventError::Parse {
            line: line_no,
            source,
        })
    }
}

/// Convert a JSON value from the input to an operator value.
///
/// Integers that fit `i64` stay integers; other numbers become reals.
/// Arrays and objects are passed as their JSON text.
pub fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
        },
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => Value::Text(json.to_string()),
    }
}

fn to_record(fields: &Map<String, JsonValue>) -> Record {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), json_to_value(v)))
        .collect()
}

/// Replay `input` through the operator, writing result rows to `output`.
///
/// Blank lines are skipped. The first failure stops the run and is returned;
/// the operator is left in whatever state the failure put it in. A window
/// still open at end of input is aborted.
pub fn run_events<E, R, W>(
    op: &mut StagingOperator<E>,
    input: R,
    output: &mut JsonLinesEmitter<W>,
) -> Result<Vec<WindowSummary>>
where
    E: SqlEngine,
    R: BufRead,
    W: std::io::Write,
{
    let mut summaries = Vec::new();

    for (i, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match Event::parse(&line, i + 1)? {
            Event::Begin { window } => op.begin_window(window)?,
            Event::Tuple { source, record } => {
                let record = to_record(&record);
                match source {
                    SourceRef::Index(index) => op.process(index, &record)?,
                    SourceRef::Name(name) => op.process_named(&name, &record)?,
                }
            }
            Event::Bind { values } => {
                trace!(count = values.len(), "Setting query bindings");
                op.set_bindings(values.iter().map(json_to_value).collect());
            }
            Event::End => {
                let summary = op.end_window(output)?;
                if let Some(e) = output.take_error() {
                    return Err(e.into());
                }
                info!(
                    window_id = summary.window_id,
                    rows_staged = summary.rows_staged,
                    rows_emitted = summary.rows_emitted,
                    "Window complete"
                );
                summaries.push(summary);
            }
        }
    }

    if let WindowState::Open { window_id } = op.state() {
        warn!(window_id, "Input ended inside a window; aborting it");
        op.abort_window()?;
    }

    Ok(summaries)
}

//! A [`Backend`] that emits one JSON object per line and per span
//! submission.
//!
//! See [`JsonBackend`] for more details.

use crate::attr::{AttrValue, Field};
use crate::backend::{Backend, Line, SpanData};
use serde_json::{json, Map, Value};
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A [`Backend`] writing newline-delimited JSON to any [`Write`]r.
///
/// Write failures never reach the buffering core; they go to the error
/// reporter, which defaults to printing on stderr.
///
/// # Examples
///
/// ```
/// use trellis::{JsonBackend, Seed, Settings};
///
/// let span = Seed::new(Settings::default())
///     .with_backend(JsonBackend::new(std::io::stdout()))
///     .span("request");
/// span.info("hello", &[]);
/// span.end();
/// ```
pub struct JsonBackend<W> {
    writer: Mutex<W>,
    report: Box<dyn Fn(io::Error) + Send + Sync>,
}

impl<W: Write> JsonBackend<W> {
    pub fn new(writer: W) -> Self {
        JsonBackend {
            writer: Mutex::new(writer),
            report: Box::new(|err| eprintln!("trellis json backend: {}", err)),
        }
    }

    /// Replaces the default stderr error reporter.
    pub fn with_error_reporter(
        mut self,
        report: impl Fn(io::Error) + Send + Sync + 'static,
    ) -> Self {
        self.report = Box::new(report);
        self
    }

    fn lock(&self) -> MutexGuard<'_, W> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_value(&self, value: Value) {
        let mut writer = self.lock();
        if let Err(err) = writeln!(writer, "{}", value) {
            (self.report)(err);
        }
    }
}

impl<W: Write + Send + 'static> Backend for JsonBackend<W> {
    fn line(&self, line: &Line<'_>) {
        self.write_value(json!({
            "type": "line",
            "ts": line.timestamp.to_rfc3339(),
            "level": line.level.as_str(),
            "trace_id": line.trace.trace_id().to_simple().to_string(),
            "span_id": line.trace.span_id().to_string(),
            "prefix": line.prefix,
            "msg": line.message,
            "fields": fields_value(line.fields),
        }));
    }

    fn span_data(&self, span: &SpanData<'_>) {
        self.write_value(json!({
            "type": "span",
            "desc": span.description,
            "prefix": span.prefix,
            "trace_id": span.trace.trace_id().to_simple().to_string(),
            "span_id": span.trace.span_id().to_string(),
            "parent_span_id": span.trace.parent_span_id().map(|id| id.to_string()),
            "index": span.index,
            "data": data_value(span.data),
        }));
    }

    fn flush_complete(&self) {
        if let Err(err) = self.lock().flush() {
            (self.report)(err);
        }
    }
}

fn fields_value(fields: &[Field]) -> Value {
    let mut map = Map::with_capacity(fields.len());
    for field in fields {
        map.insert(field.key().to_owned(), attr_value(field.value()));
    }
    Value::Object(map)
}

fn data_value(data: &crate::attr::AttrMap) -> Value {
    let mut map = Map::with_capacity(data.len());
    for (key, value) in data {
        map.insert(key.clone(), attr_value(value));
    }
    Value::Object(map)
}

fn attr_value(value: &AttrValue) -> Value {
    match value {
        AttrValue::String(v) => json!(v),
        AttrValue::I64(v) => json!(v),
        AttrValue::U64(v) => json!(v),
        AttrValue::F64(v) => json!(v),
        AttrValue::Bool(v) => json!(v),
    }
}

//! An introspective in-memory [`Backend`] for tests.
//!
//! Everything logged is saved to memory and can be examined: every
//! immediate line, every buffered span submission (one entry per
//! submission, in arrival order), and the number of completed flush
//! sweeps.

use crate::attr::{AttrMap, Field, IndexMap};
use crate::backend::{Backend, Line, SpanData};
use crate::level::Level;
use crate::trace::TraceContext;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A [`Backend`] that records everything it is given.
///
/// `Recorder` is a cheap clonable handle: keep one clone for assertions
/// and register another with the seed.
///
/// # Examples
///
/// ```
/// use trellis::{attrs, Recorder, Seed, Settings};
///
/// let recorder = Recorder::default();
/// let span = Seed::new(Settings::default())
///     .with_backend(recorder.clone())
///     .span("request");
/// span.span_data(attrs! { "user" => "alice" });
/// span.end();
///
/// let submission = recorder.find_span("request").unwrap();
/// assert_eq!(submission.data["user"], "alice".into());
/// assert_eq!(recorder.flush_count(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    lines: Vec<RecordedLine>,
    spans: Vec<RecordedSpan>,
    flushes: usize,
}

/// One immediate log line, as the backend saw it.
#[derive(Clone, Debug)]
pub struct RecordedLine {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub prefix: String,
    pub trace: TraceContext,
    pub message: String,
    pub fields: Vec<Field>,
}

/// One buffered span submission from a flush sweep.
#[derive(Clone, Debug)]
pub struct RecordedSpan {
    pub description: String,
    pub prefix: String,
    pub trace: TraceContext,
    pub index: IndexMap,
    pub data: AttrMap,
}

impl Recorder {
    pub fn new() -> Self {
        Recorder::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All recorded lines, in the order they were written.
    pub fn lines(&self) -> Vec<RecordedLine> {
        self.lock().lines.clone()
    }

    /// All span submissions, in the order they were flushed. A span
    /// drained by more than one sweep appears once per sweep.
    pub fn spans(&self) -> Vec<RecordedSpan> {
        self.lock().spans.clone()
    }

    /// How many flush sweeps have completed.
    pub fn flush_count(&self) -> usize {
        self.lock().flushes
    }

    /// The most recent submission for a span with the given description.
    pub fn find_span(&self, description: &str) -> Option<RecordedSpan> {
        self.lock()
            .spans
            .iter()
            .rev()
            .find(|span| span.description == description)
            .cloned()
    }

    /// Every submission for a span with the given description.
    pub fn span_submissions(&self, description: &str) -> Vec<RecordedSpan> {
        self.lock()
            .spans
            .iter()
            .filter(|span| span.description == description)
            .cloned()
            .collect()
    }

    /// All recorded lines at the given level.
    pub fn lines_at(&self, level: Level) -> Vec<RecordedLine> {
        self.lock()
            .lines
            .iter()
            .filter(|line| line.level == level)
            .cloned()
            .collect()
    }
}

impl Backend for Recorder {
    fn line(&self, line: &Line<'_>) {
        self.lock().lines.push(RecordedLine {
            timestamp: line.timestamp,
            level: line.level,
            prefix: line.prefix.to_owned(),
            trace: *line.trace,
            message: line.message.to_owned(),
            fields: line.fields.to_vec(),
        });
    }

    fn span_data(&self, span: &SpanData<'_>) {
        self.lock().spans.push(RecordedSpan {
            description: span.description.to_owned(),
            prefix: span.prefix.to_owned(),
            trace: *span.trace,
            index: span.index.clone(),
            data: span.data.clone(),
        });
    }

    fn flush_complete(&self) {
        self.lock().flushes += 1;
    }
}

//! The contract between the buffering core and the writers it fans out to.
//!
//! See [`Backend`] for more details.

use crate::attr::{AttrMap, Field, IndexMap};
use crate::level::Level;
use crate::trace::TraceContext;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One log line, handed to every backend's [`line`] sink as it is written.
///
/// The borrowed views are only valid for the duration of the call; a
/// backend that keeps line data copies what it needs.
///
/// [`line`]: Backend::line
#[derive(Clone, Copy, Debug)]
pub struct Line<'a> {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    /// The span's dotted fork/step path.
    pub prefix: &'a str,
    pub trace: &'a TraceContext,
    pub message: &'a str,
    /// Prefill fields first, then the call-site fields.
    pub fields: &'a [Field],
}

/// One span's buffered state, handed to every backend's [`span_data`] sink
/// during a flush sweep.
///
/// `trace` carries both the span's own identity and its parent span id.
/// The borrowed maps are only valid for the duration of the call.
///
/// [`span_data`]: Backend::span_data
#[derive(Clone, Copy, Debug)]
pub struct SpanData<'a> {
    pub description: &'a str,
    pub prefix: &'a str,
    pub trace: &'a TraceContext,
    pub index: &'a IndexMap,
    pub data: &'a AttrMap,
}

/// A writer that consumes trace output.
///
/// Backends have two channels of interaction: [`line`] receives every log
/// line synchronously as it is written, while [`span_data`] receives
/// span-level attribute state only during a flush sweep, followed by one
/// [`flush_complete`] per sweep. A backend is free to define what consuming
/// means: writing to stdout or a file, sending over a network, storing in
/// memory, ignoring, or anything else.
///
/// The core never inspects backend outcomes; a backend that can fail
/// surfaces its errors through its own reporting hook (see
/// [`JsonBackend`]).
///
/// `span_data` runs while the flush coordination lock is held: a backend
/// must not mutate spans of the same tree from inside it.
///
/// [`line`]: Backend::line
/// [`span_data`]: Backend::span_data
/// [`flush_complete`]: Backend::flush_complete
/// [`JsonBackend`]: crate::printer::JsonBackend
pub trait Backend: Send + Sync + 'static {
    /// Accepts one log line, called synchronously on every level method.
    fn line(&self, line: &Line<'_>);

    /// Accepts one drained span's buffered state, called once per dirty
    /// span per flush sweep.
    fn span_data(&self, span: &SpanData<'_>);

    /// Called once per flush sweep, after every drained span for that sweep
    /// has been submitted.
    fn flush_complete(&self);
}

/// A [`Backend`] that ignores everything it is given.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sink;

impl Backend for Sink {
    fn line(&self, _line: &Line<'_>) {}

    fn span_data(&self, _span: &SpanData<'_>) {}

    fn flush_complete(&self) {}
}

impl<B: Backend> Backend for Arc<B> {
    fn line(&self, line: &Line<'_>) {
        self.as_ref().line(line)
    }

    fn span_data(&self, span: &SpanData<'_>) {
        self.as_ref().span_data(span)
    }

    fn flush_complete(&self) {
        self.as_ref().flush_complete()
    }
}

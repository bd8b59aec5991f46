//! Explicit context propagation for spans.
//!
//! Instead of a process-global lookup keyed by a private sentinel, the
//! current span travels inside a [`Carrier`] value threaded through call
//! chains.

use crate::fail;
use crate::span::Span;

/// A typed carrier for the current [`Span`].
///
/// Callers that can tolerate a missing span use
/// [`span_or_discard`](Carrier::span_or_discard); callers for which a
/// missing span is a fatal wiring bug use
/// [`must_span`](Carrier::must_span).
///
/// # Examples
///
/// ```
/// use trellis::{Carrier, Recorder, Seed, Settings};
///
/// fn handle(carrier: &Carrier) {
///     let span = carrier.span_or_discard();
///     span.info("handling", &[]);
/// }
///
/// let recorder = Recorder::default();
/// let span = Seed::new(Settings::default())
///     .with_backend(recorder.clone())
///     .span("request");
/// let carrier = Carrier::from(span.clone());
/// handle(&carrier);
/// span.end();
/// assert_eq!(recorder.lines().len(), 1);
///
/// // Without a span attached, logging falls through to a discard span.
/// handle(&Carrier::empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Carrier {
    span: Option<Span>,
}

impl Carrier {
    /// A carrier with no span attached.
    pub fn empty() -> Self {
        Carrier { span: None }
    }

    /// Attaches a span, replacing any previous one.
    pub fn attach(&mut self, span: Span) {
        self.span = Some(span);
    }

    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    /// The attached span, or a backend-less discard span when none is
    /// attached.
    pub fn span_or_discard(&self) -> Span {
        match &self.span {
            Some(span) => span.clone(),
            None => Span::discard(),
        }
    }

    /// The attached span; aborts if none is attached.
    pub fn must_span(&self) -> &Span {
        self.span.as_ref().unwrap_or_else(fail::no_span_in_carrier)
    }
}

impl From<Span> for Carrier {
    fn from(span: Span) -> Self {
        Carrier { span: Some(span) }
    }
}

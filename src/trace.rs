//! Trace identity: which trace a span belongs to, and where it sits in the
//! parent/child graph.

use std::fmt;
use uuid::Uuid;

/// An 8-byte span identifier, random and non-zero once assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpanId([u8; 8]);

impl SpanId {
    /// The unassigned id, used only inside seed templates that have not
    /// produced a span yet.
    pub const ZERO: SpanId = SpanId([0; 8]);

    /// Generates a fresh random id. An all-zero id is considered invalid,
    /// so generation retries until the id is non-zero.
    pub fn random() -> Self {
        loop {
            let id: [u8; 8] = rand::random();
            if id != [0; 8] {
                return SpanId(id);
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 8]
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// A span's position in a distributed trace: the trace it belongs to, its
/// own id, and its parent's id if it has one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceContext {
    trace_id: Uuid,
    span_id: SpanId,
    parent_span_id: Option<SpanId>,
}

impl TraceContext {
    /// An unassigned template context. Identity is minted by
    /// [`rebuild`](TraceContext::rebuild) when a span is created from it.
    pub fn new() -> Self {
        TraceContext {
            trace_id: Uuid::nil(),
            span_id: SpanId::ZERO,
            parent_span_id: None,
        }
    }

    /// Adopt an existing trace position, e.g. parsed from an inbound
    /// request. The local span id is still reassigned on span creation.
    pub fn with_remote_parent(trace_id: Uuid, parent_span_id: SpanId) -> Self {
        TraceContext {
            trace_id,
            span_id: SpanId::ZERO,
            parent_span_id: Some(parent_span_id),
        }
    }

    /// Assigns a fresh span id, minting a trace id only if none is set yet.
    /// Lineage (trace id, parent id) is preserved.
    pub(crate) fn rebuild(&mut self) {
        if self.trace_id.is_nil() {
            self.trace_id = Uuid::new_v4();
        }
        self.span_id = SpanId::random();
    }

    /// Derives the context for a child span: same trace, fresh span id,
    /// parent set to this context's span id.
    pub fn sub_span(&self) -> TraceContext {
        TraceContext {
            trace_id: self.trace_id,
            span_id: SpanId::random(),
            parent_span_id: Some(self.span_id),
        }
    }

    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.parent_span_id
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        TraceContext::new()
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.trace_id.to_simple(), self.span_id)
    }
}

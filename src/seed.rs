//! Seeds: the copy-on-derive templates that spans grow from.

use crate::attr::{AttrMap, AttrValue, Field};
use crate::backend::Backend;
use crate::span::{self, Span};
use crate::trace::TraceContext;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How long buffered span data may sit unflushed before the timer forces a
/// sweep.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_secs(5 * 60);

/// Configuration consumed at span-tree construction.
///
/// There is no process-wide mutable default; settings travel on the seed.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
    /// Worst-case staleness of buffered span data.
    pub flush_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            flush_delay: DEFAULT_FLUSH_DELAY,
        }
    }
}

/// The ordered, append-only list of backends a span tree fans out to.
///
/// Cloning is cheap: each backend is held behind an [`Arc`] shared across
/// every seed copy in the tree.
#[derive(Clone, Default)]
pub struct Backends {
    list: Vec<Arc<dyn Backend>>,
}

impl Backends {
    pub fn push(&mut self, backend: Arc<dyn Backend>) {
        self.list.push(backend);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<dyn Backend>> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Backends").field("len", &self.len()).finish()
    }
}

/// A template for creating spans: trace identity, naming, prefill,
/// seed attribute data, backends, and settings.
///
/// Seeds are never mutated in place once a span holds them; every
/// derivation (`clone`, [`Span::copy_seed`], fork/step) works on a fresh
/// copy, and all owned maps are copied with it, so no two seeds alias
/// mutable state.
///
/// [`Span::copy_seed`]: crate::Span::copy_seed
#[derive(Clone, Debug)]
pub struct Seed {
    pub(crate) trace: TraceContext,
    pub(crate) description: String,
    pub(crate) prefix: String,
    pub(crate) prefill: Vec<Field>,
    pub(crate) data: AttrMap,
    pub(crate) backends: Backends,
    pub(crate) settings: Settings,
}

impl Seed {
    pub fn new(settings: Settings) -> Self {
        Seed {
            trace: TraceContext::new(),
            description: String::new(),
            prefix: String::new(),
            prefill: Vec::new(),
            data: AttrMap::new(),
            backends: Backends::default(),
            settings,
        }
    }

    /// Registers a backend. Backends registered before a span tree is
    /// created receive every line and every flush sweep of that tree.
    pub fn with_backend(mut self, backend: impl Backend) -> Self {
        self.add_backend(Arc::new(backend));
        self
    }

    /// `&mut` form of [`with_backend`](Seed::with_backend), usable from the
    /// `*_with` child-creation closures.
    pub fn add_backend(&mut self, backend: Arc<dyn Backend>) {
        self.backends.push(backend);
    }

    /// Seeds an attribute into the shared data of every buffer parent
    /// created from this seed.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.add_data(key, value);
        self
    }

    pub fn add_data(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.data.insert(key.into(), value.into());
    }

    /// Appends a field included on every log line written through spans
    /// holding this seed.
    pub fn with_prefill(mut self, field: Field) -> Self {
        self.add_prefill(field);
        self
    }

    pub fn add_prefill(&mut self, field: Field) {
        self.prefill.push(field);
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Adopts an existing trace position, e.g. one propagated from an
    /// inbound request.
    pub fn with_trace(mut self, trace: TraceContext) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_flush_delay(mut self, flush_delay: Duration) -> Self {
        self.settings.flush_delay = flush_delay;
        self
    }

    pub fn trace(&self) -> &TraceContext {
        &self.trace
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Appends a fork/step suffix to the dotted prefix path.
    pub(crate) fn push_prefix(&mut self, suffix: &str) {
        if self.prefix.is_empty() {
            self.prefix.push_str(suffix);
        } else {
            self.prefix.push('.');
            self.prefix.push_str(suffix);
        }
    }

    /// Creates a new buffer parent span: the root of one buffered-flush
    /// domain.
    ///
    /// The seed is copied, its trace identity is rebuilt (fresh span id,
    /// same lineage), seed data becomes the initial shared data, and the
    /// new span starts out dirty with the flush timer armed for
    /// `settings.flush_delay`.
    pub fn span(&self, description: impl Into<String>) -> Span {
        let mut seed = self.clone();
        seed.description = description.into();
        seed.trace.rebuild();
        span::new_buffer_parent(seed)
    }
}

impl Default for Seed {
    fn default() -> Self {
        Seed::new(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_do_not_alias() {
        let original = Seed::default().with_data("shared", 1);
        let mut copy = original.clone();
        copy.add_data("copied", 2);
        assert_eq!(original.data.len(), 1);
        assert_eq!(copy.data.len(), 2);
    }

    #[test]
    fn prefix_accumulates_with_dots() {
        let mut seed = Seed::default();
        seed.push_prefix("A");
        assert_eq!(seed.prefix, "A");
        seed.push_prefix("1");
        assert_eq!(seed.prefix, "A.1");
    }
}

//! Spans: the nodes of a buffered trace tree.

use crate::attr::{AttrMap, AttrValue, Field, FieldSet};
use crate::backend::Line;
use crate::level::Level;
use crate::seed::Seed;
use crate::shared::SharedGroup;
use crate::trace::TraceContext;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One node in a span tree: a request (the buffer parent), a fork, or a
/// step.
///
/// `Span` is a cheap clonable handle; clones refer to the same node.
/// A buffer parent's attribute data lives in the tree's shared aggregate,
/// while a child's lives locally and is funneled through the shared dirty
/// list at flush time.
///
/// Spans are finished explicitly with [`end`](Span::end); when every
/// outstanding `end` in a tree has been called, the tree flushes itself.
#[derive(Clone)]
pub struct Span {
    inner: Arc<SpanInner>,
}

struct SpanInner {
    seed: Seed,
    created: DateTime<Utc>,
    is_buffer_parent: bool,
    /// True iff this span is currently on the shared dirty list.
    in_dirty: AtomicBool,
    fork_counter: AtomicU32,
    step_counter: AtomicU32,
    /// Private data for non-buffer-parent spans. Guarded by its own lock,
    /// which is only ever taken after the shared lock, never before.
    local: Mutex<AttrMap>,
    shared: Arc<SharedGroup>,
}

/// Builds the root of a new buffered-flush domain. Called by
/// [`Seed::span`].
pub(crate) fn new_buffer_parent(seed: Seed) -> Span {
    let shared = SharedGroup::for_parent(&seed);
    let span = Span {
        inner: Arc::new(SpanInner {
            seed,
            created: Utc::now(),
            is_buffer_parent: true,
            in_dirty: AtomicBool::new(true),
            fork_counter: AtomicU32::new(0),
            step_counter: AtomicU32::new(0),
            local: Mutex::new(AttrMap::new()),
            shared: Arc::clone(&shared),
        }),
    };
    shared.lock().dirty.push(span.clone());
    shared.timer.reset(shared.flush_delay);
    span
}

impl Span {
    /// A span with no backends, for callers that need somewhere to log
    /// when no real span is available.
    pub fn discard() -> Span {
        Seed::default().span("discard")
    }

    /// Signals that this span's work is done. When every span in the tree
    /// has ended, the whole tree is flushed.
    ///
    /// Calling `end` more times than there were matching span creations is
    /// a bug in the calling code: the underflow is reported as a warning
    /// through this span and the flush timer is re-armed, since the
    /// premature flush the imbalance caused may already have fired.
    pub fn end(&self) {
        let remaining = self.inner.shared.ref_count.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining < 0 {
            self.warn("too many calls to end(): the span tree already completed", &[]);
            self.inner.shared.timer.reset(self.inner.shared.flush_delay);
        }
        if remaining <= 0 {
            self.inner.shared.flush();
        }
    }

    fn add_ref(&self) {
        let remaining = self.inner.shared.ref_count.fetch_add(1, Ordering::AcqRel) + 1;
        if remaining > 1 {
            return;
        }
        // Coming back from <= 0 means end() was over-called earlier and a
        // premature flush may have fired already.
        self.warn(
            "too many calls to end(): a child was created after the span tree completed",
            &[],
        );
        self.inner.shared.timer.reset(self.inner.shared.flush_delay);
    }

    /// Creates a child span for concurrent sub-work, identified by a
    /// base-26 letter suffix (`A`, `B`, ..., `Z`, `AA`, ...). The caller
    /// must balance this with a matching [`end`](Span::end) on the child.
    pub fn fork(&self, description: impl Into<String>) -> Span {
        self.fork_with(description, |_| {})
    }

    /// [`fork`](Span::fork) with a seed modifier applied to the child's
    /// seed copy before the span is created.
    pub fn fork_with(&self, description: impl Into<String>, modify: impl FnOnce(&mut Seed)) -> Span {
        self.add_ref();
        self.fork_no_wait_with(description, modify)
    }

    /// Like [`fork`](Span::fork), but the tree does not wait for this
    /// child: no matching `end` is required.
    pub fn fork_no_wait(&self, description: impl Into<String>) -> Span {
        self.fork_no_wait_with(description, |_| {})
    }

    pub fn fork_no_wait_with(
        &self,
        description: impl Into<String>,
        modify: impl FnOnce(&mut Seed),
    ) -> Span {
        let counter = self.inner.fork_counter.fetch_add(1, Ordering::Relaxed) + 1;
        self.new_child(description, &base26(counter), modify)
    }

    /// Creates a child span for sequential sub-work, identified by a
    /// decimal suffix starting at 1. The caller must balance this with a
    /// matching [`end`](Span::end) on the child.
    pub fn step(&self, description: impl Into<String>) -> Span {
        self.step_with(description, |_| {})
    }

    pub fn step_with(&self, description: impl Into<String>, modify: impl FnOnce(&mut Seed)) -> Span {
        self.add_ref();
        self.step_no_wait_with(description, modify)
    }

    /// Like [`step`](Span::step), but the tree does not wait for this
    /// child: no matching `end` is required.
    pub fn step_no_wait(&self, description: impl Into<String>) -> Span {
        self.step_no_wait_with(description, |_| {})
    }

    pub fn step_no_wait_with(
        &self,
        description: impl Into<String>,
        modify: impl FnOnce(&mut Seed),
    ) -> Span {
        let counter = self.inner.step_counter.fetch_add(1, Ordering::Relaxed) + 1;
        self.new_child(description, &counter.to_string(), modify)
    }

    fn new_child(
        &self,
        description: impl Into<String>,
        suffix: &str,
        modify: impl FnOnce(&mut Seed),
    ) -> Span {
        let mut seed = self.copy_seed();
        modify(&mut seed);
        seed.description = description.into();
        seed.trace = self.inner.seed.trace.sub_span();
        seed.push_prefix(suffix);
        let child = Span {
            inner: Arc::new(SpanInner {
                seed,
                created: Utc::now(),
                is_buffer_parent: false,
                in_dirty: AtomicBool::new(true),
                fork_counter: AtomicU32::new(0),
                step_counter: AtomicU32::new(0),
                local: Mutex::new(AttrMap::new()),
                shared: Arc::clone(&self.inner.shared),
            }),
        };
        // A fresh child always counts as having pending data, so it is
        // visible to at least one flush even if nothing is written to it.
        self.inner.shared.lock().dirty.push(child.clone());
        child
    }

    /// Merges attributes directly into the tree's shared aggregate map.
    pub fn buffered_span_data<K, V, I>(&self, data: I)
    where
        K: Into<String>,
        V: Into<AttrValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        {
            let mut guarded = self.inner.shared.lock();
            for (key, value) in data {
                guarded.data.insert(key.into(), value.into());
            }
        }
        self.touch();
    }

    /// Merges attributes into this span's own data: the shared aggregate
    /// for a buffer parent, the span-local map otherwise.
    pub fn span_data<K, V, I>(&self, data: I)
    where
        K: Into<String>,
        V: Into<AttrValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        if self.inner.is_buffer_parent {
            self.buffered_span_data(data);
            return;
        }
        {
            let mut local = self.lock_local();
            for (key, value) in data {
                local.insert(key.into(), value.into());
            }
        }
        self.touch();
    }

    /// Appends `key, value, key, value, ...` pairs to the tree's
    /// multi-valued search index.
    ///
    /// An odd trailing element is an unpaired key and is silently dropped.
    pub fn span_index(&self, key_value_pairs: &[&str]) {
        {
            let mut guarded = self.inner.shared.lock();
            for pair in key_value_pairs.chunks_exact(2) {
                guarded
                    .index
                    .entry(pair[0].to_owned())
                    .or_insert_with(Vec::new)
                    .push(pair[1].to_owned());
            }
        }
        self.touch();
    }

    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Level::Debug, message, fields)
    }

    pub fn trace(&self, message: &str, fields: &[Field]) {
        self.log(Level::Trace, message, fields)
    }

    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log(Level::Info, message, fields)
    }

    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Level::Warn, message, fields)
    }

    pub fn error(&self, message: &str, fields: &[Field]) {
        self.log(Level::Error, message, fields)
    }

    pub fn alert(&self, message: &str, fields: &[Field]) {
        self.log(Level::Alert, message, fields)
    }

    /// Drains the tree's dirty list to every backend now, without waiting
    /// for the timer or for the tree to complete. Racing with a pending
    /// timer fire is harmless; whichever runs second finds an empty dirty
    /// list.
    pub fn flush(&self) {
        self.inner.shared.flush()
    }

    pub fn description(&self) -> &str {
        &self.inner.seed.description
    }

    /// The dotted fork/step path of this span, e.g. `A.2.B`.
    pub fn prefix(&self) -> &str {
        &self.inner.seed.prefix
    }

    pub fn trace_context(&self) -> &TraceContext {
        &self.inner.seed.trace
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.inner.created
    }

    pub fn is_buffer_parent(&self) -> bool {
        self.inner.is_buffer_parent
    }

    /// A detached copy of this span's seed, for deriving new trees.
    pub fn copy_seed(&self) -> Seed {
        self.inner.seed.clone()
    }

    /// A copy of the fields prefilled onto every line this span writes.
    pub fn current_prefill(&self) -> Vec<Field> {
        self.inner.seed.prefill.clone()
    }

    /// Marks this span dirty. Only the clean-to-dirty transition takes the
    /// shared lock and appends to the dirty list; repeat touches between
    /// two sweeps are no-ops, so a span is never listed twice. The first
    /// entry in an otherwise-empty dirty list arms the flush timer.
    fn touch(&self) {
        if !self.inner.in_dirty.swap(true, Ordering::AcqRel) {
            let shared = &self.inner.shared;
            let mut guarded = shared.lock();
            guarded.dirty.push(self.clone());
            if guarded.dirty.len() == 1 {
                shared.enable_flush_timer();
            }
        }
    }

    fn log(&self, level: Level, message: &str, fields: &[Field]) {
        // The first line after a flush starts a new staleness clock.
        if self.inner.shared.unflushed_lines.fetch_add(1, Ordering::AcqRel) == 0 {
            self.inner.shared.enable_flush_timer();
        }
        let prefill = &self.inner.seed.prefill;
        let mut merged = FieldSet::with_capacity(prefill.len() + fields.len());
        merged.extend(prefill.iter().cloned());
        merged.extend(fields.iter().cloned());
        let line = Line {
            timestamp: Utc::now(),
            level,
            prefix: &self.inner.seed.prefix,
            trace: &self.inner.seed.trace,
            message,
            fields: &merged,
        };
        for backend in self.inner.seed.backends.iter() {
            backend.line(&line);
        }
    }

    pub(crate) fn clear_dirty(&self) {
        self.inner.in_dirty.store(false, Ordering::Release);
    }

    pub(crate) fn lock_local(&self) -> MutexGuard<'_, AttrMap> {
        self.inner.local.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Span")
            .field("description", &self.description())
            .field("prefix", &self.prefix())
            .field("trace", &self.trace_context())
            .field("is_buffer_parent", &self.is_buffer_parent())
            .finish()
    }
}

/// Renders a fork counter as a bijective base-26 letter sequence:
/// 1 is `A`, 26 is `Z`, 27 is `AA`.
fn base26(mut n: u32) -> String {
    // u32::MAX needs 7 base-26 digits.
    let mut letters = [0u8; 7];
    let mut start = letters.len();
    while n > 0 {
        n -= 1;
        start -= 1;
        letters[start] = b'A' + (n % 26) as u8;
        n /= 26;
    }
    letters[start..].iter().map(|&b| char::from(b)).collect()
}

//! The state shared by every span descended from one buffer parent, and
//! the flush coordinator that drains it.

use crate::attr::{AttrMap, IndexMap};
use crate::backend::SpanData;
use crate::seed::{Backends, Seed};
use crate::span::Span;
use crate::timer::FlushTimer;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// State common to one buffered-flush domain: the aggregate attribute
/// maps, the dirty list, the reference count, and flush-timer control.
///
/// The atomics are the fast path; the mutex is only taken on state
/// transitions (clean to dirty, a flush sweep) and map mutation. The
/// mutex may be held while taking a span's local data lock, never the
/// reverse.
pub(crate) struct SharedGroup {
    /// Outstanding `end` calls. Starts at 1 for the buffer parent;
    /// reaching zero or below triggers a flush.
    pub(crate) ref_count: AtomicI32,
    /// Log lines written since the last flush; only consulted to decide
    /// whether the timer needs arming.
    pub(crate) unflushed_lines: AtomicU32,
    /// True while the timer is armed; guards redundant resets.
    flush_active: AtomicBool,
    pub(crate) flush_delay: Duration,
    pub(crate) timer: FlushTimer,
    backends: Backends,
    guarded: Mutex<Guarded>,
}

pub(crate) struct Guarded {
    pub(crate) data: AttrMap,
    pub(crate) index: IndexMap,
    /// Spans with unflushed mutations. Append-only between sweeps;
    /// truncated (capacity kept) by each sweep.
    pub(crate) dirty: Vec<Span>,
}

impl SharedGroup {
    /// Allocates the group for a new buffer parent: refcount 1, seed data
    /// as the initial aggregate, timer thread attached via a weak
    /// reference so the group can still be reclaimed.
    pub(crate) fn for_parent(seed: &Seed) -> Arc<SharedGroup> {
        Arc::new_cyclic(|weak: &Weak<SharedGroup>| SharedGroup {
            ref_count: AtomicI32::new(1),
            unflushed_lines: AtomicU32::new(0),
            flush_active: AtomicBool::new(true),
            flush_delay: seed.settings.flush_delay,
            timer: FlushTimer::spawn(weak.clone()),
            backends: seed.backends.clone(),
            guarded: Mutex::new(Guarded {
                data: seed.data.clone(),
                index: IndexMap::new(),
                dirty: Vec::new(),
            }),
        })
    }

    // A poisoned lock only means some caller thread panicked mid-write;
    // the maps are still structurally sound and tracing must keep working.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Guarded> {
        self.guarded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arms the flush timer if it is not already armed. Only the
    /// inactive-to-active transition touches the timer, so racing
    /// mutations cannot stack redundant resets.
    pub(crate) fn enable_flush_timer(&self) {
        if !self.flush_active.swap(true, Ordering::AcqRel) {
            self.timer.reset(self.flush_delay);
        }
    }

    /// The delay-based flush path, invoked when the timer fires. Bounds
    /// the worst-case staleness of buffered data.
    pub(crate) fn timer_flush(&self) {
        self.flush_active.store(false, Ordering::Release);
        self.flush();
    }

    /// The atomic drain: under one lock acquisition, clears each dirty
    /// span's flag, submits its current data to every backend, and
    /// truncates the dirty list. Concurrent touches either land before the
    /// sweep starts or queue for the next cycle; no mutation is lost and
    /// none is drained twice within a cycle.
    ///
    /// Backend flush-complete notifications run after the lock is
    /// released.
    pub(crate) fn flush(&self) {
        self.unflushed_lines.store(0, Ordering::Release);
        let empty_index = IndexMap::new();
        {
            let mut guarded = self.lock();
            for i in 0..guarded.dirty.len() {
                let dirty = guarded.dirty[i].clone();
                dirty.clear_dirty();
                if dirty.is_buffer_parent() {
                    self.submit(&dirty, &guarded.index, &guarded.data);
                } else {
                    let local = dirty.lock_local();
                    self.submit(&dirty, &empty_index, &local);
                }
            }
            guarded.dirty.clear();
        }
        for backend in self.backends.iter() {
            backend.flush_complete();
        }
    }

    fn submit(&self, span: &Span, index: &IndexMap, data: &AttrMap) {
        let submission = SpanData {
            description: span.description(),
            prefix: span.prefix(),
            trace: span.trace_context(),
            index,
            data,
        };
        for backend in self.backends.iter() {
            backend.span_data(&submission);
        }
    }
}

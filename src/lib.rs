//! Buffered hierarchical span tracing with deferred batch flushing.
//!
//! # Overview
//!
//! `trellis` accumulates trees of [`Span`]s — requests, forks, steps —
//! that carry key/value attributes and discrete log lines. Log lines are
//! forwarded to every registered [`Backend`] immediately; span attribute
//! data is buffered and delivered in batches. A shared dirty list tracks
//! which spans have unflushed mutations, and a flush sweep drains it when
//! the tree completes, when [`Span::flush`] is called, or when the
//! per-tree timer bounds the staleness of buffered data.
//!
//! This crate is intended for programs that want low-overhead,
//! high-fidelity tracing with deferred serialization: the hot mutation
//! path is an atomic flag check, and the coordination lock is only taken
//! on clean-to-dirty transitions and flush sweeps.
//!
//! # Getting started
//!
//! Build a [`Seed`] carrying configuration and backends, then create the
//! request span from it. `fork` starts concurrent sub-work, `step`
//! sequential sub-work; both must be balanced with [`end`](Span::end),
//! and the tree flushes itself once every span has ended.
//!
//! ```
//! use trellis::{attrs, Recorder, Seed, Settings};
//!
//! let recorder = Recorder::default();
//! let seed = Seed::new(Settings::default()).with_backend(recorder.clone());
//!
//! let request = seed.span("handle request");
//! request.info("starting", &[]);
//! request.span_data(attrs! { "user" => "alice" });
//!
//! let validate = request.fork("validate");
//! validate.span_data(attrs! { "ok" => true });
//! validate.end();
//!
//! request.end();
//!
//! // Both spans arrived in one flush sweep.
//! assert_eq!(recorder.spans().len(), 2);
//! assert_eq!(recorder.flush_count(), 1);
//! ```
//!
//! # Identity
//!
//! Every tree belongs to a trace: the buffer parent mints a fresh
//! [`TraceContext`] (or adopts a propagated one via
//! [`Seed::with_trace`]), and children derive sub-span identities from
//! their parent. Within a tree, forks are lettered (`A`, `B`, ..., `Z`,
//! `AA`) and steps are numbered (`1`, `2`, ...), accumulating into a
//! dotted prefix path like `A.2.B`.
//!
//! # Feature flags
//!
//! * `full`: Enables all features listed below.
//! * `json`: Enables [`JsonBackend`] and `Serialize` impls on the value
//!   types.
//!
//! [`JsonBackend`]: crate::printer::JsonBackend

pub mod backend;
pub mod carrier;
pub mod recorder;
pub mod seed;
pub mod span;
pub mod trace;
mod attr;
mod fail;
mod level;
mod shared;
mod timer;
#[macro_use]
mod cfg;
mod macros;

cfg_json! {
    pub mod printer;
    pub use crate::printer::JsonBackend;
}

pub use crate::attr::{AttrMap, AttrValue, Field, IndexMap};
pub use crate::backend::{Backend, Line, Sink, SpanData};
pub use crate::carrier::Carrier;
pub use crate::level::{Level, ParseLevelError};
pub use crate::recorder::{RecordedLine, RecordedSpan, Recorder};
pub use crate::seed::{Backends, Seed, Settings, DEFAULT_FLUSH_DELAY};
pub use crate::span::Span;
pub use crate::trace::{SpanId, TraceContext};

//! The deferred single-shot flush timer, one per [`SharedGroup`].
//!
//! [`SharedGroup`]: crate::shared::SharedGroup

use crate::shared::SharedGroup;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Weak;
use std::thread;
use std::time::{Duration, Instant};

/// A resettable deadline serviced by a background thread.
///
/// There is no explicit cancellation: a pending deadline is superseded by
/// the next [`reset`](FlushTimer::reset). The thread holds only a [`Weak`]
/// reference to its group, so a fully-ended span tree is reclaimed
/// normally, and the thread exits once the group is gone.
pub(crate) struct FlushTimer {
    tx: SyncSender<Duration>,
}

impl FlushTimer {
    pub(crate) fn spawn(group: Weak<SharedGroup>) -> Self {
        let (tx, rx) = mpsc::sync_channel(4);
        // Detached on purpose: the thread exits when the channel
        // disconnects, which happens when the group is dropped.
        let _ = thread::Builder::new()
            .name("trellis-flush".to_owned())
            .spawn(move || run(rx, group));
        FlushTimer { tx }
    }

    /// (Re)arms the deadline to `delay` from now.
    ///
    /// Non-blocking: if resets are already queued the deadline lands in the
    /// same place anyway, and a disconnected channel means the group is
    /// already gone.
    pub(crate) fn reset(&self, delay: Duration) {
        let _ = self.tx.try_send(delay);
    }
}

fn run(rx: Receiver<Duration>, group: Weak<SharedGroup>) {
    let mut deadline: Option<Instant> = None;
    loop {
        let received = match deadline {
            Some(at) => match at.checked_duration_since(Instant::now()) {
                Some(left) => rx.recv_timeout(left),
                None => Err(RecvTimeoutError::Timeout),
            },
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(delay) => deadline = Some(Instant::now() + delay),
            Err(RecvTimeoutError::Timeout) => {
                deadline = None;
                match group.upgrade() {
                    Some(shared) => shared.timer_flush(),
                    None => return,
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

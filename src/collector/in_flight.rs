// src/collector/in_flight.rs
// =============================================================================
// Counts fetches that have started but not finished.
//
// Every fetch takes a guard when it starts; dropping the guard (on success,
// early return, error or panic) gives the slot back. `wait_idle` resolves once
// the count is zero. A child visit takes its guard before its task is
// spawned, while the parent's guard is still held, so the count cannot touch
// zero between a parent finishing and its children starting.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    pub(crate) fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            counter: Arc::clone(self),
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait_idle(&self) {
        loop {
            // Register interest before looking at the count so a
            // notification between the check and the await is not lost
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }

            notified.await;
        }
    }
}

#[derive(Debug)]
pub(crate) struct InFlightGuard {
    counter: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.counter.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.counter.idle.notify_waiters();
        }
    }
}

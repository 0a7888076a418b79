//! Bounded-wait draining of pending deliveries.

use crate::dispatcher::Dispatcher;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Upper bound on a single poll while draining.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Polls a dispatcher until its pending set is empty or a deadline passes.
#[derive(Debug, Clone, Copy)]
pub struct Drainer {
    poll_interval: Duration,
}

impl Default for Drainer {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Drainer {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Block for at most `timeout`, returning the count still unresolved.
    ///
    /// At least one non-blocking poll happens even with a zero timeout. A
    /// timeout too large to represent as an instant waits without a deadline.
    /// Messages left pending stay tracked; a later poll or drain still
    /// delivers their outcome.
    pub fn drain(&self, dispatcher: &Dispatcher, timeout: Duration) -> usize {
        let deadline = Instant::now().checked_add(timeout);

        loop {
            if dispatcher.pending() == 0 {
                return 0;
            }

            let wait = match deadline {
                Some(deadline) => deadline
                    .saturating_duration_since(Instant::now())
                    .min(self.poll_interval),
                None => self.poll_interval,
            };
            let processed = dispatcher.poll(wait);
            if processed > 0 {
                debug!(
                    "Drained {} outcomes, {} pending",
                    processed,
                    dispatcher.pending()
                );
            }

            let Some(deadline) = deadline else {
                continue;
            };
            if Instant::now() >= deadline {
                let remaining = dispatcher.pending();
                if remaining > 0 {
                    warn!(
                        "Flush timed out after {:?} with {} messages unresolved",
                        timeout, remaining
                    );
                }
                return remaining;
            }
        }
    }
}

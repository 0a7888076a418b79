//! Delivery tracking.
//!
//! The tracker is the single owner of the pending-message map. Reservations
//! are bounded by the configured capacity, which is also the bound on the
//! dispatcher's queue. Outcomes are applied under one mutex and each entry is
//! removed before its callback runs, so a callback can fire at most once.

use crate::error::ProduceError;
use crate::message::{DeliveryResult, ProducedMessage};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Callback invoked exactly once with a message's outcome.
pub type DeliveryCallback = Box<dyn FnOnce(&DeliveryResult) + Send + 'static>;

struct PendingEntry {
    message: Arc<ProducedMessage>,
    callback: DeliveryCallback,
}

#[derive(Default)]
struct TrackerState {
    next_sequence: u64,
    pending: HashMap<u64, PendingEntry>,
}

/// Bounded map from sequence number to pending message.
pub struct DeliveryTracker {
    capacity: usize,
    state: Mutex<TrackerState>,
}

impl DeliveryTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(TrackerState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of messages awaiting an outcome.
    pub fn pending(&self) -> usize {
        self.state().pending.len()
    }

    pub fn is_pending(&self, sequence: u64) -> bool {
        self.state().pending.contains_key(&sequence)
    }

    /// Reserve a slot and register `callback` for it.
    ///
    /// `build` receives the assigned sequence number. Fails with
    /// [`ProduceError::QueueFull`] when the pending set is at capacity; in that
    /// case `build` is not called and the callback is dropped unused.
    pub fn reserve<F>(
        &self,
        build: F,
        callback: DeliveryCallback,
    ) -> Result<Arc<ProducedMessage>, ProduceError>
    where
        F: FnOnce(u64) -> ProducedMessage,
    {
        let mut state = self.state();
        if state.pending.len() >= self.capacity {
            return Err(ProduceError::QueueFull {
                capacity: self.capacity,
                pending: state.pending.len(),
            });
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;

        let message = Arc::new(build(sequence));
        state.pending.insert(
            sequence,
            PendingEntry {
                message: Arc::clone(&message),
                callback,
            },
        );
        Ok(message)
    }

    /// Roll back a reservation the transport refused. The callback is not
    /// invoked.
    pub fn release(&self, sequence: u64) -> Option<Arc<ProducedMessage>> {
        self.state()
            .pending
            .remove(&sequence)
            .map(|entry| entry.message)
    }

    /// Apply an outcome: remove the entry, then run its callback.
    ///
    /// # Panics
    ///
    /// Panics if `result.sequence` is not pending. Every message yields
    /// exactly one outcome, so a second outcome for the same sequence is a bug
    /// in the transport.
    pub fn record(&self, result: DeliveryResult) {
        let entry = self.state().pending.remove(&result.sequence);
        let Some(entry) = entry else {
            panic!(
                "delivery outcome for sequence {} recorded twice or never enqueued",
                result.sequence
            );
        };

        let latency = Utc::now() - entry.message.enqueued_at;
        debug!(
            "Resolved message {} after {} ms: {}",
            result.sequence,
            latency.num_milliseconds(),
            result
        );

        (entry.callback)(&result);
    }

    fn state(&self) -> MutexGuard<'_, TrackerState> {
        // Callbacks never run under the lock, so a poisoned guard still holds
        // a consistent map.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! In-process transport.
//!
//! Messages are held in FIFO order until resolved, either explicitly with
//! [`MemoryTransport::complete`] / [`MemoryTransport::fail`] or by a background
//! acker thread. Offsets are assigned per topic starting at 0, always on
//! partition 0. An optional local limit makes `send` refuse with
//! [`TransportError::QueueFull`] once that many messages are in flight.

use super::{DeliverySink, Transport};
use crate::error::TransportError;
use crate::message::{DeliveryResult, ProducedMessage};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

struct InFlight {
    sequence: u64,
    topic: String,
}

#[derive(Default)]
struct MemoryState {
    in_flight: VecDeque<InFlight>,
    next_offsets: HashMap<String, i64>,
    closed: bool,
}

/// Transport that keeps messages in memory.
pub struct MemoryTransport {
    sink: DeliverySink,
    state: Mutex<MemoryState>,
    local_limit: Option<usize>,
}

impl MemoryTransport {
    pub fn new(sink: DeliverySink) -> Self {
        Self {
            sink,
            state: Mutex::new(MemoryState::default()),
            local_limit: None,
        }
    }

    /// Limit the transport's own queue to `limit` in-flight messages.
    pub fn with_local_limit(mut self, limit: usize) -> Self {
        self.local_limit = Some(limit);
        self
    }

    /// Messages accepted but not yet resolved.
    pub fn in_flight(&self) -> usize {
        self.state().in_flight.len()
    }

    /// Successfully deliver up to `n` of the oldest in-flight messages.
    pub fn complete(&self, n: usize) -> usize {
        let results: Vec<DeliveryResult> = {
            let mut state = self.state();
            let take = n.min(state.in_flight.len());
            let batch: Vec<InFlight> = state.in_flight.drain(..take).collect();
            batch
                .into_iter()
                .map(|msg| {
                    let offset = state.next_offsets.entry(msg.topic.clone()).or_insert(0);
                    let result = DeliveryResult::success(msg.sequence, msg.topic, 0, *offset);
                    *offset += 1;
                    result
                })
                .collect()
        };
        self.deliver_all(results)
    }

    /// Deliver every in-flight message.
    pub fn complete_all(&self) -> usize {
        self.complete(usize::MAX)
    }

    /// Fail up to `n` of the oldest in-flight messages with `error`.
    pub fn fail(&self, n: usize, error: &str) -> usize {
        let results: Vec<DeliveryResult> = {
            let mut state = self.state();
            let take = n.min(state.in_flight.len());
            state
                .in_flight
                .drain(..take)
                .map(|msg| DeliveryResult::failure(msg.sequence, msg.topic, error))
                .collect()
        };
        self.deliver_all(results)
    }

    /// Refuse further sends.
    pub fn close(&self) {
        self.state().closed = true;
    }

    /// Start a thread that completes all in-flight messages every `interval`.
    ///
    /// The thread stops when the returned handle is dropped.
    pub fn spawn_acker(self: &Arc<Self>, interval: Duration) -> AckerHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let transport = Arc::clone(self);
        let flag = Arc::clone(&stop);

        let handle = std::thread::spawn(move || {
            while !flag.load(Ordering::Acquire) {
                transport.complete_all();
                std::thread::sleep(interval);
            }
            // Final sweep so nothing accepted before shutdown is left hanging
            transport.complete_all();
        });

        AckerHandle {
            stop,
            handle: Some(handle),
        }
    }

    fn deliver_all(&self, results: Vec<DeliveryResult>) -> usize {
        let count = results.len();
        for result in results {
            self.sink.deliver(result);
        }
        count
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MemoryTransport {
    fn send(&self, message: &ProducedMessage) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.closed {
            return Err(TransportError::Closed);
        }
        if self
            .local_limit
            .is_some_and(|limit| state.in_flight.len() >= limit)
        {
            return Err(TransportError::QueueFull);
        }
        state.in_flight.push_back(InFlight {
            sequence: message.sequence,
            topic: message.topic.clone(),
        });
        debug!(
            "Accepted message {} ({} key bytes, {} value bytes)",
            message.sequence,
            message.key.len(),
            message.value.len()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Stops the background acker when dropped.
pub struct AckerHandle {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AckerHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AckerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

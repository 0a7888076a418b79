//! Non-blocking, bounded dispatcher.
//!
//! `produce` encodes a key/value pair against the bound schemas, reserves a
//! slot in the [`DeliveryTracker`] and hands the message to the transport. It
//! never waits: when the pending set or the transport's own queue is full it
//! fails with [`ProduceError::QueueFull`] and the caller decides what to do.
//!
//! Outcomes reported by the transport wait in a channel until `poll` (or
//! `flush`) applies them, so callbacks always run on the caller's thread.

use crate::drainer::Drainer;
use crate::encoder::encode;
use crate::error::{ProduceError, TransportError};
use crate::message::{DeliveryResult, ProducedMessage};
use crate::tracker::DeliveryTracker;
use crate::transport::Transport;
use chrono::Utc;
use click_schema::{Record, SchemaBinding};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct Dispatcher {
    binding: SchemaBinding,
    transport: Arc<dyn Transport>,
    outcomes: Receiver<DeliveryResult>,
    tracker: DeliveryTracker,
}

impl Dispatcher {
    /// Create a dispatcher.
    ///
    /// `outcomes` must be the receiver paired with the sink `transport`
    /// reports to (see [`crate::transport::outcome_channel`]).
    pub fn new(
        binding: SchemaBinding,
        transport: Arc<dyn Transport>,
        outcomes: Receiver<DeliveryResult>,
        capacity: usize,
    ) -> Self {
        Self {
            binding,
            transport,
            outcomes,
            tracker: DeliveryTracker::new(capacity),
        }
    }

    /// Encode and enqueue one message.
    ///
    /// Returns the message's sequence number. `on_result` runs exactly once,
    /// from a later `poll` or `flush`, unless this call fails, in which case
    /// it never runs.
    pub fn produce<F>(
        &self,
        topic: &str,
        key: &Record,
        value: &Record,
        on_result: F,
    ) -> Result<u64, ProduceError>
    where
        F: FnOnce(&DeliveryResult) + Send + 'static,
    {
        let key_bytes = encode(key, &self.binding.key)?;
        let value_bytes = encode(value, &self.binding.value)?;

        let message = self.tracker.reserve(
            |sequence| ProducedMessage {
                topic: topic.to_string(),
                key: key_bytes,
                value: value_bytes,
                key_schema: self.binding.key.reference(),
                value_schema: self.binding.value.reference(),
                sequence,
                enqueued_at: Utc::now(),
            },
            Box::new(on_result),
        )?;

        if let Err(err) = self.transport.send(&message) {
            self.tracker.release(message.sequence);
            return Err(match err {
                TransportError::QueueFull => ProduceError::QueueFull {
                    capacity: self.tracker.capacity(),
                    pending: self.tracker.pending(),
                },
                other => ProduceError::Transport(other),
            });
        }

        debug!(
            "Enqueued message {} to '{}' via {} ({} pending)",
            message.sequence,
            topic,
            self.transport.name(),
            self.tracker.pending()
        );
        Ok(message.sequence)
    }

    /// Apply delivery outcomes that are available.
    ///
    /// Waits at most `timeout` for the first outcome if none is ready; a zero
    /// timeout never blocks. Returns the number of outcomes processed.
    pub fn poll(&self, timeout: Duration) -> usize {
        let mut processed = self.drain_ready();
        if processed == 0 && !timeout.is_zero() && self.tracker.pending() > 0 {
            if let Ok(result) = self.outcomes.recv_timeout(timeout) {
                self.tracker.record(result);
                processed = 1 + self.drain_ready();
            }
        }
        processed
    }

    /// Wait up to `timeout` for every pending message to resolve.
    ///
    /// Returns the number still unresolved.
    pub fn flush(&self, timeout: Duration) -> usize {
        Drainer::default().drain(self, timeout)
    }

    /// Messages awaiting an outcome.
    pub fn pending(&self) -> usize {
        self.tracker.pending()
    }

    pub fn capacity(&self) -> usize {
        self.tracker.capacity()
    }

    pub fn binding(&self) -> &SchemaBinding {
        &self.binding
    }

    fn drain_ready(&self) -> usize {
        let mut processed = 0;
        while let Ok(result) = self.outcomes.try_recv() {
            self.tracker.record(result);
            processed += 1;
        }
        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodingError;
    use crate::transport::{outcome_channel, MemoryTransport};
    use click_schema::{BuiltinSchemaProvider, DEFAULT_KEY_SCHEMA, DEFAULT_VALUE_SCHEMA};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn setup(capacity: usize) -> (Dispatcher, Arc<MemoryTransport>) {
        let binding =
            SchemaBinding::bind(&BuiltinSchemaProvider, DEFAULT_KEY_SCHEMA, DEFAULT_VALUE_SCHEMA)
                .unwrap();
        let (sink, outcomes) = outcome_channel();
        let transport = Arc::new(MemoryTransport::new(sink));
        let dispatcher = Dispatcher::new(binding, transport.clone(), outcomes, capacity);
        (dispatcher, transport)
    }

    fn key(id: &str) -> Record {
        Record::new().with("id", id)
    }

    fn value(id: &str) -> Record {
        Record::new()
            .with("id", id)
            .with("impression_id", "imp")
            .with("creative_id", "c0ffee00")
            .with("placement_id", "deadbeef")
            .with("timestamp", 1_000i64)
            .with("user_agent", "test")
            .with("ip", "127.0.0.1")
            .with("referrer", "google.com")
            .with("cost", 0.5)
    }

    #[test]
    fn test_produce_then_poll_invokes_callback() {
        let (dispatcher, transport) = setup(4);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let seq = dispatcher
            .produce("clicks", &key("a"), &value("a"), move |result| {
                sink.lock().unwrap().push(result.clone());
            })
            .unwrap();
        assert_eq!(dispatcher.pending(), 1);
        assert_eq!(dispatcher.poll(Duration::ZERO), 0);

        transport.complete_all();
        assert_eq!(dispatcher.poll(Duration::ZERO), 1);
        assert_eq!(dispatcher.pending(), 0);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[DeliveryResult::success(seq, "clicks", 0, 0)]
        );
    }

    #[test]
    fn test_queue_full_at_capacity() {
        let (dispatcher, transport) = setup(2);

        dispatcher.produce("clicks", &key("a"), &value("a"), |_| {}).unwrap();
        dispatcher.produce("clicks", &key("b"), &value("b"), |_| {}).unwrap();
        let err = dispatcher
            .produce("clicks", &key("c"), &value("c"), |_| {})
            .unwrap_err();

        assert!(matches!(err, ProduceError::QueueFull { capacity: 2, pending: 2 }));
        assert_eq!(transport.in_flight(), 2);
    }

    #[test]
    fn test_encoding_error_leaves_no_pending_entry() {
        let (dispatcher, transport) = setup(2);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut bad = value("a");
        bad.remove("user_agent");
        let err = dispatcher
            .produce("clicks", &key("a"), &bad, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap_err();

        assert!(matches!(
            err,
            ProduceError::Encoding(EncodingError::MissingField { .. })
        ));
        assert_eq!(dispatcher.pending(), 0);
        assert_eq!(transport.in_flight(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_transport_refusal_releases_slot() {
        let (dispatcher, transport) = setup(1);
        transport.close();

        let err = dispatcher
            .produce("clicks", &key("a"), &value("a"), |_| {})
            .unwrap_err();
        assert!(matches!(err, ProduceError::Transport(TransportError::Closed)));
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn test_transport_queue_full_maps_to_queue_full() {
        let binding =
            SchemaBinding::bind(&BuiltinSchemaProvider, DEFAULT_KEY_SCHEMA, DEFAULT_VALUE_SCHEMA)
                .unwrap();
        let (sink, outcomes) = outcome_channel();
        let transport = Arc::new(MemoryTransport::new(sink).with_local_limit(1));
        let dispatcher = Dispatcher::new(binding, transport.clone(), outcomes, 8);
        let calls = Arc::new(AtomicUsize::new(0));

        dispatcher.produce("clicks", &key("a"), &value("a"), |_| {}).unwrap();
        let counter = Arc::clone(&calls);
        let err = dispatcher
            .produce("clicks", &key("b"), &value("b"), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap_err();

        assert!(matches!(
            err,
            ProduceError::QueueFull {
                capacity: 8,
                pending: 1
            }
        ));
        assert_eq!(dispatcher.pending(), 1);
        assert_eq!(transport.in_flight(), 1);

        transport.complete_all();
        assert_eq!(dispatcher.flush(Duration::from_secs(1)), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // the rolled-back slot is reusable
        dispatcher.produce("clicks", &key("c"), &value("c"), |_| {}).unwrap();
        assert_eq!(dispatcher.pending(), 1);
    }

    #[test]
    fn test_poll_waits_for_outcome() {
        let (dispatcher, transport) = setup(1);
        dispatcher.produce("clicks", &key("a"), &value("a"), |_| {}).unwrap();

        let background = Arc::clone(&transport);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            background.complete_all();
        });

        assert_eq!(dispatcher.poll(Duration::from_secs(5)), 1);
        handle.join().unwrap();
    }

    #[test]
    fn test_poll_returns_immediately_when_idle() {
        let (dispatcher, _transport) = setup(1);
        let start = std::time::Instant::now();
        assert_eq!(dispatcher.poll(Duration::from_secs(5)), 0);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_messages_carry_schema_references() {
        let (dispatcher, _transport) = setup(1);
        let binding = dispatcher.binding().clone();

        let seq = dispatcher.produce("clicks", &key("a"), &value("a"), |_| {}).unwrap();
        let message = dispatcher.tracker.release(seq).unwrap();

        assert_eq!(message.key_schema, binding.key.reference());
        assert_eq!(message.value_schema, binding.value.reference());
        assert_eq!(
            crate::encoder::decode(&message.key, &binding.key).unwrap(),
            key("a")
        );
    }
}

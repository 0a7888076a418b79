//! Click populator: the generate, encode, dispatch and drain loop.
//!
//! The populator pulls events from a [`ClickGenerator`], enqueues each one
//! through the [`Dispatcher`] and serves delivery callbacks with a
//! non-blocking poll after every enqueue. Queue-full rejections are retried
//! after a bounded poll; events that still cannot be enqueued are dropped and
//! counted. At the end it flushes outstanding deliveries within the
//! configured timeout.

use crate::dispatcher::Dispatcher;
use crate::error::ProduceError;
use crate::message::{DeliveryResult, DeliveryStatus};
use click_generator::{ClickGenerator, Clock, SystemClock};
use click_schema::Record;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Metrics from a produce run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProduceMetrics {
    /// Events drawn from the generator.
    pub generated: u64,
    /// Events accepted by the dispatcher.
    pub enqueued: u64,
    /// Events whose records did not conform to the schemas.
    pub encoding_failures: u64,
    /// Queue-full rejections, including ones later retried successfully.
    pub queue_full_rejections: u64,
    /// Events never enqueued.
    pub dropped: u64,
    /// Messages acknowledged by the broker.
    pub delivered: u64,
    /// Messages the broker reported as failed.
    pub failed: u64,
    /// Messages still pending when the flush timed out.
    pub unresolved: u64,
    /// Total time taken.
    pub total_duration: Duration,
}

impl ProduceMetrics {
    /// Delivered messages per second.
    pub fn messages_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.delivered as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Outcome counters updated from delivery callbacks.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryStats {
    pub fn record(&self, result: &DeliveryResult) {
        match &result.status {
            DeliveryStatus::Success { partition, offset } => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Message delivered to {} [{}] @ {}",
                    result.topic, partition, offset
                );
            }
            DeliveryStatus::Failure { error } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    "Message {} to {} failed delivery: {}",
                    result.sequence, result.topic, error
                );
            }
        }
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Drives events from a generator through a dispatcher.
///
/// # Example
///
/// ```ignore
/// let mut populator = ClickPopulator::new(dispatcher, ClickGenerator::seeded(42), "clicks")
///     .with_flush_timeout(Duration::from_secs(10));
/// let metrics = populator.run(1000, &AtomicBool::new(false));
/// ```
pub struct ClickPopulator<R: Rng = StdRng, C: Clock = SystemClock> {
    dispatcher: Dispatcher,
    generator: ClickGenerator<R, C>,
    topic: String,
    stats: Arc<DeliveryStats>,
    queue_full_retries: u32,
    queue_full_backoff: Duration,
    flush_timeout: Duration,
}

impl<R: Rng, C: Clock> ClickPopulator<R, C> {
    pub fn new(
        dispatcher: Dispatcher,
        generator: ClickGenerator<R, C>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            generator,
            topic: topic.into(),
            stats: Arc::new(DeliveryStats::default()),
            queue_full_retries: 3,
            queue_full_backoff: Duration::from_millis(100),
            flush_timeout: Duration::from_secs(30),
        }
    }

    /// Set how many times a queue-full rejection is retried.
    pub fn with_queue_full_retries(mut self, retries: u32) -> Self {
        self.queue_full_retries = retries;
        self
    }

    /// Set the bounded poll between queue-full retries.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.queue_full_backoff = backoff;
        self
    }

    /// Set the maximum wait for outstanding deliveries at the end of a run.
    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn stats(&self) -> &DeliveryStats {
        &self.stats
    }

    /// Generate and produce `count` events, then flush.
    ///
    /// Generation stops early once `stop` is set; messages already enqueued
    /// are still flushed.
    pub fn run(&mut self, count: u64, stop: &AtomicBool) -> ProduceMetrics {
        let start_time = Instant::now();
        let mut metrics = ProduceMetrics::default();
        let delivered_before = self.stats.delivered();
        let failed_before = self.stats.failed();

        info!(
            "Producing {} events to topic '{}' (queue capacity: {})",
            count,
            self.topic,
            self.dispatcher.capacity()
        );

        for _ in 0..count {
            if stop.load(Ordering::Relaxed) {
                info!(
                    "Stop requested after {} events, flushing",
                    metrics.generated
                );
                break;
            }

            let click = self.generator.next_event();
            metrics.generated += 1;
            self.produce_one(&click.key_record(), &click.value_record(), &click.id, &mut metrics);

            // Serve delivery callbacks without blocking
            self.dispatcher.poll(Duration::ZERO);
        }

        info!("Waiting for {} deliveries", self.dispatcher.pending());
        let unresolved = self.dispatcher.flush(self.flush_timeout);

        metrics.unresolved = unresolved as u64;
        metrics.delivered = self.stats.delivered() - delivered_before;
        metrics.failed = self.stats.failed() - failed_before;
        metrics.total_duration = start_time.elapsed();

        info!(
            "Produce complete: {} delivered, {} failed, {} dropped, {} unresolved in {:?} ({:.2} msg/sec)",
            metrics.delivered,
            metrics.failed,
            metrics.dropped,
            metrics.unresolved,
            metrics.total_duration,
            metrics.messages_per_second()
        );

        metrics
    }

    fn produce_one(
        &self,
        key: &Record,
        value: &Record,
        event_id: &str,
        metrics: &mut ProduceMetrics,
    ) {
        let mut attempts = 0;
        loop {
            let stats = Arc::clone(&self.stats);
            match self
                .dispatcher
                .produce(&self.topic, key, value, move |result| stats.record(result))
            {
                Ok(sequence) => {
                    debug!("Event {} enqueued as message {}", event_id, sequence);
                    metrics.enqueued += 1;
                    return;
                }
                Err(err @ ProduceError::QueueFull { .. }) => {
                    metrics.queue_full_rejections += 1;
                    if attempts >= self.queue_full_retries {
                        warn!("{}: dropping event {}", err, event_id);
                        metrics.dropped += 1;
                        return;
                    }
                    attempts += 1;
                    warn!("{}: try again", err);
                    self.dispatcher.poll(self.queue_full_backoff);
                }
                Err(ProduceError::Encoding(err)) => {
                    warn!("Failed to encode event {}: {}", event_id, err);
                    metrics.encoding_failures += 1;
                    metrics.dropped += 1;
                    return;
                }
                Err(err @ ProduceError::Transport(_)) => {
                    error!("Failed to enqueue event {}: {}", event_id, err);
                    metrics.dropped += 1;
                    return;
                }
            }
        }
    }
}

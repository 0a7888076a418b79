//! Command-line interface for clickstream
//!
//! # Usage Examples
//!
//! ```bash
//! # Produce the default 10 events to the "clicks" topic
//! clickstream --bootstrap-servers localhost:9092
//!
//! # Deterministic run against schemas on disk, creating the topic first
//! clickstream \
//!   --schema-dir ./schemas \
//!   --count 10000 --seed 42 \
//!   --create-topic --partitions 6 \
//!   -X linger.ms=5
//!
//! # Exercise the pipeline without a broker
//! clickstream --dry-run --count 1000
//!
//! # Settings from a file, flags override
//! clickstream --config producer.toml --flush-timeout 10s
//! ```
//!
//! Logging is controlled by `RUST_LOG` (default `info`); `RUST_LOG=debug`
//! logs every delivery.

use anyhow::Context;
use clap::Parser;
use click_generator::ClickGenerator;
use click_producer::transport::{
    create_topic, outcome_channel, AckerHandle, KafkaTransport, MemoryTransport, Transport,
};
use click_producer::{ClickPopulator, Dispatcher, ProducerArgs, ProducerConfig};
use click_schema::{BuiltinSchemaProvider, FileSchemaProvider, SchemaBinding};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Interval at which the dry-run acker resolves in-flight messages.
const DRY_RUN_ACK_INTERVAL: Duration = Duration::from_millis(5);

/// Exit status after a second interrupt (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "clickstream")]
#[command(about = "Produce synthetic click events to Kafka with Avro-encoded keys and values")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    producer: ProducerArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli
        .producer
        .into_config()
        .context("Invalid producer configuration")?;

    let binding = bind_schemas(&config)?;

    if config.create_topic {
        if config.dry_run {
            tracing::info!("Dry run: skipping creation of topic '{}'", config.topic);
        } else {
            create_topic(
                &config.kafka,
                &config.topic,
                config.partitions,
                config.replication_factor,
            )
            .await
            .with_context(|| format!("Failed to create topic '{}'", config.topic))?;
        }
    }

    let (sink, outcomes) = outcome_channel();
    let (transport, acker): (Arc<dyn Transport>, Option<AckerHandle>) = if config.dry_run {
        tracing::info!("Dry run: producing to the in-memory transport");
        let memory = Arc::new(MemoryTransport::new(sink));
        let acker = memory.spawn_acker(DRY_RUN_ACK_INTERVAL);
        (memory, Some(acker))
    } else {
        let kafka = KafkaTransport::new(&config.kafka, config.queue_capacity, sink)
            .context("Failed to create Kafka producer")?;
        (Arc::new(kafka), None)
    };

    let dispatcher = Dispatcher::new(binding, transport, outcomes, config.queue_capacity);
    let generator = match config.seed {
        Some(seed) => {
            tracing::info!("Generating events with seed {}", seed);
            ClickGenerator::seeded(seed)
        }
        None => ClickGenerator::from_entropy(),
    };

    let stop = Arc::new(AtomicBool::new(false));
    let signal_stop = Arc::clone(&stop);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt(&signal_stop) {
                tracing::warn!("Interrupted again, exiting without flushing");
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
            tracing::warn!(
                "Interrupted, finishing in-flight deliveries (Ctrl-C again to exit now)"
            );
        }
    });

    let mut populator = ClickPopulator::new(dispatcher, generator, config.topic.clone())
        .with_queue_full_retries(config.queue_full_retries)
        .with_backoff(config.queue_full_backoff)
        .with_flush_timeout(config.flush_timeout);

    // The produce loop polls synchronously, keep it off the async workers
    let count = config.count;
    let metrics = tokio::task::spawn_blocking(move || populator.run(count, &stop))
        .await
        .context("Producer task failed")?;

    if let Some(acker) = acker {
        acker.stop();
    }

    if metrics.unresolved > 0 {
        tracing::warn!(
            "{} messages were still awaiting delivery at exit",
            metrics.unresolved
        );
    }
    if metrics.dropped > 0 {
        tracing::warn!(
            "{} events were dropped ({} encoding failures, {} queue-full rejections)",
            metrics.dropped,
            metrics.encoding_failures,
            metrics.queue_full_rejections
        );
    }

    Ok(())
}

/// Request a stop. Returns true if one was already requested.
fn interrupt(stop: &AtomicBool) -> bool {
    stop.swap(true, Ordering::Relaxed)
}

fn bind_schemas(config: &ProducerConfig) -> anyhow::Result<SchemaBinding> {
    match &config.schema_dir {
        Some(dir) => SchemaBinding::bind(
            &FileSchemaProvider::new(dir),
            &config.key_schema,
            &config.value_schema,
        )
        .with_context(|| format!("Failed to load schemas from {dir:?}")),
        None => SchemaBinding::bind(
            &BuiltinSchemaProvider,
            &config.key_schema,
            &config.value_schema,
        )
        .context("Failed to load bundled schemas"),
    }
}

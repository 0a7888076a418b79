//! CLI argument definitions for the click producer.
//!
//! Every flag is optional and overrides the matching key of the config file
//! (or the built-in default when no file is given).

use crate::config::{parse_duration, Acks, Compression, ProducerConfig};
use crate::error::ConfigError;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Broker connection arguments.
#[derive(Args, Clone, Debug, Default)]
pub struct KafkaArgs {
    /// Kafka brokers (comma-separated, e.g., "localhost:9092")
    #[arg(long, env = "KAFKA_BROKERS")]
    pub bootstrap_servers: Option<String>,

    /// Acknowledgment mode required from the broker
    #[arg(long, value_enum)]
    pub acks: Option<Acks>,

    /// Compression codec for produced batches
    #[arg(long, value_enum)]
    pub compression: Option<Compression>,

    /// How long the client retries a message before reporting failure (e.g. "30s")
    #[arg(long, value_parser = parse_duration)]
    pub message_timeout: Option<Duration>,

    /// Extra librdkafka property, may be repeated (e.g. -X linger.ms=5)
    #[arg(short = 'X', long = "property", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,
}

/// Arguments of a produce run.
#[derive(Args, Clone, Debug, Default)]
pub struct ProducerArgs {
    /// Path to a TOML config file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub kafka: KafkaArgs,

    /// Topic to produce to
    #[arg(long, short = 't')]
    pub topic: Option<String>,

    /// Directory holding .avsc schema files (bundled schemas if unset)
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,

    /// Key schema identifier
    #[arg(long)]
    pub key_schema: Option<String>,

    /// Value schema identifier
    #[arg(long)]
    pub value_schema: Option<String>,

    /// Number of events to generate
    #[arg(long, short = 'n')]
    pub count: Option<u64>,

    /// Random seed for deterministic generation (same seed = same events)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum messages awaiting delivery
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Maximum time to wait for outstanding deliveries at shutdown (e.g. "30s")
    #[arg(long, value_parser = parse_duration)]
    pub flush_timeout: Option<Duration>,

    /// Retries of a queue-full rejection before the event is dropped
    #[arg(long)]
    pub queue_full_retries: Option<u32>,

    /// Create the topic before producing if it does not exist
    #[arg(long)]
    pub create_topic: bool,

    /// Partitions for a created topic
    #[arg(long)]
    pub partitions: Option<i32>,

    /// Produce to an in-memory transport instead of a broker
    #[arg(long)]
    pub dry_run: bool,
}

impl ProducerArgs {
    /// Resolve the final configuration: file (or defaults), then flags.
    pub fn into_config(self) -> Result<ProducerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ProducerConfig::from_file(path)?,
            None => ProducerConfig::default(),
        };

        let kafka = self.kafka;
        if let Some(servers) = kafka.bootstrap_servers {
            config.kafka.bootstrap_servers = servers;
        }
        if let Some(acks) = kafka.acks {
            config.kafka.acks = acks;
        }
        if let Some(compression) = kafka.compression {
            config.kafka.compression = compression;
        }
        if let Some(timeout) = kafka.message_timeout {
            config.kafka.message_timeout = timeout;
        }
        config.kafka.properties.extend(kafka.properties);

        if let Some(topic) = self.topic {
            config.topic = topic;
        }
        if self.schema_dir.is_some() {
            config.schema_dir = self.schema_dir;
        }
        if let Some(key_schema) = self.key_schema {
            config.key_schema = key_schema;
        }
        if let Some(value_schema) = self.value_schema {
            config.value_schema = value_schema;
        }
        if let Some(count) = self.count {
            config.count = count;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(capacity) = self.queue_capacity {
            config.queue_capacity = capacity;
        }
        if let Some(timeout) = self.flush_timeout {
            config.flush_timeout = timeout;
        }
        if let Some(retries) = self.queue_full_retries {
            config.queue_full_retries = retries;
        }
        if let Some(partitions) = self.partitions {
            config.partitions = partitions;
        }
        config.create_topic |= self.create_topic;
        config.dry_run |= self.dry_run;

        config.validate()?;
        Ok(config)
    }
}

/// Parse a `KEY=VALUE` librdkafka property.
pub fn parse_property(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::InvalidProperty(s.to_string())),
    }
}

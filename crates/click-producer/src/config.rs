//! Producer configuration.
//!
//! Configuration can come from a TOML file and is then overridden by CLI
//! flags (see [`crate::args`]). Durations are written as human strings such as
//! `"500ms"`, `"30s"` or `"2m"`.
//!
//! ```toml
//! topic = "clicks"
//! count = 1000
//! queue_capacity = 5000
//! flush_timeout = "30s"
//!
//! [kafka]
//! bootstrap_servers = "localhost:9092"
//! acks = "all"
//! compression = "gzip"
//!
//! [kafka.properties]
//! "linger.ms" = "5"
//! ```

use crate::error::ConfigError;
use clap::ValueEnum;
use rdkafka::ClientConfig;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default topic name.
pub const DEFAULT_TOPIC: &str = "clicks";

/// Default bound on messages awaiting delivery.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;

/// Broker acknowledgment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Acks {
    /// Fire and forget
    None,
    /// Partition leader only
    Leader,
    /// All in-sync replicas
    #[default]
    All,
}

impl Acks {
    pub fn as_config_value(&self) -> &'static str {
        match self {
            Acks::None => "0",
            Acks::Leader => "1",
            Acks::All => "all",
        }
    }
}

/// Message compression codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    #[default]
    Gzip,
    Snappy,
    Lz4,
    Zstd,
}

impl Compression {
    pub fn as_config_value(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Snappy => "snappy",
            Compression::Lz4 => "lz4",
            Compression::Zstd => "zstd",
        }
    }
}

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KafkaSettings {
    /// Comma-separated bootstrap servers
    pub bootstrap_servers: String,
    pub acks: Acks,
    pub compression: Compression,
    /// How long librdkafka keeps retrying a message before reporting failure
    #[serde(deserialize_with = "deserialize_duration")]
    pub message_timeout: Duration,
    /// Extra librdkafka properties, applied last
    pub properties: BTreeMap<String, String>,
}

impl Default for KafkaSettings {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_string(),
            acks: Acks::default(),
            compression: Compression::default(),
            message_timeout: Duration::from_secs(30),
            properties: BTreeMap::new(),
        }
    }
}

impl KafkaSettings {
    /// Build the librdkafka client configuration.
    ///
    /// The local librdkafka queue is sized to `queue_capacity` so the broker
    /// client never holds more than the dispatcher allows.
    pub fn client_config(&self, queue_capacity: usize) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("acks", self.acks.as_config_value())
            .set("compression.codec", self.compression.as_config_value())
            .set(
                "message.timeout.ms",
                self.message_timeout.as_millis().to_string(),
            )
            .set(
                "queue.buffering.max.messages",
                queue_capacity.max(1).to_string(),
            );
        for (key, value) in &self.properties {
            config.set(key, value);
        }
        config
    }

    /// Client configuration for admin operations such as topic creation.
    ///
    /// Carries the extra properties so security settings apply here too.
    pub fn admin_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.bootstrap_servers);
        for (key, value) in &self.properties {
            config.set(key, value);
        }
        config
    }
}

/// Complete configuration of a produce run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub kafka: KafkaSettings,
    pub topic: String,
    /// Directory holding `.avsc` files; the bundled schemas are used if unset
    pub schema_dir: Option<PathBuf>,
    pub key_schema: String,
    pub value_schema: String,
    /// Number of events to generate
    pub count: u64,
    /// RNG seed; OS entropy if unset
    pub seed: Option<u64>,
    pub queue_capacity: usize,
    #[serde(deserialize_with = "deserialize_duration")]
    pub flush_timeout: Duration,
    /// How many times a queue-full rejection is retried after polling
    pub queue_full_retries: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub queue_full_backoff: Duration,
    pub create_topic: bool,
    pub partitions: i32,
    pub replication_factor: i32,
    /// Use the in-memory transport instead of a broker
    pub dry_run: bool,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            kafka: KafkaSettings::default(),
            topic: DEFAULT_TOPIC.to_string(),
            schema_dir: None,
            key_schema: click_schema::DEFAULT_KEY_SCHEMA.to_string(),
            value_schema: click_schema::DEFAULT_VALUE_SCHEMA.to_string(),
            count: 10,
            seed: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            flush_timeout: Duration::from_secs(30),
            queue_full_retries: 3,
            queue_full_backoff: Duration::from_millis(100),
            create_topic: false,
            partitions: 3,
            replication_factor: 1,
            dry_run: false,
        }
    }
}

impl ProducerConfig {
    /// Load configuration from a TOML file. Missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "queue_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.topic.is_empty() {
            return Err(ConfigError::Invalid {
                field: "topic",
                reason: "must not be empty".to_string(),
            });
        }
        if self.create_topic && self.partitions < 1 {
            return Err(ConfigError::Invalid {
                field: "partitions",
                reason: format!("{} is not a valid partition count", self.partitions),
            });
        }
        Ok(())
    }
}

/// Parse a duration such as `"250ms"`, `"30s"`, `"2m"`, `"1h"` or `"45"`
/// (plain numbers are seconds).
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    let invalid = || ConfigError::InvalidDuration(s.to_string());
    if s.is_empty() {
        return Err(invalid());
    }

    let (number, unit_millis) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3_600_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else {
        (s, 1_000)
    };

    let value: u64 = number.trim().parse().map_err(|_| invalid())?;
    value
        .checked_mul(unit_millis)
        .map(Duration::from_millis)
        .ok_or_else(invalid)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}

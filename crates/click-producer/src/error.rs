//! Error types for the producer pipeline.

use click_schema::FieldType;
use thiserror::Error;

/// A record does not conform to its schema, or bytes cannot be decoded.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Required field '{field}' of '{schema}' is missing or null")]
    MissingField { schema: String, field: String },

    #[error("Field '{field}' expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        actual: &'static str,
    },

    #[error("Field '{field}' is not declared by '{schema}'")]
    UnknownField { schema: String, field: String },

    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("Payload does not start with a single-object encoding header")]
    InvalidHeader,

    #[error("Payload was written with schema {actual:016x}, expected {expected:016x}")]
    FingerprintMismatch { expected: u64, actual: u64 },

    #[error("Unexpected Avro value: {0}")]
    UnexpectedValue(String),
}

/// Errors raised by a transport when accepting a message.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The transport's own local queue is full
    #[error("Transport queue is full")]
    QueueFull,

    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Topic creation error: {0}")]
    TopicCreation(String),

    #[error("Transport is closed")]
    Closed,
}

/// Synchronous failure of [`crate::Dispatcher::produce`].
#[derive(Error, Debug)]
pub enum ProduceError {
    /// Backpressure: the caller decides whether to poll and retry
    #[error("Local producer queue is full ({pending} messages awaiting delivery, capacity {capacity})")]
    QueueFull { capacity: usize, pending: usize },

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Transport error: {0}")]
    Transport(TransportError),
}

/// Errors loading producer configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid duration '{0}'")]
    InvalidDuration(String),

    #[error("Invalid property '{0}', expected KEY=VALUE")]
    InvalidProperty(String),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

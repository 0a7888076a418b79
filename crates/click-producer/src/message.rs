//! Produced messages and their delivery outcomes.

use chrono::{DateTime, Utc};
use click_schema::SchemaRef;
use std::fmt;

/// An encoded message handed to the transport.
#[derive(Debug, Clone)]
pub struct ProducedMessage {
    pub topic: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub key_schema: SchemaRef,
    pub value_schema: SchemaRef,
    /// Assigned by the delivery tracker, unique per dispatcher
    pub sequence: u64,
    pub enqueued_at: DateTime<Utc>,
}

/// Terminal state of a delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryStatus {
    Success { partition: i32, offset: i64 },
    /// Broker-reported failure; never retried automatically
    Failure { error: String },
}

/// The single outcome reported for a produced message.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryResult {
    pub sequence: u64,
    pub topic: String,
    pub status: DeliveryStatus,
}

impl DeliveryResult {
    pub fn success(sequence: u64, topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            sequence,
            topic: topic.into(),
            status: DeliveryStatus::Success { partition, offset },
        }
    }

    pub fn failure(sequence: u64, topic: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            sequence,
            topic: topic.into(),
            status: DeliveryStatus::Failure {
                error: error.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, DeliveryStatus::Success { .. })
    }
}

impl fmt::Display for DeliveryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            DeliveryStatus::Success { partition, offset } => write!(
                f,
                "message {} delivered to {} [{}] @ {}",
                self.sequence, self.topic, partition, offset
            ),
            DeliveryStatus::Failure { error } => write!(
                f,
                "message {} to {} failed delivery: {}",
                self.sequence, self.topic, error
            ),
        }
    }
}

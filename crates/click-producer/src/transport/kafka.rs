//! Kafka transport backed by librdkafka.
//!
//! Uses a `ThreadedProducer`, whose own polling thread is the background I/O
//! context: librdkafka batches, compresses and sends messages, and calls
//! [`DeliveryContext::delivery`] from that thread once each message is
//! acknowledged or permanently failed. The sequence number travels with the
//! message as its delivery opaque.

use super::{DeliverySink, Transport};
use crate::config::KafkaSettings;
use crate::error::TransportError;
use crate::message::{DeliveryResult, ProducedMessage};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::{ClientContext, DefaultClientContext};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::Message;
use rdkafka::producer::{
    BaseRecord, DeliveryResult as KafkaDeliveryResult, ProducerContext, ThreadedProducer,
};
use std::time::Duration;
use tracing::info;

/// Forwards librdkafka delivery reports into the outcome channel.
pub struct DeliveryContext {
    sink: DeliverySink,
}

impl ClientContext for DeliveryContext {}

impl ProducerContext for DeliveryContext {
    type DeliveryOpaque = Box<u64>;

    fn delivery(&self, delivery_result: &KafkaDeliveryResult<'_>, sequence: Self::DeliveryOpaque) {
        let result = match delivery_result {
            Ok(message) => DeliveryResult::success(
                *sequence,
                message.topic(),
                message.partition(),
                message.offset(),
            ),
            Err((err, message)) => DeliveryResult::failure(*sequence, message.topic(), err.to_string()),
        };
        self.sink.deliver(result);
    }
}

/// Transport that produces to a Kafka cluster.
pub struct KafkaTransport {
    producer: ThreadedProducer<DeliveryContext>,
}

impl KafkaTransport {
    pub fn new(
        settings: &KafkaSettings,
        queue_capacity: usize,
        sink: DeliverySink,
    ) -> Result<Self, TransportError> {
        let producer: ThreadedProducer<DeliveryContext> = settings
            .client_config(queue_capacity)
            .create_with_context(DeliveryContext { sink })?;

        info!(
            "Created Kafka producer for {} (acks={}, compression={})",
            settings.bootstrap_servers,
            settings.acks.as_config_value(),
            settings.compression.as_config_value()
        );
        Ok(Self { producer })
    }
}

impl Transport for KafkaTransport {
    fn send(&self, message: &ProducedMessage) -> Result<(), TransportError> {
        let record = BaseRecord::with_opaque_to(&message.topic, Box::new(message.sequence))
            .key(message.key.as_slice())
            .payload(message.value.as_slice());

        self.producer.send(record).map_err(|(err, _)| match err {
            KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull) => TransportError::QueueFull,
            other => TransportError::Kafka(other),
        })
    }

    fn name(&self) -> &'static str {
        "kafka"
    }
}

/// Create `topic` if it does not already exist.
pub async fn create_topic(
    settings: &KafkaSettings,
    topic: &str,
    partitions: i32,
    replication_factor: i32,
) -> Result<(), TransportError> {
    let admin_client: AdminClient<DefaultClientContext> = settings.admin_config().create()?;

    let new_topic = NewTopic::new(
        topic,
        partitions,
        TopicReplication::Fixed(replication_factor),
    );
    let opts = AdminOptions::new().operation_timeout(Some(Duration::from_secs(10)));

    let results = admin_client
        .create_topics(&[new_topic], &opts)
        .await
        .map_err(|e| TransportError::TopicCreation(format!("Failed to create topic: {e}")))?;

    for result in results {
        match result {
            Ok(topic_name) => {
                info!("Topic '{}' created successfully", topic_name);
            }
            Err((topic_name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                info!("Topic '{}' already exists", topic_name);
            }
            Err((topic_name, err)) => {
                return Err(TransportError::TopicCreation(format!(
                    "Failed to create topic {topic_name}: {err}"
                )));
            }
        }
    }

    Ok(())
}

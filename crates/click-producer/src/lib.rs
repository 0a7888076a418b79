//! Schema-governed asynchronous producer pipeline for click events.
//!
//! This crate provides the `Dispatcher`, which encodes key/value records as
//! Avro single-object payloads against a [`SchemaBinding`], enqueues them on a
//! bounded, non-blocking queue and hands them to a background [`Transport`].
//! Delivery outcomes come back asynchronously and are applied exactly once by
//! the [`DeliveryTracker`] when the caller polls.
//!
//! # Architecture
//!
//! ```text
//!   ClickGenerator ──► ClickEvent ──► key/value Record
//!                                          │
//!                                          ▼
//!                                 ┌─────────────────┐
//!                                 │   encoder.rs    │  SchemaBinding
//!                                 │  C3 01 | fp | … │◄─ (key, value)
//!                                 └────────┬────────┘
//!                                          ▼
//! ┌──────────────────┐  reserve  ┌─────────────────┐   send   ┌───────────────┐
//! │ DeliveryTracker  │◄──────────│   Dispatcher    │─────────►│   Transport   │
//! │ seq → callback   │           │ produce / poll  │          │ kafka/memory  │
//! └────────▲─────────┘           └────────▲────────┘          └───────┬───────┘
//!          │ record                       │ try_recv                  │ background
//!          └──────────────────────────────┴─────── outcome channel ◄──┘ context
//!                                         ▲
//!                                      Drainer (flush with timeout)
//! ```
//!
//! # Example
//!
//! ```rust
//! use click_producer::transport::{outcome_channel, MemoryTransport};
//! use click_producer::Dispatcher;
//! use click_schema::{BuiltinSchemaProvider, Record, SchemaBinding};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let binding =
//!     SchemaBinding::bind(&BuiltinSchemaProvider, "clicks_key_v1", "clicks_value_v1").unwrap();
//! let (sink, outcomes) = outcome_channel();
//! let transport = Arc::new(MemoryTransport::new(sink));
//! let dispatcher = Dispatcher::new(binding, transport.clone(), outcomes, 100);
//!
//! let key = Record::new().with("id", "c-1");
//! let value = Record::new()
//!     .with("id", "c-1")
//!     .with("impression_id", "i-1")
//!     .with("creative_id", "0a1b2c3d")
//!     .with("placement_id", "4e5f6a7b")
//!     .with("timestamp", 1_700_000_000_000i64)
//!     .with("user_agent", "Mozilla/5.0")
//!     .with("ip", "10.0.0.1")
//!     .with("cost", 0.25);
//!
//! dispatcher
//!     .produce("clicks", &key, &value, |result| println!("{result}"))
//!     .unwrap();
//! transport.complete_all();
//! assert_eq!(dispatcher.flush(Duration::from_secs(1)), 0);
//! ```

pub mod args;
pub mod config;
pub mod dispatcher;
pub mod drainer;
pub mod encoder;
pub mod error;
pub mod message;
pub mod populator;
pub mod tracker;
pub mod transport;

// Re-exports for convenience
pub use args::{KafkaArgs, ProducerArgs};
pub use config::{Acks, Compression, KafkaSettings, ProducerConfig};
pub use dispatcher::Dispatcher;
pub use drainer::{Drainer, DEFAULT_POLL_INTERVAL};
pub use encoder::{decode, encode};
pub use error::{ConfigError, EncodingError, ProduceError, TransportError};
pub use message::{DeliveryResult, DeliveryStatus, ProducedMessage};
pub use populator::{ClickPopulator, DeliveryStats, ProduceMetrics};
pub use tracker::{DeliveryCallback, DeliveryTracker};
pub use transport::{DeliverySink, Transport};

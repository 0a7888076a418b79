//! Schema binding for the clickstream producer.
//!
//! This crate resolves named Avro schema artifacts into immutable [`Schema`]
//! descriptors and defines the schema-neutral [`Record`] type that flows
//! between the event generator and the encoder.
//!
//! # Architecture
//!
//! ```text
//!  clicks_key_v1.avsc      clicks_value_v1.avsc
//!          │                        │
//!          ▼                        ▼
//! ┌──────────────────────────────────────────┐
//! │             SchemaProvider               │
//! │  FileSchemaProvider / BuiltinProvider    │
//! └────────────────────┬─────────────────────┘
//!                      ▼
//!              SchemaBinding { key, value }
//!                      │  (Arc<Schema>, shared read-only)
//!                      ▼
//!                   encoder
//! ```
//!
//! # Example
//!
//! ```rust
//! use click_schema::{BuiltinSchemaProvider, SchemaBinding};
//!
//! let binding = SchemaBinding::bind(
//!     &BuiltinSchemaProvider,
//!     "clicks_key_v1",
//!     "clicks_value_v1",
//! ).unwrap();
//! assert_eq!(binding.key.name(), "com.example.clicks.ClickKey");
//! ```

pub mod provider;
pub mod schema;
pub mod values;

// Re-exports for convenience
pub use provider::{
    BuiltinSchemaProvider, FileSchemaProvider, SchemaBinding, SchemaProvider,
    DEFAULT_KEY_SCHEMA, DEFAULT_VALUE_SCHEMA,
};
pub use schema::{FieldDefinition, FieldType, Schema, SchemaError, SchemaRef};
pub use values::{FieldValue, Record};

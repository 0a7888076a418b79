//! Pipeline integration tests.
//!
//! These tests drive the generator, encoder, dispatcher, tracker and drainer
//! together over the in-memory transport, so no broker is required. Each test:
//! 1. Binds the bundled click schemas
//! 2. Builds a dispatcher over a fresh `MemoryTransport`
//! 3. Produces generated events with a fixed seed and clock
//! 4. Resolves deliveries manually or with the background acker

mod backpressure;
mod concurrency;
mod delivery;
mod determinism;
mod round_trip;

use click_generator::{ClickGenerator, FixedClock};
use click_producer::transport::{outcome_channel, MemoryTransport};
use click_producer::Dispatcher;
use click_schema::{BuiltinSchemaProvider, SchemaBinding, DEFAULT_KEY_SCHEMA, DEFAULT_VALUE_SCHEMA};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

pub const TOPIC: &str = "clicks";
pub const SEED: u64 = 42;
/// 2023-11-14T22:13:20Z
pub const NOW_MILLIS: i64 = 1_700_000_000_000;

pub fn binding() -> SchemaBinding {
    SchemaBinding::bind(&BuiltinSchemaProvider, DEFAULT_KEY_SCHEMA, DEFAULT_VALUE_SCHEMA)
        .expect("bundled schemas must load")
}

pub fn pipeline(capacity: usize) -> (Dispatcher, Arc<MemoryTransport>) {
    let (sink, outcomes) = outcome_channel();
    let transport = Arc::new(MemoryTransport::new(sink));
    let dispatcher = Dispatcher::new(binding(), transport.clone(), outcomes, capacity);
    (dispatcher, transport)
}

pub fn generator(seed: u64) -> ClickGenerator<StdRng, FixedClock> {
    ClickGenerator::new(StdRng::seed_from_u64(seed), FixedClock(NOW_MILLIS))
}

//! Delivery outcomes, flush semantics and dropped messages.

use crate::{generator, pipeline, SEED, TOPIC};
use click_producer::{DeliveryResult, DeliveryStatus, EncodingError, ProduceError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Outcomes = Arc<Mutex<HashMap<u64, Vec<DeliveryResult>>>>;

fn recorder(outcomes: &Outcomes) -> impl FnOnce(&DeliveryResult) + Send + 'static {
    let outcomes = Arc::clone(outcomes);
    move |result| {
        outcomes
            .lock()
            .unwrap()
            .entry(result.sequence)
            .or_default()
            .push(result.clone());
    }
}

#[test]
fn test_flush_returns_zero_once_every_message_resolved() {
    let (dispatcher, transport) = pipeline(32);
    let outcomes: Outcomes = Arc::default();

    let mut sequences = Vec::new();
    for click in generator(SEED).take(20) {
        let seq = dispatcher
            .produce(TOPIC, &click.key_record(), &click.value_record(), recorder(&outcomes))
            .unwrap();
        sequences.push(seq);
    }
    transport.complete(15);
    transport.fail(5, "Broker: Not enough in-sync replicas");

    assert_eq!(dispatcher.flush(Duration::from_secs(1)), 0);

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), sequences.len());
    for seq in &sequences {
        assert_eq!(outcomes[seq].len(), 1, "sequence {seq} resolved once");
    }
    let failed = outcomes
        .values()
        .filter(|results| !results[0].is_success())
        .count();
    assert_eq!(failed, 5);
}

#[test]
fn test_flush_reports_unresolved_after_timeout() {
    let (dispatcher, transport) = pipeline(32);
    let outcomes: Outcomes = Arc::default();

    for click in generator(SEED).take(4) {
        dispatcher
            .produce(TOPIC, &click.key_record(), &click.value_record(), recorder(&outcomes))
            .unwrap();
    }
    transport.complete(1);

    assert_eq!(dispatcher.flush(Duration::from_millis(50)), 3);
    assert_eq!(outcomes.lock().unwrap().len(), 1);

    // unresolved messages stay tracked and resolve on a later flush
    transport.complete_all();
    assert_eq!(dispatcher.flush(Duration::from_secs(1)), 0);
    assert_eq!(outcomes.lock().unwrap().len(), 4);
}

#[test]
fn test_failed_delivery_reaches_callback_with_error() {
    let (dispatcher, transport) = pipeline(4);
    let outcomes: Outcomes = Arc::default();
    let click = generator(SEED).next_event();

    let seq = dispatcher
        .produce(TOPIC, &click.key_record(), &click.value_record(), recorder(&outcomes))
        .unwrap();
    transport.fail(1, "Local: Message timed out");
    assert_eq!(dispatcher.poll(Duration::from_secs(1)), 1);

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(
        outcomes[&seq][0].status,
        DeliveryStatus::Failure {
            error: "Local: Message timed out".to_string()
        }
    );
    // failures are not retried
    assert_eq!(transport.in_flight(), 0);
    assert_eq!(dispatcher.pending(), 0);
}

#[test]
fn test_nonconforming_record_is_dropped_and_pipeline_continues() {
    let (dispatcher, transport) = pipeline(4);
    let outcomes: Outcomes = Arc::default();
    let mut clicks = generator(SEED);

    let click = clicks.next_event();
    let mut value = click.value_record();
    value.insert("cost", "free");
    let err = dispatcher
        .produce(TOPIC, &click.key_record(), &value, recorder(&outcomes))
        .unwrap_err();
    assert!(matches!(
        err,
        ProduceError::Encoding(EncodingError::TypeMismatch { .. })
    ));
    assert_eq!(dispatcher.pending(), 0);

    let click = clicks.next_event();
    let seq = dispatcher
        .produce(TOPIC, &click.key_record(), &click.value_record(), recorder(&outcomes))
        .unwrap();
    transport.complete_all();
    assert_eq!(dispatcher.flush(Duration::from_secs(1)), 0);

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[&seq][0].is_success());
}

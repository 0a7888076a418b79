//! Bounded queue behaviour under backpressure.

use crate::{generator, pipeline, SEED, TOPIC};
use click_producer::ProduceError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_produce_beyond_capacity_fails_without_disturbing_pending() {
    const CAPACITY: usize = 8;
    let (dispatcher, transport) = pipeline(CAPACITY);
    let delivered = Arc::new(AtomicUsize::new(0));
    let mut clicks = generator(SEED);

    for _ in 0..CAPACITY {
        let click = clicks.next_event();
        let counter = Arc::clone(&delivered);
        dispatcher
            .produce(TOPIC, &click.key_record(), &click.value_record(), move |r| {
                assert!(r.is_success());
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    let click = clicks.next_event();
    let err = dispatcher
        .produce(TOPIC, &click.key_record(), &click.value_record(), |_| {
            panic!("rejected message must not get a callback")
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ProduceError::QueueFull {
            capacity: CAPACITY,
            pending: CAPACITY
        }
    ));
    assert_eq!(dispatcher.pending(), CAPACITY);

    transport.complete_all();
    assert_eq!(dispatcher.flush(Duration::from_secs(1)), 0);
    assert_eq!(delivered.load(Ordering::SeqCst), CAPACITY);
}

#[test]
fn test_capacity_five_with_partial_drain() {
    let (dispatcher, transport) = pipeline(5);
    let mut clicks = generator(SEED);

    let mut accepted = 0;
    let mut rejected = 0;
    for _ in 0..10 {
        let click = clicks.next_event();
        match dispatcher.produce(TOPIC, &click.key_record(), &click.value_record(), |_| {}) {
            Ok(_) => accepted += 1,
            Err(ProduceError::QueueFull { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(accepted, 5);
    assert_eq!(rejected, 5);

    transport.complete(3);
    assert_eq!(dispatcher.poll(Duration::ZERO), 3);
    assert_eq!(dispatcher.pending(), 2);

    for _ in 0..3 {
        let click = clicks.next_event();
        dispatcher
            .produce(TOPIC, &click.key_record(), &click.value_record(), |_| {})
            .unwrap();
    }
    let click = clicks.next_event();
    assert!(matches!(
        dispatcher.produce(TOPIC, &click.key_record(), &click.value_record(), |_| {}),
        Err(ProduceError::QueueFull { .. })
    ));
}

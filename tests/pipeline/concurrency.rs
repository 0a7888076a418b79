//! Polling while a background context resolves messages.

use crate::{generator, pipeline, SEED, TOPIC};
use click_producer::ProduceError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn test_background_acker_never_loses_or_duplicates_callbacks() {
    const MESSAGES: usize = 2_000;
    let (dispatcher, transport) = pipeline(64);
    let acker = transport.spawn_acker(Duration::from_micros(200));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut clicks = generator(SEED);
    let mut enqueued = HashSet::new();
    while enqueued.len() < MESSAGES {
        let click = clicks.next_event();
        let sink = Arc::clone(&seen);
        match dispatcher.produce(TOPIC, &click.key_record(), &click.value_record(), move |r| {
            sink.lock().unwrap().push(r.sequence);
        }) {
            Ok(seq) => {
                assert!(enqueued.insert(seq), "sequence {seq} assigned twice");
            }
            Err(ProduceError::QueueFull { .. }) => {
                dispatcher.poll(Duration::from_millis(10));
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
        dispatcher.poll(Duration::ZERO);
    }

    assert_eq!(dispatcher.flush(Duration::from_secs(10)), 0);
    acker.stop();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), MESSAGES);
    let unique: HashSet<u64> = seen.iter().copied().collect();
    assert_eq!(unique, enqueued);
}

#[test]
fn test_poll_from_another_thread_while_producing() {
    const MESSAGES: usize = 500;
    let (dispatcher, transport) = pipeline(MESSAGES);
    let dispatcher = Arc::new(dispatcher);
    let acker = transport.spawn_acker(Duration::from_micros(100));
    let fired = Arc::new(Mutex::new(Vec::new()));
    let done = Arc::new(AtomicBool::new(false));

    let poller = {
        let dispatcher = Arc::clone(&dispatcher);
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                dispatcher.poll(Duration::from_millis(1));
            }
        })
    };

    for click in generator(SEED).take(MESSAGES) {
        let sink = Arc::clone(&fired);
        dispatcher
            .produce(TOPIC, &click.key_record(), &click.value_record(), move |r| {
                sink.lock().unwrap().push(r.sequence);
            })
            .unwrap();
    }

    assert_eq!(dispatcher.flush(Duration::from_secs(10)), 0);
    done.store(true, Ordering::Release);
    poller.join().unwrap();
    acker.stop();

    let fired = fired.lock().unwrap();
    let unique: HashSet<u64> = fired.iter().copied().collect();
    assert_eq!(fired.len(), MESSAGES);
    assert_eq!(unique.len(), MESSAGES);
}

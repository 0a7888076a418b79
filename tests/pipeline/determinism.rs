//! Seeded generation is reproducible end to end.

use crate::{binding, generator, SEED};
use click_producer::encode;

#[test]
fn test_same_seed_same_events() {
    let first: Vec<_> = generator(SEED).take(50).collect();
    let second: Vec<_> = generator(SEED).take(50).collect();
    assert_eq!(first, second);
}

#[test]
fn test_same_seed_same_payloads() {
    let binding = binding();
    let payloads = |seed: u64| -> Vec<Vec<u8>> {
        generator(seed)
            .take(20)
            .map(|click| encode(&click.value_record(), &binding.value).unwrap())
            .collect()
    };
    assert_eq!(payloads(SEED), payloads(SEED));
}

#[test]
fn test_different_seeds_diverge() {
    let first: Vec<_> = generator(SEED).take(10).collect();
    let second: Vec<_> = generator(SEED + 1).take(10).collect();
    assert_ne!(first, second);
}

//! Client network attribute generators.

use rand::Rng;

/// Four independently sampled octets joined by dots.
pub fn generate_ipv4<R: Rng>(rng: &mut R) -> String {
    let octets: [u8; 4] = [rng.gen(), rng.gen(), rng.gen(), rng.gen()];
    octets
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

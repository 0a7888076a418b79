//! UUID identifier generators.

use rand::Rng;
use uuid::Uuid;

/// Length of the truncated creative/placement identifiers.
pub const SHORT_ID_LEN: usize = 8;

/// Generate a random UUID v4 using the provided RNG.
pub fn generate_uuid_v4<R: Rng>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);

    // Set version (4) and variant (RFC 4122) bits
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// A fresh UUID truncated to its first [`SHORT_ID_LEN`] characters.
pub fn generate_short_id<R: Rng>(rng: &mut R) -> String {
    let mut id = generate_uuid_v4(rng).to_string();
    id.truncate(SHORT_ID_LEN);
    id
}

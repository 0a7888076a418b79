//! Field generators for click events.
//!
//! Each function draws only from the RNG it is given, so the sequence of
//! values is fully determined by the RNG state.

pub mod network;
pub mod sample;
pub mod uuid;

use crate::event::ClickEvent;
use rand::Rng;

/// Generate one click event at `now_millis`.
///
/// Fields are drawn in a fixed order so that the RNG stream maps to the same
/// events on every run.
pub fn generate_click<R: Rng>(rng: &mut R, now_millis: i64) -> ClickEvent {
    let id = uuid::generate_uuid_v4(rng).to_string();
    let impression_id = uuid::generate_uuid_v4(rng).to_string();
    let creative_id = uuid::generate_short_id(rng);
    let placement_id = uuid::generate_short_id(rng);
    let user_agent = sample::choose(rng, sample::USER_AGENTS).to_string();
    let ip = network::generate_ipv4(rng);
    let referrer = sample::choose(rng, sample::REFERRERS).to_string();
    let cost = sample::generate_cost(rng);

    ClickEvent {
        id,
        impression_id,
        creative_id,
        placement_id,
        timestamp: now_millis,
        user_agent,
        ip,
        referrer,
        cost,
    }
}

//! Click event generator with an explicitly owned RNG and clock.

use crate::event::ClickEvent;
use crate::generators::generate_click;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the event timestamp.
pub trait Clock {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Generator that produces an infinite sequence of click events.
///
/// Every call consumes RNG state, so the sequence cannot be rewound; build a
/// new generator from the same seed to replay it.
pub struct ClickGenerator<R: Rng = StdRng, C: Clock = SystemClock> {
    rng: R,
    clock: C,
    generated: u64,
}

impl ClickGenerator<StdRng, SystemClock> {
    /// Wall-clock generator seeded with `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), SystemClock)
    }

    /// Wall-clock generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy(), SystemClock)
    }
}

impl<R: Rng, C: Clock> ClickGenerator<R, C> {
    pub fn new(rng: R, clock: C) -> Self {
        Self {
            rng,
            clock,
            generated: 0,
        }
    }

    /// Produce the next event.
    pub fn next_event(&mut self) -> ClickEvent {
        let now = self.clock.now_millis();
        let click = generate_click(&mut self.rng, now);
        self.generated += 1;
        click
    }

    /// Number of events produced so far.
    pub fn generated(&self) -> u64 {
        self.generated
    }
}

impl<R: Rng, C: Clock> Iterator for ClickGenerator<R, C> {
    type Item = ClickEvent;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_event())
    }
}

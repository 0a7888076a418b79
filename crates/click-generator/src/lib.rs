//! Synthetic click event generator.
//!
//! This crate provides the `ClickGenerator` which produces an infinite,
//! non-restartable sequence of [`ClickEvent`]s. All randomness comes from an
//! RNG the caller passes in, and wall-clock time comes from an injected
//! [`Clock`], so a fixed seed and a fixed clock reproduce the same sequence.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │    ClickGenerator    │
//! │                      │
//! │  - rng (StdRng)      │
//! │  - clock             │
//! │  - generated         │
//! └──────────┬───────────┘
//!            │
//!            ▼
//!   ClickEvent ──► key_record() / value_record() ──► encoder
//! ```
//!
//! # Example
//!
//! ```rust
//! use click_generator::{ClickGenerator, FixedClock};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut generator = ClickGenerator::new(StdRng::seed_from_u64(42), FixedClock(0));
//! let click = generator.next_event();
//! assert_eq!(click.creative_id.len(), 8);
//! ```

pub mod event;
pub mod generator;
pub mod generators;

// Re-exports for convenience
pub use event::{ClickEvent, EventError};
pub use generator::{ClickGenerator, Clock, FixedClock, SystemClock};
pub use generators::generate_click;

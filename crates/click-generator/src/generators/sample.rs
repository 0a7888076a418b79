//! Uniform sampling from fixed candidate sets and ranges.

use rand::Rng;

/// User agents the generator picks from.
pub const USER_AGENTS: &[&str] = &[
    // Samsung S8
    "Mozilla/5.0 (Linux; Android 7.0; SM-G892A Build/NRD90M; wv) AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 Chrome/60.0.3112.107 Mobile Safari/537.36",
    // iPhone XR
    "Mozilla/5.0 (iPhone; CPU iPhone OS 12_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.0 Mobile/15E148 Safari/604.1",
    // Mac OS X Safari
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_2) AppleWebKit/601.3.9 (KHTML, like Gecko) Version/9.0.2 Safari/601.3.9",
    // Roku Ultra
    "Roku4640X/DVP-7.70 (297.70E04154A)",
    // PS4
    "Mozilla/5.0 (PlayStation 4 3.11) AppleWebKit/537.73 (KHTML, like Gecko)",
];

/// Referring sites the generator picks from.
pub const REFERRERS: &[&str] = &[
    "google.com",
    "facebook.com",
    "nytimes.com",
    "cnn.com",
    "foxnews.com",
    "espn.com",
];

/// Lower bound of the click cost.
pub const MIN_COST: f64 = 0.05;

/// Upper bound of the click cost.
pub const MAX_COST: f64 = 1.00;

/// Pick one candidate uniformly.
///
/// Panics on an empty slice; the candidate sets above are never empty.
pub fn choose<'a, R: Rng>(rng: &mut R, candidates: &[&'a str]) -> &'a str {
    let idx = rng.gen_range(0..candidates.len());
    candidates[idx]
}

/// Uniform cost in `[MIN_COST, MAX_COST]`.
pub fn generate_cost<R: Rng>(rng: &mut R) -> f64 {
    rng.gen_range(MIN_COST..=MAX_COST)
}

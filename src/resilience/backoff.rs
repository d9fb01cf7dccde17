//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Exponents beyond this no longer change anything useful.
const MAX_EXPONENT: u32 = 30;

/// Calculate the delay before retry number `attempt + 1`.
///
/// `base * 2^attempt`, scaled by a jitter factor drawn from `[0.5, 1.0)`.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.5..1.0);
    scaled_delay(attempt, base, jitter)
}

/// Deterministic part of [`backoff_delay`] for a given jitter factor.
pub fn scaled_delay(attempt: u32, base: Duration, jitter: f64) -> Duration {
    let exponential = 2f64.powi(attempt.min(MAX_EXPONENT) as i32);
    let secs = base.as_secs_f64() * exponential * jitter;
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

//! Outbound token-bucket rate limiter.
//!
//! # Responsibilities
//! - Throttle calls to the upstream to a sustained rate with bounded bursts
//! - Suspend callers until a token is available; never fail
//!
//! # Design Decisions
//! - Token state lives behind one mutex held only for the refill arithmetic
//! - A waiter reserves its token up front: the balance goes negative and the
//!   waiter sleeps until its own slot is due, so N queued callers are spread
//!   over N refill periods and no loop can let a batch through at once
//! - Dropping `acquire()` mid-wait hands the reserved token back

use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tokio::time::{sleep, Duration, Instant};

/// Invalid limiter parameters.
#[derive(Debug, Error, PartialEq)]
pub enum LimiterError {
    #[error("refill rate must be > 0 tokens/sec, got {0}")]
    NonPositiveRate(f64),

    #[error("burst capacity must be >= 0, got {0}")]
    NegativeCapacity(f64),
}

/// A simple token bucket. `tokens` is negative while waiters hold reservations.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn refill(&mut self, ceiling: f64, refill_rate: f64) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(ceiling);
        self.last_update = now;
    }

    /// Refill, then take one token or report how long until one is due.
    fn try_acquire(&mut self, ceiling: f64, refill_rate: f64) -> Result<(), Duration> {
        self.refill(ceiling, refill_rate);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / refill_rate))
        }
    }

    /// Refill, then take one token even if it is not there yet.
    /// Returns how long until the taken token is covered by refill.
    fn reserve(&mut self, ceiling: f64, refill_rate: f64) -> Duration {
        self.refill(ceiling, refill_rate);
        self.tokens -= 1.0;

        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-self.tokens / refill_rate)
        }
    }
}

/// Rate limiter shared by every upstream attempt of one client.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    capacity: f64,
    refill_rate: f64,
}

/// Token taken ahead of time; refunded if the waiter goes away before its slot.
struct Reservation<'a> {
    limiter: &'a RateLimiter,
    settled: bool,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut bucket = self.limiter.lock();
            bucket.tokens = (bucket.tokens + 1.0).min(self.limiter.ceiling());
        }
    }
}

impl RateLimiter {
    /// Create a limiter that starts full.
    ///
    /// A capacity below one token still lets a single token accrue, so the
    /// limiter degrades to "no burst" instead of blocking forever.
    pub fn new(refill_per_second: f64, capacity: f64) -> Result<Self, LimiterError> {
        if !(refill_per_second > 0.0) {
            return Err(LimiterError::NonPositiveRate(refill_per_second));
        }
        if !(capacity >= 0.0) {
            return Err(LimiterError::NegativeCapacity(capacity));
        }

        Ok(Self {
            bucket: Mutex::new(TokenBucket::new(capacity)),
            capacity,
            refill_rate: refill_per_second,
        })
    }

    /// Wait until a token is available, then consume it.
    pub async fn acquire(&self) {
        let wait = self.lock().reserve(self.ceiling(), self.refill_rate);
        if wait.is_zero() {
            return;
        }

        let mut reservation = Reservation {
            limiter: self,
            settled: false,
        };
        tracing::debug!(
            wait_ms = wait.as_millis() as u64,
            "Rate limit reached, waiting for token"
        );
        sleep(wait).await;
        reservation.settled = true;
    }

    /// Non-blocking attempt. `Err` carries the suggested wait.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.lock().try_acquire(self.ceiling(), self.refill_rate)
    }

    /// Tokens currently in the bucket (without refilling). Negative while
    /// waiters hold reservations.
    pub fn available(&self) -> f64 {
        self.lock().tokens
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    fn ceiling(&self) -> f64 {
        self.capacity.max(1.0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

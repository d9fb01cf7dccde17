//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream attempt:
//!     → rate_limit.rs (wait for a token; never fails)
//!     → [HTTP call]
//!     → On failure: retries.rs (sleep backoff.rs delay, run the attempt again)
//! ```
//!
//! # Design Decisions
//! - Every external call is throttled before it leaves the process
//! - Retries re-run the whole attempt, including token acquisition
//! - Locks guard arithmetic only; nothing sleeps while holding one

pub mod backoff;
pub mod rate_limit;
pub mod retries;

pub use rate_limit::{LimiterError, RateLimiter};
pub use retries::{retry, RetryPolicy};

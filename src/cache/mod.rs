//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! AskService::ask(question)
//!     → fingerprint() (normalized key)
//!     → ResponseCache::get() → hit: return, miss: call upstream
//!     → ResponseCache::set() on success
//! ```

pub mod response;

pub use response::{fingerprint, CacheStats, ResponseCache};

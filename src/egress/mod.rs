//! Egress proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Config proxy list
//!     → entry.rs (parse + normalize each address)
//!     → pool.rs (rotation / random pick, blacklist)
//!
//! Upstream attempt:
//!     → ProxyManager::select() → per-proxy HTTP client
//!     → On suspect status / transport error: ProxyManager::mark_failed()
//! ```

pub mod entry;
pub mod pool;

pub use entry::ProxyEntry;
pub use pool::ProxyManager;

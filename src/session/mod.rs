//! Session persistence subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:  session file → SessionStore::open() → auth cookie for the client
//! Request:  AskService → record_request() / record_error() → session file
//! Metrics:  stats() → request total, error count, uptime
//! ```

pub mod store;

pub use store::{ErrorEntry, SessionState, SessionStats, SessionStore, ERROR_LOG_LIMIT};

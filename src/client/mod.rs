//! Upstream client subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream::request(text)
//!     → retries.rs (whole attempt re-run on failure)
//!         → rate_limit.rs (acquire token)
//!         → egress pool (select proxy)
//!         → headers.rs (static headers + random user agent, JSON payload)
//!         → HTTP POST
//!         → error.rs (status / transport / malformed classification)
//!     → answer string
//! ```

pub mod api;
pub mod error;
pub mod headers;

use async_trait::async_trait;

pub use api::{parse_answer, ApiClient};
pub use error::{ClientError, PROXY_SUSPECT_STATUSES};

/// Something that can answer a question.
///
/// Implemented by [`ApiClient`]; the service and the health monitor depend on
/// this trait so they can run against any upstream.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn request(&self, text: &str) -> Result<String, ClientError>;

    /// Release connections. Default: nothing to release.
    fn close(&self) {}
}

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!
//! AskService::render_metrics():
//!     → cache stats + latest health report + session stats
//!     → metrics.rs (Prometheus plaintext)
//!     → GET /metrics
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through the HTTP trace spans
//! - Metrics are rendered on demand from a snapshot, not accumulated

pub mod logging;
pub mod metrics;

pub use self::logging::{init_logging, preview};
pub use self::metrics::{render_metrics, MetricsSnapshot};

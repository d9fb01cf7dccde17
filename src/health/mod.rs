//! Upstream health subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (monitor.rs)
//!     → Send each probe question through the Upstream (concurrently, with timeouts)
//!     → Count successes / failures
//!     → report.rs (Healthy / Degraded / Down)
//!     → Bounded history
//!
//! Consumers:
//!     → AskService::health_status()
//!     → Metrics text (status gauge, last probe duration)
//! ```
//!
//! # Design Decisions
//! - The monitor never touches the response cache
//! - Status is derived per cycle; no hysteresis between cycles

pub mod monitor;
pub mod report;

pub use monitor::{HealthMonitor, MonitorError, HISTORY_LIMIT};
pub use report::{HealthReport, HealthStatus};

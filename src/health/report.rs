//! Health reports.

use serde::Serialize;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Upstream health derived from one probe cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every probe succeeded.
    Healthy,
    /// Some probes succeeded.
    Degraded,
    /// No probe succeeded.
    Down,
}

impl HealthStatus {
    pub fn from_counts(successes: usize, failures: usize) -> Self {
        match (successes, failures) {
            (0, _) => Self::Down,
            (_, 0) => Self::Healthy,
            _ => Self::Degraded,
        }
    }

    /// Gauge value: 1 / 0.5 / 0.
    pub fn as_metric(&self) -> f64 {
        match self {
            Self::Healthy => 1.0,
            Self::Degraded => 0.5,
            Self::Down => 0.0,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Down => "down",
        };
        f.write_str(s)
    }
}

/// Outcome of one probe cycle. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub probe_duration_secs: f64,
    pub success_count: usize,
    pub failure_count: usize,
    /// Unix timestamp, seconds.
    pub created_at: u64,
}

impl HealthReport {
    pub fn new(success_count: usize, failure_count: usize, probe_duration_secs: f64) -> Self {
        Self {
            status: HealthStatus::from_counts(success_count, failure_count),
            probe_duration_secs,
            success_count,
            failure_count,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }
}

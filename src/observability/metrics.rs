//! Metrics text exposition.
//!
//! # Responsibilities
//! - Render service state as Prometheus plaintext
//!
//! # Metrics
//! - `askgate_health_status` (gauge): 1=healthy, 0.5=degraded, 0=down or unknown
//! - `askgate_health_last_probe_duration_seconds` (gauge)
//! - `askgate_health_probe_successes` / `_failures` (gauge): last cycle counts
//! - `askgate_cache_hits_total` / `askgate_cache_misses_total` (counter)
//! - `askgate_cache_entries` (gauge)
//! - `askgate_requests_total` (counter): persisted across restarts
//! - `askgate_session_errors` (gauge): retained error log length
//! - `askgate_uptime_seconds` (gauge): since the persisted start time
//!
//! # Design Decisions
//! - Rendered from an explicit snapshot through a local recorder; no global
//!   recorder is installed, so every render reflects the snapshot exactly

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::cache::CacheStats;
use crate::health::HealthReport;
use crate::session::SessionStats;

/// Point-in-time view of everything the metrics text reports.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// `None` when caching is disabled.
    pub cache: Option<CacheStats>,
    /// `None` before the first probe cycle.
    pub health: Option<HealthReport>,
    pub session: SessionStats,
}

/// Render `snapshot` in the Prometheus text format.
pub fn render_metrics(snapshot: &MetricsSnapshot) -> String {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        describe_gauge!(
            "askgate_health_status",
            "Upstream health: 1 healthy, 0.5 degraded, 0 down"
        );
        describe_gauge!(
            "askgate_health_last_probe_duration_seconds",
            "Duration of the last probe cycle"
        );
        describe_gauge!(
            "askgate_health_probe_successes",
            "Successful probes in the last cycle"
        );
        describe_gauge!(
            "askgate_health_probe_failures",
            "Failed probes in the last cycle"
        );
        describe_counter!("askgate_cache_hits_total", "Answer cache hits");
        describe_counter!("askgate_cache_misses_total", "Answer cache misses");
        describe_gauge!("askgate_cache_entries", "Entries in the answer cache");
        describe_counter!("askgate_requests_total", "Upstream requests served");
        describe_gauge!("askgate_session_errors", "Errors in the session log");
        describe_gauge!(
            "askgate_uptime_seconds",
            "Seconds since the session started"
        );

        let health = snapshot.health.as_ref();
        metrics::gauge!("askgate_health_status")
            .set(health.map_or(0.0, |r| r.status.as_metric()));
        metrics::gauge!("askgate_health_last_probe_duration_seconds")
            .set(health.map_or(0.0, |r| r.probe_duration_secs));
        metrics::gauge!("askgate_health_probe_successes")
            .set(health.map_or(0.0, |r| r.success_count as f64));
        metrics::gauge!("askgate_health_probe_failures")
            .set(health.map_or(0.0, |r| r.failure_count as f64));

        let cache = snapshot.cache.unwrap_or(CacheStats {
            size: 0,
            capacity: 0,
            ttl_secs: 0,
            hits: 0,
            misses: 0,
        });
        metrics::counter!("askgate_cache_hits_total").absolute(cache.hits);
        metrics::counter!("askgate_cache_misses_total").absolute(cache.misses);
        metrics::gauge!("askgate_cache_entries").set(cache.size as f64);

        let session = &snapshot.session;
        metrics::counter!("askgate_requests_total").absolute(session.total_requests);
        metrics::gauge!("askgate_session_errors").set(session.error_count as f64);
        metrics::gauge!("askgate_uptime_seconds").set(session.uptime_secs as f64);
    });

    handle.render()
}

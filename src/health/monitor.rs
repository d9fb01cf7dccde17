//! Periodic upstream health probing.
//!
//! # Responsibilities
//! - Run the canned probe questions against the upstream on a timer
//! - Turn pass/fail counts into a [`HealthReport`]
//! - Keep the last [`HISTORY_LIMIT`] reports
//!
//! # Design Decisions
//! - Probes run concurrently, each under its own timeout, so one hung
//!   probe cannot stall the cycle or wait out the client's retries
//! - `stop()` signals the loop and awaits the task; an in-flight cycle is
//!   cancelled, never finished in the background
//! - Health state is upstream-wide, not per proxy

use futures_util::future::join_all;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};

use crate::client::Upstream;
use crate::config::HealthConfig;
use crate::health::report::HealthReport;
use crate::lifecycle::Shutdown;

/// Reports retained; the oldest is dropped first.
pub const HISTORY_LIMIT: usize = 100;

/// Invalid monitor parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("probe interval must be > 0")]
    ZeroInterval,

    #[error("probe timeout must be > 0")]
    ZeroProbeTimeout,

    #[error("at least one probe query is required")]
    NoProbes,
}

/// State shared with the background task.
struct Prober {
    upstream: Arc<dyn Upstream>,
    queries: Vec<String>,
    probe_timeout: Duration,
    history: Mutex<VecDeque<HealthReport>>,
}

impl Prober {
    async fn run_cycle(&self) -> HealthReport {
        let start = Instant::now();

        let outcomes = join_all(self.queries.iter().map(|query| async move {
            match time::timeout(self.probe_timeout, self.upstream.request(query)).await {
                Ok(Ok(_)) => true,
                Ok(Err(e)) => {
                    tracing::warn!(probe = %query, error = %e, "Health probe failed");
                    false
                }
                Err(_) => {
                    tracing::warn!(probe = %query, "Health probe timed out");
                    false
                }
            }
        }))
        .await;

        let successes = outcomes.iter().filter(|ok| **ok).count();
        let report = HealthReport::new(
            successes,
            outcomes.len() - successes,
            start.elapsed().as_secs_f64(),
        );

        tracing::info!(
            status = %report.status,
            successes = report.success_count,
            failures = report.failure_count,
            duration_secs = report.probe_duration_secs,
            "Health probe completed"
        );

        self.record(report.clone());
        report
    }

    fn record(&self, report: HealthReport) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push_back(report);
        while history.len() > HISTORY_LIMIT {
            history.pop_front();
        }
    }
}

struct RunningTask {
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

/// Background health monitor.
pub struct HealthMonitor {
    prober: Arc<Prober>,
    interval: Duration,
    task: Mutex<Option<RunningTask>>,
}

impl HealthMonitor {
    pub fn new(upstream: Arc<dyn Upstream>, config: &HealthConfig) -> Result<Self, MonitorError> {
        if config.interval_secs == 0 {
            return Err(MonitorError::ZeroInterval);
        }
        if config.probe_timeout_secs == 0 {
            return Err(MonitorError::ZeroProbeTimeout);
        }
        if config.probe_queries.is_empty() {
            return Err(MonitorError::NoProbes);
        }

        Ok(Self {
            prober: Arc::new(Prober {
                upstream,
                queries: config.probe_queries.clone(),
                probe_timeout: Duration::from_secs(config.probe_timeout_secs),
                history: Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT)),
            }),
            interval: Duration::from_secs(config.interval_secs),
            task: Mutex::new(None),
        })
    }

    /// Spawn the probe loop. No-op if already running.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            tracing::debug!("Health monitor already running");
            return;
        }

        let shutdown = Shutdown::new();
        let mut stop_rx = shutdown.subscribe();
        let prober = self.prober.clone();
        let interval = self.interval;

        tracing::info!(interval_secs = interval.as_secs(), "Health monitor starting");

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stop_rx.recv() => {
                        tracing::info!("Health monitor received shutdown signal, exiting loop");
                        break;
                    }
                    _ = async {
                        ticker.tick().await;
                        prober.run_cycle().await;
                    } => {}
                }
            }
        });

        *task = Some(RunningTask { shutdown, handle });
    }

    /// Stop the probe loop and wait for it to exit. No-op if not running.
    pub async fn stop(&self) {
        let running = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(RunningTask { shutdown, handle }) = running else {
            return;
        };

        shutdown.trigger();
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Health monitor task ended abnormally");
        }
        tracing::info!("Health monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Run one probe cycle now and record it.
    pub async fn probe_now(&self) -> HealthReport {
        self.prober.run_cycle().await
    }

    /// Most recent report, `None` before the first cycle completes.
    pub fn latest_report(&self) -> Option<HealthReport> {
        self.prober
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    /// Copy of the retained history, oldest first.
    pub fn history(&self) -> Vec<HealthReport> {
        self.prober
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

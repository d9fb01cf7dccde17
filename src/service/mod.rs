//! Ask service facade.
//!
//! # Data Flow
//! ```text
//! ask(question)
//!     → validate (non-empty, length limit)
//!     → ResponseCache (fingerprint lookup) → hit: return
//!     → Upstream::request → answer
//!     → ResponseCache::set, SessionStore::record_request
//!     → on failure: SessionStore::record_error, ServiceError
//!
//! HealthMonitor runs beside it on the same Upstream, never touching the cache.
//! ```
//!
//! # Design Decisions
//! - Explicitly constructed and shared by `Arc`; no process-wide singletons
//! - Initialization order: session store → client → cache → monitor
//! - Validation failures never reach the upstream and are not retried

pub mod error;

use serde::Serialize;
use std::sync::Arc;

use crate::cache::{fingerprint, CacheStats, ResponseCache};
use crate::client::{ApiClient, ClientError, Upstream};
use crate::config::{ApiConfig, ConfigError, GatewayConfig};
use crate::health::{HealthMonitor, HealthReport};
use crate::observability::{preview, render_metrics, MetricsSnapshot};
use crate::session::{SessionStats, SessionStore};

pub use error::ServiceError;

/// Service overview for `/api/status`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub health: Option<HealthReport>,
    pub monitoring: bool,
    pub cache: Option<CacheStats>,
    pub session: SessionStats,
}

pub struct AskService {
    session: Arc<SessionStore>,
    upstream: Arc<dyn Upstream>,
    cache: Option<ResponseCache>,
    monitor: HealthMonitor,
    monitoring_enabled: bool,
    max_question_chars: usize,
}

impl AskService {
    /// Build the service against the configured upstream.
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let session = Arc::new(SessionStore::open(&config.session.path));
        let cookie = resolve_auth_cookie(&config.api, &session)?;
        let client = ApiClient::new(&config.api, &config.rate_limit, &config.proxy, &cookie)?;

        Self::with_upstream(config, session, Arc::new(client))
    }

    /// Build the service on an existing session store and upstream.
    pub fn with_upstream(
        config: &GatewayConfig,
        session: Arc<SessionStore>,
        upstream: Arc<dyn Upstream>,
    ) -> Result<Self, ConfigError> {
        let cache = if config.cache.enabled {
            Some(ResponseCache::from_config(&config.cache))
        } else {
            tracing::info!("Answer cache disabled");
            None
        };

        let monitor = HealthMonitor::new(upstream.clone(), &config.health)
            .map_err(|e| ConfigError::Invalid(format!("health: {}", e)))?;

        Ok(Self {
            session,
            upstream,
            cache,
            monitor,
            monitoring_enabled: config.health.enabled,
            max_question_chars: config.api.max_question_chars,
        })
    }

    /// Answer a question, from cache when possible.
    pub async fn ask(&self, question: &str) -> Result<String, ServiceError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ServiceError::Validation("question must not be empty".into()));
        }
        if question.chars().count() > self.max_question_chars {
            return Err(ServiceError::Validation(format!(
                "question exceeds {} characters",
                self.max_question_chars
            )));
        }

        let key = fingerprint(question);
        if let Some(answer) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            tracing::debug!(question = %preview(question), "Answer served from cache");
            return Ok(answer);
        }

        match self.upstream.request(question).await {
            Ok(answer) => {
                if let Some(cache) = &self.cache {
                    cache.set(&key, &answer);
                }
                self.session.record_request();
                tracing::info!(question = %preview(question), "Question answered");
                Ok(answer)
            }
            Err(e) => {
                self.session.record_error(&e.to_string());
                tracing::error!(question = %preview(question), error = %e, "Question failed");
                Err(match e {
                    ClientError::Session(msg) => ServiceError::Unexpected(msg),
                    other => ServiceError::Upstream(other),
                })
            }
        }
    }

    /// Latest health report, probing right away if none exists yet.
    pub async fn health_status(&self) -> HealthReport {
        match self.monitor.latest_report() {
            Some(report) => report,
            None => self.monitor.probe_now().await,
        }
    }

    pub fn latest_report(&self) -> Option<HealthReport> {
        self.monitor.latest_report()
    }

    pub fn health_history(&self) -> Vec<HealthReport> {
        self.monitor.history()
    }

    /// Start periodic probing, unless disabled in configuration.
    pub fn start_monitoring(&self) {
        if self.monitoring_enabled {
            self.monitor.start();
        } else {
            tracing::info!("Health monitoring disabled");
        }
    }

    pub async fn stop_monitoring(&self) {
        self.monitor.stop().await;
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            health: self.monitor.latest_report(),
            monitoring: self.monitor.is_running(),
            cache: self.cache.as_ref().map(ResponseCache::stat),
            session: self.session.stats(),
        }
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache: self.cache.as_ref().map(ResponseCache::stat),
            health: self.monitor.latest_report(),
            session: self.session.stats(),
        }
    }

    pub fn render_metrics(&self) -> String {
        render_metrics(&self.metrics_snapshot())
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Stop the monitor and release upstream connections.
    pub async fn shutdown(&self) {
        self.stop_monitoring().await;
        self.upstream.close();
        tracing::info!("Ask service shut down");
    }
}

/// Configured cookie first, then the persisted one.
fn resolve_auth_cookie(api: &ApiConfig, session: &SessionStore) -> Result<String, ConfigError> {
    let configured = api.auth_cookie.as_deref().map(str::trim).filter(|c| !c.is_empty());

    if let Some(cookie) = configured {
        if session.auth_cookie().as_deref() != Some(cookie) {
            session.update_cookie(cookie);
        }
        return Ok(cookie.to_string());
    }

    session
        .auth_cookie()
        .filter(|c| !c.is_empty())
        .ok_or(ConfigError::MissingSecret("api.auth_cookie"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingUpstream {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Upstream for CountingUpstream {
        async fn request(&self, text: &str) -> Result<String, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ClientError::Status(503))
            } else {
                Ok(format!("answer to {text}"))
            }
        }
    }

    fn service(
        config: &GatewayConfig,
        upstream: CountingUpstream,
    ) -> (AskService, Arc<CountingUpstream>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let session = Arc::new(SessionStore::open(dir.path().join("session.json")));
        let upstream = Arc::new(upstream);
        let service = AskService::with_upstream(config, session, upstream.clone()).unwrap();
        (service, upstream, dir)
    }

    #[tokio::test]
    async fn test_second_ask_is_served_from_cache() {
        let (service, upstream, _dir) = service(&GatewayConfig::default(), CountingUpstream::default());

        assert_eq!(service.ask("2+2").await.unwrap(), "answer to 2+2");
        assert_eq!(service.ask("  2+2 ").await.unwrap(), "answer to 2+2");

        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.session().stats().total_requests, 1);
        let cache = service.cache().unwrap().stat();
        assert_eq!((cache.hits, cache.misses), (1, 1));
    }

    #[tokio::test]
    async fn test_validation_never_reaches_upstream() {
        let mut config = GatewayConfig::default();
        config.api.max_question_chars = 5;
        let (service, upstream, _dir) = service(&config, CountingUpstream::default());

        assert!(matches!(service.ask("   ").await, Err(ServiceError::Validation(_))));
        assert!(matches!(service.ask("too long").await, Err(ServiceError::Validation(_))));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_recorded() {
        let upstream = CountingUpstream { fail: true, ..Default::default() };
        let (service, _, _dir) = service(&GatewayConfig::default(), upstream);

        let err = service.ask("hello").await.unwrap_err();
        assert_eq!(err.status_code(), 502);
        assert_eq!(service.session().stats().error_count, 1);
        assert_eq!(service.cache().unwrap().stat().size, 0);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_calls_upstream() {
        let mut config = GatewayConfig::default();
        config.cache.enabled = false;
        let (service, upstream, _dir) = service(&config, CountingUpstream::default());

        service.ask("q").await.unwrap();
        service.ask("q").await.unwrap();
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
        assert!(service.metrics_snapshot().cache.is_none());
    }

    #[tokio::test]
    async fn test_health_status_probes_when_empty() {
        let (service, upstream, _dir) = service(&GatewayConfig::default(), CountingUpstream::default());
        assert!(service.latest_report().is_none());

        let report = service.health_status().await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 3);

        // Second call reuses the stored report
        service.health_status().await;
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 3);
        assert!(service.render_metrics().contains("askgate_health_status 1"));
    }

    #[test]
    fn test_cookie_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionStore::open(dir.path().join("session.json"));
        let mut api = ApiConfig::default();

        assert!(matches!(
            resolve_auth_cookie(&api, &session),
            Err(ConfigError::MissingSecret(_))
        ));

        api.auth_cookie = Some("from-config".into());
        assert_eq!(resolve_auth_cookie(&api, &session).unwrap(), "from-config");
        assert_eq!(session.auth_cookie().as_deref(), Some("from-config"));

        // Persisted cookie is used once configuration no longer carries one
        api.auth_cookie = None;
        assert_eq!(resolve_auth_cookie(&api, &session).unwrap(), "from-config");
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP surface settings (bind address, timeouts).
    pub server: ServerConfig,

    /// Upstream API settings.
    pub api: ApiConfig,

    /// Outbound rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Egress proxy pool.
    pub proxy: ProxyConfig,

    /// Response cache.
    pub cache: CacheConfig,

    /// Upstream health monitoring.
    pub health: HealthConfig,

    /// Durable session state.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time allowed for one inbound request, in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 60,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the upstream API.
    pub base_url: String,

    /// Path appended to `base_url` for question requests.
    pub endpoint_path: String,

    /// Per-attempt HTTP timeout in seconds.
    pub timeout_secs: u64,

    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_delay_ms: u64,

    /// JSON field carrying the answer in upstream responses.
    pub answer_field: String,

    /// Name of the authentication cookie.
    pub cookie_name: String,

    /// Authentication cookie value. Never logged.
    #[serde(skip_serializing)]
    pub auth_cookie: Option<String>,

    /// Longest accepted question, in characters.
    pub max_question_chars: usize,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.perplexity.ai/api".to_string(),
            endpoint_path: "/chat/async".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
            answer_field: "answer".to_string(),
            cookie_name: "p_token".to_string(),
            auth_cookie: None,
            max_question_chars: 4000,
        }
    }
}

/// Outbound rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sustained request rate.
    pub requests_per_minute: f64,

    /// Burst capacity (tokens available at startup).
    pub burst: f64,
}

impl RateLimitConfig {
    /// Token refill rate derived from the per-minute budget.
    pub fn refill_per_second(&self) -> f64 {
        self.requests_per_minute / 60.0
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 20.0,
            burst: 5.0,
        }
    }
}

/// Egress proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Route upstream calls through the proxy pool.
    pub enabled: bool,

    /// Rotate through the list in order instead of picking at random.
    pub rotation: bool,

    /// Proxy addresses (`http://host:port`, `host:port`, `host:port:user:pass`).
    pub proxies: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rotation: true,
            proxies: Vec::new(),
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the response cache.
    pub enabled: bool,

    /// Entry lifetime in seconds (0 = never expires).
    pub ttl_secs: u64,

    /// Maximum number of entries (0 = unbounded).
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            max_entries: 1000,
        }
    }
}

/// Health monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Start the background monitor with the server.
    pub enabled: bool,

    /// Seconds between probe cycles.
    pub interval_secs: u64,

    /// Deadline for each individual probe request, in seconds.
    pub probe_timeout_secs: u64,

    /// Canned questions issued on every probe cycle.
    pub probe_queries: Vec<String>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 300,
            probe_timeout_secs: 10,
            probe_queries: vec![
                "What day is it today?".to_string(),
                "Test ping".to_string(),
                "2 + 2".to_string(),
            ],
        }
    }
}

/// Session persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path of the JSON session file.
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: "data/session.json".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

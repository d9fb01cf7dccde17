//! Upstream API client.
//!
//! # Responsibilities
//! - Turn one question into throttled, retried, optionally proxied HTTP calls
//! - Validate the response and extract the answer
//! - Blacklist proxies that look responsible for a failure
//!
//! # Design Decisions
//! - One attempt = token + proxy pick + HTTP call + parse; retries re-run the
//!   whole attempt so a blacklisted proxy is not reused
//! - HTTP clients are created lazily, one per egress route, behind a mutex
//!   held only while looking up or building a client
//! - Malformed bodies are retried like transport errors but never blame the proxy

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::client::error::ClientError;
use crate::client::headers::{origin_of, AskPayload, HeaderTemplate};
use crate::client::Upstream;
use crate::config::{ApiConfig, ConfigError, ProxyConfig, RateLimitConfig};
use crate::egress::{ProxyEntry, ProxyManager};
use crate::observability::preview;
use crate::resilience::{retry, RateLimiter, RetryPolicy};

/// Connect timeout ceiling, independent of the overall request timeout.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Lazily built HTTP clients, keyed by proxy URL (`None` = direct).
#[derive(Default)]
struct HttpSession {
    clients: HashMap<Option<String>, reqwest::Client>,
}

/// Client for the upstream question-answering API.
pub struct ApiClient {
    endpoint: String,
    answer_field: String,
    timeout: Duration,
    headers: HeaderTemplate,
    limiter: RateLimiter,
    proxies: Option<ProxyManager>,
    policy: RetryPolicy,
    session: Mutex<Option<HttpSession>>,
}

impl ApiClient {
    pub fn new(
        api: &ApiConfig,
        rate_limit: &RateLimitConfig,
        proxy: &ProxyConfig,
        auth_cookie: &str,
    ) -> Result<Self, ConfigError> {
        let limiter = RateLimiter::new(rate_limit.refill_per_second(), rate_limit.burst)
            .map_err(|e| ConfigError::Invalid(format!("rate_limit: {}", e)))?;

        let origin = origin_of(&api.base_url).map_err(ConfigError::Invalid)?;
        let headers = HeaderTemplate::new(&origin, &api.cookie_name, auth_cookie)
            .map_err(ConfigError::Invalid)?;

        let proxies = if proxy.enabled && !proxy.proxies.is_empty() {
            Some(ProxyManager::new(&proxy.proxies, proxy.rotation))
        } else {
            None
        };

        let endpoint = format!(
            "{}/{}",
            api.base_url.trim_end_matches('/'),
            api.endpoint_path.trim_start_matches('/')
        );

        tracing::info!(
            endpoint = %endpoint,
            proxies = proxies.as_ref().map_or(0, ProxyManager::len),
            max_retries = api.max_retries,
            "API client configured"
        );

        Ok(Self {
            endpoint,
            answer_field: api.answer_field.clone(),
            timeout: api.timeout(),
            headers,
            limiter,
            proxies,
            policy: RetryPolicy::new(api.max_retries, api.retry_delay()),
            session: Mutex::new(None),
        })
    }

    /// Proxy pool, if proxying is enabled.
    pub fn proxies(&self) -> Option<&ProxyManager> {
        self.proxies.as_ref()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Drop every HTTP client. Idempotent; the next request starts a new session.
    pub fn close(&self) {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner).take();
        if session.is_some() {
            tracing::info!("HTTP session closed");
        }
    }

    /// One attempt: token, proxy, call, parse.
    async fn attempt(&self, text: &str) -> Result<String, ClientError> {
        self.limiter.acquire().await;

        let proxy = self.proxies.as_ref().and_then(ProxyManager::select);
        let client = self.http_client(proxy.as_deref())?;

        let result = self.call(&client, text).await;

        if let (Err(e), Some(addr)) = (&result, proxy.as_deref()) {
            if e.blames_proxy() {
                if let Some(pool) = &self.proxies {
                    pool.mark_failed(addr);
                }
            }
        }

        result
    }

    async fn call(&self, client: &reqwest::Client, text: &str) -> Result<String, ClientError> {
        let response = client
            .post(&self.endpoint)
            .headers(self.headers.render())
            .json(&AskPayload::new(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Upstream rejected request");
            return Err(ClientError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_answer(&body, &self.answer_field)
    }

    fn http_client(&self, proxy: Option<&str>) -> Result<reqwest::Client, ClientError> {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let session = guard.get_or_insert_with(|| {
            tracing::debug!("Opening HTTP session");
            HttpSession::default()
        });

        let key = proxy.map(str::to_string);
        if let Some(client) = session.clients.get(&key) {
            return Ok(client.clone());
        }

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout.min(MAX_CONNECT_TIMEOUT));

        builder = match proxy {
            Some(addr) => {
                let shown = ProxyEntry { address: addr.to_string() };
                tracing::debug!(proxy = %shown, "Building proxied HTTP client");
                builder.proxy(reqwest::Proxy::all(addr)?)
            }
            None => builder.no_proxy(),
        };

        let client = builder.build()?;
        session.clients.insert(key, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Upstream for ApiClient {
    async fn request(&self, text: &str) -> Result<String, ClientError> {
        tracing::debug!(question = %preview(text), "Sending upstream request");
        retry(&self.policy, || self.attempt(text)).await
    }

    fn close(&self) {
        ApiClient::close(self);
    }
}

/// Extract the string at `field` from a JSON body.
pub fn parse_answer(body: &str, field: &str) -> Result<String, ClientError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ClientError::MalformedBody(e.to_string()))?;

    match value.get(field).and_then(serde_json::Value::as_str) {
        Some(answer) => Ok(answer.to_string()),
        None => Err(ClientError::MissingField(field.to_string())),
    }
}

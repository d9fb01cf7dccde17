//! Request headers and payload.
//!
//! # Design Decisions
//! - The user agent is drawn per call from a fixed pool of desktop browsers
//! - Everything else is static for the lifetime of the client

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, ORIGIN,
    REFERER, USER_AGENT,
};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

const ENTITLEMENT_HEADER: HeaderName = HeaderName::from_static("x-pph-pro-entitlement");

/// Static part of the request headers, built once per client.
#[derive(Debug, Clone)]
pub struct HeaderTemplate {
    base: HeaderMap,
}

impl HeaderTemplate {
    /// Build the template. Fails if the origin or cookie is not a valid header value.
    pub fn new(origin: &str, cookie_name: &str, cookie: &str) -> Result<Self, String> {
        let value = |raw: &str, what: &str| {
            HeaderValue::from_str(raw).map_err(|_| format!("{} is not a valid header value", what))
        };

        let mut base = HeaderMap::new();
        base.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        base.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        base.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        base.insert(ORIGIN, value(origin, "origin")?);
        base.insert(REFERER, value(&format!("{}/", origin), "referer")?);
        base.insert(ENTITLEMENT_HEADER, HeaderValue::from_static("false"));

        let mut cookie_value = value(&format!("{}={}", cookie_name, cookie), "auth cookie")?;
        cookie_value.set_sensitive(true);
        base.insert(COOKIE, cookie_value);

        Ok(Self { base })
    }

    /// Headers for one call, with a freshly drawn user agent.
    pub fn render(&self) -> HeaderMap {
        let mut headers = self.base.clone();
        headers.insert(USER_AGENT, HeaderValue::from_static(random_user_agent()));
        headers
    }
}

pub fn random_user_agent() -> &'static str {
    USER_AGENTS[fastrand::usize(..USER_AGENTS.len())]
}

/// Scheme + host (+ port) of `base_url`, as sent in `Origin`.
pub fn origin_of(base_url: &str) -> Result<String, String> {
    let url = url::Url::parse(base_url).map_err(|e| format!("invalid base_url: {}", e))?;
    match url.origin() {
        origin @ url::Origin::Tuple(..) => Ok(origin.ascii_serialization()),
        url::Origin::Opaque(_) => Err(format!("base_url '{}' has no origin", base_url)),
    }
}

/// JSON body of one upstream call.
#[derive(Debug, Serialize)]
pub struct AskPayload<'a> {
    pub id: Uuid,
    pub version: &'static str,
    pub source: &'static str,
    pub text: &'a str,
    pub timestamp: u64,
    pub previous_messages: &'static [serde_json::Value],
    pub attachments: &'static [serde_json::Value],
}

impl<'a> AskPayload<'a> {
    pub fn new(text: &'a str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            id: Uuid::new_v4(),
            version: "0.0",
            source: "user",
            text,
            timestamp,
            previous_messages: &[],
            attachments: &[],
        }
    }
}

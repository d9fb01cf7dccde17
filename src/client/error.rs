//! Upstream client errors.

use thiserror::Error;

/// Statuses that point at the egress proxy rather than the upstream.
pub const PROXY_SUSPECT_STATUSES: [u16; 6] = [403, 407, 408, 502, 503, 504];

/// Failure of one upstream attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("malformed response body: {0}")]
    MalformedBody(String),

    #[error("response is missing field '{0}'")]
    MissingField(String),

    #[error("HTTP session error: {0}")]
    Session(String),
}

impl ClientError {
    /// The upstream answered, but not with something we can use.
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, Self::MalformedBody(_) | Self::MissingField(_))
    }

    pub fn is_proxy_suspect_status(&self) -> bool {
        matches!(self, Self::Status(code) if PROXY_SUSPECT_STATUSES.contains(code))
    }

    /// Whether the proxy used for the failed attempt should be blacklisted.
    pub fn blames_proxy(&self) -> bool {
        self.is_proxy_suspect_status() || matches!(self, Self::Connection(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_builder() {
            Self::Session(e.to_string())
        } else {
            Self::Connection(e.to_string())
        }
    }
}

//! Boundary errors of the ask service.

use thiserror::Error;

use crate::client::ClientError;

/// Message returned to callers for upstream failures.
pub const UPSTREAM_MESSAGE: &str = "Upstream service unavailable";

/// Message returned to callers for anything unclassified.
pub const UNEXPECTED_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The caller sent something unusable.
    #[error("{0}")]
    Validation(String),

    /// The upstream failed after retries.
    #[error("upstream failure: {0}")]
    Upstream(#[from] ClientError),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl ServiceError {
    /// HTTP status for the boundary: 400 / 502 / 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Upstream(_) => 502,
            Self::Unexpected(_) => 500,
        }
    }

    /// Text safe to show callers. Internal detail only for validation errors.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Upstream(_) => UPSTREAM_MESSAGE.to_string(),
            Self::Unexpected(_) => UNEXPECTED_MESSAGE.to_string(),
        }
    }
}

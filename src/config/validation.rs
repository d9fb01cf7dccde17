//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rates > 0, intervals > 0, burst >= 0)
//! - Check that URLs, bind addresses and proxy entries parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::egress::ProxyEntry;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }

    match url::Url::parse(&config.api.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "api.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("api.base_url", e.to_string())),
    }
    if config.api.timeout_secs == 0 {
        errors.push(ValidationError::new("api.timeout_secs", "must be > 0"));
    }
    if config.api.max_retries == 0 {
        errors.push(ValidationError::new("api.max_retries", "must be >= 1"));
    }
    if config.api.answer_field.trim().is_empty() {
        errors.push(ValidationError::new("api.answer_field", "must not be empty"));
    }
    if config.api.cookie_name.trim().is_empty() {
        errors.push(ValidationError::new("api.cookie_name", "must not be empty"));
    }
    if config.api.max_question_chars == 0 {
        errors.push(ValidationError::new("api.max_question_chars", "must be > 0"));
    }

    if !(config.rate_limit.requests_per_minute > 0.0) {
        errors.push(ValidationError::new("rate_limit.requests_per_minute", "must be > 0"));
    }
    if !(config.rate_limit.burst >= 0.0) {
        errors.push(ValidationError::new("rate_limit.burst", "must be >= 0"));
    }

    for raw in &config.proxy.proxies {
        if let Err(e) = ProxyEntry::parse(raw) {
            errors.push(ValidationError::new("proxy.proxies", e));
        }
    }
    if config.proxy.enabled && config.proxy.proxies.is_empty() {
        tracing::warn!("Proxy enabled but the proxy list is empty; requests will go direct");
    }

    if config.health.interval_secs == 0 {
        errors.push(ValidationError::new("health.interval_secs", "must be > 0"));
    }
    if config.health.probe_timeout_secs == 0 {
        errors.push(ValidationError::new("health.probe_timeout_secs", "must be > 0"));
    }
    if config.health.probe_queries.is_empty() {
        errors.push(ValidationError::new("health.probe_queries", "must not be empty"));
    }

    if config.session.path.trim().is_empty() {
        errors.push(ValidationError::new("session.path", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.api.base_url = "not a url".to_string();
        config.rate_limit.requests_per_minute = 0.0;
        config.rate_limit.burst = -1.0;
        config.health.interval_secs = 0;
        config.proxy.proxies = vec!["10.0.0.1:notaport".to_string()];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();

        assert_eq!(
            fields,
            vec![
                "api.base_url",
                "rate_limit.requests_per_minute",
                "rate_limit.burst",
                "proxy.proxies",
                "health.interval_secs",
            ]
        );
    }

    #[test]
    fn test_zero_burst_is_allowed() {
        let mut config = GatewayConfig::default();
        config.rate_limit.burst = 0.0;
        assert!(validate_config(&config).is_ok());
    }
}

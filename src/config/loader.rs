//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "ASKGATE";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    Env { key: String, value: String },
    MissingSecret(&'static str),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::Env { key, value } => {
                write!(f, "Environment variable {} has unparseable value '{}'", key, value)
            }
            ConfigError::MissingSecret(name) => write!(f, "Missing required secret: {}", name),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: GatewayConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<GatewayConfig, ConfigError> {
    if path.exists() {
        return load_config(path);
    }

    tracing::info!(path = %path.display(), "Config file not found, using defaults");
    let mut config = GatewayConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay `ASKGATE_<SECTION>_<FIELD>` values onto `config`.
///
/// Each value is parsed into the field's type exactly once; a value that
/// does not parse is an error rather than a silent fallback.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvOverlay { lookup };

    env.apply("SERVER_BIND_ADDRESS", &mut config.server.bind_address)?;
    env.apply("SERVER_REQUEST_TIMEOUT_SECS", &mut config.server.request_timeout_secs)?;
    env.apply("SERVER_MAX_BODY_BYTES", &mut config.server.max_body_bytes)?;

    env.apply("API_BASE_URL", &mut config.api.base_url)?;
    env.apply("API_ENDPOINT_PATH", &mut config.api.endpoint_path)?;
    env.apply("API_TIMEOUT_SECS", &mut config.api.timeout_secs)?;
    env.apply("API_MAX_RETRIES", &mut config.api.max_retries)?;
    env.apply("API_RETRY_DELAY_MS", &mut config.api.retry_delay_ms)?;
    env.apply("API_ANSWER_FIELD", &mut config.api.answer_field)?;
    env.apply("API_COOKIE_NAME", &mut config.api.cookie_name)?;
    env.apply("API_MAX_QUESTION_CHARS", &mut config.api.max_question_chars)?;
    if let Some(cookie) = env.raw("API_AUTH_COOKIE") {
        config.api.auth_cookie = Some(cookie);
    }

    env.apply("RATE_LIMIT_REQUESTS_PER_MINUTE", &mut config.rate_limit.requests_per_minute)?;
    env.apply("RATE_LIMIT_BURST", &mut config.rate_limit.burst)?;

    env.apply_bool("PROXY_ENABLED", &mut config.proxy.enabled)?;
    env.apply_bool("PROXY_ROTATION", &mut config.proxy.rotation)?;
    if let Some(list) = env.raw("PROXY_PROXIES") {
        config.proxy.proxies = list
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
    }

    env.apply_bool("CACHE_ENABLED", &mut config.cache.enabled)?;
    env.apply("CACHE_TTL_SECS", &mut config.cache.ttl_secs)?;
    env.apply("CACHE_MAX_ENTRIES", &mut config.cache.max_entries)?;

    env.apply_bool("HEALTH_ENABLED", &mut config.health.enabled)?;
    env.apply("HEALTH_INTERVAL_SECS", &mut config.health.interval_secs)?;
    env.apply("HEALTH_PROBE_TIMEOUT_SECS", &mut config.health.probe_timeout_secs)?;

    env.apply("SESSION_PATH", &mut config.session.path)?;

    env.apply("OBSERVABILITY_LOG_LEVEL", &mut config.observability.log_level)?;
    if let Some(format) = env.raw("OBSERVABILITY_LOG_FORMAT") {
        config.observability.log_format = match format.to_ascii_lowercase().as_str() {
            "pretty" => crate::config::schema::LogFormat::Pretty,
            "json" => crate::config::schema::LogFormat::Json,
            _ => return Err(env.error("OBSERVABILITY_LOG_FORMAT", format)),
        };
    }

    Ok(())
}

struct EnvOverlay<F> {
    lookup: F,
}

impl<F> EnvOverlay<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn key(suffix: &str) -> String {
        format!("{}_{}", ENV_PREFIX, suffix)
    }

    fn raw(&self, suffix: &str) -> Option<String> {
        (self.lookup)(&Self::key(suffix))
    }

    fn error(&self, suffix: &str, value: String) -> ConfigError {
        ConfigError::Env { key: Self::key(suffix), value }
    }

    fn apply<T: FromStr>(&self, suffix: &str, field: &mut T) -> Result<(), ConfigError> {
        if let Some(raw) = self.raw(suffix) {
            *field = raw.trim().parse().map_err(|_| self.error(suffix, raw.clone()))?;
        }
        Ok(())
    }

    fn apply_bool(&self, suffix: &str, field: &mut bool) -> Result<(), ConfigError> {
        if let Some(raw) = self.raw(suffix) {
            *field = match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => return Err(self.error(suffix, raw)),
            };
        }
        Ok(())
    }
}

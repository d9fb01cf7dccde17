//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, ASKGATE_* environment overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → passed by reference to every constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; populated once at startup
//! - All fields have defaults to allow minimal configs
//! - Environment values are parsed into typed fields, never inferred at use sites
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::GatewayConfig;
pub use schema::{
    ApiConfig, CacheConfig, HealthConfig, LogFormat, ObservabilityConfig, ProxyConfig,
    RateLimitConfig, ServerConfig, SessionConfig,
};

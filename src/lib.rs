//! askgate: resilient gateway to a rate-limited question-answering API.

// Core
pub mod cache;
pub mod client;
pub mod config;
pub mod egress;
pub mod health;
pub mod service;
pub mod session;

// Surfaces
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use service::{AskService, ServiceError};

//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, trace span, timeout, body limit)
//!     → handler → AskService
//!     → response.rs (ServiceError → 400 / 502 / 500 JSON)
//!     → Send to client
//! ```

pub mod response;
pub mod server;

pub use response::ErrorBody;
pub use server::{
    AskRequest, AskResponse, HttpServer, INVALID_BODY_MESSAGE, METRICS_CONTENT_TYPE, X_REQUEST_ID,
};

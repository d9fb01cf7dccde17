//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Serve on a listener until shutdown is signalled
//!
//! # Routes
//! - `POST /api/ask` `{"question"}` → `{"answer"}`
//! - `GET /api/health` → latest health report
//! - `GET /api/status` → health, cache and session overview
//! - `GET /metrics` (alias `/stats`) → Prometheus plaintext

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderName},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::health::HealthReport;
use crate::service::{AskService, ServiceError, ServiceStatus};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Message for ask bodies that are not `{"question": "<text>"}` JSON.
pub const INVALID_BODY_MESSAGE: &str = "Invalid JSON body";

/// Prometheus text exposition content type.
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

/// HTTP front end for the ask service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ServerConfig, service: Arc<AskService>) -> Self {
        Self {
            router: Self::build_router(config, service),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, service: Arc<AskService>) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id
                )
            }))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)));

        Router::new()
            .route("/api/ask", post(ask_handler))
            .route("/api/health", get(health_handler))
            .route("/api/status", get(status_handler))
            .route("/metrics", get(metrics_handler))
            .route("/stats", get(metrics_handler))
            .with_state(service)
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(middleware)
    }

    /// Router with all layers, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn ask_handler(
    State(service): State<Arc<AskService>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ServiceError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Rejected ask body");
        ServiceError::Validation(INVALID_BODY_MESSAGE.to_string())
    })?;

    let answer = service.ask(&request.question).await?;
    Ok(Json(AskResponse { answer }))
}

async fn health_handler(State(service): State<Arc<AskService>>) -> Json<HealthReport> {
    Json(service.health_status().await)
}

async fn status_handler(State(service): State<Arc<AskService>>) -> Json<ServiceStatus> {
    Json(service.status())
}

async fn metrics_handler(State(service): State<Arc<AskService>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)],
        service.render_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, Upstream};
    use crate::config::GatewayConfig;
    use crate::http::response::ErrorBody;
    use crate::service::error::UPSTREAM_MESSAGE;
    use crate::session::SessionStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    struct FixedUpstream(Result<String, ClientError>);

    #[async_trait]
    impl Upstream for FixedUpstream {
        async fn request(&self, _text: &str) -> Result<String, ClientError> {
            self.0.clone()
        }
    }

    fn router(upstream: FixedUpstream) -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig::default();
        let session = Arc::new(SessionStore::open(dir.path().join("session.json")));
        let service = AskService::with_upstream(&config, session, Arc::new(upstream)).unwrap();
        let server = HttpServer::new(&config.server, Arc::new(service));
        (server.router(), dir)
    }

    fn ask(body: &str) -> Request {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/ask")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_of(response: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_ask_returns_answer() {
        let (app, _dir) = router(FixedUpstream(Ok("4".into())));

        let response = app.oneshot(ask(r#"{"question":"2+2"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));

        let body: AskResponse = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body.answer, "4");
    }

    #[tokio::test]
    async fn test_validation_errors_are_400() {
        let (app, _dir) = router(FixedUpstream(Ok("4".into())));

        let response = app.clone().oneshot(ask(r#"{"question":"   "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_slice(&body_of(response).await).unwrap();
        assert!(body.error.contains("empty"));

        let response = app.clone().oneshot(ask("not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body.error, INVALID_BODY_MESSAGE);

        let response = app.oneshot(ask(r#"{"prompt":"2+2"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body.error, INVALID_BODY_MESSAGE);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GatewayConfig::default();
        config.server.max_body_bytes = 64;
        let session = Arc::new(SessionStore::open(dir.path().join("session.json")));
        let upstream = Arc::new(FixedUpstream(Ok("4".into())));
        let service = AskService::with_upstream(&config, session, upstream).unwrap();
        let app = HttpServer::new(&config.server, Arc::new(service)).router();

        let question = "x".repeat(200);
        let body = serde_json::json!({ "question": question }).to_string();
        let response = app.oneshot(ask(&body)).await.unwrap();
        assert!(response.status().is_client_error(), "got {}", response.status());
    }

    #[tokio::test]
    async fn test_upstream_errors_are_502_without_detail() {
        let (app, _dir) = router(FixedUpstream(Err(ClientError::Connection(
            "proxy 10.0.0.1 refused".into(),
        ))));

        let response = app.oneshot(ask(r#"{"question":"hi"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: ErrorBody = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body.error, UPSTREAM_MESSAGE);
    }

    #[tokio::test]
    async fn test_metrics_and_alias() {
        let (app, _dir) = router(FixedUpstream(Ok("4".into())));

        for uri in ["/metrics", "/stats"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[header::CONTENT_TYPE], METRICS_CONTENT_TYPE);
            let text = String::from_utf8(body_of(response).await).unwrap();
            assert!(text.contains("askgate_uptime_seconds"));
        }
    }

    #[tokio::test]
    async fn test_health_and_status() {
        let (app, _dir) = router(FixedUpstream(Ok("ok".into())));

        let response = app.clone().oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(health["status"], "healthy");

        let response = app.oneshot(get("/api/status")).await.unwrap();
        let status: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(status["health"]["status"], "healthy");
        assert_eq!(status["monitoring"], false);
        assert_eq!(status["session"]["total_requests"], 0);
    }
}

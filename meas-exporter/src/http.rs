//! HTTP server for the Prometheus metrics endpoint.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

use crate::exposition::{self, SharedExposition};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    exposition: SharedExposition,
}

/// Create the HTTP router.
pub fn create_router(exposition: SharedExposition, metrics_path: &str) -> Router {
    let state = AppState { exposition };

    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the metrics endpoint.
///
/// Fetching and encoding is blocking work, so it runs off the async workers.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let exposition = state.exposition.clone();
    let rendered = tokio::task::spawn_blocking(move || exposition.render()).await;

    match rendered {
        Ok(Ok(body)) => {
            debug!(bytes = body.len(), "Served scrape");
            (
                StatusCode::OK,
                [(CONTENT_TYPE, exposition::CONTENT_TYPE)],
                body,
            )
                .into_response()
        }
        Ok(Err(e)) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics\n").into_response()
        }
        Err(e) => {
            error!(error = %e, "Scrape task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "scrape failed\n").into_response()
        }
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// Handler for the /ready endpoint.
async fn ready_handler(State(state): State<AppState>) -> Response {
    if state.exposition.converter_count() > 0 {
        (StatusCode::OK, "ready\n").into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "not ready - no meas tables configured\n",
        )
            .into_response()
    }
}

/// HTTP server configuration.
pub struct HttpServer {
    exposition: SharedExposition,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(exposition: SharedExposition, listen_addr: SocketAddr, metrics_path: String) -> Self {
        Self {
            exposition,
            listen_addr,
            metrics_path,
        }
    }

    /// Bind the listener. Failure here is fatal for the exporter.
    pub async fn bind(self) -> anyhow::Result<BoundServer> {
        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        let local_addr = listener.local_addr()?;
        info!(
            addr = %local_addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        Ok(BoundServer {
            router: create_router(self.exposition, &self.metrics_path),
            listener,
            local_addr,
        })
    }

    /// Bind and run the HTTP server until the shutdown signal is received.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        self.bind().await?.serve(shutdown).await
    }
}

/// A server whose listener is already bound.
pub struct BoundServer {
    router: Router,
    listener: tokio::net::TcpListener,
    local_addr: SocketAddr,
}

impl BoundServer {
    /// The actual listening address (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests until the shutdown signal is received.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                // Wait for shutdown signal
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MeasCollector;
    use crate::config::{SourceConfig, TableConfig};
    use crate::exposition::Exposition;
    use crate::tables::{TableKind, build_collector};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn sample_exposition() -> SharedExposition {
        let collector = build_collector(&[TableConfig {
            table: TableKind::Diameter,
            source: SourceConfig::Sample,
        }])
        .unwrap();
        Arc::new(Exposition::new(collector))
    }

    fn empty_exposition() -> SharedExposition {
        Arc::new(Exposition::new(MeasCollector::default()))
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let router = create_router(sample_exposition(), "/metrics");

        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().contains("openmetrics-text"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("diamsch_sent_messages_total{type=\"CCR\"}"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_no_tables() {
        let router = create_router(empty_exposition(), "/metrics");

        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let router = create_router(empty_exposition(), "/metrics");

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_endpoint_not_ready() {
        let router = create_router(empty_exposition(), "/metrics");

        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_ready_endpoint_ready() {
        let router = create_router(sample_exposition(), "/metrics");

        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_custom_metrics_path() {
        let router = create_router(sample_exposition(), "/prometheus/metrics");

        // Custom path should work
        let response = router
            .clone()
            .oneshot(
                Request::get("/prometheus/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Default path should 404
        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bind_conflict_fails() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        let server = HttpServer::new(empty_exposition(), addr, "/metrics".to_string());
        assert!(server.bind().await.is_err());
    }
}

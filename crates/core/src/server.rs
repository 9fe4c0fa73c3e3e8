// Copyright 2025 FIO Exporter Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP scrape endpoint.
//!
//! Provides:
//! - `/metrics` (and `/`) - Prometheus text exposition of the registry
//! - `/health` - liveness check with the number of published gauges

use crate::error::{Error, Result};
use crate::registry::MetricRegistry;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

/// Port the exporter listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 8088;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Create the router serving `registry`.
pub fn create_router(registry: Arc<MetricRegistry>) -> Router {
    Router::new()
        .route("/", get(metrics_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(registry)
}

async fn metrics_handler(State(registry): State<Arc<MetricRegistry>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        registry.render(),
    )
}

async fn health_handler(State(registry): State<Arc<MetricRegistry>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "metrics": registry.len(),
    }))
}

/// Bind `addr` and serve `registry` on a spawned task.
///
/// Binding happens before this returns so that a busy port is reported to
/// the caller instead of being lost inside the task.
pub async fn start_server(
    addr: SocketAddr,
    registry: Arc<MetricRegistry>,
) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
    let listener = TcpListener::bind(addr).await.map_err(Error::Server)?;
    let local_addr = listener.local_addr().map_err(Error::Server)?;
    let router = create_router(registry);

    info!(addr = %local_addr, "Serving metrics");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .map_err(Error::Server)
    });
    Ok((local_addr, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_body(router: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_endpoint_renders_registry() {
        let registry = Arc::new(MetricRegistry::new());
        registry
            .record("fio_read_clat_min", "FIO read clat min (ns)", 6505387.0)
            .unwrap();

        let (status, content_type, text) =
            get_body(create_router(Arc::clone(&registry)), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(EXPOSITION_CONTENT_TYPE));
        assert!(text.contains("# HELP fio_read_clat_min FIO read clat min (ns)"));
        assert!(text.contains(r#"fio_read_clat_min{model="fioparser",unit="no-juju"} 6505387"#));
    }

    #[tokio::test]
    async fn test_root_serves_metrics_too() {
        let registry = Arc::new(MetricRegistry::new());
        registry.record("fio_write_iops", "FIO write IOPS", 3.0).unwrap();

        let (status, _, text) = get_body(create_router(registry), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("fio_write_iops"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let registry = Arc::new(MetricRegistry::new());
        registry.record("fio_write_iops", "FIO write IOPS", 3.0).unwrap();

        let (status, _, text) = get_body(create_router(registry), "/health").await;
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["metrics"], 1);
    }

    #[tokio::test]
    async fn test_start_server_reports_bound_address() {
        let registry = Arc::new(MetricRegistry::new());
        let (addr, handle) = start_server("127.0.0.1:0".parse().unwrap(), registry)
            .await
            .unwrap();
        assert_ne!(addr.port(), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_busy_port_is_an_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = start_server(addr, Arc::new(MetricRegistry::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Server(_)));
    }
}

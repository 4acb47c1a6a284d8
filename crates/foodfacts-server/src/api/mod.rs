//! HTTP application
//!
//! Product routes are mounted twice, at `/products` and `/api/products`;
//! existing clients use the `/api` prefix.

use std::future::IntoFuture;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;

use crate::config::CorsConfig;
use crate::features::{self, FeatureState};
use crate::middleware;

pub fn create_router(state: FeatureState, cors: &CorsConfig) -> Router {
    let products = features::product_router(state.clone());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health).with_state(state))
        .nest("/products", products.clone())
        .nest("/api/products", products)
        .layer(CompressionLayer::new())
        .layer(middleware::cors_layer(cors))
        .layer(middleware::tracing_layer())
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Food Facts API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health(State(state): State<FeatureState>) -> Response {
    match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": e.to_string() })),
            )
                .into_response()
        },
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}

/// Serve `app` until a shutdown signal, then give open connections
/// `shutdown_timeout` to finish.
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown_timeout: Duration,
) -> std::io::Result<()> {
    let shutdown = std::sync::Arc::new(tokio::sync::Notify::new());
    let trigger = shutdown.clone();

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        trigger.notify_one();
    })
    .into_future();

    tokio::select! {
        result = server => result,
        _ = async {
            shutdown.notified().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!(
                timeout_secs = shutdown_timeout.as_secs(),
                "Shutdown timeout elapsed, closing remaining connections"
            );
            Ok(())
        },
    }
}

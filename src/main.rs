//! IoT Threat Verdict Server
//!
//! Classifies IoT security telemetry submitted through an HTML form or the
//! JSON API and renders a "threat mitigated / threat detected" verdict.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    THREAT VERDICT                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  Form /   │  │  Feature  │  │  Inference              │ │
//! │  │  JSON API │─▶│  Adapter  │─▶│  (ONNX or heuristic)    │ │
//! │  │  (Axum)   │  │           │  │                         │ │
//! │  └───────────┘  └───────────┘  └────────────┬────────────┘ │
//! │                                             ▼              │
//! │                                    ┌────────────────┐      │
//! │                                    │  Model Store   │      │
//! │                                    │  (models/)     │      │
//! │                                    └────────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod models;
mod inference;
mod handlers;
mod views;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inference::ModelStore;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "threat_verdict=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Threat Verdict server starting ({})...", config.environment);

    // Load models once; missing artifacts degrade to the heuristic
    let store = ModelStore::load(&config);
    if store.loaded_count() == 0 {
        if config.is_production() {
            tracing::error!("No models loaded in production; every verdict comes from the heuristic fallback");
        } else {
            tracing::warn!("No models loaded; using heuristic fallback");
        }
    }

    let state = AppState {
        store: Arc::new(store),
        config: config.clone(),
    };

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ModelStore>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    tracing::debug!("Models directory: {}", state.config.models_dir.display());

    Router::new()
        .route("/health", get(handlers::health::check))
        // Browser form
        .route("/", get(handlers::analyze::form).post(handlers::analyze::submit))
        .route("/analyze", get(handlers::analyze::form).post(handlers::analyze::submit))
        .route("/home", get(handlers::analyze::form))
        // JSON API
        .route("/api/predict", post(handlers::api::predict))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    use crate::test_support::{body_json, fallback_router};

    #[tokio::test]
    async fn test_health_reports_fallback() {
        let response = fallback_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["models_loaded"], 0);
        assert_eq!(body["fallback_active"], true);
        assert_eq!(body["models"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = fallback_router()
            .oneshot(Request::get("/does-not-exist").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

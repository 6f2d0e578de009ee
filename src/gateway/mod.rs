//! Axum HTTP surface with body limits and request timeouts.
//!
//! Routes:
//! - `POST /chat` `{ sessionId, message }` → `{ reply, persona }`
//! - `POST /speech` `{ sessionId, text }` → audio bytes
//! - `POST /session/reset` `{ sessionId }` → `{ status, persona }`
//! - `GET /health`

mod handlers;

use handlers::{
    handle_chat, handle_health, handle_reset, handle_speech, structure_layer_rejection,
};

use crate::config::{MAX_BODY_BYTES, REQUEST_TIMEOUT};
use crate::dialogue::Orchestrator;
use crate::speech::SpeechService;
use crate::storage::FailoverKv;
use anyhow::Result;
use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    middleware::map_response,
    routing::{get, post},
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub speech: Arc<SpeechService>,
    pub storage: Arc<FailoverKv>,
}

// Fields are optional so a missing one maps to MISSING_FIELD instead of a
// generic deserialization rejection.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    pub session_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechBody {
    pub session_id: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetBody {
    pub session_id: Option<String>,
}

pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    let mut app = Router::new()
        .route("/health", get(handle_health))
        .route("/chat", post(handle_chat))
        .route("/speech", post(handle_speech))
        .route("/session/reset", post(handle_reset))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(map_response(structure_layer_rejection));

    if !cors_origins.is_empty() {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        );
    }

    app
}

/// Bind `host:port` and serve until Ctrl-C.
pub async fn run_gateway(
    host: &str,
    port: u16,
    state: AppState,
    cors_origins: &[String],
) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_gateway_with_listener(listener, state, cors_origins).await
}

/// Serve from a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    state: AppState,
    cors_origins: &[String],
) -> Result<()> {
    let local_addr = listener.local_addr()?;
    let backend = state.storage.active_backend().to_string();

    println!("◆ Parley gateway listening on http://{local_addr}");
    println!("  POST /chat");
    println!("  POST /speech");
    println!("  POST /session/reset");
    println!("  GET  /health");
    println!("  storage: {backend}");
    tracing::info!(addr = %local_addr, storage = %backend, "gateway started");

    let app = build_app(state, cors_origins);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

//! REST and WebSocket routes

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use hud_gpu::{GpuSampler, GpuSnapshot};
use hud_ollama::{OllamaSampler, OllamaStats};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::Result;

/// Shared handler state: both samplers plus the push-stream cadence. The
/// publisher itself is stateless; it only reads the samplers' latest
/// snapshots.
#[derive(Clone)]
pub struct AppState {
    pub gpu: Arc<GpuSampler>,
    pub ollama: Arc<OllamaSampler>,
    pub stream_interval: Duration,
}

/// Create the Axum application
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api/gpus", get(gpus_handler))
        .route("/api/ollama/stats", get(ollama_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serve the application until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    info!("listening on {}", listener.local_addr()?);
    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Handler for /api/gpus
async fn gpus_handler(State(state): State<AppState>) -> Response {
    match state.gpu.latest().await {
        Some(snapshot) => Json(snapshot.as_ref()).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "no data yet").into_response(),
    }
}

/// Handler for /api/ollama/stats
async fn ollama_handler(State(state): State<AppState>) -> Response {
    match state.ollama.latest().await {
        Some(stats) => Json(stats.as_ref()).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "no data yet").into_response(),
    }
}

/// Handler for /health
async fn health_handler() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
        .into_response()
}

/// Handler for /ws: upgrade and stream snapshots until the client goes away.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| stream_snapshots(socket, state))
}

/// Push both latest snapshots on every tick. The connection ends on the
/// first failed write; other connections and the samplers are unaffected.
async fn stream_snapshots(mut socket: WebSocket, state: AppState) {
    let mut ticker = tokio::time::interval(state.stream_interval);
    // Skip the interval's immediate first tick so the first push lands one
    // full period after the upgrade.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let gpu = state.gpu.latest().await;
        let ollama = state.ollama.latest().await;
        let payload = stream_payload(gpu.as_deref(), ollama.as_deref());

        let text = match serde_json::to_string(&payload) {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to serialize stream payload: {}", e);
                break;
            }
        };

        if socket.send(Message::Text(text.into())).await.is_err() {
            debug!("websocket client disconnected");
            break;
        }
    }
}

/// One stream frame. A sampler with no data yet contributes `null`.
fn stream_payload(gpu: Option<&GpuSnapshot>, ollama: Option<&OllamaStats>) -> serde_json::Value {
    json!({
        "gpu": gpu,
        "ollama": ollama,
    })
}

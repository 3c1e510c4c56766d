//! # hud-server
//!
//! REST and WebSocket publisher for gpuhud.
//!
//! The server owns no sampling logic: it holds both samplers, reads their
//! latest snapshots on demand (REST) or on a fixed cadence (WebSocket
//! stream), and serializes them. Routes:
//!
//! - `GET /api/gpus` — latest GPU snapshot, or 503 before the first
//!   successful poll
//! - `GET /api/ollama/stats` — latest Ollama snapshot, same contract
//! - `GET /ws` — once per second, pushes `{gpu, ollama}` with `null` for a
//!   sampler that has no data yet
//! - `GET /health` — process liveness

pub mod config;
pub mod http;

// Re-export main types
pub use config::{LoggingConfig, ServerConfig};
pub use http::{create_app, serve, AppState};

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur while starting or running the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("GPU sampler error: {0}")]
    Gpu(#[from] hud_gpu::GpuError),

    #[error("Ollama sampler error: {0}")]
    Ollama(#[from] hud_ollama::OllamaError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize logging and tracing
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match config.format.as_str() {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }

    Ok(())
}

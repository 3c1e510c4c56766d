//! # hud-ollama
//!
//! Ollama runtime state sampling and memory-budget derivation.
//!
//! This crate provides:
//! - A typed client for the Ollama HTTP API (liveness, version, model
//!   catalog, running models, verbose model introspection)
//! - A per-model-name architecture metadata cache
//! - KV-cache sizing and VRAM breakdown derivation from architecture
//!   metadata that no single upstream call reports
//! - A background sampler ([`OllamaSampler`]) publishing one immutable
//!   [`OllamaStats`] snapshot per cycle
//!
//! ## Example
//!
//! ```rust,no_run
//! use hud_ollama::{OllamaSampler, OllamaSamplerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OllamaSamplerConfig::from_env();
//!     let sampler = OllamaSampler::new(config)?;
//!     let handle = hud_core::spawn_sampler(
//!         std::sync::Arc::new(sampler),
//!         std::time::Duration::from_secs(5),
//!     );
//!     // ... serve snapshots ...
//!     handle.stop().await;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

pub mod api;
pub mod config;
pub mod derive;
pub mod sampler;
pub mod stats;

// Re-export main types
pub use api::OllamaClient;
pub use config::OllamaSamplerConfig;
pub use sampler::OllamaSampler;
pub use stats::{KvCacheInfo, OllamaStats, RunningModel, VramBreakdown};

/// Result type for Ollama sampling operations
pub type Result<T> = std::result::Result<T, OllamaError>;

/// Errors that can occur while sampling the Ollama runtime
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

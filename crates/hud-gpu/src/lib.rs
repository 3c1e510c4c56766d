//! # hud-gpu
//!
//! NVIDIA GPU telemetry sampling via the `nvidia-smi` command-line tool.
//!
//! This crate provides:
//! - Typed device and per-process telemetry records ([`GpuDevice`],
//!   [`GpuProcess`])
//! - CSV parsing of the `--query-gpu` and `--query-compute-apps` outputs
//! - A background sampler ([`GpuSampler`]) that joins devices with their
//!   compute processes and publishes one immutable [`GpuSnapshot`] per cycle
//!
//! ## Example
//!
//! ```rust,no_run
//! use hud_gpu::{GpuSampler, GpuSamplerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sampler = GpuSampler::new(GpuSamplerConfig::default())?;
//!     let handle = hud_core::spawn_sampler(
//!         std::sync::Arc::new(sampler),
//!         std::time::Duration::from_secs(1),
//!     );
//!     // ... serve snapshots ...
//!     handle.stop().await;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

pub mod config;
pub mod metrics;
pub mod query;
pub mod sampler;

// Re-export main types
pub use config::GpuSamplerConfig;
pub use metrics::{GpuDevice, GpuProcess, GpuSnapshot};
pub use sampler::GpuSampler;

/// Result type for GPU sampling operations
pub type Result<T> = std::result::Result<T, GpuError>;

/// Errors that can occur while sampling GPU telemetry
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("command failed: {0}")]
    Command(String),

    #[error("command timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid output: {0}")]
    InvalidOutput(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GpuError {
    /// Whether the next poll cycle may reasonably succeed without operator
    /// intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GpuError::Command(_) | GpuError::Timeout(_) | GpuError::Io(_)
        )
    }
}

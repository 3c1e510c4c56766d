//! Server configuration

use hud_gpu::GpuSamplerConfig;
use hud_ollama::OllamaSamplerConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Environment variable naming the listen address.
pub const BIND_ENV: &str = "GPUHUD_BIND";

const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,

    /// Output format: "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// Cadence of the WebSocket push stream
    pub stream_interval: Duration,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// GPU sampler configuration
    pub gpu: GpuSamplerConfig,

    /// Ollama sampler configuration
    pub ollama: OllamaSamplerConfig,
}

impl ServerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.parse().expect("default bind address is valid"),
            stream_interval: Duration::from_secs(1),
            logging: LoggingConfig::default(),
            gpu: GpuSamplerConfig::default(),
            ollama: OllamaSamplerConfig::default(),
        }
    }

    /// Default configuration with overrides read from the environment:
    /// `GPUHUD_BIND` for the listen address, plus the sampler-level
    /// `OLLAMA_HOST` and `OLLAMA_KV_CACHE_TYPE` variables.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.ollama = OllamaSamplerConfig::from_env();

        if let Ok(bind) = std::env::var(BIND_ENV) {
            if let Ok(addr) = bind.parse() {
                config.bind_addr = addr;
            }
        }

        config
    }

    /// Set the listen address
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the push-stream cadence
    pub fn with_stream_interval(mut self, interval: Duration) -> Self {
        self.stream_interval = interval;
        self
    }

    /// Validate the configuration, including both sampler sections.
    pub fn validate(&self) -> Result<(), String> {
        if self.stream_interval.is_zero() {
            return Err("stream interval must be greater than zero".to_string());
        }
        self.gpu.validate()?;
        self.ollama.validate()?;
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

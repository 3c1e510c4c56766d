//! GPU sampler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the nvidia-smi based GPU sampler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuSamplerConfig {
    /// Path to the nvidia-smi binary
    pub smi_binary: String,

    /// Polling interval for the sampler loop
    pub polling_interval: Duration,

    /// Timeout applied to each nvidia-smi invocation
    pub command_timeout: Duration,
}

impl GpuSamplerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            smi_binary: "nvidia-smi".to_string(),
            polling_interval: Duration::from_secs(1),
            command_timeout: Duration::from_secs(5),
        }
    }

    /// Set the nvidia-smi binary path
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.smi_binary = binary.into();
        self
    }

    /// Set the polling interval
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// Set the per-invocation command timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.smi_binary.is_empty() {
            return Err("smi binary path must not be empty".to_string());
        }
        if self.polling_interval.is_zero() {
            return Err("polling interval must be greater than zero".to_string());
        }
        if self.command_timeout.is_zero() {
            return Err("command timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for GpuSamplerConfig {
    fn default() -> Self {
        Self::new()
    }
}

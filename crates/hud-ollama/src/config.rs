//! Ollama sampler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Environment variable naming the Ollama endpoint.
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

/// Environment variable selecting the KV-cache element data type.
pub const KV_CACHE_TYPE_ENV: &str = "OLLAMA_KV_CACHE_TYPE";

const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_KV_CACHE_DTYPE: &str = "f16";

/// Configuration for the Ollama runtime sampler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaSamplerConfig {
    /// Base URL of the Ollama daemon
    pub endpoint: Url,

    /// KV-cache element data type label the runtime was configured with
    pub kv_cache_dtype: String,

    /// Polling interval for the sampler loop
    pub polling_interval: Duration,

    /// Timeout applied to each API request
    pub request_timeout: Duration,
}

impl OllamaSamplerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is valid"),
            kv_cache_dtype: DEFAULT_KV_CACHE_DTYPE.to_string(),
            polling_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Default configuration with endpoint and KV-cache type overrides read
    /// from the environment. Unparseable or empty values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Ok(host) = std::env::var(OLLAMA_HOST_ENV) {
            if !host.is_empty() {
                if let Ok(endpoint) = Url::parse(&normalize_host(&host)) {
                    config.endpoint = endpoint;
                }
            }
        }

        if let Ok(dtype) = std::env::var(KV_CACHE_TYPE_ENV) {
            if !dtype.is_empty() {
                config.kv_cache_dtype = dtype;
            }
        }

        config
    }

    /// Set the daemon endpoint. Accepts bare `host:port` values.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, url::ParseError> {
        self.endpoint = Url::parse(&normalize_host(endpoint))?;
        Ok(self)
    }

    /// Set the KV-cache element data type label
    pub fn with_kv_cache_dtype(mut self, dtype: impl Into<String>) -> Self {
        self.kv_cache_dtype = dtype.into();
        self
    }

    /// Set the polling interval
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.scheme() != "http" && self.endpoint.scheme() != "https" {
            return Err("endpoint must use HTTP or HTTPS scheme".to_string());
        }
        if self.kv_cache_dtype.is_empty() {
            return Err("KV-cache dtype must not be empty".to_string());
        }
        if self.polling_interval.is_zero() {
            return Err("polling interval must be greater than zero".to_string());
        }
        if self.request_timeout.is_zero() {
            return Err("request timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for OllamaSamplerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Bare `host:port` values get an http scheme prepended, matching what the
/// Ollama CLI itself accepts in `OLLAMA_HOST`.
fn normalize_host(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

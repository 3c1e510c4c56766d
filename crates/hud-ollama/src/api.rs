//! Typed client for the Ollama HTTP API

use crate::config::OllamaSamplerConfig;
use crate::{OllamaError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// `/api/ps` response: models currently resident in the runtime
#[derive(Debug, Clone, Deserialize)]
pub struct PsResponse {
    #[serde(default)]
    pub models: Vec<PsModel>,
}

/// One running model as reported by `/api/ps`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PsModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: String,
    /// Total model size on disk in bytes
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub details: ModelDetails,
    #[serde(default)]
    pub expires_at: String,
    /// VRAM footprint reported by the runtime, bytes
    #[serde(default)]
    pub size_vram: u64,
}

/// Model detail block shared by `/api/ps` and `/api/tags`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub parameter_size: String,
    #[serde(default)]
    pub quantization_level: String,
}

/// `/api/tags` response: the full local model catalog
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagModel>,
}

/// One catalog entry as reported by `/api/tags`
#[derive(Debug, Clone, Deserialize)]
pub struct TagModel {
    #[serde(default)]
    pub name: String,
    /// On-disk size in bytes
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub details: ModelDetails,
}

/// `/api/show` response with verbose architecture detail
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowResponse {
    /// Flat key/value architecture metadata, e.g. `llama.block_count`
    #[serde(default)]
    pub model_info: HashMap<String, Value>,
    #[serde(default)]
    pub details: ModelDetails,
    /// Newline-delimited runtime parameter block (`num_ctx 8192`, ...)
    #[serde(default)]
    pub parameters: String,
}

/// `/api/version` response
#[derive(Debug, Clone, Deserialize)]
pub struct VersionResponse {
    #[serde(default)]
    pub version: String,
}

/// HTTP client for one Ollama daemon
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: Url,
}

impl OllamaClient {
    /// Create a client bound to the configured endpoint, with the
    /// configured per-request timeout.
    pub fn new(config: &OllamaSamplerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                OllamaError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.as_str().trim_end_matches('/'), path)
    }

    /// Liveness probe against the daemon root endpoint.
    pub async fn ping(&self) -> Result<()> {
        let url = self.url("/");
        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| OllamaError::Connection(format!("failed to reach Ollama: {}", e)))?;
        Ok(())
    }

    /// Runtime version.
    pub async fn version(&self) -> Result<VersionResponse> {
        self.get_json("/api/version").await
    }

    /// Full local model catalog.
    pub async fn tags(&self) -> Result<TagsResponse> {
        self.get_json("/api/tags").await
    }

    /// Models currently loaded into the runtime.
    pub async fn ps(&self) -> Result<PsResponse> {
        self.get_json("/api/ps").await
    }

    /// Model introspection with verbose architecture detail.
    pub async fn show(&self, model: &str) -> Result<ShowResponse> {
        let url = self.url("/api/show");
        debug!("fetching model metadata for {} from {}", model, url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "model": model, "verbose": true }))
            .send()
            .await
            .map_err(|e| OllamaError::Connection(format!("show request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(OllamaError::InvalidResponse(format!(
                "show request failed: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OllamaError::InvalidResponse(format!("invalid show response: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OllamaError::Connection(format!("request to {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(OllamaError::InvalidResponse(format!(
                "{} returned {}",
                path,
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            OllamaError::InvalidResponse(format!("invalid response from {}: {}", path, e))
        })
    }
}

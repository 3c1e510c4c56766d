//! Background Ollama sampler

use crate::api::{OllamaClient, ShowResponse};
use crate::config::OllamaSamplerConfig;
use crate::derive;
use crate::stats::OllamaStats;
use crate::{OllamaError, Result};
use async_trait::async_trait;
use hud_core::{Sampler, SnapshotCache};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Samples the Ollama daemon on a fixed interval and publishes the most
/// recent complete snapshot.
///
/// Every cycle stores a snapshot: an unreachable daemon is recorded as
/// `running=false` with an empty model list rather than aborting, so readers
/// always see the current reachability state.
pub struct OllamaSampler {
    config: OllamaSamplerConfig,
    client: OllamaClient,
    cache: SnapshotCache<OllamaStats>,
    /// Architecture metadata, fetched at most once per model name for the
    /// process lifetime. Bounded by the number of distinct models ever
    /// loaded.
    show_cache: RwLock<HashMap<String, ShowResponse>>,
}

impl OllamaSampler {
    /// Create a new sampler. Fails only on invalid configuration.
    pub fn new(config: OllamaSamplerConfig) -> Result<Self> {
        config.validate().map_err(OllamaError::Configuration)?;
        let client = OllamaClient::new(&config)?;
        Ok(Self {
            config,
            client,
            cache: SnapshotCache::new(),
            show_cache: RwLock::new(HashMap::new()),
        })
    }

    /// The most recent complete snapshot, or `None` if no poll has ever run
    /// to completion.
    pub async fn latest(&self) -> Option<Arc<OllamaStats>> {
        self.cache.latest().await
    }

    /// Configured polling interval for the sampler loop.
    pub fn polling_interval(&self) -> Duration {
        self.config.polling_interval
    }

    /// Cached `/api/show` metadata for one model name. A failed fetch is
    /// not cached, so it is retried on the next poll that references the
    /// same name; the lookup is idempotent, so no negative-caching is
    /// needed.
    async fn show_cached(&self, name: &str) -> Option<ShowResponse> {
        if let Some(cached) = self.show_cache.read().await.get(name) {
            return Some(cached.clone());
        }

        match self.client.show(name).await {
            Ok(show) => {
                self.show_cache
                    .write()
                    .await
                    .insert(name.to_string(), show.clone());
                Some(show)
            }
            Err(e) => {
                warn!("metadata fetch for model {} failed: {}", name, e);
                None
            }
        }
    }

    /// One full acquisition cycle. Always yields a snapshot; the liveness
    /// probe failing is a valid terminal state for the cycle, and any later
    /// call failing degrades only the fields it would have filled.
    async fn fetch(&self) -> OllamaStats {
        let mut stats = OllamaStats::offline();

        if let Err(e) = self.client.ping().await {
            debug!("Ollama liveness probe failed: {}", e);
            return stats;
        }
        stats.running = true;

        match self.client.version().await {
            Ok(version) => stats.version = version.version,
            Err(e) => debug!("version fetch failed: {}", e),
        }

        match self.client.tags().await {
            Ok(tags) => {
                stats.available_models_count = tags.models.len() as u64;
                stats.total_disk_usage_bytes = tags.models.iter().map(|m| m.size).sum();
            }
            Err(e) => debug!("model catalog fetch failed: {}", e),
        }

        let ps = match self.client.ps().await {
            Ok(ps) => ps,
            Err(e) => {
                warn!("running-model fetch failed: {}", e);
                return stats;
            }
        };

        for model in &ps.models {
            let show = self.show_cached(&model.name).await;
            stats.running_models.push(derive::derive_running_model(
                model,
                show.as_ref(),
                &self.config.kv_cache_dtype,
            ));
        }

        stats
    }
}

#[async_trait]
impl Sampler for OllamaSampler {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn poll(&self) {
        let stats = self.fetch().await;
        debug!(
            "sampled Ollama: running={}, {} models loaded",
            stats.running,
            stats.running_models.len()
        );
        self.cache.replace(stats).await;
    }
}

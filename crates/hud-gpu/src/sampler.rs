//! Background GPU sampler

use crate::config::GpuSamplerConfig;
use crate::metrics::{GpuDevice, GpuProcess, GpuSnapshot};
use crate::query;
use crate::{GpuError, Result};
use async_trait::async_trait;
use hud_core::{Sampler, SnapshotCache};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Samples GPU telemetry on a fixed interval and publishes the most recent
/// complete snapshot.
///
/// One cycle queries the device list and the compute-process list, joins
/// them by device uuid, and replaces the snapshot wholesale. A failed cycle
/// leaves the previous snapshot visible to readers.
pub struct GpuSampler {
    config: GpuSamplerConfig,
    cache: SnapshotCache<GpuSnapshot>,
}

impl GpuSampler {
    /// Create a new sampler. Fails only on invalid configuration.
    pub fn new(config: GpuSamplerConfig) -> Result<Self> {
        config.validate().map_err(GpuError::Configuration)?;
        Ok(Self {
            config,
            cache: SnapshotCache::new(),
        })
    }

    /// The most recent complete snapshot, or `None` if no poll has ever
    /// succeeded.
    pub async fn latest(&self) -> Option<Arc<GpuSnapshot>> {
        self.cache.latest().await
    }

    /// Configured polling interval for the sampler loop.
    pub fn polling_interval(&self) -> Duration {
        self.config.polling_interval
    }

    /// One full acquisition cycle: query devices and processes, join them.
    async fn fetch(&self) -> Result<GpuSnapshot> {
        let mut gpus = query::query_devices(&self.config).await?;
        let processes = query::query_processes(&self.config).await?;
        attach_processes(&mut gpus, processes);
        Ok(GpuSnapshot::new(gpus))
    }
}

/// Group process records by device uuid and attach each group to its device.
/// Devices with no attached process keep an empty list.
fn attach_processes(gpus: &mut [GpuDevice], processes: Vec<(String, GpuProcess)>) {
    let mut by_uuid: HashMap<String, Vec<GpuProcess>> = HashMap::new();
    for (uuid, process) in processes {
        by_uuid.entry(uuid).or_default().push(process);
    }
    for gpu in gpus {
        if let Some(attached) = by_uuid.remove(&gpu.uuid) {
            gpu.processes = attached;
        }
    }
}

#[async_trait]
impl Sampler for GpuSampler {
    fn name(&self) -> &'static str {
        "gpu"
    }

    async fn poll(&self) {
        match self.fetch().await {
            Ok(snapshot) => {
                debug!("sampled {} GPUs", snapshot.gpus.len());
                self.cache.replace(snapshot).await;
            }
            Err(e) if e.is_retryable() => {
                warn!("GPU poll failed, keeping previous snapshot: {}", e);
            }
            Err(e) => {
                error!("GPU poll failed: {}", e);
            }
        }
    }
}

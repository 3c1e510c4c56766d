//! Published Ollama runtime statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// KV-cache sizing for one running model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KvCacheInfo {
    /// Cache element data type label
    pub dtype: String,

    /// Cache bytes consumed per token of context
    pub bytes_per_token: u64,

    /// Cache size at the full context window, bytes
    pub max_size_bytes: u64,

    /// Cache size at the full context window, MiB
    pub max_size_mib: f64,
}

/// Split of a model's reported VRAM footprint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VramBreakdown {
    /// Footprint reported by the runtime, bytes
    pub total_bytes: u64,

    /// Estimated weights-only share, bytes
    pub weights_est_bytes: u64,

    /// KV-cache share at the full context window, bytes
    pub kv_cache_max_bytes: u64,
}

/// A model currently resident in the runtime.
///
/// The `context_window`, `kv_cache`, and `vram` fields are derived from
/// architecture metadata; when that metadata was not obtainable they stay at
/// their zero values. That is a valid, expected state, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningModel {
    pub name: String,

    /// VRAM footprint reported by the runtime, bytes
    pub size_vram_bytes: u64,

    /// Declared parameter count, e.g. "8.0B"
    pub parameter_size: String,

    /// Declared quantization level, e.g. "Q4_K_M"
    pub quantization: String,

    /// Architecture family
    pub family: String,

    /// When the runtime will evict the model
    pub expires_at: String,

    /// Effective context window in tokens
    pub context_window: u64,

    pub kv_cache: KvCacheInfo,

    pub vram: VramBreakdown,
}

/// Immutable result of one full Ollama poll cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaStats {
    /// Collection time, UTC
    pub timestamp: DateTime<Utc>,

    /// Whether the daemon answered the liveness probe
    pub running: bool,

    /// Runtime version string; empty when unavailable
    pub version: String,

    /// Models currently loaded, in the order the runtime reports them
    pub running_models: Vec<RunningModel>,

    /// Number of models in the local catalog
    pub available_models_count: u64,

    /// Summed on-disk size of all catalog models, bytes
    pub total_disk_usage_bytes: u64,
}

impl OllamaStats {
    /// The snapshot every cycle starts from: daemon assumed unreachable
    /// until the liveness probe says otherwise.
    pub fn offline() -> Self {
        Self {
            timestamp: Utc::now(),
            running: false,
            version: String::new(),
            running_models: Vec::new(),
            available_models_count: 0,
            total_disk_usage_bytes: 0,
        }
    }
}

//! Memory-budget derivation for running models
//!
//! Combines a `/api/ps` entry with `/api/show` architecture metadata to size
//! the KV cache and split the reported VRAM footprint into weights and cache
//! budgets. None of the upstream calls report these figures directly.

use crate::api::{PsModel, ShowResponse};
use crate::stats::{KvCacheInfo, RunningModel, VramBreakdown};
use serde_json::Value;
use std::collections::HashMap;

/// Context window applied when neither the model metadata nor a runtime
/// `num_ctx` override declares one.
pub const DEFAULT_CONTEXT_WINDOW: u64 = 2048;

/// Bytes per KV-cache element for a cache data type label.
///
/// The quantized entries are empirical block overheads (18 and 34 bytes per
/// 32-element block), not pure bit widths. Unknown labels are treated as
/// 16-bit float.
pub fn kv_dtype_bytes_per_element(dtype: &str) -> f64 {
    match dtype {
        "q4_0" => 0.5625,
        "q8_0" => 1.0625,
        _ => 2.0, // f16
    }
}

/// Integer-valued entry from the verbose `model_info` block. GGUF metadata
/// surfaces counts as either integers or floats depending on the encoder.
fn model_info_u64(info: &HashMap<String, Value>, key: &str) -> u64 {
    match info.get(key) {
        Some(value) => value
            .as_u64()
            .or_else(|| value.as_f64().map(|f| f as u64))
            .unwrap_or(0),
        None => 0,
    }
}

fn model_info_str<'a>(info: &'a HashMap<String, Value>, key: &str) -> &'a str {
    info.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Integer value of `key` in the newline-delimited runtime parameter block,
/// or zero. Lines are `key value` pairs separated by whitespace.
fn param_u64(parameters: &str, key: &str) -> u64 {
    for line in parameters.lines() {
        let mut parts = line.split_whitespace();
        if let (Some(k), Some(v)) = (parts.next(), parts.next()) {
            if k == key && parts.next().is_none() {
                return v.parse().unwrap_or(0);
            }
        }
    }
    0
}

/// Build the published record for one running model, deriving KV-cache and
/// VRAM budgets when the architecture metadata allows it.
///
/// With no metadata (`show` is `None`) every derived field stays zero. With
/// metadata but an incomplete architecture block (any of layer count,
/// KV-head count, head count, embedding length missing or zero) only the
/// context window is resolved; KV-cache and VRAM stay zero rather than
/// being guessed.
pub fn derive_running_model(
    model: &PsModel,
    show: Option<&ShowResponse>,
    kv_dtype: &str,
) -> RunningModel {
    let mut running = RunningModel {
        name: model.name.clone(),
        size_vram_bytes: model.size_vram,
        parameter_size: model.details.parameter_size.clone(),
        quantization: model.details.quantization_level.clone(),
        family: model.details.family.clone(),
        expires_at: model.expires_at.clone(),
        ..RunningModel::default()
    };

    let Some(show) = show else {
        return running;
    };

    // The metadata keys are namespaced by architecture; resolve the family
    // first, falling back to what /api/ps reported.
    let mut arch = model_info_str(&show.model_info, "general.architecture").to_string();
    if arch.is_empty() {
        arch = model.details.family.clone();
    }

    let n_layers = model_info_u64(&show.model_info, &format!("{}.block_count", arch));
    let n_heads = model_info_u64(&show.model_info, &format!("{}.attention.head_count", arch));
    let n_kv_heads = model_info_u64(&show.model_info, &format!("{}.attention.head_count_kv", arch));
    let emb_len = model_info_u64(&show.model_info, &format!("{}.embedding_length", arch));
    let mut ctx_len = model_info_u64(&show.model_info, &format!("{}.context_length", arch));

    // A runtime num_ctx override wins over the architecture ceiling.
    let num_ctx = param_u64(&show.parameters, "num_ctx");
    if num_ctx > 0 {
        ctx_len = num_ctx;
    }
    if ctx_len == 0 {
        ctx_len = DEFAULT_CONTEXT_WINDOW;
    }
    running.context_window = ctx_len;

    if n_layers > 0 && n_kv_heads > 0 && n_heads > 0 && emb_len > 0 {
        let head_dim = emb_len / n_heads;
        let bytes_per_token = ((2 * n_layers * n_kv_heads * head_dim) as f64
            * kv_dtype_bytes_per_element(kv_dtype)) as u64;
        let max_bytes = bytes_per_token * ctx_len;

        running.kv_cache = KvCacheInfo {
            dtype: kv_dtype.to_string(),
            bytes_per_token,
            max_size_bytes: max_bytes,
            max_size_mib: max_bytes as f64 / (1024.0 * 1024.0),
        };

        // When the cache estimate exceeds the reported footprint the
        // subtraction is meaningless; the on-disk size is the closest
        // available weights figure.
        let weights_est = if model.size_vram >= max_bytes {
            model.size_vram - max_bytes
        } else {
            model.size
        };

        running.vram = VramBreakdown {
            total_bytes: model.size_vram,
            weights_est_bytes: weights_est,
            kv_cache_max_bytes: max_bytes,
        };
    }

    running
}

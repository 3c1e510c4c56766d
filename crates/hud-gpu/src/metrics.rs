//! GPU telemetry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One compute process resident on a GPU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuProcess {
    /// Process id
    pub pid: u32,

    /// Process executable name
    pub process_name: String,

    /// GPU memory consumed by the process in MiB
    pub used_memory_mib: u64,
}

/// One physical GPU's state at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuDevice {
    /// Device index as reported by the driver
    pub index: u32,

    /// Product name
    pub name: String,

    /// Stable device UUID
    pub uuid: String,

    /// Driver version
    pub driver_version: String,

    /// Core temperature in degrees Celsius
    pub temperature_c: i64,

    /// Fan speed as a percentage of its maximum
    pub fan_speed_pct: u64,

    /// Current power draw in watts
    pub power_draw_w: f64,

    /// Enforced power limit in watts
    pub power_limit_w: f64,

    /// Framebuffer memory in use, MiB
    pub memory_used_mib: u64,

    /// Total framebuffer memory, MiB
    pub memory_total_mib: u64,

    /// Free framebuffer memory, MiB
    pub memory_free_mib: u64,

    /// GPU compute utilization percentage
    pub gpu_utilization_pct: u64,

    /// Memory bandwidth utilization percentage
    pub mem_utilization_pct: u64,

    /// Performance state label (P0..P12)
    pub pstate: String,

    /// Current PCIe link generation
    pub pcie_gen_current: u64,

    /// Maximum supported PCIe link generation
    pub pcie_gen_max: u64,

    /// Compute processes attached to this device. Always present, possibly
    /// empty; serializes as `[]` when no process is attached.
    pub processes: Vec<GpuProcess>,
}

/// Immutable result of one full GPU poll cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuSnapshot {
    /// Collection time, UTC
    pub timestamp: DateTime<Utc>,

    /// All devices visible to the driver, in index order
    pub gpus: Vec<GpuDevice>,
}

impl GpuSnapshot {
    /// Stamp a set of device records with the current time.
    pub fn new(gpus: Vec<GpuDevice>) -> Self {
        Self {
            timestamp: Utc::now(),
            gpus,
        }
    }
}

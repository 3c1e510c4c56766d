//! nvidia-smi invocation and CSV row parsing

use crate::config::GpuSamplerConfig;
use crate::metrics::{GpuDevice, GpuProcess};
use crate::{GpuError, Result};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Fields requested from `--query-gpu`, in schema order.
const DEVICE_FIELDS: &str = "index,name,uuid,driver_version,temperature.gpu,fan.speed,\
power.draw,power.limit,memory.used,memory.total,memory.free,utilization.gpu,\
utilization.memory,pstate,pcie.link.gen.current,pcie.link.gen.max";
const DEVICE_FIELD_COUNT: usize = 16;

/// Fields requested from `--query-compute-apps`, in schema order.
const PROCESS_FIELDS: &str = "gpu_uuid,pid,process_name,used_memory";
const PROCESS_FIELD_COUNT: usize = 4;

/// Query all visible devices. Malformed rows are dropped, not errors.
pub async fn query_devices(config: &GpuSamplerConfig) -> Result<Vec<GpuDevice>> {
    let query = format!("--query-gpu={}", DEVICE_FIELDS);
    let output = run_smi(config, &[&query, "--format=csv,noheader,nounits"]).await?;
    Ok(output.lines().filter_map(parse_device_row).collect())
}

/// Query active compute processes as (device uuid, process) pairs.
pub async fn query_processes(config: &GpuSamplerConfig) -> Result<Vec<(String, GpuProcess)>> {
    let query = format!("--query-compute-apps={}", PROCESS_FIELDS);
    let output = run_smi(config, &[&query, "--format=csv,noheader,nounits"]).await?;
    Ok(output.lines().filter_map(parse_process_row).collect())
}

/// Run one nvidia-smi invocation, bounded by the configured timeout.
async fn run_smi(config: &GpuSamplerConfig, args: &[&str]) -> Result<String> {
    debug!("running {} {:?}", config.smi_binary, args);

    let output = timeout(
        config.command_timeout,
        Command::new(&config.smi_binary).args(args).output(),
    )
    .await
    .map_err(|_| GpuError::Timeout(config.command_timeout))?
    .map_err(|e| GpuError::Command(format!("failed to launch {}: {}", config.smi_binary, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GpuError::Command(format!(
            "{} exited with {}: {}",
            config.smi_binary,
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout).map_err(|_| {
        GpuError::InvalidOutput(format!("{} produced non-UTF-8 output", config.smi_binary))
    })
}

/// Parse one `--query-gpu` CSV row. Rows with fewer fields than the schema
/// are skipped; the device list is left to the remaining rows.
pub fn parse_device_row(line: &str) -> Option<GpuDevice> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let fields: Vec<&str> = line.split(", ").collect();
    if fields.len() < DEVICE_FIELD_COUNT {
        return None;
    }

    Some(GpuDevice {
        index: parse_u64(fields[0]) as u32,
        name: fields[1].trim().to_string(),
        uuid: fields[2].trim().to_string(),
        driver_version: fields[3].trim().to_string(),
        temperature_c: parse_i64(fields[4]),
        fan_speed_pct: parse_u64(fields[5]),
        power_draw_w: parse_f64(fields[6]),
        power_limit_w: parse_f64(fields[7]),
        memory_used_mib: parse_u64(fields[8]),
        memory_total_mib: parse_u64(fields[9]),
        memory_free_mib: parse_u64(fields[10]),
        gpu_utilization_pct: parse_u64(fields[11]),
        mem_utilization_pct: parse_u64(fields[12]),
        pstate: fields[13].trim().to_string(),
        pcie_gen_current: parse_u64(fields[14]),
        pcie_gen_max: parse_u64(fields[15]),
        processes: Vec::new(),
    })
}

/// Parse one `--query-compute-apps` CSV row into (device uuid, process).
pub fn parse_process_row(line: &str) -> Option<(String, GpuProcess)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let fields: Vec<&str> = line.split(", ").collect();
    if fields.len() < PROCESS_FIELD_COUNT {
        return None;
    }

    Some((
        fields[0].trim().to_string(),
        GpuProcess {
            pid: parse_u64(fields[1]) as u32,
            process_name: fields[2].trim().to_string(),
            used_memory_mib: parse_u64(fields[3]),
        },
    ))
}

/// Values nvidia-smi reports as not applicable parse to zero. Missing
/// telemetry never aborts a cycle.
fn is_not_available(s: &str) -> bool {
    s.is_empty() || s == "[N/A]" || s == "N/A"
}

fn parse_u64(s: &str) -> u64 {
    let s = s.trim();
    if is_not_available(s) {
        return 0;
    }
    s.parse().unwrap_or(0)
}

fn parse_i64(s: &str) -> i64 {
    let s = s.trim();
    if is_not_available(s) {
        return 0;
    }
    s.parse().unwrap_or(0)
}

fn parse_f64(s: &str) -> f64 {
    let s = s.trim();
    if is_not_available(s) {
        return 0.0;
    }
    s.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE_ROW: &str = "0, NVIDIA GeForce RTX 4090, GPU-9f6ed3e1-5d3c-4b23-a2bd-5c1f0e9a7f10, \
550.54.14, 43, 30, 68.42, 450.00, 1024, 24564, 23540, 12, 4, P8, 4, 4";

    #[test]
    fn test_parse_device_row() {
        let device = parse_device_row(DEVICE_ROW).unwrap();
        assert_eq!(device.index, 0);
        assert_eq!(device.name, "NVIDIA GeForce RTX 4090");
        assert_eq!(device.uuid, "GPU-9f6ed3e1-5d3c-4b23-a2bd-5c1f0e9a7f10");
        assert_eq!(device.driver_version, "550.54.14");
        assert_eq!(device.temperature_c, 43);
        assert_eq!(device.fan_speed_pct, 30);
        assert_eq!(device.power_draw_w, 68.42);
        assert_eq!(device.power_limit_w, 450.0);
        assert_eq!(device.memory_used_mib, 1024);
        assert_eq!(device.memory_total_mib, 24564);
        assert_eq!(device.memory_free_mib, 23540);
        assert_eq!(device.gpu_utilization_pct, 12);
        assert_eq!(device.mem_utilization_pct, 4);
        assert_eq!(device.pstate, "P8");
        assert_eq!(device.pcie_gen_current, 4);
        assert_eq!(device.pcie_gen_max, 4);
        assert!(device.processes.is_empty());
    }

    #[test]
    fn test_parse_preserves_numeric_fields_exactly() {
        // Parsing then re-serializing keeps every numeric field intact.
        let device = parse_device_row(DEVICE_ROW).unwrap();
        let json = serde_json::to_value(&device).unwrap();
        assert_eq!(json["temperature_c"], 43);
        assert_eq!(json["fan_speed_pct"], 30);
        assert_eq!(json["power_draw_w"], 68.42);
        assert_eq!(json["power_limit_w"], 450.0);
        assert_eq!(json["memory_used_mib"], 1024);
        assert_eq!(json["memory_total_mib"], 24564);
        assert_eq!(json["memory_free_mib"], 23540);
        assert_eq!(json["gpu_utilization_pct"], 12);
        assert_eq!(json["mem_utilization_pct"], 4);
        assert_eq!(json["pcie_gen_current"], 4);
        assert_eq!(json["pcie_gen_max"], 4);
    }

    #[test]
    fn test_not_applicable_fields_parse_to_zero() {
        // Fan speed and PCIe generations are [N/A] on some boards.
        let row = "1, Tesla T4, GPU-11112222-3333-4444-5555-666677778888, 535.104.05, \
40, [N/A], N/A, 70.00, 0, 15360, 15360, 0, 0, P8, [N/A], [N/A]";
        let device = parse_device_row(row).unwrap();
        assert_eq!(device.fan_speed_pct, 0);
        assert_eq!(device.power_draw_w, 0.0);
        assert_eq!(device.pcie_gen_current, 0);
        assert_eq!(device.pcie_gen_max, 0);
        // Real values around the markers survive.
        assert_eq!(device.temperature_c, 40);
        assert_eq!(device.power_limit_w, 70.0);
        assert_eq!(device.memory_total_mib, 15360);
    }

    #[test]
    fn test_short_row_is_skipped() {
        assert!(parse_device_row("0, NVIDIA GeForce RTX 4090, GPU-1234").is_none());
        assert!(parse_device_row("").is_none());
        assert!(parse_device_row("   ").is_none());
        assert!(parse_process_row("GPU-1234, 4242").is_none());
    }

    #[test]
    fn test_parse_process_row() {
        let (uuid, process) =
            parse_process_row("GPU-9f6ed3e1-5d3c-4b23-a2bd-5c1f0e9a7f10, 4242, /usr/bin/ollama, 812")
                .unwrap();
        assert_eq!(uuid, "GPU-9f6ed3e1-5d3c-4b23-a2bd-5c1f0e9a7f10");
        assert_eq!(process.pid, 4242);
        assert_eq!(process.process_name, "/usr/bin/ollama");
        assert_eq!(process.used_memory_mib, 812);
    }

    #[test]
    fn test_garbage_numeric_field_parses_to_zero() {
        let row = "zero, Some GPU, GPU-1, 550.54.14, garbage, 30, 68.42, 450.00, \
1024, 24564, 23540, 12, 4, P8, 4, 4";
        let device = parse_device_row(row).unwrap();
        assert_eq!(device.index, 0);
        assert_eq!(device.temperature_c, 0);
    }
}

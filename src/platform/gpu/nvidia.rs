//! NVIDIA probe via the `nvidia-smi` diagnostic tool.

use std::process::Command;

use crate::core::gpu::GpuProbe;
use crate::core::snapshot::{GpuSnapshot, MemorySnapshot, VramInfo};

const MIB: u64 = 1024 * 1024;

/// Queries `nvidia-smi` for a CSV line of utilization, memory and
/// temperature. An absent executable or a driver error is a silent
/// fallthrough; the chain throttle keeps the subprocess cost bounded.
pub struct NvidiaSmiProbe;

impl GpuProbe for NvidiaSmiProbe {
    fn name(&self) -> &'static str {
        "nvidia-smi"
    }

    fn probe(&mut self, _memory: &MemorySnapshot) -> Option<GpuSnapshot> {
        let output = Command::new("nvidia-smi")
            .args([
                "--query-gpu=utilization.gpu,memory.used,memory.total,temperature.gpu",
                "--format=csv,noheader,nounits",
            ])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout);
        parse_smi_csv(text.lines().next()?)
    }
}

/// Parse one `utilization, mem.used, mem.total, temperature` CSV line;
/// memory values are MiB. A snapshot without a usage figure is useless
/// here, so that field is required.
pub fn parse_smi_csv(line: &str) -> Option<GpuSnapshot> {
    let mut fields = line.split(',').map(str::trim);

    let mut gpu = GpuSnapshot::new("NVIDIA GPU");
    gpu.usage_percent = Some(fields.next()?.parse().ok()?);

    let used = fields.next().and_then(|f| f.parse::<u64>().ok());
    let total = fields.next().and_then(|f| f.parse::<u64>().ok());
    if let (Some(used), Some(total)) = (used, total) {
        gpu.vram = Some(VramInfo {
            used_bytes: used * MIB,
            total_bytes: total * MIB,
        });
    }
    gpu.temperature_c = fields.next().and_then(|f| f.parse().ok());

    Some(gpu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_smi_csv() {
        let gpu = parse_smi_csv("42, 1024, 8192, 65").unwrap();
        assert_eq!(gpu.vendor, "NVIDIA GPU");
        assert_eq!(gpu.usage_percent, Some(42.0));
        let vram = gpu.vram.unwrap();
        assert_eq!(vram.used_bytes, 1024 * MIB);
        assert_eq!(vram.total_bytes, 8192 * MIB);
        assert_eq!(gpu.temperature_c, Some(65.0));
    }

    #[test]
    fn test_parse_smi_csv_partial_fields() {
        // Usage alone is still a valid snapshot.
        let gpu = parse_smi_csv("17, [N/A], [N/A], [N/A]").unwrap();
        assert_eq!(gpu.usage_percent, Some(17.0));
        assert!(gpu.vram.is_none());
        assert!(gpu.temperature_c.is_none());
    }

    #[test]
    fn test_parse_smi_csv_garbage() {
        assert!(parse_smi_csv("").is_none());
        assert!(parse_smi_csv("No devices were found").is_none());
    }
}

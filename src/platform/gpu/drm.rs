//! DRM sysfs probe: `/sys/class/drm/card*`.
//!
//! Covers amdgpu (`gpu_busy_percent`), Intel Xe (`gt/gt0/usage`,
//! `tile0/vram0`), and the Broadcom v3d driver whose only usage signal
//! is the `gpu_stats` queue table of cumulative timestamp/runtime pairs.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::core::gpu::GpuProbe;
use crate::core::snapshot::{GpuSnapshot, MemorySnapshot, VramInfo};
use crate::platform::proc::read_number_file;
use crate::platform::thermal;

/// Usage files tried in order under the card directory.
const USAGE_FILES: &[&str] = &[
    "device/gpu_busy_percent",
    "gt/gt0/usage",
    "device/usage",
    "device/load",
];

/// One cumulative (timestamp, runtime) reading per v3d scheduler queue.
#[derive(Debug, Clone, Copy)]
struct QueueSample {
    timestamp: u64,
    runtime: u64,
}

pub struct DrmProbe {
    /// Previous gpu_stats reading per queue name, for the delta.
    queues: HashMap<String, QueueSample>,
}

impl DrmProbe {
    pub fn new() -> Self {
        Self {
            queues: HashMap::new(),
        }
    }

    /// Busiest-queue usage from the v3d `gpu_stats` table, or `None`
    /// until a second reading makes a delta possible.
    fn v3d_usage(&mut self, card_path: &Path, card: &str) -> Option<f64> {
        let stats = fs::read_to_string(card_path.join("device/gpu_stats"))
            .ok()
            .or_else(|| {
                // Older kernels only publish the table in debugfs.
                let num = card.strip_prefix("card")?;
                fs::read_to_string(format!("/sys/kernel/debug/dri/{num}/gpu_stats")).ok()
            })?;

        let mut usage: Option<f64> = None;
        for line in stats.lines().skip(1) {
            let Some((queue, ts, rt)) = parse_gpu_stats_line(line) else {
                continue;
            };
            if let Some(prev) = self.queues.get(&queue) {
                if ts > prev.timestamp {
                    let q_usage = (rt.saturating_sub(prev.runtime)) as f64 * 100.0
                        / (ts - prev.timestamp) as f64;
                    usage = Some(usage.map_or(q_usage, |u: f64| u.max(q_usage)));
                }
            }
            self.queues.insert(
                queue,
                QueueSample {
                    timestamp: ts,
                    runtime: rt,
                },
            );
        }
        usage
    }
}

impl GpuProbe for DrmProbe {
    fn name(&self) -> &'static str {
        "drm"
    }

    fn probe(&mut self, memory: &MemorySnapshot) -> Option<GpuSnapshot> {
        let entries = fs::read_dir("/sys/class/drm").ok()?;
        for entry in entries.flatten() {
            let card = entry.file_name().to_string_lossy().into_owned();
            // Connectors look like card0-HDMI-A-1; only bare cards count.
            if !card.starts_with("card") || card.contains('-') {
                continue;
            }
            let card_path = entry.path();

            let mut usage = USAGE_FILES
                .iter()
                .find_map(|rel| read_number_file(&card_path.join(rel)));
            if usage.is_none() {
                usage = self.v3d_usage(&card_path, &card);
            }
            if usage.is_none() {
                continue;
            }

            let mut gpu = GpuSnapshot::new(vendor_label(&card_path));
            gpu.usage_percent = usage;
            gpu.temperature_c = hwmon_temp(&card_path).or_else(thermal::read_thermal_zone0);
            gpu.vram = vram_info(&card_path).or_else(|| cma_vram(&gpu.vendor, memory));
            if gpu.vram.is_some() && gpu.vendor == "GPU" {
                gpu.vendor = "VideoCore GPU".to_string();
            }
            return Some(gpu);
        }
        None
    }
}

/// Human-readable vendor label from the PCI vendor id, with the uevent
/// driver name as fallback for non-PCI SoC devices.
fn vendor_label(card_path: &Path) -> String {
    if let Ok(vendor) = fs::read_to_string(card_path.join("device/vendor")) {
        if let Some(label) = label_for_vendor_id(&vendor) {
            return label.to_string();
        }
    }
    if let Ok(uevent) = fs::read_to_string(card_path.join("device/uevent")) {
        if uevent.contains("DRIVER=v3d") || uevent.contains("DRIVER=vc4") {
            return "VideoCore GPU".to_string();
        }
    }
    "GPU".to_string()
}

pub fn label_for_vendor_id(vendor: &str) -> Option<&'static str> {
    if vendor.contains("0x1002") {
        Some("AMD GPU")
    } else if vendor.contains("0x8086") {
        Some("Intel GPU")
    } else if vendor.contains("0x10de") {
        Some("NVIDIA GPU")
    } else if vendor.contains("0x14e4") {
        Some("Broadcom GPU")
    } else {
        None
    }
}

fn hwmon_temp(card_path: &Path) -> Option<f64> {
    let entries = fs::read_dir(card_path.join("device/hwmon")).ok()?;
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with("hwmon") {
            continue;
        }
        if let Some(t) = read_number_file(&entry.path().join("temp1_input")) {
            return Some(t / 1000.0);
        }
    }
    None
}

fn vram_info(card_path: &Path) -> Option<VramInfo> {
    // amdgpu publishes byte counts directly; Xe uses the tile layout.
    let pairs = [
        ("device/mem_info_vram_used", "device/mem_info_vram_total"),
        ("tile0/vram0/used", "tile0/vram0/size"),
    ];
    for (used_rel, total_rel) in pairs {
        let used = read_number_file(&card_path.join(used_rel));
        let total = read_number_file(&card_path.join(total_rel));
        if let (Some(used), Some(total)) = (used, total) {
            return Some(VramInfo {
                used_bytes: used as u64,
                total_bytes: total as u64,
            });
        }
    }
    None
}

/// SoC GPUs without dedicated VRAM borrow from the CMA pool.
pub fn cma_vram(vendor: &str, memory: &MemorySnapshot) -> Option<VramInfo> {
    let soc = matches!(vendor, "Broadcom GPU" | "VideoCore GPU" | "GPU");
    (soc && memory.has_cma()).then(|| VramInfo {
        used_bytes: memory.cma_used_bytes,
        total_bytes: memory.cma_total_bytes,
    })
}

/// Parse one gpu_stats row: `queue timestamp jobs runtime`.
pub fn parse_gpu_stats_line(line: &str) -> Option<(String, u64, u64)> {
    let mut fields = line.split_whitespace();
    let queue = fields.next()?.to_string();
    let timestamp = fields.next()?.parse().ok()?;
    let _jobs = fields.next()?;
    let runtime = fields.next()?.parse().ok()?;
    Some((queue, timestamp, runtime))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_for_vendor_id() {
        assert_eq!(label_for_vendor_id("0x1002\n"), Some("AMD GPU"));
        assert_eq!(label_for_vendor_id("0x8086\n"), Some("Intel GPU"));
        assert_eq!(label_for_vendor_id("0x10de\n"), Some("NVIDIA GPU"));
        assert_eq!(label_for_vendor_id("0x14e4\n"), Some("Broadcom GPU"));
        assert_eq!(label_for_vendor_id("0xdead\n"), None);
    }

    #[test]
    fn test_parse_gpu_stats_line() {
        let (queue, ts, rt) = parse_gpu_stats_line("v3d_bin 1000000 42 250000").unwrap();
        assert_eq!(queue, "v3d_bin");
        assert_eq!(ts, 1_000_000);
        assert_eq!(rt, 250_000);
        assert!(parse_gpu_stats_line("queue timestamp jobs runtime").is_none());
        assert!(parse_gpu_stats_line("").is_none());
    }

    #[test]
    fn test_v3d_delta_needs_two_readings() {
        let mut probe = DrmProbe::new();
        // Seed the history directly; the busiest queue must win.
        probe.queues.insert(
            "v3d_bin".to_string(),
            QueueSample {
                timestamp: 0,
                runtime: 0,
            },
        );
        probe.queues.insert(
            "v3d_render".to_string(),
            QueueSample {
                timestamp: 0,
                runtime: 0,
            },
        );
        let mut usage: Option<f64> = None;
        for line in ["v3d_bin 1000 1 100", "v3d_render 1000 1 800"] {
            let (queue, ts, rt) = parse_gpu_stats_line(line).unwrap();
            let prev = probe.queues[&queue];
            if ts > prev.timestamp {
                let q = (rt - prev.runtime) as f64 * 100.0 / (ts - prev.timestamp) as f64;
                usage = Some(usage.map_or(q, |u: f64| u.max(q)));
            }
        }
        assert_eq!(usage, Some(80.0));
    }

    #[test]
    fn test_cma_vram_only_for_soc() {
        let memory = MemorySnapshot {
            cma_used_bytes: 1024,
            cma_total_bytes: 4096,
            ..Default::default()
        };
        assert!(cma_vram("VideoCore GPU", &memory).is_some());
        assert!(cma_vram("AMD GPU", &memory).is_none());
        assert!(cma_vram("VideoCore GPU", &MemorySnapshot::default()).is_none());
    }
}

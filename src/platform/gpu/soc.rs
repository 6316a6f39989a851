//! SoC GPU probes: Adreno kgsl, generic devfreq, and the CMA-only
//! fallback for boards where no driver exposes a usage figure.

use std::fs;
use std::path::Path;

use crate::core::gpu::GpuProbe;
use crate::core::snapshot::{GpuSnapshot, MemorySnapshot, VramInfo};
use crate::platform::proc::read_number_file;
use crate::platform::thermal;

/// Qualcomm Adreno via `/sys/class/kgsl/kgsl-3d0`.
pub struct KgslProbe;

impl GpuProbe for KgslProbe {
    fn name(&self) -> &'static str {
        "kgsl"
    }

    fn probe(&mut self, _memory: &MemorySnapshot) -> Option<GpuSnapshot> {
        let base = Path::new("/sys/class/kgsl/kgsl-3d0");

        let usage = read_number_file(&base.join("gpu_busy_percentage")).or_else(|| {
            // gpubusy is a raw busy/total tick pair; an all-zero pair
            // means the driver has nothing to report yet.
            let text = fs::read_to_string(base.join("gpubusy")).ok()?;
            parse_gpubusy(&text).filter(|u| *u > 0.0)
        })?;

        let mut gpu = GpuSnapshot::new("Adreno GPU");
        gpu.usage_percent = Some(usage);
        gpu.temperature_c = thermal::read_thermal_zone0();
        Some(gpu)
    }
}

/// Kernel devfreq load files, which several SoC GPU drivers (v3d, Mali)
/// publish instead of a DRM usage node.
pub struct DevfreqProbe;

const DEVFREQ_DIRS: &[&str] = &[
    "/sys/class/devfreq",
    // Raspberry Pi firmware places the GPU devfreq off the soc node.
    "/sys/devices/platform/soc/soc:gpu/devfreq",
];

impl GpuProbe for DevfreqProbe {
    fn name(&self) -> &'static str {
        "devfreq"
    }

    fn probe(&mut self, _memory: &MemorySnapshot) -> Option<GpuSnapshot> {
        for dir in DEVFREQ_DIRS {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !["v3d", "gpu", "mali", "soc:gpu"]
                    .iter()
                    .any(|n| name.contains(n))
                {
                    continue;
                }
                let Ok(text) = fs::read_to_string(entry.path().join("load")) else {
                    continue;
                };
                let Some(usage) = parse_devfreq_load(&text) else {
                    continue;
                };
                let mut gpu = GpuSnapshot::new(devfreq_label(&name));
                gpu.usage_percent = Some(usage);
                gpu.temperature_c = thermal::read_thermal_zone0();
                return Some(gpu);
            }
        }
        None
    }
}

/// Last resort: boards whose GPU shares memory through the CMA pool but
/// report no usage at all still get a VRAM line.
pub struct CmaFallbackProbe;

impl GpuProbe for CmaFallbackProbe {
    fn name(&self) -> &'static str {
        "cma"
    }

    fn probe(&mut self, memory: &MemorySnapshot) -> Option<GpuSnapshot> {
        if !memory.has_cma() {
            return None;
        }
        let mut gpu = GpuSnapshot::new("VideoCore GPU");
        gpu.vram = Some(VramInfo {
            used_bytes: memory.cma_used_bytes,
            total_bytes: memory.cma_total_bytes,
        });
        gpu.temperature_c = thermal::read_thermal_zone0();
        Some(gpu)
    }
}

/// gpubusy holds cumulative `busy total` ticks.
pub fn parse_gpubusy(text: &str) -> Option<f64> {
    let mut fields = text.split_whitespace();
    let busy: u64 = fields.next()?.parse().ok()?;
    let total: u64 = fields.next()?.parse().ok()?;
    (total > 0).then(|| busy as f64 * 100.0 / total as f64)
}

/// devfreq load is a percentage, possibly suffixed with `@<freq>`.
pub fn parse_devfreq_load(text: &str) -> Option<f64> {
    let text = text.split('@').next()?;
    text.trim().parse().ok()
}

fn devfreq_label(device: &str) -> &'static str {
    if device.contains("v3d") || device.contains("soc:gpu") {
        "VideoCore GPU"
    } else if device.contains("mali") {
        "Mali GPU"
    } else {
        "GPU"
    }
}

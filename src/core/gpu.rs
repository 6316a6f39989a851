use crate::core::snapshot::{GpuSnapshot, MemorySnapshot};

/// Trait for GPU usage probes
///
/// Each vendor path (nvidia-smi, DRM sysfs, kgsl, devfreq, ...) is one
/// probe. Probes are attempted in priority order and the first one that
/// yields a snapshot wins; adding a vendor means adding one probe.
/// Implementations are provided in the platform layer.
pub trait GpuProbe {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Attempt to read a snapshot. `None` means the probe does not apply
    /// on this machine (or failed) and the chain falls through to the
    /// next one. Probes may keep per-call state (e.g. queue counters)
    /// but must never block beyond a bounded read.
    ///
    /// The current memory snapshot is passed in because SoC GPUs report
    /// VRAM through the CMA pool.
    fn probe(&mut self, memory: &MemorySnapshot) -> Option<GpuSnapshot>;
}

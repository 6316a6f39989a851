//! GPU-specific platform code.
//!
//! Provides the priority-ordered probe chain behind the
//! [`GpuProbe`](crate::core::GpuProbe) trait: vendor tool first, then
//! DRM sysfs, then the SoC paths. The whole chain is throttled because
//! the first probe may spawn a subprocess.

mod drm;
mod nvidia;
mod soc;

pub use drm::DrmProbe;
pub use nvidia::NvidiaSmiProbe;
pub use soc::{CmaFallbackProbe, DevfreqProbe, KgslProbe};

use std::time::{Duration, Instant};

use crate::core::gpu::GpuProbe;
use crate::core::snapshot::{GpuSnapshot, MemorySnapshot};

/// Minimum interval between full probe-chain runs; between runs the
/// cached snapshot is returned so a subprocess-backed probe can never
/// dominate the sampling loop.
const PROBE_INTERVAL: Duration = Duration::from_millis(800);

/// First-match-wins probe chain with a short-lived result cache.
pub struct GpuMonitor {
    probes: Vec<Box<dyn GpuProbe>>,
    cached: Option<GpuSnapshot>,
    last_probe: Option<Instant>,
}

impl GpuMonitor {
    /// Chain with every supported vendor path, in priority order.
    pub fn new() -> Self {
        Self::with_probes(vec![
            Box::new(NvidiaSmiProbe),
            Box::new(DrmProbe::new()),
            Box::new(KgslProbe),
            Box::new(DevfreqProbe),
            Box::new(CmaFallbackProbe),
        ])
    }

    /// Empty chain, for `--no-gpu`.
    pub fn disabled() -> Self {
        Self::with_probes(Vec::new())
    }

    pub fn with_probes(probes: Vec<Box<dyn GpuProbe>>) -> Self {
        Self {
            probes,
            cached: None,
            last_probe: None,
        }
    }

    /// Run the chain, or return the cached result when called again
    /// within the throttle window.
    pub fn sample(&mut self, memory: &MemorySnapshot) -> Option<GpuSnapshot> {
        if let Some(last) = self.last_probe {
            if last.elapsed() < PROBE_INTERVAL {
                return self.cached.clone();
            }
        }
        self.last_probe = Some(Instant::now());

        self.cached = None;
        for probe in &mut self.probes {
            if let Some(gpu) = probe.probe(memory) {
                log::debug!("gpu probe {} matched: {}", probe.name(), gpu.vendor);
                self.cached = Some(gpu);
                break;
            }
            log::debug!("gpu probe {} fell through", probe.name());
        }
        self.cached.clone()
    }
}

impl Default for GpuMonitor {
    fn default() -> Self {
        Self::new()
    }
}

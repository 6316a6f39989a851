use serde::{Deserialize, Serialize};

/// Cumulative CPU tick counters from the aggregate line of `/proc/stat`.
///
/// Counters are monotonically non-decreasing for the lifetime of a boot;
/// a counter reset is treated as a zero delta, never a negative one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// Sum of all eight counters.
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    /// Ticks spent doing nothing useful (idle + iowait).
    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }
}

/// Point-in-time memory usage derived from `/proc/meminfo`.
///
/// `used_bytes` is total minus available, which tracks what the kernel
/// could actually reclaim. The swap and CMA pairs are zero when the
/// corresponding pool does not exist on this machine.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub swap_used_bytes: u64,
    pub swap_total_bytes: u64,
    pub cma_used_bytes: u64,
    pub cma_total_bytes: u64,
}

impl MemorySnapshot {
    pub fn used_percent(&self) -> f64 {
        percent(self.used_bytes, self.total_bytes)
    }

    pub fn swap_percent(&self) -> f64 {
        percent(self.swap_used_bytes, self.swap_total_bytes)
    }

    pub fn cma_percent(&self) -> f64 {
        percent(self.cma_used_bytes, self.cma_total_bytes)
    }

    pub fn has_swap(&self) -> bool {
        self.swap_total_bytes > 0
    }

    pub fn has_cma(&self) -> bool {
        self.cma_total_bytes > 0
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 * 100.0 / total as f64).clamp(0.0, 100.0)
    }
}

/// Instantaneous byte rates for the busiest network interface.
///
/// "Busiest" means the largest cumulative rx+tx counter in the current
/// sample, not the largest rate; loopback never qualifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub interface: String,
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
}

impl Default for NetworkSnapshot {
    fn default() -> Self {
        Self {
            interface: "-".to_string(),
            rx_bytes_per_sec: 0.0,
            tx_bytes_per_sec: 0.0,
        }
    }
}

/// VRAM usage pair reported by a GPU probe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VramInfo {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl VramInfo {
    pub fn used_percent(&self) -> f64 {
        percent(self.used_bytes, self.total_bytes)
    }
}

/// Best-effort GPU metrics; each field is independently optional because
/// vendors expose different subsets (a GPU may report usage but not
/// temperature).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuSnapshot {
    pub vendor: String,
    pub usage_percent: Option<f64>,
    pub vram: Option<VramInfo>,
    pub temperature_c: Option<f64>,
}

impl GpuSnapshot {
    pub fn new(vendor: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            usage_percent: None,
            vram: None,
            temperature_c: None,
        }
    }
}

/// One row of the process table. Recreated every sample; identity across
/// samples exists only as the pid key into the sampler history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: i32,
    pub name: String,
    pub cpu_percent: f64,
    pub mem_bytes: u64,
    pub threads: i64,
}

/// Sort key for the process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortMode {
    Cpu,
    Mem,
}

/// Optional CPU package temperature and average core frequency, sampled
/// alongside the main pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CpuExtras {
    pub temperature_c: Option<f64>,
    pub avg_freq_mhz: Option<f64>,
}

/// Complete output of one sampling pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub cpu_percent: f64,
    pub cpu_count: usize,
    pub cpu_extras: CpuExtras,
    pub memory: MemorySnapshot,
    pub network: NetworkSnapshot,
    pub gpu: Option<GpuSnapshot>,
    pub processes: Vec<ProcessInfo>,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            cpu_percent: 0.0,
            cpu_count: 1,
            cpu_extras: CpuExtras::default(),
            memory: MemorySnapshot::default(),
            network: NetworkSnapshot::default(),
            gpu: None,
            processes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_times_totals() {
        let t = CpuTimes {
            user: 10,
            nice: 1,
            system: 5,
            idle: 70,
            iowait: 4,
            irq: 2,
            softirq: 2,
            steal: 6,
        };
        assert_eq!(t.total(), 100);
        assert_eq!(t.idle_total(), 74);
    }

    #[test]
    fn test_memory_percent_clamped() {
        let m = MemorySnapshot {
            used_bytes: 200,
            total_bytes: 100,
            ..Default::default()
        };
        assert_eq!(m.used_percent(), 100.0);

        let empty = MemorySnapshot::default();
        assert_eq!(empty.used_percent(), 0.0);
        assert!(!empty.has_swap());
        assert!(!empty.has_cma());
    }
}

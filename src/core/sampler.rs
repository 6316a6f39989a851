//! The stateful delta-computation engine.
//!
//! The sampler owns the only history in the program: the previous CPU
//! counters, per-pid tick totals, and per-interface byte counters. One
//! `sample` call reads every source once, converts cumulative counters
//! into rates against that history, and replaces the history wholesale,
//! so pids and interfaces that disappeared are dropped automatically.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Instant;

use crate::core::snapshot::{
    CpuExtras, CpuTimes, NetworkSnapshot, ProcessInfo, Sample, SortMode,
};
use crate::platform::gpu::GpuMonitor;
use crate::platform::{proc, thermal};

/// Floor for the elapsed-seconds divisor, guarding against clock
/// anomalies between two back-to-back samples.
const MIN_ELAPSED_SECS: f64 = 0.001;

pub struct Sampler {
    prev_cpu: Option<CpuTimes>,
    prev_ticks: HashMap<i32, u64>,
    prev_net: HashMap<String, (u64, u64)>,
    last_sample: Instant,
    page_size: u64,
    gpu: GpuMonitor,
}

impl Sampler {
    pub fn new(gpu: GpuMonitor) -> Self {
        Self {
            prev_cpu: None,
            prev_ticks: HashMap::new(),
            prev_net: HashMap::new(),
            last_sample: Instant::now(),
            page_size: proc::page_size(),
            gpu,
        }
    }

    /// Run one full sampling pass.
    ///
    /// Absence of any single source is non-fatal: the corresponding
    /// field comes back zeroed or `None` and the dashboard degrades.
    pub fn sample(&mut self, sort: SortMode, filter: &str) -> Sample {
        let now = Instant::now();
        let elapsed = (now - self.last_sample).as_secs_f64().max(MIN_ELAPSED_SECS);
        self.last_sample = now;

        let cur_cpu = proc::read_cpu_times();
        let (total_delta, idle_delta) = match self.prev_cpu {
            Some(prev) => (
                cur_cpu.total().saturating_sub(prev.total()),
                cur_cpu.idle_total().saturating_sub(prev.idle_total()),
            ),
            // First sample: no baseline yet, report 0%.
            None => (0, 0),
        };

        let memory = proc::read_memory();
        let network = self.sample_network(elapsed);
        let gpu = self.gpu.sample(&memory);
        let processes = self.sample_processes(total_delta, sort, filter);
        self.prev_cpu = Some(cur_cpu);

        Sample {
            cpu_percent: aggregate_cpu_percent(total_delta, idle_delta),
            cpu_count: proc::read_cpu_count(),
            cpu_extras: CpuExtras {
                temperature_c: thermal::read_cpu_temp(),
                avg_freq_mhz: thermal::read_cpu_freq_mhz(),
            },
            memory,
            network,
            gpu,
            processes,
        }
    }

    /// Read the interface counters, derive the busiest one, and replace
    /// the counter map wholesale.
    fn sample_network(&mut self, elapsed: f64) -> NetworkSnapshot {
        let counters = proc::read_net_counters();
        let best = pick_busiest(&counters, &self.prev_net, elapsed);
        self.prev_net = counters
            .into_iter()
            .map(|(iface, rx, tx)| (iface, (rx, tx)))
            .collect();
        best
    }

    /// Walk `/proc`, build the filtered and sorted table, and replace
    /// the tick history. Ticks are recorded for every live pid, not
    /// just the filtered ones, so clearing the filter never produces a
    /// spurious CPU spike.
    fn sample_processes(
        &mut self,
        total_delta: u64,
        sort: SortMode,
        filter: &str,
    ) -> Vec<ProcessInfo> {
        let mut next_ticks = HashMap::with_capacity(self.prev_ticks.len().max(64));
        let mut processes = Vec::new();

        for pid in proc::list_pids() {
            // The process may have exited since the directory listing.
            let Some(stat) = proc::read_pid_stat(pid) else {
                continue;
            };
            let prev = self
                .prev_ticks
                .get(&pid)
                .copied()
                .unwrap_or(stat.total_ticks);
            next_ticks.insert(pid, stat.total_ticks);

            if !matches_filter(&stat.name, pid, filter) {
                continue;
            }
            processes.push(ProcessInfo {
                pid,
                name: stat.name,
                cpu_percent: process_cpu_percent(stat.total_ticks, prev, total_delta),
                mem_bytes: stat.rss_pages * self.page_size,
                threads: stat.threads,
            });
        }

        self.prev_ticks = next_ticks;
        processes.sort_by(|a, b| compare_processes(a, b, sort));
        processes
    }
}

/// Pick the busiest interface and compute its rates against the
/// previous counters.
///
/// Busiest means the largest cumulative rx+tx counter in the current
/// sample, never the largest rate, so the headline interface does not
/// flap between samples. Interfaces without a previous reading default
/// to their current counters, reporting zero rate instead of a startup
/// spike; a decreased counter also yields zero, never negative.
pub fn pick_busiest(
    counters: &[(String, u64, u64)],
    prev: &HashMap<String, (u64, u64)>,
    elapsed: f64,
) -> NetworkSnapshot {
    let mut best = NetworkSnapshot::default();
    let mut best_total = 0u64;
    for (iface, rx, tx) in counters {
        if rx + tx <= best_total {
            continue;
        }
        best_total = rx + tx;
        let (prev_rx, prev_tx) = prev.get(iface).copied().unwrap_or((*rx, *tx));
        best = NetworkSnapshot {
            interface: iface.clone(),
            rx_bytes_per_sec: rx.saturating_sub(prev_rx) as f64 / elapsed,
            tx_bytes_per_sec: tx.saturating_sub(prev_tx) as f64 / elapsed,
        };
    }
    best
}

/// Aggregate CPU usage over one delta window, clamped to [0, 100].
/// A zero total delta (first sample, or a counter reset) reports 0.
pub fn aggregate_cpu_percent(total_delta: u64, idle_delta: u64) -> f64 {
    if total_delta == 0 {
        return 0.0;
    }
    let busy = total_delta.saturating_sub(idle_delta);
    (busy as f64 * 100.0 / total_delta as f64).clamp(0.0, 100.0)
}

/// Per-process CPU usage: share of all ticks spent machine-wide during
/// the window. Deliberately *not* normalized by core count, so a
/// single-threaded hog on an 8-core machine tops out around 12.5% —
/// the same scale as the aggregate figure.
pub fn process_cpu_percent(ticks_now: u64, ticks_prev: u64, total_delta: u64) -> f64 {
    if total_delta == 0 {
        return 0.0;
    }
    let delta = ticks_now.saturating_sub(ticks_prev);
    (delta as f64 * 100.0 / total_delta as f64).clamp(0.0, 100.0)
}

/// Case-insensitive substring match on the name, or substring match on
/// the decimal pid. An empty filter matches everything.
pub fn matches_filter(name: &str, pid: i32, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    name.to_lowercase().contains(&filter.to_lowercase()) || pid.to_string().contains(filter)
}

/// Total order for the process table: primary key per sort mode
/// descending, tie-break on the other metric descending.
pub fn compare_processes(a: &ProcessInfo, b: &ProcessInfo, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Cpu => b
            .cpu_percent
            .total_cmp(&a.cpu_percent)
            .then_with(|| b.mem_bytes.cmp(&a.mem_bytes)),
        SortMode::Mem => b
            .mem_bytes
            .cmp(&a.mem_bytes)
            .then_with(|| b.cpu_percent.total_cmp(&a.cpu_percent)),
    }
}

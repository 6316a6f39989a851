//! Sampling core: the delta-computation engine and its typed snapshots.
//!
//! This module owns the business logic that turns raw cumulative kernel
//! counters into rates and percentages and maintains the process table
//! across samples. Reading the counters lives in the platform layer.

pub mod gpu;
pub mod sampler;
pub mod snapshot;

pub use gpu::GpuProbe;
pub use sampler::{
    aggregate_cpu_percent, compare_processes, matches_filter, pick_busiest, process_cpu_percent,
    Sampler,
};
pub use snapshot::{
    CpuExtras, CpuTimes, GpuSnapshot, MemorySnapshot, NetworkSnapshot, ProcessInfo, Sample,
    SortMode, VramInfo,
};

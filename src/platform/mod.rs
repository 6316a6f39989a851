//! Platform layer: everything that touches `/proc`, `/sys`, or a vendor
//! tool. All readers are best-effort and degrade to empty values.

pub mod gpu;
pub mod proc;
pub mod thermal;

pub use gpu::GpuMonitor;

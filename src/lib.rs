// ltop library - public API

// Re-export error types
pub mod error;
pub use error::{LtopError, Result};

// Module declarations
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use core::sampler::Sampler;
pub use core::snapshot::{Sample, SortMode};

// Initialize logging
//
// Quiet by default so the alternate screen stays clean; RUST_LOG=debug
// enables probe tracing on stderr.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
}

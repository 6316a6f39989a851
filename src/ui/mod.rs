//! Terminal user interface: raw input decoding, frame composition, and
//! the interactive event loop.

pub mod app;
pub mod dashboard;
pub mod input;
pub mod terminal;

pub use app::{run_monitor, MonitorConfig};
pub use dashboard::Dashboard;
pub use input::Key;
pub use terminal::TerminalSession;

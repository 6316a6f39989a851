use std::io;
use thiserror::Error;

/// Custom error type for the ltop application
///
/// Metric readers never surface errors (a missing source degrades to an
/// empty value), so the error surface is terminal I/O only.
#[derive(Error, Debug)]
pub enum LtopError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("not attached to an interactive terminal")]
    NotATty,

    #[error("terminal setup failed: {0}")]
    TerminalSetup(String),
}

/// Result type alias for the ltop application
pub type Result<T> = std::result::Result<T, LtopError>;

impl LtopError {
    /// Create a terminal setup error
    pub fn terminal_setup<S: Into<String>>(msg: S) -> Self {
        LtopError::TerminalSetup(msg.into())
    }
}

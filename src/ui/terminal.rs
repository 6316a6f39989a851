//! Terminal session management: raw mode, alternate screen, non-blocking
//! stdin, and restoration on every exit path.

use std::io::{stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor, execute,
    tty::IsTty,
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::error::{LtopError, Result};

/// Whether a session is active and needs undoing. Global because the
/// Ctrl-C handler has no access to the session value.
static RESTORE_ARMED: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(false));

/// Undo everything `TerminalSession::enter` did. Idempotent; safe to
/// call from the signal handler, the Drop impl, or both.
pub fn restore_terminal() {
    let mut armed = RESTORE_ARMED.lock();
    if !*armed {
        return;
    }
    *armed = false;

    let _ = disable_raw_mode();
    let _ = execute!(stdout(), LeaveAlternateScreen, cursor::Show);
    // Put stdin back into blocking mode for whatever runs next.
    unsafe {
        let flags = libc::fcntl(libc::STDIN_FILENO, libc::F_GETFL);
        if flags >= 0 {
            libc::fcntl(libc::STDIN_FILENO, libc::F_SETFL, flags & !libc::O_NONBLOCK);
        }
    }
}

/// RAII guard for the full-screen session.
pub struct TerminalSession {
    _private: (),
}

impl TerminalSession {
    /// Enter raw mode on the alternate screen with non-blocking stdin.
    ///
    /// Fails up front when stdout is not a terminal, before touching
    /// any terminal state.
    pub fn enter() -> Result<Self> {
        let mut out = stdout();
        if !out.is_tty() {
            return Err(LtopError::NotATty);
        }

        enable_raw_mode().map_err(|e| LtopError::terminal_setup(e.to_string()))?;
        execute!(
            out,
            EnterAlternateScreen,
            Clear(ClearType::All),
            cursor::MoveTo(0, 0),
            cursor::Hide
        )
        .map_err(|e| LtopError::terminal_setup(e.to_string()))?;
        out.flush()?;

        unsafe {
            let flags = libc::fcntl(libc::STDIN_FILENO, libc::F_GETFL);
            if flags >= 0 {
                libc::fcntl(libc::STDIN_FILENO, libc::F_SETFL, flags | libc::O_NONBLOCK);
            }
        }

        *RESTORE_ARMED.lock() = true;

        // Panics unwind through Drop, but a signal does not; the
        // handler restores directly and exits with the usual status.
        let _ = ctrlc::set_handler(|| {
            restore_terminal();
            std::process::exit(130);
        });

        Ok(Self { _private: () })
    }

    /// Block until stdin is readable or the timeout passes. Returns
    /// `true` when input is waiting.
    pub fn wait_for_input(&self, timeout: Duration) -> bool {
        let mut fds = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
        let ready = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        ready > 0 && (fds.revents & libc::POLLIN) != 0
    }

    /// Non-blocking read of whatever is buffered on stdin. Returns the
    /// number of bytes read, zero when nothing is available.
    pub fn read_input(&self, buf: &mut [u8]) -> usize {
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n > 0 {
            n as usize
        } else {
            0
        }
    }

    pub fn size(&self) -> (u16, u16) {
        crossterm::terminal::size().unwrap_or((80, 24))
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        restore_terminal();
    }
}

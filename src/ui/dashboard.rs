//! Full-screen dashboard renderer.
//!
//! Every frame is composed into an internal byte buffer as a queued
//! stream of terminal commands and flushed with a single write, so a
//! frame never appears half-drawn. Lines are overwritten in place with
//! clear-to-end-of-line instead of clearing the whole screen, which
//! keeps refresh flicker-free.

use std::io::{stdout, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{Clear, ClearType},
};

use crate::core::snapshot::{Sample, SortMode};
use crate::error::Result;

const PID_W: usize = 7;
const CPU_W: usize = 8;
const MEM_W: usize = 12;
const THR_W: usize = 4;
const NAME_MIN: usize = 12;

/// Rows consumed by everything that is not the process table: the
/// header block through the rule (12 lines, rows 0-11) plus the footer
/// on the last row. The table window must fit strictly between them.
const CHROME_ROWS: usize = 13;

/// Everything the renderer needs for one frame, borrowed from the app.
pub struct DashboardState<'a> {
    pub sample: &'a Sample,
    pub sort: SortMode,
    pub filter: &'a str,
    pub searching: bool,
    pub selection: usize,
}

pub struct Dashboard {
    buf: Vec<u8>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(16 * 1024),
        }
    }

    /// Compose and flush one frame for a `cols` x `rows` terminal.
    pub fn render(&mut self, state: &DashboardState, cols: u16, rows: u16) -> Result<()> {
        self.buf.clear();
        let cols = cols as usize;
        let s = state.sample;
        let mut row: u16 = 0;

        self.line(&mut row, format!("ltop - {} CPUs", s.cpu_count))?;

        let mut cpu_line = format!("CPU: {:5.1}%", s.cpu_percent);
        if let Some(mhz) = s.cpu_extras.avg_freq_mhz {
            cpu_line.push_str(&format!("  {:.0} MHz", mhz));
        }
        if let Some(t) = s.cpu_extras.temperature_c {
            cpu_line.push_str(&format!("  {:.1}C", t));
        }
        self.line(&mut row, cpu_line)?;

        self.line(
            &mut row,
            format!(
                "MEM: {:5.1}%  {} / {}",
                s.memory.used_percent(),
                human_bytes(s.memory.used_bytes),
                human_bytes(s.memory.total_bytes)
            ),
        )?;

        if s.memory.has_swap() {
            self.line(
                &mut row,
                format!(
                    "SWP: {:5.1}%  {} / {}",
                    s.memory.swap_percent(),
                    human_bytes(s.memory.swap_used_bytes),
                    human_bytes(s.memory.swap_total_bytes)
                ),
            )?;
        } else {
            self.line(&mut row, String::new())?;
        }

        if s.memory.has_cma() {
            self.line(
                &mut row,
                format!(
                    "CMA: {:5.1}%  {} / {}",
                    s.memory.cma_percent(),
                    human_bytes(s.memory.cma_used_bytes),
                    human_bytes(s.memory.cma_total_bytes)
                ),
            )?;
        } else {
            self.line(&mut row, String::new())?;
        }

        self.line(&mut row, gpu_line(s))?;

        self.line(
            &mut row,
            format!(
                "NET: {}  rx {}/s  tx {}/s",
                s.network.interface,
                human_bytes(s.network.rx_bytes_per_sec as u64),
                human_bytes(s.network.tx_bytes_per_sec as u64)
            ),
        )?;

        let mode = if state.searching { "SEARCHING" } else { "NORMAL" };
        self.line(
            &mut row,
            format!("[{mode}] q quit  j/k move  h/l sort  / search  Esc clear"),
        )?;

        let filter_line = if state.searching {
            format!("/{}_", state.filter)
        } else if !state.filter.is_empty() {
            format!("{} (press / to edit)", state.filter)
        } else {
            String::new()
        };
        self.line(&mut row, filter_line)?;
        self.line(&mut row, String::new())?;

        // Table header with a marker on the active sort column.
        let (cpu_hdr, mem_hdr) = match state.sort {
            SortMode::Cpu => ("CPU%\u{25BC}", "MEM"),
            SortMode::Mem => ("CPU%", "MEM\u{25BC}"),
        };
        let name_w = name_width(cols);
        let header = format!(
            "{:>PID_W$} {:>CPU_W$} {:>MEM_W$} {:>THR_W$} {:<name_w$}",
            "PID", cpu_hdr, mem_hdr, "THR", "NAME"
        );
        let rule_len = header.len().min(cols);
        self.line(&mut row, header)?;
        self.line(&mut row, "-".repeat(rule_len))?;

        let visible = visible_rows(rows);
        let count = s.processes.len();
        let (start, end) = scroll_window(state.selection, count, visible);
        for (idx, p) in s.processes[start..end].iter().enumerate() {
            let abs = start + idx;
            let text = format!(
                "{:>PID_W$} {:>CPU_W$.1} {:>MEM_W$} {:>THR_W$} {:<name_w$.name_w$}",
                p.pid,
                p.cpu_percent,
                human_bytes(p.mem_bytes),
                p.threads,
                p.name
            );
            if abs == state.selection {
                queue!(
                    self.buf,
                    MoveTo(0, row),
                    SetAttribute(Attribute::Reverse),
                    Print(&text),
                    SetAttribute(Attribute::Reset),
                    Clear(ClearType::UntilNewLine)
                )?;
                row += 1;
            } else {
                self.line(&mut row, text)?;
            }
        }

        // Wipe stale rows below the table, then pin the footer to the
        // last terminal row.
        queue!(self.buf, MoveTo(0, row), Clear(ClearType::FromCursorDown))?;
        queue!(
            self.buf,
            MoveTo(0, rows.saturating_sub(1)),
            Print(footer_text(start, end, count)),
            Clear(ClearType::UntilNewLine)
        )?;

        let mut out = stdout();
        out.write_all(&self.buf)?;
        out.flush()?;
        Ok(())
    }

    fn line(&mut self, row: &mut u16, text: String) -> Result<()> {
        queue!(
            self.buf,
            MoveTo(0, *row),
            Print(text),
            Clear(ClearType::UntilNewLine)
        )?;
        *row += 1;
        Ok(())
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

fn gpu_line(sample: &Sample) -> String {
    let Some(gpu) = &sample.gpu else {
        return "GPU:".to_string();
    };
    let mut line = format!("GPU: {}", gpu.vendor);
    if let Some(usage) = gpu.usage_percent {
        line.push_str(&format!("  {:5.1}%", usage));
    }
    if let Some(vram) = &gpu.vram {
        line.push_str(&format!(
            "  {} / {}",
            human_bytes(vram.used_bytes),
            human_bytes(vram.total_bytes)
        ));
    }
    if let Some(t) = gpu.temperature_c {
        line.push_str(&format!("  {:.1}C", t));
    }
    line
}

/// Width left for the NAME column after the fixed columns and their
/// separating spaces.
pub fn name_width(cols: usize) -> usize {
    let fixed = PID_W + CPU_W + MEM_W + THR_W + 5;
    cols.saturating_sub(fixed).max(NAME_MIN)
}

/// Process rows that fit on a terminal with `rows` total rows.
pub fn visible_rows(rows: u16) -> usize {
    (rows as usize).saturating_sub(CHROME_ROWS)
}

/// Keep the selection inside the current table.
pub fn clamp_selection(selection: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        selection.min(count - 1)
    }
}

/// Half-open window of table indexes to draw, centering the selection
/// when the table overflows the screen.
pub fn scroll_window(selection: usize, count: usize, visible: usize) -> (usize, usize) {
    if count == 0 || visible == 0 {
        return (0, 0);
    }
    let max_start = count.saturating_sub(visible);
    let start = selection.saturating_sub(visible / 2).min(max_start);
    (start, (start + visible).min(count))
}

/// Footer text with the 1-based inclusive range of visible rows. An
/// empty window (no rows, or a terminal too short for any table rows)
/// reports 0-0 so the range stays valid.
pub fn footer_text(start: usize, end: usize, count: usize) -> String {
    if end == 0 {
        format!("Showing 0-0 of {count}")
    } else {
        format!("Showing {}-{} of {}", start + 1, end, count)
    }
}

/// Scale a byte count into the unit that keeps the number readable.
pub fn human_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= GIB {
        format!("{:.2} GiB", b / GIB)
    } else if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

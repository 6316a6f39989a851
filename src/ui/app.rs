//! Interactive monitor: state machine plus the single-threaded event
//! loop that ties sampling, input, and rendering together.

use std::time::{Duration, Instant};

use anyhow::Context;

use crate::core::sampler::Sampler;
use crate::core::snapshot::{Sample, SortMode};
use crate::platform::gpu::GpuMonitor;
use crate::ui::dashboard::{clamp_selection, Dashboard, DashboardState};
use crate::ui::input::{decode, Key};
use crate::ui::terminal::TerminalSession;

/// Longest accepted search filter.
const MAX_FILTER_LEN: usize = 63;

/// Minimum time between frames; input bursts coalesce into one redraw.
const RENDER_INTERVAL: Duration = Duration::from_millis(16);

/// How long one input wait blocks before the loop checks its timers.
const INPUT_POLL: Duration = Duration::from_millis(10);

pub struct MonitorConfig {
    pub interval_ms: u64,
    pub enable_gpu: bool,
}

/// All mutable state of the interactive monitor.
pub struct MonitorApp {
    sampler: Sampler,
    sample: Sample,
    sort: SortMode,
    filter: String,
    searching: bool,
    selection: usize,
    needs_sample: bool,
    needs_render: bool,
    should_quit: bool,
}

impl MonitorApp {
    pub fn new(sampler: Sampler) -> Self {
        Self {
            sampler,
            sample: Sample::default(),
            sort: SortMode::Cpu,
            filter: String::new(),
            searching: false,
            selection: 0,
            needs_sample: true,
            needs_render: true,
            should_quit: false,
        }
    }

    /// Apply one keypress. Search mode captures printable characters;
    /// normal mode treats them as commands.
    pub fn handle_key(&mut self, key: Key) {
        if key == Key::Quit {
            self.should_quit = true;
            return;
        }

        if self.searching {
            self.handle_search_key(key);
        } else {
            self.handle_normal_key(key);
        }
    }

    fn handle_search_key(&mut self, key: Key) {
        match key {
            Key::Esc | Key::Enter => {
                // Leaving search keeps the filter applied.
                self.searching = false;
                self.needs_render = true;
            }
            Key::Backspace => {
                if self.filter.pop().is_none() {
                    self.searching = false;
                }
                self.selection = 0;
                self.needs_sample = true;
            }
            Key::Char(c) => {
                if self.filter.len() < MAX_FILTER_LEN {
                    self.filter.push(c);
                    self.selection = 0;
                    self.needs_sample = true;
                }
            }
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, key: Key) {
        match key {
            Key::Char('q') => self.should_quit = true,
            Key::Up | Key::Char('k') => {
                self.selection = self.selection.saturating_sub(1);
                self.needs_render = true;
            }
            Key::Down | Key::Char('j') => {
                self.selection = clamp_selection(self.selection + 1, self.sample.processes.len());
                self.needs_render = true;
            }
            Key::Left | Key::Char('h') => {
                self.sort = SortMode::Cpu;
                self.needs_sample = true;
            }
            Key::Right | Key::Char('l') => {
                self.sort = SortMode::Mem;
                self.needs_sample = true;
            }
            Key::Char('/') => {
                // Search always starts from an empty filter.
                self.searching = true;
                self.filter.clear();
                self.selection = 0;
                self.needs_render = true;
            }
            Key::Esc => {
                if !self.filter.is_empty() {
                    self.filter.clear();
                    self.selection = 0;
                    self.needs_sample = true;
                }
            }
            _ => {}
        }
    }

    fn resample(&mut self) {
        self.sample = self.sampler.sample(self.sort, &self.filter);
        self.selection = clamp_selection(self.selection, self.sample.processes.len());
        self.needs_sample = false;
        self.needs_render = true;
    }
}

/// Run the interactive monitor until quit.
///
/// Single-threaded: the loop alternates between a short blocking wait
/// for input and the sampling/render timers, so idle CPU cost stays
/// near zero while keystrokes still land within one poll interval.
pub fn run_monitor(config: MonitorConfig) -> anyhow::Result<()> {
    let gpu = if config.enable_gpu {
        GpuMonitor::new()
    } else {
        GpuMonitor::disabled()
    };
    let session = TerminalSession::enter().context("failed to set up terminal")?;

    let mut app = MonitorApp::new(Sampler::new(gpu));
    let mut dashboard = Dashboard::new();
    let sample_interval = Duration::from_millis(config.interval_ms.max(1));
    let mut last_sampled = Instant::now() - sample_interval;
    let mut last_rendered = Instant::now() - RENDER_INTERVAL;
    let mut buf = [0u8; 256];

    loop {
        if app.needs_sample || last_sampled.elapsed() >= sample_interval {
            app.resample();
            last_sampled = Instant::now();
        }

        if app.needs_render && last_rendered.elapsed() >= RENDER_INTERVAL {
            let (cols, rows) = session.size();
            let state = DashboardState {
                sample: &app.sample,
                sort: app.sort,
                filter: &app.filter,
                searching: app.searching,
                selection: app.selection,
            };
            dashboard.render(&state, cols, rows)?;
            app.needs_render = false;
            last_rendered = Instant::now();
        }

        if session.wait_for_input(INPUT_POLL) {
            // Drain everything buffered so a paste or key repeat burst
            // is applied before the next frame.
            loop {
                let n = session.read_input(&mut buf);
                if n == 0 {
                    break;
                }
                for key in decode(&buf[..n]) {
                    app.handle_key(key);
                }
                if !session.wait_for_input(Duration::ZERO) {
                    break;
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    drop(session);
    Ok(())
}

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::core::config::{Config, InfoColumn, MemoryMode};
use crate::core::monitor::messages::Message;
use crate::core::monitor::metrics::MonitorSnapshot;
use crate::core::monitor::rank::SortKey;
use crate::core::monitor::runtime::SamplerRuntime;
use crate::core::monitor::sampler::MonitorContext;

use super::event_handler::MonitorEvent;
use super::render::render_ui;

const FRAME_INTERVAL: Duration = Duration::from_millis(250);
const PERIOD_STEP: Duration = Duration::from_millis(500);

/// Monitor application state
pub struct MonitorApp {
    pub hostname: String,
    pub sort: SortKey,
    pub info: InfoColumn,
    pub memory: MemoryMode,
    pub top: usize,
    pub period: Duration,
    pub snapshot: MonitorSnapshot,
    pub message: Option<Message>,
    pub should_quit: bool,
    pub needs_clear: bool,
    period_changed: bool,
}

impl MonitorApp {
    pub fn new(config: &MonitorAppConfig) -> Self {
        Self {
            hostname: config.hostname.clone(),
            sort: config.sort,
            info: config.info,
            memory: config.memory,
            top: config.top,
            period: config.period,
            snapshot: MonitorSnapshot::default(),
            message: None,
            should_quit: false,
            needs_clear: false,
            period_changed: false,
        }
    }

    /// Copy the frame's view out of the shared context and drain its
    /// messages. Call with the runtime's mask held.
    pub fn capture(&mut self, ctx: &mut MonitorContext) {
        self.snapshot = ctx.snapshot(self.sort, self.top);
        if let Some(message) = ctx.messages.most_important().cloned() {
            self.message = Some(message);
        }
        ctx.messages.drain();
    }

    /// Handle keyboard events
    pub fn handle_event(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Quit => self.should_quit = true,
            MonitorEvent::NextSort => self.sort = self.sort.next(),
            MonitorEvent::NextInfo => self.info = self.info.next(),
            MonitorEvent::ToggleMemory => self.memory = self.memory.toggle(),
            MonitorEvent::Faster => {
                if self.period > PERIOD_STEP {
                    self.period -= PERIOD_STEP;
                    self.period_changed = true;
                }
            }
            MonitorEvent::Slower => {
                self.period += PERIOD_STEP;
                self.period_changed = true;
            }
            MonitorEvent::Redraw => self.needs_clear = true,
            MonitorEvent::None => {}
        }
    }

    /// The new period, once, after a key changed it.
    pub fn take_period_change(&mut self) -> Option<Duration> {
        if std::mem::take(&mut self.period_changed) {
            Some(self.period)
        } else {
            None
        }
    }
}

/// Configuration for the monitor app
#[derive(Debug, Clone)]
pub struct MonitorAppConfig {
    pub hostname: String,
    pub sort: SortKey,
    pub info: InfoColumn,
    pub memory: MemoryMode,
    pub top: usize,
    pub period: Duration,
}

impl MonitorAppConfig {
    pub fn from_config(config: &Config, hostname: String, period: Duration) -> Self {
        Self {
            hostname,
            sort: config.sort,
            info: config.info,
            memory: config.memory,
            top: config.top,
            period,
        }
    }
}

/// Run the monitor TUI application
pub fn run_monitor_app(config: MonitorAppConfig, runtime: &SamplerRuntime) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = event_loop(&mut terminal, MonitorApp::new(&config), runtime);

    // Restore terminal even when the loop failed
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: MonitorApp,
    runtime: &SamplerRuntime,
) -> Result<()> {
    loop {
        {
            let mut ctx = runtime.mask();
            app.capture(&mut ctx);
        }

        if std::mem::take(&mut app.needs_clear) {
            terminal.clear().context("Failed to clear terminal")?;
        }
        terminal.draw(|frame| render_ui(frame, &app))?;

        if event::poll(FRAME_INTERVAL).context("Event poll failed")? {
            if let Event::Key(key) = event::read().context("Event read failed")? {
                if key.kind == KeyEventKind::Press {
                    app.handle_event(MonitorEvent::from_key(key));
                }
            }
        }

        if app.should_quit {
            break;
        }

        if let Some(period) = app.take_period_change() {
            runtime.set_period(period)?;
        }
    }
    Ok(())
}

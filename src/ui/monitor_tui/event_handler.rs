use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Events that can occur in the monitor TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    Quit,
    /// Cycle cpu / rss / vsize
    NextSort,
    /// Cycle pid / cmdline / wchan / user / priority
    NextInfo,
    ToggleMemory,
    /// Shorten the update period by half a second
    Faster,
    /// Lengthen the update period by half a second
    Slower,
    Redraw,
    None,
}

impl MonitorEvent {
    pub fn from_key(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                MonitorEvent::Redraw
            }
            KeyCode::Char('q') | KeyCode::Esc => MonitorEvent::Quit,
            KeyCode::Char('s') | KeyCode::Char(' ') => MonitorEvent::NextSort,
            KeyCode::Char('i') => MonitorEvent::NextInfo,
            KeyCode::Char('m') => MonitorEvent::ToggleMemory,
            KeyCode::Char('-') => MonitorEvent::Faster,
            KeyCode::Char('+') => MonitorEvent::Slower,
            _ => MonitorEvent::None,
        }
    }
}

use ratatui::prelude::*;

use crate::core::monitor::logins::PresenceStatus;
use crate::core::monitor::messages::Priority;

/// Color for a CPU percentage
pub fn cpu_color(value: f64) -> Color {
    match value {
        v if v < 50.0 => Color::Cyan,
        v if v < 75.0 => Color::LightYellow,
        v if v < 90.0 => Color::LightRed,
        _ => Color::Red,
    }
}

/// Style of a watch-group member id
pub fn presence_style(status: PresenceStatus) -> Style {
    match status {
        PresenceStatus::NotLoggedIn => Style::default().fg(Color::DarkGray),
        PresenceStatus::JustLoggedIn => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        PresenceStatus::LoggedIn => Style::default().fg(Color::Green),
    }
}

pub fn message_style(priority: Priority) -> Style {
    match priority {
        Priority::Min => Style::default().fg(Color::DarkGray),
        Priority::Med => Style::default().fg(Color::Yellow),
        Priority::Max => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

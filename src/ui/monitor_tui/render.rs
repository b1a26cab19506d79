use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use super::app::MonitorApp;
use super::widgets::{cpu_color, message_style, presence_style};
use crate::ui::formatters::{
    flags_line, format_info, format_name, format_size, format_sort_value, memory_figures,
};

/// Main render function
pub fn render_ui(frame: &mut Frame, app: &MonitorApp) {
    let area = frame.area();

    let block = Block::default()
        .title(format!(" Information for {} ", app.hostname))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(summary_height(app)), // Load, CPU, memory, logins, groups
            Constraint::Length(1),                   // Flags
            Constraint::Min(1),                      // Processes
            Constraint::Length(1),                   // Message
        ])
        .split(inner);

    render_summary(frame, chunks[0], app);
    render_flags(frame, chunks[1], app);
    render_processes(frame, chunks[2], app);
    render_message(frame, chunks[3], app);
}

fn summary_height(app: &MonitorApp) -> u16 {
    let disk_row = usize::from(!app.snapshot.filesystems.is_empty());
    (5 + app.snapshot.groups.len() + disk_row) as u16
}

fn render_summary(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let snapshot = &app.snapshot;
    let cpu = &snapshot.cpu;
    let busy = cpu.user + cpu.nice + cpu.system;
    let label = Style::default().add_modifier(Modifier::BOLD);

    let (mem, swap) = memory_figures(&snapshot.memory, app.memory);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Load:   ", label),
            Span::raw(format!(
                "{:5.2} {:5.2} {:5.2}",
                snapshot.loads.one, snapshot.loads.five, snapshot.loads.fifteen
            )),
        ]),
        Line::from(vec![
            Span::styled("CPU:    ", label),
            Span::styled(
                format!(
                    "{:5.1}%U {:5.1}%S {:5.1}%I",
                    cpu.user + cpu.nice,
                    cpu.system,
                    cpu.idle
                ),
                Style::default().fg(cpu_color(busy)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Mem:    ", label),
            Span::raw(mem),
            Span::styled("  Swap: ", label),
            Span::raw(swap),
        ]),
        Line::from(vec![
            Span::styled("Logins: ", label),
            Span::raw(format!("{:3}", snapshot.logins.tty_logins)),
            Span::styled("   Real: ", label),
            Span::raw(format!("{:3}", snapshot.logins.tty_users)),
        ]),
        Line::from(vec![
            Span::styled("XLogins:", label),
            Span::raw(format!("{:3}", snapshot.logins.x_logins)),
            Span::styled("   Real: ", label),
            Span::raw(format!("{:3}", snapshot.logins.x_users)),
        ]),
    ];

    for group in &snapshot.groups {
        let mut spans = vec![Span::styled(format!("{:<12.12} ", group.name), label)];
        spans.extend(
            group
                .members
                .iter()
                .map(|(id, status)| Span::styled(id.to_string(), presence_style(*status))),
        );
        lines.push(Line::from(spans));
    }

    // Tightest writable filesystem
    if let Some(fs) = snapshot.filesystems.iter().min_by_key(|fs| fs.available_bytes) {
        let style = if fs.full {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled("Disk:   ", label),
            Span::styled(
                format!("{:.18} {} free", fs.mount_point, format_size(fs.available_bytes)),
                style,
            ),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_flags(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let flags = flags_line(app.sort, app.info, app.memory);
    let para = Paragraph::new(format!("{}  {:.1}s", flags, app.period.as_secs_f64()))
        .style(Style::default().fg(Color::Cyan));
    frame.render_widget(para, area);
}

fn render_processes(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let lines: Vec<Line> = app
        .snapshot
        .processes
        .iter()
        .take(area.height as usize)
        .map(|process| {
            let value_style = match app.sort {
                crate::core::monitor::rank::SortKey::Cpu => {
                    Style::default().fg(cpu_color(process.cpu_percent))
                }
                _ => Style::default(),
            };
            Line::from(vec![
                Span::raw(format!("{} ", format_name(process))),
                Span::styled(format!("{} ", format_sort_value(process, app.sort)), value_style),
                Span::raw(format_info(process, app.info)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_message(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let para = match &app.message {
        Some(message) => Paragraph::new(message.text.as_str()).style(message_style(message.priority)),
        None => Paragraph::new(" q: Quit │ s: Sort │ i: Info │ m: Memory │ +/-: Period ")
            .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(para, area);
}

//! Alerts list.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::types::{Alert, AlertKind, Severity};
use crate::ui::theme::{severity_color, ACCENT, MUTED};
use crate::ui::util::{draw_scrollbar, inner, scroll_offset};
use crate::view::format_timestamp;

fn severity_text(s: Severity) -> &'static str {
    match s {
        Severity::Critical => "CRITICAL",
        Severity::Error => "ERROR",
        Severity::Warning => "WARNING",
        Severity::Info => "INFO",
    }
}

fn kind_text(k: AlertKind) -> &'static str {
    match k {
        AlertKind::Cpu => "cpu",
        AlertKind::Memory => "memory",
        AlertKind::Disk => "disk",
        AlertKind::Network => "network",
        AlertKind::System => "system",
        AlertKind::Other => "other",
    }
}

pub fn draw_alerts(f: &mut ratatui::Frame<'_>, area: Rect, alerts: &[Alert], selected: usize) {
    let active = alerts.iter().filter(|a| a.active).count();
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Alerts ({active} active)  d: dismiss")),
        area,
    );
    let inner = inner(area);
    if inner.height < 2 || inner.width < 3 {
        return;
    }
    if alerts.is_empty() {
        f.render_widget(Paragraph::new("No alerts").style(Style::default().fg(MUTED)), inner);
        return;
    }
    let content = Rect {
        width: inner.width.saturating_sub(2),
        ..inner
    };
    let view = content.height.saturating_sub(1) as usize;
    let offset = scroll_offset(selected, alerts.len(), view);

    let rows = alerts.iter().enumerate().skip(offset).take(view).map(|(i, a)| {
        let mut style = if a.active {
            Style::default()
        } else {
            Style::default().fg(MUTED)
        };
        if i == selected {
            style = style.bg(Color::Rgb(40, 60, 90)).add_modifier(Modifier::BOLD);
        }
        Row::new(vec![
            Cell::from(severity_text(a.severity))
                .style(Style::default().fg(severity_color(a.severity))),
            Cell::from(kind_text(a.kind)),
            Cell::from(a.agent_hostname.clone().unwrap_or_default()),
            Cell::from(if a.title.is_empty() { a.message.clone() } else { format!("{}: {}", a.title, a.message) }),
            Cell::from(format_timestamp(a.timestamp)),
            Cell::from(if a.active { "active" } else { "dismissed" }),
        ])
        .style(style)
    });

    let header = Row::new(vec!["Severity", "Type", "Agent", "Message", "Time", "State"])
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    let widths = [
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(16),
        Constraint::Min(20),
        Constraint::Length(20),
        Constraint::Length(10),
    ];
    f.render_widget(Table::new(rows, widths).header(header).column_spacing(1), content);

    let bar = Rect {
        x: inner.x + inner.width.saturating_sub(1),
        width: 1,
        ..inner
    };
    draw_scrollbar(f, bar, alerts.len(), view, offset);
}

//! Top header (endpoint, connection, last update) and the section tabs.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
};

use crate::api::DashboardApi;
use crate::dashboard::{Dashboard, Section};
use crate::ui::theme::{ACCENT, MUTED};

pub fn draw_header<A: DashboardApi>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    dash: &Dashboard<A>,
    endpoint: &str,
) {
    let (dot, state, color) = if dash.is_loading() {
        ("◌", "loading", Color::Yellow)
    } else if dash.is_connected() {
        ("●", "connected", Color::Green)
    } else {
        ("●", "disconnected", Color::Red)
    };
    let updated = dash
        .last_update()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".into());
    let every = dash.timer().interval().as_secs();

    let line = Line::from(vec![
        Span::styled("netdash", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" | {endpoint} | ")),
        Span::styled(format!("{dot} {state}"), Style::default().fg(color)),
        Span::raw(format!(" | updated {updated} | every {every}s")),
        Span::styled("  (press 'q' to quit)", Style::default().fg(MUTED)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn tab_title<A: DashboardApi>(dash: &Dashboard<A>, s: Section) -> String {
    match s {
        Section::Agents => format!("2 Agents ({})", dash.table_agents().len()),
        Section::Alerts => format!("4 Alerts ({})", dash.active_alert_count()),
        other => format!("{} {}", other.index() + 1, other.title()),
    }
}

pub fn draw_tabs<A: DashboardApi>(f: &mut ratatui::Frame<'_>, area: Rect, dash: &Dashboard<A>) {
    let titles: Vec<String> = Section::ALL.iter().map(|s| tab_title(dash, *s)).collect();
    let tabs = Tabs::new(titles)
        .select(dash.section().index())
        .style(Style::default().fg(MUTED))
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .divider("|");
    f.render_widget(tabs, area);
}

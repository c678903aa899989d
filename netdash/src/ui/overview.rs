//! Overview: stat cards, usage gauges, realtime charts, and the agents table
//! with per-cell threshold coloring, zebra striping and a scrollbar.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::api::DashboardApi;
use crate::dashboard::{
    Dashboard, CPU_CHART, CPU_GAUGE, DISK_GAUGE, MEMORY_CHART, MEMORY_GAUGE,
};
use crate::ui::charts::{draw_gauge, draw_line_chart};
use crate::ui::theme::{status_color, tier_color, ACCENT, MUTED};
use crate::ui::util::{draw_scrollbar, inner, scroll_offset, truncate_middle};
use crate::view::{AgentRow, MetricCell};

const COLS: [Constraint; 7] = [
    Constraint::Percentage(22), // Hostname
    Constraint::Length(16),     // IP
    Constraint::Length(8),      // CPU
    Constraint::Length(8),      // Memory
    Constraint::Length(8),      // Disk
    Constraint::Length(20),     // Last update
    Constraint::Length(8),      // Status
];

pub fn draw_overview<A: DashboardApi>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    dash: &mut Dashboard<A>,
    selected: usize,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),   // stat cards
            Constraint::Length(3),   // gauges
            Constraint::Ratio(1, 3), // realtime charts
            Constraint::Min(5),      // agents table
        ])
        .split(area);

    draw_stat_cards(f, rows[0], dash);

    let gauges = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(rows[1]);
    for (id, slot) in [CPU_GAUGE, MEMORY_GAUGE, DISK_GAUGE].iter().zip(gauges.iter()) {
        draw_gauge(f, *slot, dash.charts().get(id));
    }

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);
    draw_line_chart(f, charts[0], dash.charts_mut(), CPU_CHART);
    draw_line_chart(f, charts[1], dash.charts_mut(), MEMORY_CHART);

    let title = if dash.filter().is_empty() {
        format!("Agents ({} total, timespan {})", dash.table_agents().len(), dash.timespan())
    } else {
        format!("Agents (filter: '{}')", dash.filter())
    };
    draw_agents_table(f, rows[3], &title, &dash.visible_rows(), selected);
}

fn draw_stat_cards<A: DashboardApi>(f: &mut ratatui::Frame<'_>, area: Rect, dash: &Dashboard<A>) {
    let s = dash.stats();
    let cards = [
        ("Agents", s.total_agents.to_string()),
        ("Avg CPU", format!("{:.1}%", s.avg_cpu)),
        ("Avg Memory", format!("{:.1}%", s.avg_memory)),
        ("Avg Disk", format!("{:.1}%", s.avg_disk)),
        ("Active alerts", s.active_alerts.to_string()),
    ];
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 5); 5])
        .split(area);
    for ((label, value), slot) in cards.iter().zip(slots.iter()) {
        let p = Paragraph::new(Line::from(Span::styled(
            value.clone(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )))
        .centered()
        .block(Block::default().borders(Borders::ALL).title(*label));
        f.render_widget(p, *slot);
    }
}

fn metric_cell(m: &MetricCell) -> Cell<'static> {
    Cell::from(m.text()).style(Style::default().fg(tier_color(m.tier)))
}

pub fn draw_agents_table(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    rows: &[AgentRow],
    selected: usize,
) {
    f.render_widget(
        Block::default().borders(Borders::ALL).title(title.to_string()),
        area,
    );

    // reserve 2 columns for the scrollbar
    let inner = inner(area);
    if inner.height < 1 || inner.width < 3 {
        return;
    }
    let content = Rect {
        width: inner.width.saturating_sub(2),
        ..inner
    };

    if rows.is_empty() {
        let msg = Paragraph::new(Span::styled("No agents", Style::default().fg(MUTED)));
        f.render_widget(msg, content);
        return;
    }

    let viewport_rows = content.height.saturating_sub(1) as usize;
    let offset = scroll_offset(selected, rows.len(), viewport_rows);
    let host_w = (content.width as usize * 22 / 100).max(4);

    let body = rows
        .iter()
        .enumerate()
        .skip(offset)
        .take(viewport_rows)
        .map(|(i, r)| {
            let base = if i == selected {
                Style::default().bg(Color::Rgb(40, 60, 90)).add_modifier(Modifier::BOLD)
            } else if i % 2 == 1 {
                Style::default().bg(Color::Rgb(24, 24, 28))
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(truncate_middle(&r.hostname, host_w)),
                Cell::from(r.ip.clone()).style(Style::default().fg(MUTED)),
                metric_cell(&r.cpu),
                metric_cell(&r.memory),
                metric_cell(&r.disk),
                Cell::from(r.last_update.clone()),
                Cell::from(r.status.text()).style(Style::default().fg(status_color(r.status))),
            ])
            .style(base)
        });

    let header = Row::new(vec!["Hostname", "IP", "CPU", "Memory", "Disk", "Last update", "Status"])
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));

    let table = Table::new(body, COLS.to_vec())
        .header(header)
        .column_spacing(1);
    f.render_widget(table, content);

    let scroll_area = Rect {
        x: inner.x + inner.width.saturating_sub(1),
        y: inner.y,
        width: 1,
        height: inner.height,
    };
    draw_scrollbar(f, scroll_area, rows.len(), viewport_rows, offset);
}

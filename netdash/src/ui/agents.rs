//! Agent cards with per-metric gauges, and the detail pane for the
//! selected agent.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use crate::api::DashboardApi;
use crate::dashboard::Dashboard;
use crate::types::{Agent, Metric, ThresholdConfig};
use crate::ui::theme::{status_color, tier_color, ACCENT, MUTED};
use crate::ui::util::{inner, scroll_offset, truncate_middle};
use crate::view::{format_timestamp, format_uptime, StatusTier};

const CARD_H: u16 = 5;

pub fn draw_agents<A: DashboardApi>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    dash: &Dashboard<A>,
    selected: usize,
) {
    let (grid_area, detail_area) = match dash.agent_detail() {
        Some(_) => {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(area);
            (cols[0], Some(cols[1]))
        }
        None => (area, None),
    };

    draw_cards(f, grid_area, dash.grid_agents(), dash.thresholds(), selected);
    if let (Some(a), Some(slot)) = (dash.agent_detail(), detail_area) {
        draw_detail(f, slot, a);
    }
}

fn draw_cards(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    agents: &[Agent],
    thresholds: &ThresholdConfig,
    selected: usize,
) {
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Agents ({})  Enter: details", agents.len())),
        area,
    );
    let inner = inner(area);
    if inner.height < CARD_H {
        return;
    }
    if agents.is_empty() {
        f.render_widget(Paragraph::new(Span::styled("No agents", Style::default().fg(MUTED))), inner);
        return;
    }

    let fit = (inner.height / CARD_H) as usize;
    let offset = scroll_offset(selected, agents.len(), fit);
    let shown = agents.len().saturating_sub(offset).min(fit);
    let constraints: Vec<Constraint> = (0..shown).map(|_| Constraint::Length(CARD_H)).collect();
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (slot, (i, a)) in slots.iter().zip(agents.iter().enumerate().skip(offset)) {
        let mut title_style = Style::default().fg(status_color(a.status));
        if i == selected {
            title_style = title_style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }
        let title = Line::from(vec![
            Span::styled(
                format!(" {} ", truncate_middle(&a.hostname, (slot.width / 2) as usize)),
                title_style,
            ),
            Span::styled(format!(" {}  {}", a.ip_address, a.status.text()), Style::default().fg(MUTED)),
        ]);
        f.render_widget(Block::default().borders(Borders::ALL).title(title), *slot);

        let card = inner_rows(*slot);
        for (metric, (value, row)) in Metric::ALL
            .iter()
            .zip([a.cpu_percent, a.memory_percent, a.disk_percent].iter().zip(card.iter()))
        {
            let tier = StatusTier::classify(*value, thresholds.for_metric(*metric) as f64);
            let ratio = if value.is_finite() { (value / 100.0).clamp(0.0, 1.0) } else { 0.0 };
            let g = Gauge::default()
                .ratio(ratio)
                .label(format!("{} {value:.1}%", metric.label()))
                .gauge_style(Style::default().fg(tier_color(tier)));
            f.render_widget(g, *row);
        }
    }
}

fn inner_rows(slot: Rect) -> Vec<Rect> {
    let i = inner(slot);
    (0..i.height.min(3))
        .map(|k| Rect {
            y: i.y + k,
            height: 1,
            ..i
        })
        .collect()
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<14}"), Style::default().fg(ACCENT)),
        Span::raw(value),
    ])
}

fn draw_detail(f: &mut ratatui::Frame<'_>, area: Rect, a: &Agent) {
    let lines = vec![
        field("Hostname", a.hostname.clone()),
        field("IP address", a.ip_address.clone()),
        field("Status", a.status.text().to_string()),
        field("Platform", a.platform.clone().unwrap_or_else(|| "N/A".into())),
        field("Architecture", a.architecture.clone().unwrap_or_else(|| "N/A".into())),
        field("CPU", format!("{:.1}%", a.cpu_percent)),
        field("Memory", format!("{:.1}%", a.memory_percent)),
        field("Disk", format!("{:.1}%", a.disk_percent)),
        field("Processes", a.processes.to_string()),
        field("Uptime", format_uptime(a.uptime)),
        field("Last update", format_timestamp(a.last_update)),
    ];
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Agent detail (Esc closes)"));
    f.render_widget(p, area);
}

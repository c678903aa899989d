//! Drawing for registry charts: gauges and time-series line charts.

use chrono::{Local, TimeZone};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart as LineWidget, Dataset, Gauge, GraphType, Paragraph},
};

use crate::charts::{AxisLayout, Chart, ChartEntry, ChartRegistry, LineChart, TimeAxis};
use crate::ui::theme::{gauge_color, series_color, MUTED};

pub fn draw_gauge(f: &mut ratatui::Frame<'_>, area: Rect, entry: Option<&ChartEntry>) {
    let Some(Chart::Gauge(g)) = entry.map(|e| &e.chart) else {
        f.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };
    let ratio = if g.used.is_finite() {
        (g.used / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let w = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(g.title.clone()))
        .gauge_style(Style::default().fg(gauge_color(g.tier)))
        .ratio(ratio)
        .label(format!("{:.1}% used / {:.1}% free", g.used, g.free));
    f.render_widget(w, area);
}

fn time_labels(axis: &TimeAxis, layout: &AxisLayout) -> Vec<Span<'static>> {
    layout
        .ticks
        .iter()
        .map(|t| {
            let text = Local
                .timestamp_millis_opt(*t as i64)
                .single()
                .map(|d| d.format(axis.format).to_string())
                .unwrap_or_default();
            Span::styled(text, Style::default().fg(MUTED))
        })
        .collect()
}

// Local offset from UTC right now, in milliseconds.
fn local_offset_ms() -> f64 {
    Local::now().offset().local_minus_utc() as f64 * 1000.0
}

pub fn draw_line_chart(f: &mut ratatui::Frame<'_>, area: Rect, charts: &mut ChartRegistry, id: &str) {
    let Some(entry) = charts.lay_out(id, area, local_offset_ms()) else {
        f.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };
    let Chart::Line(line) = &entry.chart else {
        f.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(line.title.clone());
    let Some(layout) = &entry.layout else {
        f.render_widget(Paragraph::new("No data").block(block), area);
        return;
    };

    let datasets: Vec<Dataset> = line
        .datasets
        .iter()
        .map(|d| {
            Dataset::default()
                .name(d.metric.label())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(series_color(d.metric)))
                .data(&d.points)
        })
        .collect();

    let y_max = y_ceiling(line);
    let chart = LineWidget::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds(layout.bounds)
                .labels(time_labels(&line.axis, layout)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", y_max / 2.0)),
                    Span::styled(format!("{y_max:.0}"), Style::default().add_modifier(Modifier::BOLD)),
                ]),
        );
    f.render_widget(chart, area);
}

// Percentages normally top out at 100, but raw values are never clamped.
fn y_ceiling(line: &LineChart) -> f64 {
    let peak = line
        .datasets
        .iter()
        .flat_map(|d| d.points.iter().map(|p| p.1))
        .fold(0.0_f64, f64::max);
    if peak > 100.0 {
        (peak / 10.0).ceil() * 10.0
    } else {
        100.0
    }
}

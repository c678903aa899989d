//! History section: range inputs and the three-metric history chart.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::api::DashboardApi;
use crate::dashboard::{Dashboard, HISTORY_CHART};
use crate::ui::charts::draw_line_chart;
use crate::ui::theme::{ACCENT, MUTED};
use crate::ui::{InputMode, UiState};

pub const RANGE_FIELDS: [&str; 2] = ["Start", "End"];

pub fn draw_history<A: DashboardApi>(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    dash: &mut Dashboard<A>,
    ui: &UiState,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let selected = ui.selected(dash.section());
    let values = [&ui.history_start, &ui.history_end];
    let mut spans = Vec::new();
    for (i, (label, value)) in RANGE_FIELDS.iter().zip(values).enumerate() {
        let editing = i == selected && ui.mode == InputMode::Edit;
        let shown = if editing { format!("{}_", ui.input) } else { value.clone() };
        let mut style = Style::default();
        if i == selected {
            style = style.fg(ACCENT).add_modifier(Modifier::BOLD);
        }
        spans.push(Span::styled(format!("{label}: "), style));
        spans.push(Span::styled(format!("[{shown}]"), style));
        spans.push(Span::raw("   "));
    }
    spans.push(Span::styled(
        format!("{} points  (Enter edits, r reloads, YYYY-MM-DDTHH:MM)", dash.history_points()),
        Style::default().fg(MUTED),
    ));
    f.render_widget(
        Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("Range")),
        rows[0],
    );

    draw_line_chart(f, rows[1], dash.charts_mut(), HISTORY_CHART);
}

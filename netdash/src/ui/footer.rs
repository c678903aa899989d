//! Bottom line: filter prompt, the newest notification, or key hints.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::notify::Toasts;
use crate::ui::theme::{level_color, ACCENT, MUTED};
use crate::ui::{InputMode, UiState};

const HINTS: &str =
    "1-5/Tab section  r refresh  i interval  t timespan  / filter  e export  c test  Enter open  q quit";

pub fn draw_footer(f: &mut ratatui::Frame<'_>, area: Rect, toasts: &Toasts, ui: &UiState) {
    let line = if ui.mode == InputMode::Filter {
        Line::from(vec![
            Span::styled("filter: ", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
            Span::raw(format!("{}_", ui.input)),
            Span::styled("  (Enter keeps, Esc clears)", Style::default().fg(MUTED)),
        ])
    } else if let Some(t) = toasts.latest() {
        let more = toasts.len().saturating_sub(1);
        let mut spans = vec![Span::styled(
            t.message.clone(),
            Style::default().fg(level_color(t.level)).add_modifier(Modifier::BOLD),
        )];
        if more > 0 {
            spans.push(Span::styled(format!("  (+{more})"), Style::default().fg(MUTED)));
        }
        Line::from(spans)
    } else {
        Line::from(Span::styled(HINTS, Style::default().fg(MUTED)))
    };
    f.render_widget(Paragraph::new(line), area);
}

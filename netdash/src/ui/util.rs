//! Small UI helpers: inner areas, truncation, list scrolling and the scrollbar.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::ui::theme::{SB_ARROW, SB_THUMB, SB_TRACK};

/// Area inside a one-cell border.
pub fn inner(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

pub fn truncate_middle(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "...".into();
    }
    let keep = max - 3;
    let left: String = s.chars().take(keep / 2).collect();
    let right: String = s.chars().skip(n - (keep - keep / 2)).collect();
    format!("{left}...{right}")
}

/// First visible row so that `selected` stays inside a `view`-row window.
pub fn scroll_offset(selected: usize, total: usize, view: usize) -> usize {
    if view == 0 || total <= view {
        return 0;
    }
    let max_off = total - view;
    selected.saturating_sub(view - 1).min(max_off)
}

/// Vertical scrollbar: arrows at both ends, a proportional thumb between.
pub fn draw_scrollbar(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    total_rows: usize,
    viewport_rows: usize,
    offset: usize,
) {
    if area.height < 3 {
        return;
    }
    let track = (area.height - 2) as usize;
    let total = total_rows.max(1);
    let view = viewport_rows.clamp(1, total);
    let max_off = total.saturating_sub(view);

    let thumb_len = (track * view).div_ceil(total).max(1).min(track);
    let thumb_top = if max_off == 0 {
        0
    } else {
        ((track - thumb_len) * offset.min(max_off) + max_off / 2) / max_off
    };

    let mut lines: Vec<Line> = Vec::with_capacity(area.height as usize);
    lines.push(Line::from(Span::styled("▲", Style::default().fg(SB_ARROW))));
    for i in 0..track {
        if i >= thumb_top && i < thumb_top + thumb_len {
            lines.push(Line::from(Span::styled("█", Style::default().fg(SB_THUMB))));
        } else {
            lines.push(Line::from(Span::styled("│", Style::default().fg(SB_TRACK))));
        }
    }
    lines.push(Line::from(Span::styled("▼", Style::default().fg(SB_ARROW))));
    f.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_keeps_both_ends() {
        assert_eq!(truncate_middle("PC-OFFICE-01", 20), "PC-OFFICE-01");
        assert_eq!(truncate_middle("workstation-basement-07", 11), "work...t-07");
        assert_eq!(truncate_middle("abcdef", 3), "...");
    }

    #[test]
    fn offset_follows_selection() {
        assert_eq!(scroll_offset(0, 50, 10), 0);
        assert_eq!(scroll_offset(9, 50, 10), 0);
        assert_eq!(scroll_offset(10, 50, 10), 1);
        assert_eq!(scroll_offset(49, 50, 10), 40);
        assert_eq!(scroll_offset(3, 5, 10), 0);
    }
}

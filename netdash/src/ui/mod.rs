//! UI module root: per-section panels plus the frame layout that stitches
//! them together.

pub mod agents;
pub mod alerts;
pub mod charts;
pub mod footer;
pub mod header;
pub mod history;
pub mod overview;
pub mod settings;
pub mod theme;
pub mod util;

use ratatui::layout::{Constraint, Direction, Layout};

use crate::api::DashboardApi;
use crate::dashboard::{Dashboard, Section};
use settings::{Field, SettingsForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Filter,
    Edit,
}

/// View-only state: selection per section, the text input buffer and the
/// editable form copies.
#[derive(Debug, Default)]
pub struct UiState {
    pub mode: InputMode,
    pub input: String,
    selected: [usize; 5],
    pub form: SettingsForm,
    pub history_start: String,
    pub history_end: String,
}

impl UiState {
    pub fn selected(&self, s: Section) -> usize {
        self.selected[s.index()]
    }

    pub fn select(&mut self, s: Section, index: usize) {
        self.selected[s.index()] = index;
    }

    /// Move within `0..len`, clamping at both ends.
    pub fn move_selection(&mut self, s: Section, delta: isize, len: usize) {
        let cur = self.selected[s.index()] as isize;
        let max = len.saturating_sub(1) as isize;
        self.selected[s.index()] = (cur + delta).clamp(0, max) as usize;
    }

    /// Clamp after the underlying list shrank.
    pub fn clamp_selection(&mut self, s: Section, len: usize) {
        let i = s.index();
        self.selected[i] = self.selected[i].min(len.saturating_sub(1));
    }
}

/// Number of selectable rows in a section.
pub fn selectable_len<A: DashboardApi>(dash: &Dashboard<A>, s: Section) -> usize {
    match s {
        Section::Overview => dash.visible_rows().len(),
        Section::Agents => dash.grid_agents().len(),
        Section::History => history::RANGE_FIELDS.len(),
        Section::Alerts => dash.alerts().len(),
        Section::Settings => Field::ALL.len(),
    }
}

pub fn draw<A: DashboardApi>(
    f: &mut ratatui::Frame<'_>,
    dash: &mut Dashboard<A>,
    ui: &UiState,
    endpoint: &str,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(1), // tabs
            Constraint::Min(5),    // section body
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    header::draw_header(f, rows[0], dash, endpoint);
    header::draw_tabs(f, rows[1], dash);

    let section = dash.section();
    let selected = ui.selected(section);
    match section {
        Section::Overview => overview::draw_overview(f, rows[2], dash, selected),
        Section::Agents => agents::draw_agents(f, rows[2], dash, selected),
        Section::History => history::draw_history(f, rows[2], dash, ui),
        Section::Alerts => alerts::draw_alerts(f, rows[2], dash.alerts(), selected),
        Section::Settings => {
            settings::draw_settings(f, rows[2], &ui.form, selected, ui.mode, &ui.input)
        }
    }

    footer::draw_footer(f, rows[3], dash.toasts(), ui);
}

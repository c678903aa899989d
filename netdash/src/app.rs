//! App state and main loop: terminal setup, key handling, timer ticks, and drawing.

use std::{
    io,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::DashboardApi;
use crate::dashboard::{Dashboard, HistoryRange, Section, RANGE_FORMAT, TIMESPANS};
use crate::notify::Level;
use crate::ui::{self, settings::Field, InputMode, UiState};

pub const EXPORT_FILE: &str = "netdash-data.csv";
pub const INTERVALS: [Duration; 4] = [
    Duration::from_secs(5),
    Duration::from_secs(10),
    Duration::from_secs(30),
    Duration::from_secs(60),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Back,
    Show(Section),
    NextSection,
    PrevSection,
    Refresh,
    CycleInterval,
    CycleTimespan,
    Filter,
    Export,
    TestConnection,
    Up,
    Down,
    Dismiss,
    Enter,
    Save,
    None,
}

/// Normal-mode key bindings.
pub fn map_key(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        KeyCode::Esc => Action::Back,
        KeyCode::Char(c @ '1'..='5') => {
            Action::Show(Section::ALL[(c as u8 - b'1') as usize])
        }
        KeyCode::Tab => Action::NextSection,
        KeyCode::BackTab => Action::PrevSection,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char('i') => Action::CycleInterval,
        KeyCode::Char('t') => Action::CycleTimespan,
        KeyCode::Char('/') => Action::Filter,
        KeyCode::Char('e') => Action::Export,
        KeyCode::Char('c') => Action::TestConnection,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Char('d') => Action::Dismiss,
        KeyCode::Enter => Action::Enter,
        KeyCode::Char('s') => Action::Save,
        _ => Action::None,
    }
}

pub fn next_interval(cur: Duration) -> Duration {
    INTERVALS
        .iter()
        .copied()
        .find(|d| *d > cur)
        .unwrap_or(INTERVALS[0])
}

pub fn next_timespan(cur: &str) -> &'static str {
    let i = TIMESPANS.iter().position(|s| *s == cur).unwrap_or(0);
    TIMESPANS[(i + 1) % TIMESPANS.len()]
}

fn format_range_input(v: Option<chrono::NaiveDateTime>) -> String {
    v.map(|t| t.format(RANGE_FORMAT).to_string()).unwrap_or_default()
}

pub struct App<A> {
    dash: Dashboard<A>,
    ui: UiState,
    endpoint: String,
    export_path: PathBuf,
    should_quit: bool,
}

impl<A: DashboardApi> App<A> {
    pub fn new(dash: Dashboard<A>, endpoint: impl Into<String>) -> Self {
        let mut app = Self {
            dash,
            ui: UiState::default(),
            endpoint: endpoint.into(),
            export_path: PathBuf::from(EXPORT_FILE),
            should_quit: false,
        };
        app.sync_history_inputs();
        app
    }

    pub fn export_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }

    pub fn dashboard(&self) -> &Dashboard<A> {
        &self.dash
    }

    pub fn ui_state(&self) -> &UiState {
        &self.ui
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn run(&mut self) -> Result<()> {
        // Terminal setup
        enable_raw_mode().context("enabling raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let res = self.event_loop(&mut terminal).await;

        // Teardown
        self.dash.teardown();
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    /// Initial fan-out load, then start the refresh timer.
    pub async fn start(&mut self) {
        self.dash.load_initial().await;
        self.sync_form();
        self.dash.start(Instant::now());
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<()> {
        // first frame shows the loading state
        terminal.draw(|f| self.draw(f))?;
        self.start().await;

        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                match event::read()? {
                    Event::Key(k) if k.kind == KeyEventKind::Press => self.handle_key(k).await,
                    Event::Resize(_, _) => self.dash.charts_mut().resize_all(),
                    _ => {}
                }
            }
            if self.should_quit {
                break;
            }

            self.tick(Instant::now()).await;

            terminal.draw(|f| self.draw(f))?;

            // Tick rate
            sleep(Duration::from_millis(100)).await;
        }
        Ok(())
    }

    /// Timer refresh and toast expiry for one loop pass.
    pub async fn tick(&mut self, now: Instant) {
        if self.dash.on_tick(now).await {
            self.after_refresh();
        }
        self.dash.expire_toasts(now);
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        ui::draw(f, &mut self.dash, &self.ui, &self.endpoint);
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        match self.ui.mode {
            InputMode::Normal => self.perform(map_key(key)).await,
            InputMode::Filter => self.filter_key(key),
            InputMode::Edit => self.edit_key(key).await,
        }
    }

    fn filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.ui.input.push(c),
            KeyCode::Backspace => {
                self.ui.input.pop();
            }
            KeyCode::Enter => {
                self.ui.mode = InputMode::Normal;
                return;
            }
            KeyCode::Esc => {
                self.ui.input.clear();
                self.ui.mode = InputMode::Normal;
            }
            _ => return,
        }
        self.dash.set_filter(&self.ui.input);
        self.ui
            .clamp_selection(Section::Overview, ui::selectable_len(&self.dash, Section::Overview));
    }

    async fn edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.ui.input.push(c),
            KeyCode::Backspace => {
                self.ui.input.pop();
            }
            KeyCode::Esc => {
                self.ui.input.clear();
                self.ui.mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                self.ui.mode = InputMode::Normal;
                let text = std::mem::take(&mut self.ui.input);
                self.commit_edit(text).await;
            }
            _ => {}
        }
    }

    async fn commit_edit(&mut self, text: String) {
        let section = self.dash.section();
        let sel = self.ui.selected(section);
        match section {
            Section::History => {
                if sel == 0 {
                    self.ui.history_start = text;
                } else {
                    self.ui.history_end = text;
                }
                let range = HistoryRange::parse(&self.ui.history_start, &self.ui.history_end);
                self.dash.set_history_range(range);
                self.dash.refresh().await;
            }
            Section::Settings => {
                if let Some(field) = Field::ALL.get(sel) {
                    self.ui.form.set(*field, text);
                }
            }
            _ => {}
        }
    }

    async fn perform(&mut self, action: Action) {
        let section = self.dash.section();
        match action {
            Action::Quit => self.should_quit = true,
            Action::Back => {
                if self.dash.agent_detail().is_some() {
                    self.dash.close_agent_detail();
                } else {
                    self.should_quit = true;
                }
            }
            Action::Show(s) => self.switch(s).await,
            Action::NextSection => self.switch(section.next()).await,
            Action::PrevSection => self.switch(section.prev()).await,
            Action::Refresh => {
                self.dash.refresh().await;
                self.after_refresh();
            }
            Action::CycleInterval => {
                let next = next_interval(self.dash.timer().interval());
                self.dash.set_refresh_interval(next, Instant::now());
                self.dash
                    .notify(Level::Info, format!("Refreshing every {}s", next.as_secs()));
            }
            Action::CycleTimespan => {
                if section == Section::Overview {
                    let span = next_timespan(self.dash.timespan());
                    self.dash.set_timespan(span).await;
                    self.dash.notify(Level::Info, format!("Timespan {span}"));
                }
            }
            Action::Filter => {
                if section == Section::Overview {
                    self.ui.input = self.dash.filter().to_string();
                    self.ui.mode = InputMode::Filter;
                }
            }
            Action::Export => self.export(),
            Action::TestConnection => {
                self.dash.test_connection().await;
            }
            Action::Up => {
                let len = ui::selectable_len(&self.dash, section);
                self.ui.move_selection(section, -1, len);
            }
            Action::Down => {
                let len = ui::selectable_len(&self.dash, section);
                self.ui.move_selection(section, 1, len);
            }
            Action::Dismiss => self.dismiss_selected().await,
            Action::Enter => self.enter().await,
            Action::Save => self.save().await,
            Action::None => {}
        }
    }

    async fn switch(&mut self, s: Section) {
        if self.dash.section() == s {
            return;
        }
        self.dash.switch_section(s).await;
        self.after_refresh();
    }

    fn after_refresh(&mut self) {
        let section = self.dash.section();
        self.ui
            .clamp_selection(section, ui::selectable_len(&self.dash, section));
        if section == Section::Settings {
            self.sync_form();
        }
    }

    fn sync_form(&mut self) {
        self.ui.form = self
            .ui
            .form
            .refreshed(self.dash.thresholds(), self.dash.notifications());
    }

    fn sync_history_inputs(&mut self) {
        let r = self.dash.history_range();
        self.ui.history_start = format_range_input(r.start);
        self.ui.history_end = format_range_input(r.end);
    }

    fn export(&mut self) {
        let rows = self.dash.visible_rows().len();
        let csv = self.dash.export_csv();
        if csv.is_empty() {
            self.dash.notify(Level::Warning, "No data to export");
            return;
        }
        match std::fs::write(&self.export_path, csv) {
            Ok(()) => {
                info!(rows, path = %self.export_path.display(), "exported agents");
                self.dash.notify(
                    Level::Success,
                    format!("Exported {rows} rows to {}", self.export_path.display()),
                );
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                self.dash.notify(Level::Error, format!("Export failed: {e}"));
            }
        }
    }

    async fn dismiss_selected(&mut self) {
        if self.dash.section() != Section::Alerts {
            return;
        }
        let sel = self.ui.selected(Section::Alerts);
        let Some(alert) = self.dash.alerts().get(sel) else {
            return;
        };
        if !alert.active {
            self.dash.notify(Level::Info, "Alert already dismissed");
            return;
        }
        let id = alert.id.clone();
        self.dash.dismiss_alert(&id).await;
        self.after_refresh();
    }

    async fn enter(&mut self) {
        let section = self.dash.section();
        let sel = self.ui.selected(section);
        match section {
            Section::Overview => {
                let Some(id) = self.dash.visible_rows().get(sel).map(|r| r.id.clone()) else {
                    return;
                };
                self.switch(Section::Agents).await;
                if let Some(i) = self.dash.grid_agents().iter().position(|a| a.id == id) {
                    self.ui.select(Section::Agents, i);
                }
                self.dash.load_agent_detail(&id).await;
            }
            Section::Agents => {
                let Some(id) = self.dash.grid_agents().get(sel).map(|a| a.id.clone()) else {
                    return;
                };
                self.dash.load_agent_detail(&id).await;
            }
            Section::History => {
                self.ui.input = if sel == 0 {
                    self.ui.history_start.clone()
                } else {
                    self.ui.history_end.clone()
                };
                self.ui.mode = InputMode::Edit;
            }
            Section::Alerts => {}
            Section::Settings => match Field::ALL.get(sel) {
                Some(Field::Enabled) => self.ui.form.toggle_enabled(),
                Some(Field::Password) => {
                    self.ui.input.clear();
                    self.ui.mode = InputMode::Edit;
                }
                Some(field) => {
                    self.ui.input = self.ui.form.value(*field);
                    self.ui.mode = InputMode::Edit;
                }
                None => {}
            },
        }
    }

    async fn save(&mut self) {
        if self.dash.section() != Section::Settings {
            return;
        }
        let sel = self.ui.selected(Section::Settings);
        let threshold_block = Field::ALL.get(sel).is_some_and(|f| f.is_threshold());
        if threshold_block {
            match self.ui.form.thresholds() {
                Ok(cfg) => {
                    if self.dash.save_thresholds(cfg).await {
                        self.ui.form.commit(true);
                        self.sync_form();
                    }
                }
                Err(msg) => self.dash.notify(Level::Warning, msg),
            }
        } else {
            match self.ui.form.notification() {
                Ok(cfg) => {
                    // the saved copy holds no password, so the field clears
                    if self.dash.save_notification_config(cfg).await {
                        self.ui.form.commit(false);
                        self.sync_form();
                    }
                }
                Err(msg) => self.dash.notify(Level::Warning, msg),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use crate::timer::DEFAULT_INTERVAL;
    use crate::types::ThresholdConfig;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn demo_app() -> App<MockBackend> {
        let mut app = App::new(Dashboard::new(MockBackend::new(), DEFAULT_INTERVAL), "demo");
        app.start().await;
        app
    }

    async fn type_text(app: &mut App<MockBackend>, s: &str) {
        for c in s.chars() {
            app.handle_key(key(KeyCode::Char(c))).await;
        }
    }

    #[test]
    fn key_bindings() {
        assert_eq!(map_key(key(KeyCode::Char('3'))), Action::Show(Section::History));
        assert_eq!(map_key(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(map_key(key(KeyCode::Char('c'))), Action::TestConnection);
        assert_eq!(map_key(key(KeyCode::Esc)), Action::Back);
        assert_eq!(map_key(key(KeyCode::Char('x'))), Action::None);
    }

    #[test]
    fn cycles_wrap() {
        assert_eq!(next_interval(Duration::from_secs(10)), Duration::from_secs(30));
        assert_eq!(next_interval(Duration::from_secs(60)), Duration::from_secs(5));
        assert_eq!(next_interval(Duration::from_millis(7_500)), Duration::from_secs(10));
        assert_eq!(next_timespan("6h"), "24h");
        assert_eq!(next_timespan("24h"), "1h");
        assert_eq!(next_timespan("bogus"), "6h");
    }

    #[tokio::test]
    async fn filter_mode_narrows_and_clears() {
        let mut app = demo_app().await;
        app.handle_key(key(KeyCode::Char('/'))).await;
        assert_eq!(app.ui_state().mode, InputMode::Filter);
        type_text(&mut app, "server").await;
        assert_eq!(app.dashboard().visible_rows().len(), 1);
        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.dashboard().filter(), "server");

        app.handle_key(key(KeyCode::Char('/'))).await;
        app.handle_key(key(KeyCode::Esc)).await;
        assert_eq!(app.dashboard().filter(), "");
        assert_eq!(app.dashboard().visible_rows().len(), 5);
    }

    #[tokio::test]
    async fn password_is_cleared_after_saving_email_settings() {
        let mut app = demo_app().await;
        app.handle_key(key(KeyCode::Char('5'))).await;
        assert_eq!(app.dashboard().section(), Section::Settings);
        for _ in 0..Field::ALL.len() {
            app.handle_key(key(KeyCode::Down)).await;
        }
        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.ui_state().mode, InputMode::Edit);
        type_text(&mut app, "s3cret").await;
        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.ui_state().form.password, "s3cret");

        app.handle_key(key(KeyCode::Char('s'))).await;
        assert!(app.ui_state().form.password.is_empty());
        assert!(app.dashboard().notifications().sender_password.is_empty());
        assert_eq!(app.dashboard().toasts().latest().unwrap().level, Level::Success);
    }

    #[tokio::test]
    async fn pending_edit_survives_a_timer_refresh() {
        let mut app = demo_app().await;
        app.handle_key(key(KeyCode::Char('5'))).await;
        app.handle_key(key(KeyCode::Enter)).await;
        app.handle_key(key(KeyCode::Backspace)).await;
        app.handle_key(key(KeyCode::Backspace)).await;
        type_text(&mut app, "60").await;
        app.handle_key(key(KeyCode::Enter)).await;

        // someone else changes memory on the backend meanwhile
        let remote = ThresholdConfig { cpu: 75, memory: 82, disk: 90 };
        app.dashboard().api().save_thresholds(&remote).await.unwrap();
        app.tick(Instant::now() + DEFAULT_INTERVAL * 2).await;

        assert_eq!(app.dashboard().thresholds().memory, 82);
        assert_eq!(app.ui_state().form.memory, "82");
        assert_eq!(app.ui_state().form.cpu, "60");
        assert_eq!(app.dashboard().thresholds().cpu, 75);

        app.handle_key(key(KeyCode::Char('s'))).await;
        assert_eq!(app.dashboard().thresholds().cpu, 60);
        assert!(!app.ui_state().form.is_edited(Field::Cpu));
    }

    #[tokio::test]
    async fn invalid_threshold_text_is_a_warning() {
        let mut app = demo_app().await;
        app.handle_key(key(KeyCode::Char('5'))).await;
        app.handle_key(key(KeyCode::Enter)).await;
        app.handle_key(key(KeyCode::Backspace)).await;
        app.handle_key(key(KeyCode::Backspace)).await;
        type_text(&mut app, "abc").await;
        app.handle_key(key(KeyCode::Enter)).await;
        app.handle_key(key(KeyCode::Char('s'))).await;
        assert_eq!(app.dashboard().toasts().latest().unwrap().level, Level::Warning);
        assert_eq!(app.dashboard().thresholds().cpu, 75);
    }

    #[tokio::test]
    async fn export_writes_visible_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut app = App::new(Dashboard::new(MockBackend::new(), DEFAULT_INTERVAL), "demo")
            .export_to(&path);
        app.start().await;
        app.handle_key(key(KeyCode::Char('e'))).await;
        let csv = std::fs::read_to_string(&path).unwrap();
        assert_eq!(csv.lines().count(), 6);
        assert!(csv.starts_with("hostname,ip,"));
    }

    #[tokio::test]
    async fn overview_enter_opens_agent_detail() {
        let mut app = demo_app().await;
        app.handle_key(key(KeyCode::Down)).await;
        app.handle_key(key(KeyCode::Enter)).await;
        assert_eq!(app.dashboard().section(), Section::Agents);
        assert_eq!(app.dashboard().agent_detail().unwrap().hostname, "PC-OFFICE-02");
        app.handle_key(key(KeyCode::Esc)).await;
        assert!(app.dashboard().agent_detail().is_none());
        assert!(!app.should_quit());
        app.handle_key(key(KeyCode::Esc)).await;
        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn every_section_renders() {
        let mut app = demo_app().await;
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        for (n, title) in ["1", "2", "3", "4", "5"].iter().zip(["Agents", "Agent", "Range", "Alerts", "Thresholds"]) {
            app.handle_key(key(KeyCode::Char(n.chars().next().unwrap()))).await;
            terminal.draw(|f| app.draw(f)).unwrap();
            let text: String = terminal
                .backend()
                .buffer()
                .content()
                .iter()
                .map(|c| c.symbol())
                .collect();
            assert!(text.contains("netdash"), "header missing in section {n}");
            assert!(text.contains(title), "section {n} missing '{title}'");
        }
    }
}

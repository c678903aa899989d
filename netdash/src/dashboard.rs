//! Dashboard controller: section navigation, refresh cadence, initial
//! fan-out load and form persistence. Handlers take structured inputs and
//! never touch the terminal; `app` turns key presses into calls here.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::{DashboardApi, Fetched};
use crate::charts::ChartRegistry;
use crate::error::ApiError;
use crate::notify::{Level, Toasts};
use crate::timer::RefreshTimer;
use crate::types::{Agent, Alert, Metric, MetricSample, NotificationConfig, Stats, ThresholdConfig};
use crate::view::{agent_rows, export_csv, matches_filter, AgentRow};

pub const CPU_GAUGE: &str = "cpuGauge";
pub const MEMORY_GAUGE: &str = "memoryGauge";
pub const DISK_GAUGE: &str = "diskGauge";
pub const CPU_CHART: &str = "cpuChart";
pub const MEMORY_CHART: &str = "memoryChart";
pub const HISTORY_CHART: &str = "historyChart";

pub const DEFAULT_TIMESPAN: &str = "6h";
pub const TIMESPANS: [&str; 3] = ["1h", "6h", "24h"];
pub const RANGE_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Overview,
    Agents,
    History,
    Alerts,
    Settings,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Overview,
        Section::Agents,
        Section::History,
        Section::Alerts,
        Section::Settings,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::Agents => "Agents",
            Section::History => "History",
            Section::Alerts => "Alerts",
            Section::Settings => "Settings",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl HistoryRange {
    pub fn last_24h(now: DateTime<Utc>) -> Self {
        let end = now.naive_utc();
        Self {
            start: Some(end - chrono::Duration::hours(24)),
            end: Some(end),
        }
    }

    pub fn parse(start: &str, end: &str) -> Self {
        let p = |s: &str| NaiveDateTime::parse_from_str(s.trim(), RANGE_FORMAT).ok();
        Self {
            start: p(start),
            end: p(end),
        }
    }

    /// Query-string values, or a validation error if the range is unusable.
    pub fn query(&self) -> Result<(String, String), ApiError> {
        match (self.start, self.end) {
            (Some(s), Some(e)) if s < e => Ok((
                s.format(RANGE_FORMAT).to_string(),
                e.format(RANGE_FORMAT).to_string(),
            )),
            (Some(_), Some(_)) => Err(ApiError::Validation(
                "history start must be before end".into(),
            )),
            _ => Err(ApiError::Validation("select a valid date range".into())),
        }
    }
}

/// How a successful section load was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Live,
    // at least one part fell back to mock data
    Mock,
}

impl LoadOutcome {
    fn of<T>(parts: &[&Fetched<T>]) -> Self {
        if parts.iter().any(|p| p.is_mock()) {
            LoadOutcome::Mock
        } else {
            LoadOutcome::Live
        }
    }

    fn and(self, other: LoadOutcome) -> Self {
        if self == LoadOutcome::Live && other == LoadOutcome::Live {
            LoadOutcome::Live
        } else {
            LoadOutcome::Mock
        }
    }
}

struct Overview {
    stats: Fetched<Stats>,
    samples: Fetched<Vec<MetricSample>>,
    agents: Fetched<Vec<Agent>>,
}

impl Overview {
    fn outcome(&self) -> LoadOutcome {
        let degraded = self.stats.is_mock() || self.samples.is_mock() || self.agents.is_mock();
        if degraded {
            LoadOutcome::Mock
        } else {
            LoadOutcome::Live
        }
    }
}

async fn fetch_overview<A: DashboardApi>(api: &A, timespan: &str) -> Overview {
    let (stats, samples, agents) = futures::join!(
        api.stats_with_fallback(),
        api.realtime_with_fallback(timespan),
        api.agents_with_fallback(),
    );
    Overview {
        stats,
        samples,
        agents,
    }
}

pub struct Dashboard<A> {
    api: A,
    charts: ChartRegistry,
    toasts: Toasts,
    timer: RefreshTimer,
    section: Section,
    connected: bool,
    loading: bool,
    last_update: Option<DateTime<Local>>,
    timespan: String,
    stats: Stats,
    table_agents: Vec<Agent>,
    grid_agents: Vec<Agent>,
    agent_detail: Option<Agent>,
    alerts: Vec<Alert>,
    history_range: HistoryRange,
    history_points: usize,
    thresholds: ThresholdConfig,
    notifications: NotificationConfig,
    filter: String,
}

impl<A: DashboardApi> Dashboard<A> {
    pub fn new(api: A, interval: Duration) -> Self {
        let mut charts = ChartRegistry::new();
        charts.create_gauge(CPU_GAUGE, "CPU");
        charts.create_gauge(MEMORY_GAUGE, "Memory");
        charts.create_gauge(DISK_GAUGE, "Disk");
        charts.create_series(CPU_CHART, Metric::Cpu);
        charts.create_series(MEMORY_CHART, Metric::Memory);
        charts.create_history(HISTORY_CHART);

        Self {
            api,
            charts,
            toasts: Toasts::default(),
            timer: RefreshTimer::new(interval),
            section: Section::Overview,
            connected: false,
            loading: false,
            last_update: None,
            timespan: DEFAULT_TIMESPAN.to_string(),
            stats: Stats::default(),
            table_agents: Vec::new(),
            grid_agents: Vec::new(),
            agent_detail: None,
            alerts: Vec::new(),
            history_range: HistoryRange::last_24h(Utc::now()),
            history_points: 0,
            thresholds: ThresholdConfig::default(),
            notifications: NotificationConfig::default(),
            filter: String::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn charts(&self) -> &ChartRegistry {
        &self.charts
    }

    pub fn charts_mut(&mut self) -> &mut ChartRegistry {
        &mut self.charts
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn timer(&self) -> &RefreshTimer {
        &self.timer
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    pub fn timespan(&self) -> &str {
        &self.timespan
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn table_agents(&self) -> &[Agent] {
        &self.table_agents
    }

    pub fn grid_agents(&self) -> &[Agent] {
        &self.grid_agents
    }

    pub fn agent_detail(&self) -> Option<&Agent> {
        self.agent_detail.as_ref()
    }

    pub fn close_agent_detail(&mut self) {
        self.agent_detail = None;
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn active_alert_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.active).count()
    }

    pub fn history_range(&self) -> HistoryRange {
        self.history_range
    }

    pub fn set_history_range(&mut self, range: HistoryRange) {
        self.history_range = range;
    }

    pub fn history_points(&self) -> usize {
        self.history_points
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn notifications(&self) -> &NotificationConfig {
        &self.notifications
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn notify(&mut self, level: Level, message: impl Into<String>) {
        self.toasts.push(level, message);
    }

    pub fn expire_toasts(&mut self, now: Instant) {
        self.toasts.expire(now);
    }

    pub fn start(&mut self, now: Instant) {
        self.timer.start(now);
    }

    /// Overview, agents grid, thresholds and notification config, issued
    /// concurrently. Every part that arrives is applied; the load as a whole
    /// counts as failed (disconnected, one error toast) if any part failed
    /// or had to fall back to mock data.
    pub async fn load_initial(&mut self) -> bool {
        self.loading = true;
        let (overview, grid, thresholds, notifications) = {
            let api = &self.api;
            futures::join!(
                fetch_overview(api, &self.timespan),
                api.agents_with_fallback(),
                api.thresholds(),
                api.notification_config(),
            )
        };

        let outcome = overview.outcome().and(LoadOutcome::of(&[&grid]));
        self.apply_overview(overview);
        self.grid_agents = grid.into_inner();

        let mut errors = Vec::new();
        match thresholds {
            Ok(t) => self.thresholds = t,
            Err(e) => errors.push(e),
        }
        match notifications {
            Ok(n) => self.notifications = n,
            Err(e) => errors.push(e),
        }
        self.loading = false;

        for e in &errors {
            warn!(error = %e, "initial load: request failed");
        }
        let ok = errors.is_empty() && outcome == LoadOutcome::Live;
        self.connected = ok;
        self.last_update = Some(Local::now());
        if let Some(first) = errors.first() {
            self.toasts
                .push(Level::Error, format!("Error loading data: {first}"));
        } else if outcome == LoadOutcome::Mock {
            self.toasts.push(
                Level::Error,
                "Error loading data: backend unreachable, showing sample data",
            );
        } else {
            self.toasts.push(Level::Success, "Dashboard loaded");
        }
        info!(ok, "initial load finished");
        ok
    }

    fn apply_overview(&mut self, o: Overview) {
        let stats = o.stats.into_inner();
        self.charts.update_gauge(CPU_GAUGE, stats.avg_cpu);
        self.charts.update_gauge(MEMORY_GAUGE, stats.avg_memory);
        self.charts.update_gauge(DISK_GAUGE, stats.avg_disk);
        self.stats = stats;

        let samples = o.samples.into_inner();
        self.charts.update(CPU_CHART, &samples);
        self.charts.update(MEMORY_CHART, &samples);

        self.table_agents = o.agents.into_inner();
    }

    /// Load one section's data, and nothing else.
    pub async fn load_section(&mut self, section: Section) -> Result<LoadOutcome, ApiError> {
        debug!(section = section.title(), "loading section");
        match section {
            Section::Overview => {
                let o = fetch_overview(&self.api, &self.timespan).await;
                let outcome = o.outcome();
                self.apply_overview(o);
                Ok(outcome)
            }
            Section::Agents => {
                let grid = self.api.agents_with_fallback().await;
                let outcome = LoadOutcome::of(&[&grid]);
                self.grid_agents = grid.into_inner();
                Ok(outcome)
            }
            Section::History => self.load_history().await,
            Section::Alerts => {
                let alerts = self.api.alerts_with_fallback().await;
                let outcome = LoadOutcome::of(&[&alerts]);
                self.alerts = alerts.into_inner();
                Ok(outcome)
            }
            Section::Settings => {
                let res = async {
                    let t = self.api.thresholds().await?;
                    let n = self.api.notification_config().await?;
                    Ok::<_, ApiError>((t, n))
                }
                .await;
                match res {
                    Ok((t, n)) => {
                        self.thresholds = t;
                        self.notifications = n;
                        Ok(LoadOutcome::Live)
                    }
                    Err(e) => {
                        self.toasts
                            .push(Level::Warning, format!("Could not load settings: {e}"));
                        Err(e)
                    }
                }
            }
        }
    }

    async fn load_history(&mut self) -> Result<LoadOutcome, ApiError> {
        let (start, end) = match self.history_range.query() {
            Ok(q) => q,
            Err(e) => {
                self.toasts.push(Level::Warning, e.to_string());
                return Err(e);
            }
        };
        match self.api.history(&start, &end).await {
            Ok(samples) => {
                self.charts.update(HISTORY_CHART, &samples);
                self.history_points = samples.len();
                Ok(LoadOutcome::Live)
            }
            Err(e) => {
                self.toasts
                    .push(Level::Error, format!("Error loading history: {e}"));
                Err(e)
            }
        }
    }

    /// Reload the active section. Manual and timer refresh both end up here.
    /// Validation failures leave the connection indicator alone since no
    /// request was made.
    pub async fn refresh(&mut self) -> bool {
        let section = self.section;
        match self.load_section(section).await {
            Ok(outcome) => {
                self.connected = outcome == LoadOutcome::Live;
                self.last_update = Some(Local::now());
                true
            }
            Err(ApiError::Validation(msg)) => {
                debug!(section = section.title(), msg = %msg, "refresh skipped");
                false
            }
            Err(e) => {
                warn!(section = section.title(), error = %e, "refresh failed");
                self.connected = false;
                false
            }
        }
    }

    pub async fn switch_section(&mut self, section: Section) -> bool {
        info!(from = self.section.title(), to = section.title(), "switch section");
        self.section = section;
        self.agent_detail = None;
        self.refresh().await
    }

    /// Timer hook; returns whether a refresh ran. Same path as a manual
    /// refresh, whatever the section.
    pub async fn on_tick(&mut self, now: Instant) -> bool {
        if !self.timer.poll(now) {
            return false;
        }
        debug!(section = self.section.title(), "timer refresh");
        self.refresh().await;
        true
    }

    pub fn set_refresh_interval(&mut self, interval: Duration, now: Instant) {
        let replaced = self.timer.restart(interval, now);
        info!(interval_ms = interval.as_millis() as u64, replaced, "refresh interval changed");
    }

    /// Re-scale both realtime charts and reload their data for `span`.
    pub async fn set_timespan(&mut self, span: &str) {
        self.timespan = span.to_string();
        self.charts.set_timespan(CPU_CHART, span);
        self.charts.set_timespan(MEMORY_CHART, span);
        let samples = self.api.realtime_with_fallback(span).await;
        self.connected = !samples.is_mock();
        self.last_update = Some(Local::now());
        let samples = samples.into_inner();
        self.charts.update(CPU_CHART, &samples);
        self.charts.update(MEMORY_CHART, &samples);
    }

    pub fn set_filter(&mut self, text: &str) {
        self.filter = text.to_string();
    }

    /// Overview table rows after the filter.
    pub fn visible_rows(&self) -> Vec<AgentRow> {
        agent_rows(&self.table_agents, &self.thresholds)
            .into_iter()
            .filter(|r| matches_filter(r, &self.filter))
            .collect()
    }

    pub fn export_csv(&self) -> String {
        let rows = self.visible_rows();
        let refs: Vec<&AgentRow> = rows.iter().collect();
        export_csv(&refs)
    }

    pub async fn save_thresholds(&mut self, cfg: ThresholdConfig) -> bool {
        if [cfg.cpu, cfg.memory, cfg.disk].iter().any(|v| *v > 100) {
            self.toasts
                .push(Level::Warning, "Thresholds must be between 0 and 100");
            return false;
        }
        match self.api.save_thresholds(&cfg).await {
            Ok(()) => {
                self.thresholds = cfg;
                self.toasts.push(Level::Success, "Thresholds saved");
                true
            }
            Err(e) => {
                warn!(error = %e, "save thresholds failed");
                self.toasts
                    .push(Level::Error, format!("Error saving thresholds: {e}"));
                false
            }
        }
    }

    /// On success the password is dropped; the caller clears its form field.
    pub async fn save_notification_config(&mut self, cfg: NotificationConfig) -> bool {
        match self.api.save_notification_config(&cfg).await {
            Ok(()) => {
                self.notifications = NotificationConfig {
                    sender_password: String::new(),
                    ..cfg
                };
                self.toasts.push(Level::Success, "Email configuration saved");
                true
            }
            Err(e) => {
                warn!(error = %e, "save notification config failed");
                self.toasts
                    .push(Level::Error, format!("Error saving configuration: {e}"));
                false
            }
        }
    }

    pub async fn dismiss_alert(&mut self, id: &str) -> bool {
        match self.api.dismiss_alert(id).await {
            Ok(()) => {
                self.toasts.push(Level::Success, "Alert dismissed");
                let alerts = self.api.alerts_with_fallback().await;
                self.connected = !alerts.is_mock();
                self.last_update = Some(Local::now());
                self.alerts = alerts.into_inner();
                true
            }
            Err(e) => {
                warn!(alert = id, error = %e, "dismiss failed");
                self.toasts
                    .push(Level::Error, format!("Error dismissing alert: {e}"));
                false
            }
        }
    }

    pub async fn load_agent_detail(&mut self, id: &str) -> bool {
        match self.api.agent(id).await {
            Ok(a) => {
                self.agent_detail = Some(a);
                true
            }
            Err(e) => {
                self.toasts
                    .push(Level::Error, format!("Error loading agent {id}: {e}"));
                false
            }
        }
    }

    pub async fn test_connection(&mut self) -> bool {
        let ok = self.api.test_connection().await;
        self.connected = ok;
        if ok {
            self.toasts.push(Level::Success, "Backend reachable");
        } else {
            self.toasts.push(Level::Error, "Backend unreachable");
        }
        ok
    }

    /// Release every chart; called once on quit.
    pub fn teardown(&mut self) {
        self.timer.cancel();
        self.charts.destroy_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn section_cycle_wraps() {
        assert_eq!(Section::Overview.prev(), Section::Settings);
        assert_eq!(Section::Settings.next(), Section::Overview);
        assert_eq!(Section::History.index(), 2);
    }

    #[test]
    fn default_range_is_last_day() {
        let now = Utc.with_ymd_and_hms(2025, 7, 24, 11, 59, 14).unwrap();
        let (start, end) = HistoryRange::last_24h(now).query().unwrap();
        assert_eq!(start, "2025-07-23T11:59");
        assert_eq!(end, "2025-07-24T11:59");
    }

    #[test]
    fn missing_or_inverted_range_is_rejected() {
        assert!(matches!(
            HistoryRange::default().query(),
            Err(ApiError::Validation(_))
        ));
        let r = HistoryRange::parse("2025-07-24T10:00", "2025-07-24T09:00");
        assert!(matches!(r.query(), Err(ApiError::Validation(_))));
        let r = HistoryRange::parse("2025-07-24T08:00", "garbage");
        assert!(r.end.is_none());
    }
}

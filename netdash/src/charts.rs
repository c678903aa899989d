//! Chart registry: chart id -> live chart state plus its declared kind.
//!
//! The kind decides how incoming samples are mapped onto datasets. Drawing
//! lives in `ui::charts`; this module only owns data.

use std::collections::HashMap;

use ratatui::layout::Rect;
use tracing::warn;

use crate::types::{Metric, MetricSample};

pub const GAUGE_DANGER: f64 = 90.0;
pub const GAUGE_WARNING: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Gauge,
    Series(Metric),
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeTier {
    Normal,
    Warning,
    Danger,
}

impl GaugeTier {
    pub fn for_percentage(p: f64) -> Self {
        if p > GAUGE_DANGER {
            GaugeTier::Danger
        } else if p > GAUGE_WARNING {
            GaugeTier::Warning
        } else {
            GaugeTier::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaugeState {
    pub title: String,
    pub used: f64,
    pub free: f64,
    pub tier: GaugeTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Minute,
    Hour,
}

impl TimeUnit {
    pub fn millis(self) -> f64 {
        match self {
            TimeUnit::Minute => 60_000.0,
            TimeUnit::Hour => 3_600_000.0,
        }
    }
}

// columns reserved for y labels, and the width of one x label
const Y_LABEL_COLS: u16 = 8;
const X_LABEL_COLS: u16 = 8;

/// How many x labels fit in a chart `width` columns wide.
pub fn label_budget(width: u16) -> u16 {
    width.saturating_sub(Y_LABEL_COLS) / X_LABEL_COLS
}

/// X range widened to whole ticks, and the tick positions (epoch millis).
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLayout {
    pub bounds: [f64; 2],
    pub ticks: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    pub unit: TimeUnit,
    pub max_ticks: u16,
    pub format: &'static str,
}

impl TimeAxis {
    /// Tick policy per named span; unknown spans get the `6h` policy.
    pub fn for_span(span: &str) -> Self {
        let (unit, max_ticks) = match span {
            "1h" => (TimeUnit::Minute, 12),
            "24h" => (TimeUnit::Hour, 12),
            _ => (TimeUnit::Hour, 8),
        };
        let format = match unit {
            TimeUnit::Minute => "%H:%M",
            TimeUnit::Hour => "%H:00",
        };
        Self {
            unit,
            max_ticks,
            format,
        }
    }

    /// Evenly spaced ticks on whole units of local time (`offset_ms` east
    /// of UTC), at most `max_labels` and at most `max_ticks` of them
    /// (never fewer than two). The bounds are widened to the outer ticks so
    /// labels line up with the data.
    pub fn layout(&self, bounds: [f64; 2], max_labels: u16, offset_ms: f64) -> AxisLayout {
        let unit = self.unit.millis();
        let max = max_labels.min(self.max_ticks).max(2) as usize;
        let [lo, hi] = bounds;
        let span_units = ((hi - lo) / unit).max(1.0);
        let mut step = (span_units / (max - 1) as f64).ceil().max(1.0) * unit;
        loop {
            let start = ((lo + offset_ms) / step).floor() * step - offset_ms;
            let mut end = ((hi + offset_ms) / step).ceil() * step - offset_ms;
            if end <= start {
                end = start + step;
            }
            let n = ((end - start) / step).round() as usize + 1;
            if n <= max {
                return AxisLayout {
                    bounds: [start, end],
                    ticks: (0..n).map(|i| start + i as f64 * step).collect(),
                };
            }
            step = (step * 1.25 / unit).ceil() * unit;
        }
    }
}

impl Default for TimeAxis {
    fn default() -> Self {
        Self::for_span("6h")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub metric: Metric,
    // (epoch millis, percentage)
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub datasets: Vec<Dataset>,
    pub axis: TimeAxis,
}

impl LineChart {
    fn new(title: &str, metrics: &[Metric]) -> Self {
        Self {
            title: title.to_string(),
            datasets: metrics
                .iter()
                .map(|&metric| Dataset {
                    metric,
                    points: Vec::new(),
                })
                .collect(),
            axis: TimeAxis::default(),
        }
    }

    /// `[min, max]` of the x values across all datasets.
    pub fn x_bounds(&self) -> Option<[f64; 2]> {
        let xs = self.datasets.iter().flat_map(|d| d.points.iter().map(|p| p.0));
        xs.fold(None, |acc, x| match acc {
            None => Some([x, x]),
            Some([lo, hi]) => Some([lo.min(x), hi.max(x)]),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Gauge(GaugeState),
    Line(LineChart),
}

#[derive(Debug, Clone)]
pub struct ChartEntry {
    pub chart: Chart,
    pub kind: ChartKind,
    pub revision: u64,
    // Area and revision the cached axis layout was computed for.
    pub area: Option<Rect>,
    layout_revision: u64,
    pub layout: Option<AxisLayout>,
}

/// `(t, value)` pairs for one metric; same fallback chain as history.
pub fn series_points(samples: &[MetricSample], metric: Metric) -> Vec<(f64, f64)> {
    samples
        .iter()
        .map(|s| (s.timestamp.timestamp_millis() as f64, s.value(metric)))
        .collect()
}

#[derive(Debug, Default)]
pub struct ChartRegistry {
    entries: HashMap<String, ChartEntry>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, id: &str, chart: Chart, kind: ChartKind) -> &ChartEntry {
        let entry = ChartEntry {
            chart,
            kind,
            revision: 0,
            area: None,
            layout_revision: 0,
            layout: None,
        };
        self.entries.insert(id.to_string(), entry);
        &self.entries[id]
    }

    pub fn create_gauge(&mut self, id: &str, title: &str) -> &ChartEntry {
        let g = GaugeState {
            title: title.to_string(),
            used: 0.0,
            free: 100.0,
            tier: GaugeTier::Normal,
        };
        self.insert(id, Chart::Gauge(g), ChartKind::Gauge)
    }

    pub fn create_series(&mut self, id: &str, metric: Metric) -> &ChartEntry {
        let c = LineChart::new(metric.label(), &[metric]);
        self.insert(id, Chart::Line(c), ChartKind::Series(metric))
    }

    pub fn create_history(&mut self, id: &str) -> &ChartEntry {
        let c = LineChart::new("History", &Metric::ALL);
        self.insert(id, Chart::Line(c), ChartKind::History)
    }

    pub fn get(&self, id: &str) -> Option<&ChartEntry> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChartEntry> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the datasets of a series or history chart wholesale.
    pub fn update(&mut self, id: &str, samples: &[MetricSample]) {
        let Some(entry) = self.entries.get_mut(id) else {
            warn!(chart = id, "update on unknown chart");
            return;
        };
        let Chart::Line(line) = &mut entry.chart else {
            warn!(chart = id, "sample update on a gauge");
            return;
        };
        for ds in &mut line.datasets {
            ds.points = series_points(samples, ds.metric);
        }
        entry.revision += 1;
    }

    pub fn update_gauge(&mut self, id: &str, percentage: f64) {
        let Some(entry) = self.entries.get_mut(id) else {
            warn!(chart = id, "update on unknown chart");
            return;
        };
        let Chart::Gauge(g) = &mut entry.chart else {
            warn!(chart = id, "gauge update on a line chart");
            return;
        };
        g.used = percentage;
        g.free = 100.0 - percentage;
        g.tier = GaugeTier::for_percentage(percentage);
        entry.revision += 1;
    }

    pub fn set_timespan(&mut self, id: &str, span: &str) {
        match self.entries.get_mut(id) {
            Some(ChartEntry {
                chart: Chart::Line(line),
                revision,
                ..
            }) => {
                line.axis = TimeAxis::for_span(span);
                *revision += 1;
            }
            Some(_) => warn!(chart = id, "timespan on a gauge"),
            None => warn!(chart = id, "timespan on unknown chart"),
        }
    }

    /// Returns whether something was removed; destroying twice is a no-op.
    pub fn destroy(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn destroy_all(&mut self) {
        self.entries.clear();
    }

    /// Lay out a line chart's x axis for `area`, reusing the cached layout
    /// while neither the area nor the data changed.
    pub fn lay_out(&mut self, id: &str, area: Rect, offset_ms: f64) -> Option<&ChartEntry> {
        let entry = self.entries.get_mut(id)?;
        if entry.area != Some(area) || entry.layout_revision != entry.revision {
            entry.layout = match &entry.chart {
                Chart::Line(line) => line
                    .x_bounds()
                    .map(|b| line.axis.layout(b, label_budget(area.width), offset_ms)),
                Chart::Gauge(_) => None,
            };
            entry.area = Some(area);
            entry.layout_revision = entry.revision;
        }
        Some(&*entry)
    }

    /// Drop the cached layout so the next frame lays the chart out afresh.
    pub fn resize(&mut self, id: &str) {
        if let Some(e) = self.entries.get_mut(id) {
            e.area = None;
            e.layout = None;
        }
    }

    pub fn resize_all(&mut self) {
        for e in self.entries.values_mut() {
            e.area = None;
            e.layout = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample(v: serde_json::Value) -> MetricSample {
        serde_json::from_value(v).unwrap()
    }

    fn gauge(reg: &ChartRegistry, id: &str) -> GaugeState {
        match &reg.get(id).unwrap().chart {
            Chart::Gauge(g) => g.clone(),
            other => panic!("not a gauge: {other:?}"),
        }
    }

    fn line(reg: &ChartRegistry, id: &str) -> LineChart {
        match &reg.get(id).unwrap().chart {
            Chart::Line(l) => l.clone(),
            other => panic!("not a line chart: {other:?}"),
        }
    }

    #[test]
    fn gauge_split_round_trips() {
        let mut reg = ChartRegistry::new();
        reg.create_gauge("cpu", "CPU");
        reg.update_gauge("cpu", 30.0);
        reg.update_gauge("cpu", 70.0);
        let g = gauge(&reg, "cpu");
        assert_eq!(g.used, 70.0);
        assert_eq!(g.free, 30.0);
    }

    #[test]
    fn gauge_tiers_use_fixed_boundaries() {
        let mut reg = ChartRegistry::new();
        reg.create_gauge("g", "G");
        for (p, tier) in [
            (75.0, GaugeTier::Normal),
            (75.1, GaugeTier::Warning),
            (90.0, GaugeTier::Warning),
            (90.5, GaugeTier::Danger),
        ] {
            reg.update_gauge("g", p);
            assert_eq!(gauge(&reg, "g").tier, tier, "p={p}");
        }
    }

    #[test]
    fn history_field_fallback_chain() {
        let t = Utc.with_ymd_and_hms(2025, 7, 24, 10, 0, 0).unwrap();
        let ts = t.timestamp();
        let mut reg = ChartRegistry::new();
        reg.create_history("h");
        reg.update(
            "h",
            &[
                sample(json!({"timestamp": ts, "cpu_percent": 55})),
                sample(json!({"timestamp": ts, "cpu": 55})),
                sample(json!({"timestamp": ts})),
            ],
        );
        let l = line(&reg, "h");
        let x = t.timestamp_millis() as f64;
        assert_eq!(l.datasets.len(), 3);
        assert_eq!(l.datasets[0].metric, Metric::Cpu);
        assert_eq!(l.datasets[0].points, vec![(x, 55.0), (x, 55.0), (x, 0.0)]);
        assert_eq!(l.datasets[2].points, vec![(x, 0.0); 3]);
    }

    #[test]
    fn series_update_replaces_dataset() {
        let mut reg = ChartRegistry::new();
        reg.create_series("cpuChart", Metric::Cpu);
        let first: Vec<_> = (0..5)
            .map(|i| sample(json!({"timestamp": 1_700_000_000 + i, "cpu": 10 + i})))
            .collect();
        reg.update("cpuChart", &first);
        reg.update("cpuChart", &first[..2]);
        let l = line(&reg, "cpuChart");
        assert_eq!(l.datasets.len(), 1);
        assert_eq!(l.datasets[0].points.len(), 2);
        assert_eq!(l.datasets[0].points[1].1, 11.0);
        assert_eq!(reg.get("cpuChart").unwrap().revision, 2);
    }

    #[test]
    fn timespan_buckets() {
        let mut reg = ChartRegistry::new();
        reg.create_series("mem", Metric::Memory);
        reg.set_timespan("mem", "1h");
        assert_eq!(line(&reg, "mem").axis.unit, TimeUnit::Minute);
        assert_eq!(line(&reg, "mem").axis.max_ticks, 12);
        assert_eq!(line(&reg, "mem").axis.format, "%H:%M");
        reg.set_timespan("mem", "6h");
        assert_eq!(line(&reg, "mem").axis, TimeAxis { unit: TimeUnit::Hour, max_ticks: 8, format: "%H:00" });
        reg.set_timespan("mem", "7d");
        assert_eq!(line(&reg, "mem").axis, TimeAxis::for_span("6h"));
        reg.set_timespan("mem", "24h");
        assert_eq!(line(&reg, "mem").axis.unit, TimeUnit::Hour);
    }

    #[test]
    fn destroy_is_idempotent_and_unknown_updates_are_ignored() {
        let mut reg = ChartRegistry::new();
        reg.create_series("a", Metric::Cpu);
        reg.create_gauge("b", "B");
        assert!(reg.destroy("a"));
        assert!(!reg.destroy("a"));
        assert!(!reg.contains("a"));
        reg.update("a", &[]);
        reg.update_gauge("missing", 10.0);
        // wrong kind is a no-op
        reg.update("b", &[]);
        assert_eq!(reg.get("b").unwrap().revision, 0);
        reg.destroy_all();
        assert!(reg.is_empty());
    }

    const HOUR: f64 = 3_600_000.0;

    #[test]
    fn ticks_snap_to_whole_units() {
        let t0 = Utc.with_ymd_and_hms(2025, 7, 24, 6, 7, 30).unwrap().timestamp_millis() as f64;

        let hourly = TimeAxis::for_span("6h").layout([t0, t0 + 6.0 * HOUR], 20, 0.0);
        assert!(hourly.ticks.len() <= 8 && hourly.ticks.len() >= 2);
        assert!(hourly.ticks.iter().all(|t| t % HOUR == 0.0));
        assert!(hourly.bounds[0] <= t0 && hourly.bounds[1] >= t0 + 6.0 * HOUR);
        assert_eq!(hourly.ticks.first(), Some(&hourly.bounds[0]));
        assert_eq!(hourly.ticks.last(), Some(&hourly.bounds[1]));

        let minutes = TimeAxis::for_span("1h").layout([t0, t0 + HOUR], 20, 0.0);
        assert!(minutes.ticks.len() <= 12);
        assert!(minutes.ticks.iter().all(|t| t % 60_000.0 == 0.0));
        assert!(minutes.ticks.iter().any(|t| t % HOUR != 0.0));

        // UTC+05:30: whole local hours fall on :30 UTC
        let offset = 5.5 * HOUR;
        let local = TimeAxis::for_span("24h").layout([t0, t0 + 24.0 * HOUR], 12, offset);
        assert!(local.ticks.len() <= 12);
        assert!(local.ticks.iter().all(|t| (t + offset) % HOUR == 0.0));

        let flat = TimeAxis::for_span("6h").layout([t0, t0], 8, 0.0);
        assert_eq!(flat.ticks.len(), 2);
        assert!(flat.bounds[0] < flat.bounds[1]);
    }

    #[test]
    fn layout_is_cached_per_area_until_resize() {
        let mut reg = ChartRegistry::new();
        reg.create_series("cpu", Metric::Cpu);
        let pts: Vec<_> = (0..7)
            .map(|i| sample(json!({"timestamp": 1_753_340_400 + i * 3600, "cpu": 20})))
            .collect();
        reg.update("cpu", &pts);

        let wide = Rect::new(0, 0, 120, 10);
        let ticks_wide = reg.lay_out("cpu", wide, 0.0).unwrap().layout.clone().unwrap().ticks.len();
        assert_eq!(reg.get("cpu").unwrap().area, Some(wide));

        reg.resize_all();
        assert!(reg.get("cpu").unwrap().area.is_none());
        assert!(reg.get("cpu").unwrap().layout.is_none());

        let narrow = Rect::new(0, 0, 32, 10);
        let laid = reg.lay_out("cpu", narrow, 0.0).unwrap().layout.clone().unwrap();
        assert!(laid.ticks.len() < ticks_wide);
        assert!(laid.ticks.len() as u16 <= label_budget(32).max(2));

        // new data is laid out again even in the same area
        reg.update("cpu", &pts[..2]);
        let again = reg.lay_out("cpu", narrow, 0.0).unwrap().layout.clone().unwrap();
        assert!(again.bounds[1] < laid.bounds[1]);

        assert!(reg.lay_out("missing", narrow, 0.0).is_none());
    }
}

//! Pure data -> view-model transforms: status tiers, table rows, filtering,
//! CSV export and display formatting.

use chrono::{DateTime, Local, Utc};

use crate::types::{Agent, AgentStatus, Metric, ThresholdConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTier {
    Normal,
    Warning,
    Danger,
}

impl StatusTier {
    /// `danger` above the threshold, `warning` above 80% of it.
    pub fn classify(value: f64, threshold: f64) -> Self {
        if value > threshold {
            StatusTier::Danger
        } else if value > threshold * 0.8 {
            StatusTier::Warning
        } else {
            StatusTier::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCell {
    pub value: f64,
    pub tier: StatusTier,
}

impl MetricCell {
    pub fn text(&self) -> String {
        format!("{}%", self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentRow {
    pub id: String,
    pub hostname: String,
    pub ip: String,
    pub cpu: MetricCell,
    pub memory: MetricCell,
    pub disk: MetricCell,
    pub last_update: String,
    pub status: AgentStatus,
}

pub fn agent_row(a: &Agent, thresholds: &ThresholdConfig) -> AgentRow {
    let cell = |value: f64, metric: Metric| MetricCell {
        value,
        tier: StatusTier::classify(value, thresholds.for_metric(metric) as f64),
    };
    AgentRow {
        id: a.id.clone(),
        hostname: a.hostname.clone(),
        ip: a.ip_address.clone(),
        cpu: cell(a.cpu_percent, Metric::Cpu),
        memory: cell(a.memory_percent, Metric::Memory),
        disk: cell(a.disk_percent, Metric::Disk),
        last_update: format_timestamp(a.last_update),
        status: a.status,
    }
}

pub fn agent_rows(agents: &[Agent], thresholds: &ThresholdConfig) -> Vec<AgentRow> {
    agents.iter().map(|a| agent_row(a, thresholds)).collect()
}

/// Case-insensitive substring match on hostname or IP. Empty text keeps all.
pub fn matches_filter(row: &AgentRow, text: &str) -> bool {
    let needle = text.to_lowercase();
    row.hostname.to_lowercase().contains(&needle) || row.ip.to_lowercase().contains(&needle)
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub fn export_csv(rows: &[&AgentRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let mut out = vec!["hostname,ip,cpu,memory,disk,lastUpdate,status".to_string()];
    out.extend(rows.iter().map(|r| {
        [
            r.hostname.clone(),
            r.ip.clone(),
            r.cpu.text(),
            r.memory.text(),
            r.disk.text(),
            r.last_update.clone(),
            r.status.text().to_string(),
        ]
        .iter()
        .map(|c| quote(c))
        .collect::<Vec<_>>()
        .join(",")
    }));
    out.join("\n")
}

pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(t) => t.with_timezone(&Local).format("%d/%m/%Y %H:%M:%S").to_string(),
        None => "N/A".into(),
    }
}

pub fn format_uptime(seconds: f64) -> String {
    if seconds <= 0.0 || !seconds.is_finite() {
        return "N/A".into();
    }
    let s = seconds as u64;
    let (days, hours, minutes) = (s / 86_400, (s % 86_400) / 3_600, (s % 3_600) / 60);
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(host: &str, ip: &str) -> Agent {
        Agent {
            hostname: host.into(),
            ip_address: ip.into(),
            ..Agent::default()
        }
    }

    #[test]
    fn status_tier_boundaries() {
        assert_eq!(StatusTier::classify(81.0, 80.0), StatusTier::Danger);
        assert_eq!(StatusTier::classify(80.0, 80.0), StatusTier::Warning);
        assert_eq!(StatusTier::classify(64.5, 80.0), StatusTier::Warning);
        assert_eq!(StatusTier::classify(64.0, 80.0), StatusTier::Normal);
        assert_eq!(StatusTier::classify(0.0, 80.0), StatusTier::Normal);
    }

    #[test]
    fn raw_values_are_not_clamped() {
        let mut a = agent("X", "1.1.1.1");
        a.cpu_percent = 130.0;
        let row = agent_row(&a, &ThresholdConfig::default());
        assert_eq!(row.cpu.value, 130.0);
        assert_eq!(row.cpu.text(), "130%");
        assert_eq!(row.cpu.tier, StatusTier::Danger);
    }

    #[test]
    fn filter_matches_hostname_or_ip_case_insensitively() {
        let row = agent_row(&agent("Web-B", "2.2.2.2"), &ThresholdConfig::default());
        assert!(matches_filter(&row, "web-b"));
        assert!(matches_filter(&row, "2.2"));
        assert!(matches_filter(&row, ""));
        assert!(!matches_filter(&row, "zzz"));
    }

    #[test]
    fn csv_quotes_every_cell() {
        let rows = agent_rows(&[agent("PC \"1\"", "10.0.0.1")], &ThresholdConfig::default());
        let visible: Vec<_> = rows.iter().collect();
        let csv = export_csv(&visible);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("hostname,ip,cpu,memory,disk,lastUpdate,status"));
        assert_eq!(
            lines.next(),
            Some("\"PC \"\"1\"\"\",\"10.0.0.1\",\"0%\",\"0%\",\"0%\",\"N/A\",\"Unknown\"")
        );
        assert_eq!(export_csv(&[]), "");
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(0.0), "N/A");
        assert_eq!(format_uptime(59.0), "0m");
        assert_eq!(format_uptime(3_720.0), "1h 2m");
        assert_eq!(format_uptime(172_800.0 + 3_600.0), "2d 1h");
    }
}

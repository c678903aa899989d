//! Types that mirror the backend's JSON schema.
//!
//! Timestamps are normalized here, at the edge: the backend mixes epoch
//! seconds, epoch milliseconds and date-time strings, and everything past
//! deserialization only ever sees `DateTime<Utc>`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Cpu,
    Memory,
    Disk,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Cpu, Metric::Memory, Metric::Disk];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Cpu => "CPU %",
            Metric::Memory => "Memory %",
            Metric::Disk => "Disk %",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Online,
    Offline,
    Warning,
    #[default]
    #[serde(other)]
    Unknown,
}

impl AgentStatus {
    pub fn text(self) -> &'static str {
        match self {
            AgentStatus::Online => "Online",
            AgentStatus::Offline => "Offline",
            AgentStatus::Warning => "Warning",
            AgentStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Agent {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub hostname: String,
    pub ip_address: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub processes: u64,
    // seconds
    pub uptime: f64,
    pub platform: Option<String>,
    pub architecture: Option<String>,
    #[serde(deserialize_with = "timestamp::option")]
    pub last_update: Option<DateTime<Utc>>,
    pub status: AgentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub total_agents: u64,
    pub avg_cpu: f64,
    pub avg_memory: f64,
    pub avg_disk: f64,
    pub active_alerts: u64,
}

/// One timestamped reading. Live and historical endpoints disagree on field
/// names (`cpu` vs `cpu_percent`), so both spellings are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricSample {
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub memory: Option<f64>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
    #[serde(default)]
    pub disk: Option<f64>,
    #[serde(default)]
    pub disk_percent: Option<f64>,
    #[serde(default)]
    pub agent_ip: Option<String>,
}

impl MetricSample {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cpu: None,
            cpu_percent: None,
            memory: None,
            memory_percent: None,
            disk: None,
            disk_percent: None,
            agent_ip: None,
        }
    }

    /// `<metric>_percent`, then bare `<metric>`, then 0.
    pub fn value(&self, metric: Metric) -> f64 {
        let (percent, bare) = match metric {
            Metric::Cpu => (self.cpu_percent, self.cpu),
            Metric::Memory => (self.memory_percent, self.memory),
            Metric::Disk => (self.disk_percent, self.disk),
        };
        percent.or(bare).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Cpu,
    Memory,
    Disk,
    Network,
    System,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
    Error,
    #[default]
    #[serde(other)]
    Info,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Alert {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    #[serde(deserialize_with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
    pub active: bool,
    pub agent_hostname: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub cpu: u32,
    pub memory: u32,
    pub disk: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            cpu: 80,
            memory: 85,
            disk: 90,
        }
    }
}

impl ThresholdConfig {
    pub fn for_metric(&self, metric: Metric) -> u32 {
        match metric {
            Metric::Cpu => self.cpu,
            Metric::Memory => self.memory,
            Metric::Disk => self.disk,
        }
    }
}

/// SMTP notification settings. `sender_password` is write-only: it is never
/// read back from the backend and only sent when set.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub recipient_email: String,
    #[serde(skip_deserializing, skip_serializing_if = "String::is_empty")]
    pub sender_password: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_server: String::new(),
            smtp_port: 587,
            sender_email: String::new(),
            recipient_email: String::new(),
            sender_password: String::new(),
        }
    }
}

impl fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("enabled", &self.enabled)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("sender_email", &self.sender_email)
            .field("recipient_email", &self.recipient_email)
            .field(
                "sender_password",
                &if self.sender_password.is_empty() { "" } else { "***" },
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    #[serde(deserialize_with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
    pub version: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }
    Ok(match Option::<Raw>::deserialize(d)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Int(n)) => n.to_string(),
        Some(Raw::Float(n)) => n.to_string(),
        None => String::new(),
    })
}

pub mod timestamp {
    //! Epoch seconds, epoch milliseconds or date-time strings -> `DateTime<Utc>`.

    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer};

    // Anything this large is milliseconds (1e11 s is year 5138; 1e11 ms is 1973).
    const MILLIS_CUTOFF: f64 = 1e11;

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn from_epoch(v: f64) -> Option<DateTime<Utc>> {
        if !v.is_finite() {
            return None;
        }
        let millis = if v.abs() >= MILLIS_CUTOFF { v } else { v * 1000.0 };
        Utc.timestamp_millis_opt(millis.round() as i64).single()
    }

    pub fn parse_text(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(v) = s.parse::<f64>() {
            return from_epoch(v);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
            .map(|n| n.and_utc())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Number(v) => {
                from_epoch(v).ok_or_else(|| de::Error::custom(format!("timestamp out of range: {v}")))
            }
            Raw::Text(s) => {
                parse_text(&s).ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {s}")))
            }
        }
    }

    /// Lenient variant for optional fields: null, 0 and unparsable values are `None`.
    pub fn option<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(match Option::<Raw>::deserialize(d)? {
            Some(Raw::Number(v)) if v != 0.0 => from_epoch(v),
            Some(Raw::Text(s)) => parse_text(&s),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seconds_and_millis_land_on_the_same_instant() {
        let a: MetricSample = serde_json::from_value(json!({"timestamp": 1_700_000_000})).unwrap();
        let b: MetricSample =
            serde_json::from_value(json!({"timestamp": 1_700_000_000_000u64})).unwrap();
        assert_eq!(a.timestamp, b.timestamp);
        assert_eq!(a.timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn date_time_strings_parse_as_utc() {
        let s: MetricSample =
            serde_json::from_value(json!({"timestamp": "2025-07-24T11:59:14"})).unwrap();
        assert_eq!(s.timestamp.to_rfc3339(), "2025-07-24T11:59:14+00:00");
        let s: MetricSample =
            serde_json::from_value(json!({"timestamp": "2025-07-24 11:59"})).unwrap();
        assert_eq!(s.timestamp.timestamp() % 60, 0);
    }

    #[test]
    fn agent_tolerates_missing_fields_and_numeric_ids() {
        let a: Agent = serde_json::from_value(json!({
            "id": 3,
            "hostname": "SERVER-01",
            "status": "online",
            "last_update": 0
        }))
        .unwrap();
        assert_eq!(a.id, "3");
        assert_eq!(a.status, AgentStatus::Online);
        assert!(a.last_update.is_none());
        assert_eq!(a.cpu_percent, 0.0);

        let b: Agent = serde_json::from_value(json!({"status": "rebooting"})).unwrap();
        assert_eq!(b.status, AgentStatus::Unknown);
    }

    #[test]
    fn password_is_write_only() {
        let cfg: NotificationConfig = serde_json::from_value(json!({
            "smtp_server": "smtp.example.com",
            "sender_password": "leaked"
        }))
        .unwrap();
        assert!(cfg.sender_password.is_empty());
        assert_eq!(cfg.smtp_port, 587);
        let out = serde_json::to_value(&cfg).unwrap();
        assert!(out.get("sender_password").is_none());

        let with_secret = NotificationConfig {
            sender_password: "hunter2".into(),
            ..cfg
        };
        assert_eq!(
            serde_json::to_value(&with_secret).unwrap()["sender_password"],
            "hunter2"
        );
        assert!(!format!("{with_secret:?}").contains("hunter2"));
    }

    #[test]
    fn thresholds_fill_missing_fields_with_defaults() {
        let t: ThresholdConfig = serde_json::from_value(json!({"cpu": 70})).unwrap();
        assert_eq!(t, ThresholdConfig { cpu: 70, memory: 85, disk: 90 });
    }
}

//! Deterministic stand-in payloads, shaped like the real responses.
//!
//! Used by the fallback variants when the backend is unreachable and by
//! `MockBackend`, the in-memory backend behind `--demo`.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::api::DashboardApi;
use crate::error::ApiError;
use crate::types::{
    timestamp, Agent, AgentStatus, Alert, AlertKind, HealthStatus, MetricSample,
    NotificationConfig, Severity, Stats, ThresholdConfig,
};

const REALTIME_POINTS: i64 = 72;
const REALTIME_STEP_MIN: i64 = 5;
const HISTORY_MAX_POINTS: i64 = 96;

pub fn stats() -> Stats {
    Stats {
        total_agents: 5,
        avg_cpu: 45.2,
        avg_memory: 67.8,
        avg_disk: 23.4,
        active_alerts: 2,
    }
}

// Smooth, repeatable waves instead of noise.
fn wave(base: f64, amp: f64, freq: f64, phase: f64, i: i64) -> f64 {
    let v = base + amp * (i as f64 * freq + phase).sin();
    (v * 10.0).round() / 10.0
}

/// Last six hours at five minute spacing, oldest first, bare field names.
pub fn realtime(now: DateTime<Utc>) -> Vec<MetricSample> {
    (0..REALTIME_POINTS)
        .rev()
        .map(|i| {
            let mut s = MetricSample::new(now - Duration::minutes(i * REALTIME_STEP_MIN));
            s.cpu = Some(wave(50.0, 20.0, 0.35, 0.0, i));
            s.memory = Some(wave(65.0, 15.0, 0.2, 1.0, i));
            s.disk = Some(wave(30.0, 10.0, 0.1, 2.0, i));
            s
        })
        .collect()
}

/// Evenly spaced samples across `[start, end]`, `_percent` field names like
/// the history endpoint.
pub fn history(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<MetricSample> {
    let span = (end - start).num_seconds();
    if span <= 0 {
        return Vec::new();
    }
    let step = (span / HISTORY_MAX_POINTS).max(60);
    (0..=span / step)
        .map(|i| {
            let mut s = MetricSample::new(start + Duration::seconds(i * step));
            s.cpu_percent = Some(wave(40.0, 25.0, 0.25, 0.5, i));
            s.memory_percent = Some(wave(60.0, 12.0, 0.15, 1.5, i));
            s.disk_percent = Some(wave(35.0, 5.0, 0.05, 0.0, i));
            s
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn agent(
    id: u32,
    hostname: &str,
    ip: &str,
    usage: (f64, f64, f64),
    processes: u64,
    uptime: f64,
    platform: &str,
    last_seen: DateTime<Utc>,
    status: AgentStatus,
) -> Agent {
    Agent {
        id: id.to_string(),
        hostname: hostname.into(),
        ip_address: ip.into(),
        cpu_percent: usage.0,
        memory_percent: usage.1,
        disk_percent: usage.2,
        processes,
        uptime,
        platform: Some(platform.into()),
        architecture: Some("x64".into()),
        last_update: Some(last_seen),
        status,
    }
}

pub fn agents(now: DateTime<Utc>) -> Vec<Agent> {
    let ago = |s: i64| now - Duration::seconds(s);
    vec![
        agent(1, "PC-OFFICE-01", "192.168.1.100", (45.2, 67.8, 23.4), 156, 86_400.0, "Windows 11", ago(30), AgentStatus::Online),
        agent(2, "PC-OFFICE-02", "192.168.1.101", (78.5, 89.2, 45.7), 203, 172_800.0, "Windows 10", ago(45), AgentStatus::Warning),
        agent(3, "SERVER-01", "192.168.1.10", (23.1, 45.6, 67.8), 89, 2_592_000.0, "Ubuntu 22.04", ago(15), AgentStatus::Online),
        agent(4, "PC-RECEPTION", "192.168.1.102", (12.3, 34.5, 12.1), 67, 43_200.0, "Windows 11", ago(120), AgentStatus::Offline),
        agent(5, "PC-ADMIN", "192.168.1.103", (56.7, 72.3, 34.5), 134, 129_600.0, "Windows 11", ago(60), AgentStatus::Online),
    ]
}

pub fn alerts(now: DateTime<Utc>) -> Vec<Alert> {
    let ago = |s: i64| Some(now - Duration::seconds(s));
    vec![
        Alert {
            id: "1".into(),
            kind: AlertKind::Cpu,
            severity: Severity::Warning,
            title: "High CPU".into(),
            message: "PC-OFFICE-02: CPU at 78.5% (threshold: 75%)".into(),
            timestamp: ago(300),
            active: true,
            agent_hostname: Some("PC-OFFICE-02".into()),
        },
        Alert {
            id: "2".into(),
            kind: AlertKind::Memory,
            severity: Severity::Critical,
            title: "Critical memory".into(),
            message: "PC-OFFICE-02: memory at 89.2% (threshold: 85%)".into(),
            timestamp: ago(180),
            active: true,
            agent_hostname: Some("PC-OFFICE-02".into()),
        },
        Alert {
            id: "3".into(),
            kind: AlertKind::System,
            severity: Severity::Error,
            title: "Agent offline".into(),
            message: "PC-RECEPTION has not reported for 2 minutes".into(),
            timestamp: ago(120),
            active: true,
            agent_hostname: Some("PC-RECEPTION".into()),
        },
    ]
}

pub fn thresholds() -> ThresholdConfig {
    ThresholdConfig {
        cpu: 75,
        memory: 85,
        disk: 90,
    }
}

pub fn notification_config() -> NotificationConfig {
    NotificationConfig {
        enabled: true,
        smtp_server: "smtp.example.com".into(),
        smtp_port: 587,
        sender_email: "netdash@example.com".into(),
        recipient_email: "ops@example.com".into(),
        sender_password: String::new(),
    }
}

/// In-memory backend: serves the mock payloads and keeps writes for the
/// lifetime of the process.
pub struct MockBackend {
    thresholds: Mutex<ThresholdConfig>,
    notifications: Mutex<NotificationConfig>,
    dismissed: Mutex<Vec<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            thresholds: Mutex::new(thresholds()),
            notifications: Mutex::new(notification_config()),
            dismissed: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn locked<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DashboardApi for MockBackend {
    async fn stats(&self) -> Result<Stats, ApiError> {
        Ok(stats())
    }

    async fn realtime(&self, _timespan: &str) -> Result<Vec<MetricSample>, ApiError> {
        Ok(realtime(Utc::now()))
    }

    async fn agents(&self) -> Result<Vec<Agent>, ApiError> {
        Ok(agents(Utc::now()))
    }

    async fn agent(&self, id: &str) -> Result<Agent, ApiError> {
        agents(Utc::now())
            .into_iter()
            .find(|a| a.id == id)
            .ok_or(ApiError::Http {
                status: 404,
                reason: "Not Found".into(),
            })
    }

    async fn alerts(&self) -> Result<Vec<Alert>, ApiError> {
        let dismissed = locked(&self.dismissed);
        let mut list = alerts(Utc::now());
        for a in &mut list {
            if dismissed.contains(&a.id) {
                a.active = false;
            }
        }
        Ok(list)
    }

    async fn dismiss_alert(&self, id: &str) -> Result<(), ApiError> {
        if !alerts(Utc::now()).iter().any(|a| a.id == id) {
            return Err(ApiError::Http {
                status: 404,
                reason: "Not Found".into(),
            });
        }
        let mut dismissed = locked(&self.dismissed);
        if !dismissed.iter().any(|d| d == id) {
            dismissed.push(id.to_string());
        }
        Ok(())
    }

    async fn history(&self, start: &str, end: &str) -> Result<Vec<MetricSample>, ApiError> {
        let parse = |s: &str| {
            timestamp::parse_text(s)
                .ok_or_else(|| ApiError::Validation(format!("invalid date-time: {s}")))
        };
        Ok(history(parse(start)?, parse(end)?))
    }

    async fn thresholds(&self) -> Result<ThresholdConfig, ApiError> {
        Ok(*locked(&self.thresholds))
    }

    async fn save_thresholds(&self, cfg: &ThresholdConfig) -> Result<(), ApiError> {
        *locked(&self.thresholds) = *cfg;
        Ok(())
    }

    async fn notification_config(&self) -> Result<NotificationConfig, ApiError> {
        let mut cfg = locked(&self.notifications).clone();
        cfg.sender_password.clear();
        Ok(cfg)
    }

    async fn save_notification_config(&self, cfg: &NotificationConfig) -> Result<(), ApiError> {
        *locked(&self.notifications) = cfg.clone();
        Ok(())
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        Ok(HealthStatus {
            status: "healthy".into(),
            timestamp: Some(Utc::now()),
            version: Some("demo".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 24, 12, 0, 0).unwrap()
    }

    #[test]
    fn realtime_is_deterministic_and_ordered() {
        let a = realtime(now());
        let b = realtime(now());
        assert_eq!(a.len(), 72);
        assert_eq!(a.last().unwrap().timestamp, now());
        assert!(a.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.cpu, y.cpu);
            assert_eq!(x.memory, y.memory);
        }
        assert!(a.iter().all(|s| (0.0..=100.0).contains(&s.cpu.unwrap())));
    }

    #[test]
    fn history_covers_the_requested_range() {
        let start = now() - Duration::hours(24);
        let h = history(start, now());
        assert_eq!(h.first().unwrap().timestamp, start);
        assert!(h.last().unwrap().timestamp <= now());
        assert!(h.len() as i64 <= HISTORY_MAX_POINTS + 1);
        assert!(h.iter().all(|s| s.cpu_percent.is_some() && s.cpu.is_none()));
        assert!(history(now(), start).is_empty());
    }

    #[test]
    fn mock_agents_have_unique_ids_and_hostnames() {
        let list = agents(now());
        assert_eq!(list.len(), 5);
        let mut ids: Vec<_> = list.iter().map(|a| a.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 5);
        assert!(list.iter().all(|a| !a.hostname.is_empty() && !a.ip_address.is_empty()));
    }

    #[tokio::test]
    async fn mock_backend_keeps_writes_but_not_the_password() {
        let backend = MockBackend::new();
        backend
            .save_thresholds(&ThresholdConfig { cpu: 60, memory: 70, disk: 80 })
            .await
            .unwrap();
        assert_eq!(backend.thresholds().await.unwrap().cpu, 60);

        let mut cfg = notification_config();
        cfg.sender_password = "secret".into();
        backend.save_notification_config(&cfg).await.unwrap();
        assert!(backend.notification_config().await.unwrap().sender_password.is_empty());

        backend.dismiss_alert("2").await.unwrap();
        let alerts = backend.alerts().await.unwrap();
        assert!(!alerts.iter().find(|a| a.id == "2").unwrap().active);
        assert!(backend.dismiss_alert("nope").await.is_err());
    }
}

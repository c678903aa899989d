//! REST client for the monitoring backend, plus the `DashboardApi` seam the
//! dashboard is generic over.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Certificate, Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;
use crate::mock;
use crate::types::{
    Agent, Alert, HealthStatus, MetricSample, NotificationConfig, Stats, ThresholdConfig,
};

/// Decoded response body. The response content-type decides which one.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn into_typed<T: DeserializeOwned>(self, endpoint: &str) -> Result<T, ApiError> {
        match self {
            Payload::Json(v) => serde_json::from_value(v).map_err(|e| ApiError::Decode {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            }),
            Payload::Text(t) => Err(ApiError::Decode {
                endpoint: endpoint.to_string(),
                detail: format!("expected JSON, got text ({} bytes)", t.len()),
            }),
        }
    }
}

/// Everything the dashboard needs from a backend.
///
/// The `*_with_fallback` methods are the resilience boundary: they log the
/// failure and substitute deterministic mock data, and never fail. The
/// returned `Fetched` says which one the caller got.
#[allow(async_fn_in_trait)]
pub trait DashboardApi {
    async fn stats(&self) -> Result<Stats, ApiError>;
    async fn realtime(&self, timespan: &str) -> Result<Vec<MetricSample>, ApiError>;
    async fn agents(&self) -> Result<Vec<Agent>, ApiError>;
    async fn agent(&self, id: &str) -> Result<Agent, ApiError>;
    async fn alerts(&self) -> Result<Vec<Alert>, ApiError>;
    async fn dismiss_alert(&self, id: &str) -> Result<(), ApiError>;
    async fn history(&self, start: &str, end: &str) -> Result<Vec<MetricSample>, ApiError>;
    async fn thresholds(&self) -> Result<ThresholdConfig, ApiError>;
    async fn save_thresholds(&self, cfg: &ThresholdConfig) -> Result<(), ApiError>;
    async fn notification_config(&self) -> Result<NotificationConfig, ApiError>;
    async fn save_notification_config(&self, cfg: &NotificationConfig) -> Result<(), ApiError>;
    async fn health(&self) -> Result<HealthStatus, ApiError>;

    /// Liveness: a successful health answer, whatever its body.
    async fn test_connection(&self) -> bool {
        self.health().await.is_ok()
    }

    async fn stats_with_fallback(&self) -> Fetched<Stats> {
        match self.stats().await {
            Ok(s) => Fetched::Live(s),
            Err(e) => {
                warn!(error = %e, "using mock data for stats");
                Fetched::Mock(mock::stats())
            }
        }
    }

    async fn realtime_with_fallback(&self, timespan: &str) -> Fetched<Vec<MetricSample>> {
        match self.realtime(timespan).await {
            Ok(s) => Fetched::Live(s),
            Err(e) => {
                warn!(error = %e, timespan, "using mock data for realtime series");
                Fetched::Mock(mock::realtime(chrono::Utc::now()))
            }
        }
    }

    async fn agents_with_fallback(&self) -> Fetched<Vec<Agent>> {
        match self.agents().await {
            Ok(a) => Fetched::Live(a),
            Err(e) => {
                warn!(error = %e, "using mock data for agents");
                Fetched::Mock(mock::agents(chrono::Utc::now()))
            }
        }
    }

    async fn alerts_with_fallback(&self) -> Fetched<Vec<Alert>> {
        match self.alerts().await {
            Ok(a) => Fetched::Live(a),
            Err(e) => {
                warn!(error = %e, "using mock data for alerts");
                Fetched::Mock(mock::alerts(chrono::Utc::now()))
            }
        }
    }
}

/// Result of a fallback call: the real payload, or the mock substitute.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Live(T),
    Mock(T),
}

impl<T> Fetched<T> {
    pub fn is_mock(&self) -> bool {
        matches!(self, Fetched::Mock(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Fetched::Live(v) | Fetched::Mock(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Fetched::Live(v) | Fetched::Mock(v) => v,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub struct ApiClient {
    http: Client,
    base: Url,
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(
        base: Url,
        credentials: Credentials,
        timeout: Duration,
        tls_ca_pem: Option<&[u8]>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(pem) = tls_ca_pem {
            builder = builder.add_root_certificate(Certificate::from_pem(pem).map_err(ApiError::Network)?);
        }
        Ok(Self {
            http: builder.build().map_err(ApiError::Network)?,
            base,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Single attempt, no retries. Non-2xx statuses are classified into
    /// `ApiError` variants; transport failures become `Network`.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Payload, ApiError> {
        let url = self.base.join(endpoint).map_err(|e| ApiError::Validation(format!(
            "invalid endpoint {endpoint}: {e}"
        )))?;
        debug!(%method, %url, "request");

        let mut req = self
            .http
            .request(method, url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(b) = body {
            req = req.body(b.to_string());
        }

        let resp = req.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "request failed");
            ApiError::Network(e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "request rejected");
            return Err(ApiError::from_status(status));
        }

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let text = resp.text().await.map_err(ApiError::Network)?;
        if is_json {
            serde_json::from_str(&text)
                .map(Payload::Json)
                .map_err(|e| ApiError::Decode {
                    endpoint: endpoint.to_string(),
                    detail: e.to_string(),
                })
        } else {
            Ok(Payload::Text(text))
        }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(Method::GET, endpoint, None)
            .await?
            .into_typed(endpoint)
    }

    async fn post<B: Serialize>(&self, endpoint: &str, body: Option<&B>) -> Result<(), ApiError> {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ApiError::Validation(format!("cannot encode request body: {e}")))?;
        // Write endpoints answer with a status message we do not need.
        self.request(Method::POST, endpoint, body).await.map(|_| ())
    }
}

impl DashboardApi for ApiClient {
    async fn stats(&self) -> Result<Stats, ApiError> {
        self.get("/api/stats").await
    }

    async fn realtime(&self, timespan: &str) -> Result<Vec<MetricSample>, ApiError> {
        self.get(&with_query("/api/realtime", &[("timespan", timespan)]))
            .await
    }

    async fn agents(&self) -> Result<Vec<Agent>, ApiError> {
        self.get("/api/agents").await
    }

    async fn agent(&self, id: &str) -> Result<Agent, ApiError> {
        self.get(&format!("/api/agents/{}", encode_segment(id))).await
    }

    async fn alerts(&self) -> Result<Vec<Alert>, ApiError> {
        self.get("/api/alerts").await
    }

    async fn dismiss_alert(&self, id: &str) -> Result<(), ApiError> {
        self.post::<Value>(&format!("/api/alerts/{}/dismiss", encode_segment(id)), None)
            .await
    }

    async fn history(&self, start: &str, end: &str) -> Result<Vec<MetricSample>, ApiError> {
        self.get(&with_query("/api/history", &[("start", start), ("end", end)]))
            .await
    }

    async fn thresholds(&self) -> Result<ThresholdConfig, ApiError> {
        self.get("/api/thresholds").await
    }

    async fn save_thresholds(&self, cfg: &ThresholdConfig) -> Result<(), ApiError> {
        self.post("/api/thresholds", Some(cfg)).await
    }

    async fn notification_config(&self) -> Result<NotificationConfig, ApiError> {
        self.get("/api/notifications/config").await
    }

    async fn save_notification_config(&self, cfg: &NotificationConfig) -> Result<(), ApiError> {
        self.post("/api/notifications/config", Some(cfg)).await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("/api/health").await
    }

    // Some backends answer health checks with plain text; any 2xx counts.
    async fn test_connection(&self) -> bool {
        self.request(Method::GET, "/api/health", None).await.is_ok()
    }
}

fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    let q = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{path}?{q}")
}

// RFC 3986 unreserved characters pass through, everything else is %-escaped.
fn encode_segment(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

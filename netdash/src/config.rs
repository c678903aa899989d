//! Runtime configuration: CLI flags over the profile entry over the
//! environment over built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use url::Url;

use crate::api::{ApiClient, Credentials};
use crate::profiles::ProfileEntry;
use crate::timer::DEFAULT_INTERVAL;

pub const ENV_USER: &str = "NETDASH_USER";
pub const ENV_PASSWORD: &str = "NETDASH_PASSWORD";
pub const ENV_LOG: &str = "NETDASH_LOG";

pub const DEFAULT_USER: &str = "admin";
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub username: Option<String>,
    pub tls_ca: Option<String>,
    pub refresh_ms: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Environment {
    pub fn from_process() -> Self {
        let var = |k: &str| std::env::var(k).ok().filter(|v| !v.is_empty());
        Self {
            username: var(ENV_USER),
            password: var(ENV_PASSWORD),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub base_url: Url,
    pub username: String,
    pub password: String,
    pub tls_ca: Option<PathBuf>,
    pub refresh: Duration,
    pub timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("tls_ca", &self.tls_ca)
            .field("refresh", &self.refresh)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// A zero interval would refresh on every loop pass.
pub fn check_refresh(refresh: Duration) -> Result<Duration> {
    if refresh.is_zero() {
        bail!("refresh interval must be greater than zero");
    }
    Ok(refresh)
}

impl Config {
    pub fn merge(entry: &ProfileEntry, cli: &Overrides, env: &Environment) -> Result<Self> {
        let base_url = parse_base_url(&entry.url)?;
        let username = cli
            .username
            .clone()
            .or_else(|| entry.username.clone())
            .or_else(|| env.username.clone())
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        let tls_ca = cli
            .tls_ca
            .clone()
            .or_else(|| entry.tls_ca.clone())
            .map(PathBuf::from);
        let refresh = cli
            .refresh_ms
            .or(entry.refresh_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_INTERVAL);
        let refresh = check_refresh(refresh)?;
        Ok(Self {
            base_url,
            username,
            password: env.password.clone().unwrap_or_default(),
            tls_ca,
            refresh,
            timeout: HTTP_TIMEOUT,
        })
    }

    pub fn build_client(&self) -> Result<ApiClient> {
        let pem = match &self.tls_ca {
            Some(path) => Some(
                std::fs::read(path)
                    .with_context(|| format!("reading TLS CA file {}", path.display()))?,
            ),
            None => None,
        };
        let creds = Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        };
        ApiClient::new(self.base_url.clone(), creds, self.timeout, pem.as_deref())
            .context("building HTTP client")
    }
}

/// http(s) only. Endpoints are absolute paths, so any path on the URL is
/// replaced when joining.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid backend URL '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("backend URL must use http or https, got '{}'", url.scheme());
    }
    Ok(url)
}

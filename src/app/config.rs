use std::fmt;
use std::time::Duration;

use crate::adapters::transport::BASE_URL;
use crate::app::AppError;
use crate::domain::region::Region;
use crate::domain::update_cycle::PollPolicy;

#[derive(Clone)]
pub struct AppConfig {
    pub username: String,
    pub password: String,
    pub region: Region,
    pub base_url: String,
    pub http_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_max_attempts: u32,
    pub refresh: bool,
    pub debug_http: bool,
    pub replay_file: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = required(&lookup, "CARWINGS_USERNAME")?;
        let password = lookup("CARWINGS_PASSWORD")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::config("CARWINGS_PASSWORD is required"))?;

        let region = match non_empty(&lookup, "CARWINGS_REGION") {
            Some(raw) => raw
                .parse::<Region>()
                .map_err(|err| AppError::config(format!("CARWINGS_REGION: {err}")))?,
            None => Region::Usa,
        };

        Ok(Self {
            username,
            password,
            region,
            base_url: non_empty(&lookup, "CARWINGS_BASE_URL")
                .unwrap_or_else(|| BASE_URL.to_string()),
            http_timeout_ms: parse_or_default(&lookup, "CARWINGS_HTTP_TIMEOUT_MS", 30_000_u64)?,
            poll_interval_ms: parse_or_default(&lookup, "CARWINGS_POLL_INTERVAL_MS", 10_000_u64)?,
            poll_max_attempts: parse_or_default(&lookup, "CARWINGS_POLL_MAX_ATTEMPTS", 30_u32)?,
            refresh: parse_or_default(&lookup, "CARWINGS_REFRESH", true)?,
            debug_http: parse_or_default(&lookup, "CARWINGS_DEBUG_HTTP", false)?,
            replay_file: non_empty(&lookup, "CARWINGS_REPLAY_FILE"),
        })
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.poll_max_attempts,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("region", &self.region)
            .field("base_url", &self.base_url)
            .field("http_timeout_ms", &self.http_timeout_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_max_attempts", &self.poll_max_attempts)
            .field("refresh", &self.refresh)
            .field("debug_http", &self.debug_http)
            .field("replay_file", &self.replay_file)
            .finish()
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key).ok_or_else(|| AppError::config(format!("{key} is required")))
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} has an invalid value"))),
        None => Ok(default),
    }
}

//! HTTP traffic backend.
//!
//! Blocking reqwest client with an explicit request timeout, meant to run
//! inside `IoTaskPool` fetch tasks (never on the main schedule). Configured
//! entirely from environment variables so the dashboard can point at a feed
//! without a rebuild.

use std::env;
use std::time::Duration;

use bevy::log::warn;
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use super::types::{HistoricalPattern, TrafficIncident, TrafficSnapshot};
use super::{BackendError, TrafficBackend};
use crate::zone::ZoneId;

/// Base URL of the traffic feed, e.g. `https://traffic.example.ae/api`.
pub const ENV_TRAFFIC_BASE_URL: &str = "ZONEVIEW_TRAFFIC_URL";
/// Request timeout override in milliseconds.
pub const ENV_TRAFFIC_TIMEOUT_MS: &str = "ZONEVIEW_TRAFFIC_TIMEOUT_MS";
/// Set to anything to mark the live capability as unavailable at startup.
pub const ENV_LIVE_UNAVAILABLE: &str = "ZONEVIEW_LIVE_UNAVAILABLE";

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub struct HttpTrafficBackend {
    client: Client,
    base_url: String,
}

impl HttpTrafficBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a backend from `ZONEVIEW_TRAFFIC_URL`; `None` when unset.
    pub fn from_env() -> Option<Self> {
        let base_url = env::var(ENV_TRAFFIC_BASE_URL).ok()?;
        let timeout_ms = env::var(ENV_TRAFFIC_TIMEOUT_MS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        match Self::new(base_url, Duration::from_millis(timeout_ms)) {
            Ok(backend) => Some(backend),
            Err(err) => {
                warn!("failed to build HTTP traffic backend: {err}");
                None
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BackendError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        response
            .json::<T>()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

impl TrafficBackend for HttpTrafficBackend {
    fn fetch_live(&self, zone: &ZoneId) -> Result<TrafficSnapshot, BackendError> {
        self.get_json(&format!("{}/live/{}", self.base_url, zone))
    }

    fn fetch_historical(
        &self,
        zone: &ZoneId,
        time: DateTime<Utc>,
    ) -> Result<HistoricalPattern, BackendError> {
        self.get_json(&format!(
            "{}/historical/{}?time={}",
            self.base_url,
            zone,
            time.to_rfc3339()
        ))
    }

    fn fetch_incidents(&self, area: &str) -> Result<Vec<TrafficIncident>, BackendError> {
        self.get_json(&format!("{}/incidents?area={}", self.base_url, area))
    }
}

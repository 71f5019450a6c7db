//! Traffic data provider: remote fetch with synthetic fallback.
//!
//! The provider never fails. Any backend error — transport, non-2xx,
//! decode — is absorbed into a deterministic synthetic bundle, so callers
//! (the overlay renderer) have no error path at all. Incident fetches fall
//! back to an empty list instead: incident synthesis is the renderer's job,
//! because only the renderer knows the active bounds.

mod http;
mod synthetic;
mod types;

pub use http::{HttpTrafficBackend, ENV_LIVE_UNAVAILABLE, ENV_TRAFFIC_BASE_URL};
pub use synthetic::{
    base_profile, synthetic_pattern, synthetic_segments, synthetic_snapshot, BaseProfile,
    MIN_SEGMENT_SPEED_KMH,
};
pub use types::{
    DataSource, FlowDirection, HistoricalPattern, IncidentKind, IncidentSeverity, TrafficIncident,
    TrafficSegment, TrafficSnapshot,
};

use std::sync::Arc;

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::zone::ZoneId;

/// Backend failure taxonomy. Every variant is absorbed by the provider.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("traffic backend disabled")]
    Disabled,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("traffic backend returned HTTP {0}")]
    Status(u16),
    #[error("failed to decode backend payload: {0}")]
    Decode(String),
}

/// A remote traffic feed. May be absent or offline at any time.
pub trait TrafficBackend: Send + Sync {
    fn fetch_live(&self, zone: &ZoneId) -> Result<TrafficSnapshot, BackendError>;

    fn fetch_historical(
        &self,
        zone: &ZoneId,
        time: DateTime<Utc>,
    ) -> Result<HistoricalPattern, BackendError>;

    fn fetch_incidents(&self, area: &str) -> Result<Vec<TrafficIncident>, BackendError>;
}

/// A backend that is never there. The default: the dashboard runs entirely
/// on synthetic data until a real feed is configured.
pub struct OfflineBackend;

impl TrafficBackend for OfflineBackend {
    fn fetch_live(&self, _zone: &ZoneId) -> Result<TrafficSnapshot, BackendError> {
        Err(BackendError::Disabled)
    }

    fn fetch_historical(
        &self,
        _zone: &ZoneId,
        _time: DateTime<Utc>,
    ) -> Result<HistoricalPattern, BackendError> {
        Err(BackendError::Disabled)
    }

    fn fetch_incidents(&self, _area: &str) -> Result<Vec<TrafficIncident>, BackendError> {
        Err(BackendError::Disabled)
    }
}

/// Fetch-with-fallback facade over a [`TrafficBackend`].
pub struct TrafficDataProvider {
    backend: Arc<dyn TrafficBackend>,
    live_available: bool,
}

impl TrafficDataProvider {
    pub fn new(backend: Arc<dyn TrafficBackend>, live_available: bool) -> Self {
        Self {
            backend,
            live_available,
        }
    }

    /// Provider with no remote feed; everything is synthesized.
    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineBackend), true)
    }

    /// Capability flag consulted by the orchestrator before entering live
    /// mode. Fixed at construction; runtime fetch failures do not revise it.
    pub fn is_live_available(&self) -> bool {
        self.live_available
    }

    /// Current traffic for a zone. Never fails: backend errors yield the
    /// synthetic snapshot for the current hour.
    pub fn live_snapshot(&self, zone: &ZoneId) -> TrafficSnapshot {
        match self.backend.fetch_live(zone) {
            Ok(mut snapshot) => {
                snapshot.source = DataSource::Live;
                snapshot
            }
            Err(err) => {
                debug!("live fetch for {zone} failed, synthesizing: {err}");
                synthetic_snapshot(Utc::now())
            }
        }
    }

    /// Historical pattern keyed by `time`. Never fails: backend errors yield
    /// the synthetic pattern for the queried hour.
    pub fn historical_pattern(&self, zone: &ZoneId, time: DateTime<Utc>) -> HistoricalPattern {
        match self.backend.fetch_historical(zone, time) {
            Ok(mut pattern) => {
                pattern.source = DataSource::Live;
                pattern.queried_at = time;
                pattern
            }
            Err(err) => {
                debug!("historical fetch for {zone} failed, synthesizing: {err}");
                synthetic_pattern(time)
            }
        }
    }

    /// Incidents for an area string; falls back to the empty list.
    pub fn incidents(&self, area: &str) -> Vec<TrafficIncident> {
        match self.backend.fetch_incidents(area) {
            Ok(incidents) => incidents,
            Err(err) => {
                debug!("incident fetch for {area:?} failed: {err}");
                Vec::new()
            }
        }
    }
}

/// Shared handle to the active provider, cloned into fetch tasks.
#[derive(Resource)]
pub struct ProviderHandle(pub Arc<TrafficDataProvider>);

impl Default for ProviderHandle {
    fn default() -> Self {
        Self(Arc::new(TrafficDataProvider::offline()))
    }
}

pub struct ProviderPlugin;

impl Plugin for ProviderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProviderHandle>();
    }
}

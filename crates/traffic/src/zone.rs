//! Zone catalogue: records, emirates, sources, and periodic reload.
//!
//! Zones are owned by the [`ZoneCatalogue`] resource and refreshed three
//! ways: a silent background reload every [`ZoneReloadTimer::INTERVAL`]
//! ticks, an explicit manual reload, and an emirate-filter change. Only the
//! foreground paths surface failures to the user; background failures keep
//! the last good catalogue and log a warning.
//!
//! All reloads run as `IoTaskPool` tasks so a slow zone source never stalls
//! a frame.

use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{block_on, IoTaskPool, Task};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{GeoPoint, ZoneBoundary};
use crate::lifecycle::ViewLifecycle;
use crate::selection::SelectedZone;

/// Stable zone identity as issued by the zone editor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The seven emirates, each with a hard-coded map view preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emirate {
    AbuDhabi,
    Dubai,
    Sharjah,
    Ajman,
    UmmAlQuwain,
    RasAlKhaimah,
    Fujairah,
}

pub const ALL_EMIRATES: [Emirate; 7] = [
    Emirate::AbuDhabi,
    Emirate::Dubai,
    Emirate::Sharjah,
    Emirate::Ajman,
    Emirate::UmmAlQuwain,
    Emirate::RasAlKhaimah,
    Emirate::Fujairah,
];

impl Emirate {
    pub fn label(self) -> &'static str {
        match self {
            Self::AbuDhabi => "Abu Dhabi",
            Self::Dubai => "Dubai",
            Self::Sharjah => "Sharjah",
            Self::Ajman => "Ajman",
            Self::UmmAlQuwain => "Umm Al Quwain",
            Self::RasAlKhaimah => "Ras Al Khaimah",
            Self::Fujairah => "Fujairah",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_EMIRATES
            .into_iter()
            .find(|e| e.label().eq_ignore_ascii_case(name.trim()))
    }

    /// Map view preset: (center, zoom).
    pub fn map_view(self) -> (GeoPoint, f32) {
        match self {
            Self::AbuDhabi => (GeoPoint::new(24.45, 54.40), 10.0),
            Self::Dubai => (GeoPoint::new(25.20, 55.27), 10.0),
            Self::Sharjah => (GeoPoint::new(25.35, 55.42), 10.5),
            Self::Ajman => (GeoPoint::new(25.40, 55.45), 11.0),
            Self::UmmAlQuwain => (GeoPoint::new(25.55, 55.55), 11.0),
            Self::RasAlKhaimah => (GeoPoint::new(25.78, 55.95), 10.5),
            Self::Fujairah => (GeoPoint::new(25.13, 56.33), 10.5),
        }
    }
}

/// Catalogue filter: everything, or a single emirate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmirateFilter {
    #[default]
    All,
    Only(Emirate),
}

impl EmirateFilter {
    /// Parse a UI-supplied name; anything unrecognized (including "All")
    /// falls back to the country-wide view.
    pub fn from_name(name: &str) -> Self {
        match Emirate::from_name(name) {
            Some(e) => Self::Only(e),
            None => Self::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(e) => e.label(),
        }
    }

    pub fn matches(self, zone: &Zone) -> bool {
        match self {
            Self::All => true,
            Self::Only(e) => zone.emirate == e,
        }
    }

    /// Map view preset for the filter (the "All" country-wide view, or the
    /// emirate's own preset).
    pub fn map_view(self) -> (GeoPoint, f32) {
        match self {
            Self::All => (GeoPoint::new(24.9, 54.8), 7.0),
            Self::Only(e) => e.map_view(),
        }
    }
}

/// Land-use classification driving the congestion baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Residential,
    Commercial,
    Industrial,
    Mixed,
}

impl ZoneKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Residential => "Residential",
            Self::Commercial => "Commercial",
            Self::Industrial => "Industrial",
            Self::Mixed => "Mixed use",
        }
    }
}

/// A congestion-pricing zone as issued by the zone editor. Immutable once
/// loaded; pricing attributes are display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub emirate: Emirate,
    #[serde(rename = "zoneType")]
    pub kind: ZoneKind,
    #[serde(default)]
    pub centroid: Option<GeoPoint>,
    pub boundary_ref: String,
    #[serde(default)]
    pub base_rate_aed: f32,
    #[serde(default)]
    pub peak_multiplier: f32,
}

/// Zone source failure taxonomy. Nothing here is fatal to the engine.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("zone source unavailable")]
    Unavailable,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("zone source returned HTTP {0}")]
    Status(u16),
    #[error("malformed zone data: {0}")]
    Malformed(String),
}

/// External supplier of zone records and boundary polygons.
pub trait ZoneSource: Send + Sync {
    fn list_zones(&self) -> Result<Vec<Zone>, SourceError>;

    fn list_zones_matching(&self, filter: &EmirateFilter) -> Result<Vec<Zone>, SourceError> {
        Ok(self
            .list_zones()?
            .into_iter()
            .filter(|z| filter.matches(z))
            .collect())
    }

    fn boundary(&self, id: &ZoneId) -> Result<ZoneBoundary, SourceError>;
}

/// Built-in demo catalogue covering the emirates, used whenever no remote
/// zone editor is wired up. Boundaries are hexagons around each centroid.
#[derive(Default)]
pub struct StaticZoneSource;

/// Half-extent in degrees of the demo hexagon boundaries.
const DEMO_BOUNDARY_HALF_DEG: f64 = 0.02;

fn demo_zone(
    id: &str,
    name: &str,
    emirate: Emirate,
    kind: ZoneKind,
    lat: f64,
    lon: f64,
    base_rate_aed: f32,
    peak_multiplier: f32,
) -> Zone {
    Zone {
        id: ZoneId::new(id),
        name: name.to_string(),
        emirate,
        kind,
        centroid: Some(GeoPoint::new(lat, lon)),
        boundary_ref: format!("boundaries/{id}"),
        base_rate_aed,
        peak_multiplier,
    }
}

impl StaticZoneSource {
    fn demo_zones() -> Vec<Zone> {
        use Emirate::*;
        use ZoneKind::*;
        vec![
            demo_zone("dxb-001", "Deira", Dubai, Commercial, 25.271, 55.311, 6.0, 2.0),
            demo_zone("dxb-002", "Bur Dubai", Dubai, Mixed, 25.258, 55.292, 5.0, 1.8),
            demo_zone("dxb-003", "Al Quoz", Dubai, Industrial, 25.139, 55.232, 4.0, 1.5),
            demo_zone("dxb-004", "Jumeirah", Dubai, Residential, 25.205, 55.244, 4.0, 1.6),
            demo_zone("dxb-005", "Business Bay", Dubai, Commercial, 25.185, 55.263, 8.0, 2.5),
            demo_zone("auh-001", "Al Markaziyah", AbuDhabi, Commercial, 24.492, 54.368, 6.0, 2.0),
            demo_zone("auh-002", "Mussafah", AbuDhabi, Industrial, 24.353, 54.500, 4.0, 1.5),
            demo_zone("auh-003", "Khalifa City", AbuDhabi, Residential, 24.419, 54.605, 3.0, 1.4),
            demo_zone("shj-001", "Al Majaz", Sharjah, Mixed, 25.323, 55.385, 5.0, 1.8),
            demo_zone("shj-002", "Sharjah Industrial Area", Sharjah, Industrial, 25.311, 55.424, 4.0, 1.5),
            demo_zone("ajm-001", "Ajman Corniche", Ajman, Residential, 25.408, 55.435, 3.0, 1.4),
            demo_zone("rak-001", "Al Nakheel", RasAlKhaimah, Mixed, 25.790, 55.943, 4.0, 1.6),
        ]
    }
}

impl ZoneSource for StaticZoneSource {
    fn list_zones(&self) -> Result<Vec<Zone>, SourceError> {
        Ok(Self::demo_zones())
    }

    fn boundary(&self, id: &ZoneId) -> Result<ZoneBoundary, SourceError> {
        let zones = Self::demo_zones();
        let zone = zones
            .iter()
            .find(|z| &z.id == id)
            .ok_or_else(|| SourceError::Malformed(format!("unknown zone {id}")))?;
        let center = zone
            .centroid
            .ok_or_else(|| SourceError::Malformed(format!("zone {id} has no coordinates")))?;
        let h = DEMO_BOUNDARY_HALF_DEG;
        // Flat-topped hexagon around the centroid.
        let ring = vec![
            GeoPoint::new(center.lat + h, center.lon),
            GeoPoint::new(center.lat + h * 0.5, center.lon + h * 0.87),
            GeoPoint::new(center.lat - h * 0.5, center.lon + h * 0.87),
            GeoPoint::new(center.lat - h, center.lon),
            GeoPoint::new(center.lat - h * 0.5, center.lon - h * 0.87),
            GeoPoint::new(center.lat + h * 0.5, center.lon - h * 0.87),
        ];
        Ok(ZoneBoundary::new(ring))
    }
}

/// Shared handle to the active zone source.
#[derive(Resource)]
pub struct ZoneSourceHandle(pub Arc<dyn ZoneSource>);

impl Default for ZoneSourceHandle {
    fn default() -> Self {
        Self(Arc::new(StaticZoneSource))
    }
}

/// The authoritative zone list for the current filter.
#[derive(Resource, Default)]
pub struct ZoneCatalogue {
    pub zones: Vec<Zone>,
}

impl ZoneCatalogue {
    pub fn get(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// The emirate filter currently applied to the catalogue.
#[derive(Resource, Default)]
pub struct ActiveEmirateFilter(pub EmirateFilter);

/// Tick counter for the silent background reload.
#[derive(Resource, Default)]
pub struct ZoneReloadTimer {
    pub counter: u32,
}

impl ZoneReloadTimer {
    /// Reload every 150 ticks (15 s at 10 Hz).
    pub const INTERVAL: u32 = 150;
}

/// Why a reload was issued; foreground reloads surface their failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadReason {
    Background,
    Manual,
    Filter,
}

impl ReloadReason {
    pub fn is_foreground(self) -> bool {
        matches!(self, Self::Manual | Self::Filter)
    }
}

/// In-flight zone list fetch.
#[derive(Component)]
pub struct ZoneListTask {
    pub reason: ReloadReason,
    task: Task<Result<Vec<Zone>, SourceError>>,
}

/// User pressed the reload button.
#[derive(Event, Default)]
pub struct ManualReloadRequested;

/// User picked an emirate (or "All") in the filter control.
#[derive(Event, Clone, Copy)]
pub struct EmirateFilterApplied(pub EmirateFilter);

/// A reload completed and replaced the catalogue.
#[derive(Event, Debug)]
pub struct ZonesReloaded {
    pub count: usize,
}

/// A foreground reload failed; shown to the user by the UI crate.
#[derive(Event, Debug, Clone)]
pub struct ZoneLoadFailed {
    pub reason: ReloadReason,
    pub message: String,
}

fn spawn_list_task(
    commands: &mut Commands,
    source: &ZoneSourceHandle,
    filter: EmirateFilter,
    reason: ReloadReason,
) {
    let source = Arc::clone(&source.0);
    let task = IoTaskPool::get().spawn(async move { source.list_zones_matching(&filter) });
    commands.spawn(ZoneListTask { reason, task });
}

/// Startup: issue the initial catalogue load.
pub fn load_zones_on_startup(
    mut commands: Commands,
    source: Res<ZoneSourceHandle>,
    filter: Res<ActiveEmirateFilter>,
) {
    spawn_list_task(&mut commands, &source, filter.0, ReloadReason::Background);
}

/// FixedUpdate: silent periodic reload of the current filter's zones.
pub fn tick_zone_reload(
    mut commands: Commands,
    lifecycle: Res<ViewLifecycle>,
    mut timer: ResMut<ZoneReloadTimer>,
    source: Res<ZoneSourceHandle>,
    filter: Res<ActiveEmirateFilter>,
) {
    if lifecycle.disposed {
        return;
    }
    timer.counter += 1;
    if timer.counter >= ZoneReloadTimer::INTERVAL {
        timer.counter = 0;
        spawn_list_task(&mut commands, &source, filter.0, ReloadReason::Background);
    }
}

/// Update: manual reloads and emirate filter changes, both foreground.
///
/// A manual reload also forgets remembered boundary-fetch failures so the
/// user gets a retry path for zones that previously failed to render.
pub fn handle_reload_requests(
    mut commands: Commands,
    lifecycle: Res<ViewLifecycle>,
    mut manual: EventReader<ManualReloadRequested>,
    mut filters: EventReader<EmirateFilterApplied>,
    mut active: ResMut<ActiveEmirateFilter>,
    source: Res<ZoneSourceHandle>,
    mut failures: ResMut<crate::boundary::BoundaryFailures>,
) {
    if lifecycle.disposed {
        manual.clear();
        filters.clear();
        return;
    }
    if let Some(EmirateFilterApplied(filter)) = filters.read().last() {
        active.0 = *filter;
        spawn_list_task(&mut commands, &source, *filter, ReloadReason::Filter);
    }
    if manual.read().last().is_some() {
        failures.0.clear();
        spawn_list_task(&mut commands, &source, active.0, ReloadReason::Manual);
    }
}

/// Update: poll in-flight list fetches and apply completed ones.
pub fn collect_zone_lists(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut ZoneListTask)>,
    mut catalogue: ResMut<ZoneCatalogue>,
    mut selected: ResMut<SelectedZone>,
    mut reloaded: EventWriter<ZonesReloaded>,
    mut failed: EventWriter<ZoneLoadFailed>,
) {
    for (entity, mut pending) in &mut tasks {
        let Some(result) = block_on(futures_lite::future::poll_once(&mut pending.task)) else {
            continue;
        };
        match result {
            Ok(zones) => {
                // A reload can drop the selected zone (filter change, CRUD
                // deletion); clear the selection rather than point at a ghost.
                if let Some(id) = selected.0.clone() {
                    if !zones.iter().any(|z| z.id == id) {
                        selected.0 = None;
                    }
                }
                reloaded.send(ZonesReloaded { count: zones.len() });
                catalogue.zones = zones;
            }
            Err(err) => {
                if pending.reason.is_foreground() {
                    failed.send(ZoneLoadFailed {
                        reason: pending.reason,
                        message: err.to_string(),
                    });
                } else {
                    warn!("background zone reload failed; keeping last catalogue: {err}");
                }
            }
        }
        commands.entity(entity).despawn();
    }
}

pub struct ZonesPlugin;

impl Plugin for ZonesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ZoneSourceHandle>()
            .init_resource::<ZoneCatalogue>()
            .init_resource::<ActiveEmirateFilter>()
            .init_resource::<ZoneReloadTimer>()
            .add_event::<ManualReloadRequested>()
            .add_event::<EmirateFilterApplied>()
            .add_event::<ZonesReloaded>()
            .add_event::<ZoneLoadFailed>()
            .add_systems(Startup, load_zones_on_startup)
            .add_systems(FixedUpdate, tick_zone_reload)
            .add_systems(Update, (handle_reload_requests, collect_zone_lists));
    }
}

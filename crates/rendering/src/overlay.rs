//! Traffic overlay layer set and the render pipeline.
//!
//! A repaint is always a full clear-and-rebuild of [`OverlayLayers`]: the
//! newest [`RepaintRequested`] event of a frame (last value wins) resolves
//! the active bounds, spawns a provider fetch on the IO task pool tagged
//! with the current [`ViewGeneration`], and the completed result is
//! converted into renderable primitives in one go. Results from a stale
//! generation are dropped so a slow fetch can never paint over newer state.
//!
//! The draw modules (heatmap, flow lines, speed labels, incident markers,
//! contextual, zone polygons) only read the layer set; everything they need
//! is precomputed here.

use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{block_on, IoTaskPool, Task};
use chrono::Weekday;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use traffic::boundary::{BoundaryReady, BoundsCache};
use traffic::clock::ViewClock;
use traffic::congestion::{flow_band, CongestionBand};
use traffic::geo::{GeoBounds, GeoPoint};
use traffic::lifecycle::{DisposeView, ViewLifecycle};
use traffic::mode::{DisplayMode, ModeState};
use traffic::provider::{
    DataSource, HistoricalPattern, IncidentKind, IncidentSeverity, ProviderHandle,
    TrafficIncident, TrafficSegment, TrafficSnapshot,
};
use traffic::selection::SelectedZone;
use traffic::zone::ZoneCatalogue;
use traffic::{RepaintRequested, ViewGeneration};

use crate::camera::MapViewport;

/// Half-extent of the fallback envelope around a zone centroid (or the map
/// center when the zone has no coordinates).
pub const FALLBACK_HALF_DEG: f64 = 0.05;

/// Flow-line opacity for live/historical rendering.
pub const FLOW_LINE_OPACITY: f32 = 0.9;

/// Reduced flow-line opacity signaling "projected" simulation data.
pub const SIMULATION_FLOW_OPACITY: f32 = 0.7;

/// Heatmap intensity floor/ceiling.
const MIN_HEAT_INTENSITY: f32 = 0.1;
const MAX_HEAT_INTENSITY: f32 = 1.0;

/// Offset of the first synthetic incident from the zone center (stays
/// within 0.02° of it).
const NEAR_CENTER_OFFSET: (f64, f64) = (0.008, -0.006);

/// Relative position of the second synthetic incident inside the bounds.
const SECOND_INCIDENT_FRACTIONS: (f64, f64) = (0.25, 0.7);

const RENDER_RNG_SEED: u64 = 42;

// ---------------------------------------------------------------------------
// Renderable primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HeatPoint {
    pub location: GeoPoint,
    pub intensity: f32,
}

#[derive(Debug, Clone)]
pub struct FlowLine {
    pub path: Vec<GeoPoint>,
    pub band: CongestionBand,
    pub opacity: f32,
    /// Compass heading of the flow, for the direction glyph.
    pub heading_degrees: f32,
}

#[derive(Debug, Clone)]
pub struct SpeedLabel {
    pub location: GeoPoint,
    pub speed_kmh: i32,
}

/// The overlay layer set for the currently displayed zone. Cleared and
/// rebuilt wholesale on every repaint; never incrementally updated.
#[derive(Resource, Default)]
pub struct OverlayLayers {
    pub heat: Vec<HeatPoint>,
    pub flow: Vec<FlowLine>,
    pub speeds: Vec<SpeedLabel>,
    pub incidents: Vec<TrafficIncident>,
    pub contextual: Vec<crate::contextual::ContextualKind>,
    pub bounds: Option<GeoBounds>,
    pub source: Option<DataSource>,
    pub average_speed_kmh: f32,
    pub congestion_level: u8,
}

impl OverlayLayers {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Deterministic RNG for synthetic overlay geometry. Seeded once so reruns
/// of the same view produce the same inflated segment paths.
#[derive(Resource)]
pub struct RenderRng(pub ChaCha8Rng);

impl Default for RenderRng {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(RENDER_RNG_SEED))
    }
}

// ---------------------------------------------------------------------------
// Fetch plumbing
// ---------------------------------------------------------------------------

/// Mode-independent bundle handed from the fetch task to the pipeline.
pub struct OverlayData {
    pub segments: Vec<TrafficSegment>,
    pub incidents: Vec<TrafficIncident>,
    pub average_speed_kmh: f32,
    pub congestion_level: u8,
    pub source: DataSource,
}

impl From<TrafficSnapshot> for OverlayData {
    fn from(snapshot: TrafficSnapshot) -> Self {
        Self {
            segments: snapshot.segments,
            incidents: snapshot.incidents,
            average_speed_kmh: snapshot.average_speed_kmh,
            congestion_level: snapshot.congestion_level,
            source: snapshot.source,
        }
    }
}

impl From<HistoricalPattern> for OverlayData {
    fn from(pattern: HistoricalPattern) -> Self {
        Self {
            segments: pattern.segments,
            incidents: pattern.incidents,
            average_speed_kmh: pattern.average_speed_kmh,
            congestion_level: pattern.congestion_level,
            source: pattern.source,
        }
    }
}

/// In-flight overlay fetch, tagged with the generation it was issued under.
#[derive(Component)]
pub struct OverlayFetchTask {
    pub generation: u64,
    pub(crate) mode: DisplayMode,
    pub(crate) bounds: GeoBounds,
    pub(crate) zone_center: Option<GeoPoint>,
    pub(crate) task: Task<OverlayData>,
}

/// Wall-clock context the contextual overlays are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct RenderInstant {
    pub weekday: Weekday,
    pub hour: u8,
    pub month0: u32,
}

// ---------------------------------------------------------------------------
// Pipeline (pure)
// ---------------------------------------------------------------------------

/// Resolve the rendered envelope: explicit well-formed bbox parameter, else
/// cached zone bounds, else a fallback box around the zone centroid (or the
/// map center when the zone has no coordinates).
pub fn resolve_bounds(
    explicit: Option<&str>,
    cached: Option<GeoBounds>,
    zone_center: Option<GeoPoint>,
    map_center: GeoPoint,
) -> GeoBounds {
    if let Some(parsed) = explicit.and_then(GeoBounds::parse_bbox) {
        return parsed;
    }
    if let Some(bounds) = cached {
        return bounds;
    }
    GeoBounds::around(zone_center.unwrap_or(map_center), FALLBACK_HALF_DEG)
}

/// Give every degenerate segment (fewer than 2 path points) a synthetic
/// 2-point path strictly inside the bounds, so every segment is drawable.
pub fn inflate_segments(
    segments: &mut [TrafficSegment],
    bounds: &GeoBounds,
    rng: &mut ChaCha8Rng,
) {
    for segment in segments.iter_mut() {
        if segment.path.len() < 2 {
            segment.path = vec![bounds.random_interior(rng), bounds.random_interior(rng)];
        }
    }
}

/// Exactly two synthetic incidents: one near the zone center, one at a
/// fixed relative offset inside the bounds.
pub fn synthesize_incidents(center: GeoPoint, bounds: &GeoBounds) -> Vec<TrafficIncident> {
    vec![
        TrafficIncident {
            id: "synthetic-1".to_string(),
            kind: IncidentKind::Accident,
            description: "Slow traffic reported near the zone center".to_string(),
            severity: IncidentSeverity::Medium,
            location: GeoPoint::new(
                center.lat + NEAR_CENTER_OFFSET.0,
                center.lon + NEAR_CENTER_OFFSET.1,
            ),
            window: None,
        },
        TrafficIncident {
            id: "synthetic-2".to_string(),
            kind: IncidentKind::Roadworks,
            description: "Scheduled roadworks".to_string(),
            severity: IncidentSeverity::Low,
            location: bounds
                .interior_point(SECOND_INCIDENT_FRACTIONS.0, SECOND_INCIDENT_FRACTIONS.1),
            window: None,
        },
    ]
}

/// Convert a fetched data bundle into the full overlay layer set.
pub fn build_layers(
    mut data: OverlayData,
    mode: DisplayMode,
    bounds: GeoBounds,
    zone_center: GeoPoint,
    at: RenderInstant,
    rng: &mut ChaCha8Rng,
) -> OverlayLayers {
    inflate_segments(&mut data.segments, &bounds, rng);

    let mut layers = OverlayLayers {
        bounds: Some(bounds),
        source: Some(data.source),
        average_speed_kmh: data.average_speed_kmh,
        congestion_level: data.congestion_level,
        ..Default::default()
    };

    let opacity = if mode == DisplayMode::Simulation {
        SIMULATION_FLOW_OPACITY
    } else {
        FLOW_LINE_OPACITY
    };

    for segment in &data.segments {
        let intensity = (f32::from(segment.congestion_level) / 100.0)
            .clamp(MIN_HEAT_INTENSITY, MAX_HEAT_INTENSITY);
        for point in &segment.path {
            layers.heat.push(HeatPoint {
                location: *point,
                intensity,
            });
        }

        layers.flow.push(FlowLine {
            path: segment.path.clone(),
            band: flow_band(segment.congestion_level),
            opacity,
            heading_degrees: segment.direction.heading_degrees(),
        });

        let midpoint = segment.path[segment.path.len() / 2];
        layers.speeds.push(SpeedLabel {
            location: midpoint,
            speed_kmh: segment.speed_kmh.round() as i32,
        });
    }

    layers.incidents = if data.incidents.is_empty() {
        synthesize_incidents(zone_center, &bounds)
    } else {
        data.incidents
    };

    if mode == DisplayMode::Historical {
        layers.contextual = crate::contextual::active_contextual(at.weekday, at.hour, at.month0);
    }

    layers
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Update: service the newest repaint request of the frame by spawning a
/// provider fetch task. With no zone selected the overlay is simply blank.
#[allow(clippy::too_many_arguments)]
pub fn queue_overlay_repaints(
    mut commands: Commands,
    lifecycle: Res<ViewLifecycle>,
    mut repaints: EventReader<RepaintRequested>,
    selected: Res<SelectedZone>,
    catalogue: Res<ZoneCatalogue>,
    bounds_cache: Res<BoundsCache>,
    mode: Res<ModeState>,
    clock: Res<ViewClock>,
    provider: Res<ProviderHandle>,
    viewport: Res<MapViewport>,
    generation: Res<ViewGeneration>,
    mut layers: ResMut<OverlayLayers>,
) {
    let Some(request) = repaints.read().last().cloned() else {
        return;
    };
    if lifecycle.disposed {
        return;
    }
    let Some(zone_id) = selected.0.clone() else {
        layers.clear();
        return;
    };

    let zone_center = catalogue.get(&zone_id).and_then(|z| z.centroid);
    let bounds = resolve_bounds(
        request.bbox.as_deref(),
        bounds_cache.0.get(&zone_id).copied(),
        zone_center,
        viewport.center,
    );
    let mode_now = mode.effective;
    let timestamp = clock.timestamp();
    let area = format!(
        "{:.4},{:.4},{:.4},{:.4}",
        bounds.min_lat, bounds.min_lon, bounds.max_lat, bounds.max_lon
    );

    let provider = Arc::clone(&provider.0);
    let task = IoTaskPool::get().spawn(async move {
        let mut data = match mode_now {
            DisplayMode::Live => OverlayData::from(provider.live_snapshot(&zone_id)),
            DisplayMode::Historical | DisplayMode::Simulation => {
                OverlayData::from(provider.historical_pattern(&zone_id, timestamp))
            }
        };
        // The bundle's own incidents win; the area endpoint is the backup
        // (and falls back to empty, leaving synthesis to the pipeline).
        if data.incidents.is_empty() {
            data.incidents = provider.incidents(&area);
        }
        data
    });

    commands.spawn(OverlayFetchTask {
        generation: generation.current(),
        mode: mode_now,
        bounds,
        zone_center,
        task,
    });
}

/// Update: apply completed fetches; stale generations are dropped.
pub fn collect_overlay_results(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut OverlayFetchTask)>,
    generation: Res<ViewGeneration>,
    clock: Res<ViewClock>,
    mut rng: ResMut<RenderRng>,
    mut layers: ResMut<OverlayLayers>,
) {
    for (entity, mut pending) in &mut tasks {
        let Some(data) = block_on(futures_lite::future::poll_once(&mut pending.task)) else {
            continue;
        };
        commands.entity(entity).despawn();
        if pending.generation != generation.current() {
            debug!(
                "dropping overlay result from generation {} (current {})",
                pending.generation,
                generation.current()
            );
            continue;
        }
        let at = RenderInstant {
            weekday: clock.weekday(),
            hour: clock.hour,
            month0: clock.month0(),
        };
        let center = pending.zone_center.unwrap_or_else(|| pending.bounds.center());
        *layers = build_layers(data, pending.mode, pending.bounds, center, at, &mut rng.0);
    }
}

/// Update: when the selected zone's boundary lands after the overlay was
/// already painted against fallback bounds, repaint against the real
/// envelope.
pub fn repaint_on_boundary_ready(
    mut ready: EventReader<BoundaryReady>,
    selected: Res<SelectedZone>,
    mut repaint: EventWriter<RepaintRequested>,
) {
    for BoundaryReady(zone_id) in ready.read() {
        if selected.0.as_ref() == Some(zone_id) {
            repaint.send(RepaintRequested::default());
        }
    }
}

/// Update: view disposal drops in-flight fetches and blanks the overlay.
pub fn clear_overlay_on_dispose(
    mut commands: Commands,
    mut events: EventReader<DisposeView>,
    tasks: Query<Entity, With<OverlayFetchTask>>,
    mut layers: ResMut<OverlayLayers>,
) {
    if events.is_empty() {
        return;
    }
    events.clear();
    for entity in &tasks {
        commands.entity(entity).despawn();
    }
    layers.clear();
}

pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OverlayLayers>()
            .init_resource::<RenderRng>()
            .init_resource::<MapViewport>()
            .add_systems(
                Update,
                (
                    repaint_on_boundary_ready,
                    queue_overlay_repaints,
                    collect_overlay_results,
                    clear_overlay_on_dispose,
                ),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(1)
    }

    fn weekday_noon() -> RenderInstant {
        RenderInstant {
            weekday: Weekday::Tue,
            hour: 10,
            month0: 2,
        }
    }

    fn sample_bounds() -> GeoBounds {
        GeoBounds::new(25.0, 55.0, 25.2, 55.3)
    }

    fn synthetic_data() -> OverlayData {
        OverlayData {
            segments: traffic::provider::synthetic_segments(25.0),
            incidents: Vec::new(),
            average_speed_kmh: 23.25,
            congestion_level: 75,
            source: DataSource::Synthetic,
        }
    }

    #[test]
    fn explicit_bbox_wins_over_cached_bounds() {
        let cached = sample_bounds();
        let resolved = resolve_bounds(
            Some("24.0,54.0,24.5,54.5"),
            Some(cached),
            None,
            GeoPoint::new(25.0, 55.0),
        );
        assert_eq!(resolved, GeoBounds::new(24.0, 54.0, 24.5, 54.5));
    }

    #[test]
    fn malformed_bbox_falls_back_to_cached() {
        let cached = sample_bounds();
        let resolved = resolve_bounds(
            Some("garbage"),
            Some(cached),
            None,
            GeoPoint::new(25.0, 55.0),
        );
        assert_eq!(resolved, cached);
    }

    #[test]
    fn missing_bounds_fall_back_to_centroid_box() {
        let centroid = GeoPoint::new(25.1, 55.1);
        let resolved = resolve_bounds(None, None, Some(centroid), GeoPoint::new(24.0, 54.0));
        assert_eq!(resolved, GeoBounds::around(centroid, FALLBACK_HALF_DEG));

        let map_center = GeoPoint::new(24.0, 54.0);
        let resolved = resolve_bounds(None, None, None, map_center);
        assert_eq!(resolved, GeoBounds::around(map_center, FALLBACK_HALF_DEG));
    }

    #[test]
    fn inflate_gives_every_segment_a_drawable_path() {
        let bounds = sample_bounds();
        let mut segments = traffic::provider::synthetic_segments(30.0);
        assert!(segments.iter().all(|s| s.path.is_empty()));

        inflate_segments(&mut segments, &bounds, &mut test_rng());
        for segment in &segments {
            assert_eq!(segment.path.len(), 2);
            for point in &segment.path {
                assert!(bounds.contains_strictly(point), "{point:?} outside bounds");
            }
        }
    }

    #[test]
    fn inflate_keeps_real_paths() {
        let bounds = sample_bounds();
        let mut segments = traffic::provider::synthetic_segments(30.0);
        let original = vec![GeoPoint::new(25.05, 55.05), GeoPoint::new(25.06, 55.07)];
        segments[0].path = original.clone();

        inflate_segments(&mut segments, &bounds, &mut test_rng());
        assert_eq!(segments[0].path, original);
    }

    #[test]
    fn heat_intensity_is_clamped() {
        let mut data = synthetic_data();
        data.segments[0].congestion_level = 3; // would be 0.03 unclamped
        data.segments[1].congestion_level = 100;
        let layers = build_layers(
            data,
            DisplayMode::Historical,
            sample_bounds(),
            GeoPoint::new(25.1, 55.15),
            weekday_noon(),
            &mut test_rng(),
        );
        assert!(!layers.heat.is_empty());
        for p in &layers.heat {
            assert!(p.intensity >= MIN_HEAT_INTENSITY && p.intensity <= MAX_HEAT_INTENSITY);
        }
    }

    #[test]
    fn speed_label_sits_at_floor_midpoint() {
        let mut data = synthetic_data();
        let path = vec![
            GeoPoint::new(25.01, 55.01),
            GeoPoint::new(25.02, 55.02),
            GeoPoint::new(25.03, 55.03),
            GeoPoint::new(25.04, 55.04),
        ];
        data.segments[0].path = path.clone();
        data.segments.truncate(1);
        let layers = build_layers(
            data,
            DisplayMode::Historical,
            sample_bounds(),
            GeoPoint::new(25.1, 55.15),
            weekday_noon(),
            &mut test_rng(),
        );
        // floor(4 / 2) = index 2
        assert_eq!(layers.speeds.len(), 1);
        assert_eq!(layers.speeds[0].location, path[2]);
        assert_eq!(layers.speeds[0].speed_kmh, 20);
    }

    #[test]
    fn empty_incidents_synthesize_exactly_two() {
        let center = GeoPoint::new(25.1, 55.15);
        let layers = build_layers(
            synthetic_data(),
            DisplayMode::Historical,
            sample_bounds(),
            center,
            weekday_noon(),
            &mut test_rng(),
        );
        assert_eq!(layers.incidents.len(), 2);
        assert!(
            layers.incidents[0].location.degree_distance(&center) <= 0.02,
            "first synthetic incident must sit near the zone center"
        );
        let bounds = sample_bounds();
        assert!(bounds.contains(&layers.incidents[1].location));
    }

    #[test]
    fn provider_incidents_are_kept_verbatim() {
        let mut data = synthetic_data();
        data.incidents = vec![TrafficIncident {
            id: "inc-9".to_string(),
            kind: IncidentKind::Closure,
            description: "Bridge closed".to_string(),
            severity: IncidentSeverity::High,
            location: GeoPoint::new(25.05, 55.1),
            window: None,
        }];
        let layers = build_layers(
            data,
            DisplayMode::Live,
            sample_bounds(),
            GeoPoint::new(25.1, 55.15),
            weekday_noon(),
            &mut test_rng(),
        );
        assert_eq!(layers.incidents.len(), 1);
        assert_eq!(layers.incidents[0].id, "inc-9");
    }

    #[test]
    fn simulation_mode_dims_flow_and_skips_contextual() {
        let layers = build_layers(
            synthetic_data(),
            DisplayMode::Simulation,
            sample_bounds(),
            GeoPoint::new(25.1, 55.15),
            // Friday noon would trigger the prayer overlay in historical.
            RenderInstant {
                weekday: Weekday::Fri,
                hour: 12,
                month0: 7,
            },
            &mut test_rng(),
        );
        assert!(layers.flow.iter().all(|f| f.opacity == SIMULATION_FLOW_OPACITY));
        assert!(layers.contextual.is_empty());
    }

    #[test]
    fn historical_mode_applies_contextual_overlays() {
        let layers = build_layers(
            synthetic_data(),
            DisplayMode::Historical,
            sample_bounds(),
            GeoPoint::new(25.1, 55.15),
            RenderInstant {
                weekday: Weekday::Fri,
                hour: 12,
                month0: 7,
            },
            &mut test_rng(),
        );
        assert!(layers.flow.iter().all(|f| f.opacity == FLOW_LINE_OPACITY));
        assert!(layers
            .contextual
            .contains(&crate::contextual::ContextualKind::PrayerTime));
        assert!(layers
            .contextual
            .contains(&crate::contextual::ContextualKind::ConstructionSeason));
    }

    #[test]
    fn flow_band_colors_follow_congestion() {
        let layers = build_layers(
            synthetic_data(),
            DisplayMode::Live,
            sample_bounds(),
            GeoPoint::new(25.1, 55.15),
            weekday_noon(),
            &mut test_rng(),
        );
        // Canonical congestion levels: 60, 40, 30, 70.
        let bands: Vec<CongestionBand> = layers.flow.iter().map(|f| f.band).collect();
        assert_eq!(
            bands,
            vec![
                CongestionBand::Amber,
                CongestionBand::Amber,
                CongestionBand::Green,
                CongestionBand::Red,
            ]
        );
    }
}

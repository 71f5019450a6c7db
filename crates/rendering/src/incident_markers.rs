//! Incident marker layer: severity-styled pins with a click-to-open popup.
//!
//! Markers are drawn from the overlay layer set; clicking near one stores
//! it in [`ActiveIncidentPopup`], which the UI crate renders as a window
//! with the incident's type and description.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use traffic::geo::GeoPoint;
use traffic::provider::{IncidentSeverity, TrafficIncident};

use crate::camera::{geo_to_world, world_to_geo};
use crate::overlay::OverlayLayers;

const MARKER_RADIUS: f32 = 10.0;

/// Click tolerance in degrees (roughly a marker radius at zone zoom).
const CLICK_TOLERANCE_DEG: f64 = 0.01;

pub fn severity_color(severity: IncidentSeverity) -> Color {
    match severity {
        IncidentSeverity::Low => Color::srgb(0.93, 0.80, 0.25),
        IncidentSeverity::Medium => Color::srgb(0.95, 0.55, 0.10),
        IncidentSeverity::High => Color::srgb(0.85, 0.12, 0.10),
    }
}

/// The incident whose popup is open, if any.
#[derive(Resource, Default)]
pub struct ActiveIncidentPopup(pub Option<TrafficIncident>);

/// Nearest incident within `tolerance_deg` of a point.
pub fn incident_at(
    incidents: &[TrafficIncident],
    point: GeoPoint,
    tolerance_deg: f64,
) -> Option<&TrafficIncident> {
    incidents
        .iter()
        .map(|incident| (incident, incident.location.degree_distance(&point)))
        .filter(|(_, distance)| *distance <= tolerance_deg)
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(incident, _)| incident)
}

pub fn draw_incident_markers(layers: Res<OverlayLayers>, mut gizmos: Gizmos) {
    for incident in &layers.incidents {
        let center = geo_to_world(&incident.location);
        let color = severity_color(incident.severity);
        gizmos.circle_2d(center, MARKER_RADIUS, color);
        gizmos.circle_2d(center, MARKER_RADIUS * 0.35, color);
        if incident.severity == IncidentSeverity::High {
            gizmos.circle_2d(center, MARKER_RADIUS * 1.6, color.with_alpha(0.5));
        }
    }
}

/// System: left-click hit testing against the marker layer.
pub fn handle_incident_clicks(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
    layers: Res<OverlayLayers>,
    mut popup: ResMut<ActiveIncidentPopup>,
) {
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.get_single() else {
        return;
    };
    let Ok(world) = camera.viewport_to_world_2d(camera_transform, cursor) else {
        return;
    };
    let clicked = world_to_geo(world);
    popup.0 = incident_at(&layers.incidents, clicked, CLICK_TOLERANCE_DEG).cloned();
}

pub struct IncidentMarkersPlugin;

impl Plugin for IncidentMarkersPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveIncidentPopup>()
            .add_systems(Update, (draw_incident_markers, handle_incident_clicks));
    }
}

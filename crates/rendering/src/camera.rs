//! Map viewport: a geographic center plus a web-map style zoom level,
//! projected onto a top-down 2D camera.
//!
//! The projection is a plain equirectangular scale (degrees to world
//! units), which is plenty at emirate scale and keeps every conversion
//! trivially invertible for hit testing.

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

use traffic::geo::GeoPoint;
use traffic::selection::ZoneSelected;
use traffic::zone::{EmirateFilter, EmirateFilterApplied, ZoneCatalogue};

/// World units per degree of latitude/longitude.
pub const WORLD_UNITS_PER_DEGREE: f32 = 1000.0;

/// Zoom applied when the viewport recenters on a selected zone.
pub const SELECTED_ZONE_ZOOM: f32 = 11.0;

const MIN_ZOOM: f32 = 4.0;
const MAX_ZOOM: f32 = 16.0;

/// Orthographic scale at zoom 0; halves with every zoom level.
const ZOOM_SCALE_REF: f32 = 400.0;

/// Keyboard pan speed in screen pixels per second.
const PAN_SPEED: f32 = 420.0;

const ZOOM_STEP: f32 = 0.5;

pub fn geo_to_world(p: &GeoPoint) -> Vec2 {
    Vec2::new(
        p.lon as f32 * WORLD_UNITS_PER_DEGREE,
        p.lat as f32 * WORLD_UNITS_PER_DEGREE,
    )
}

pub fn world_to_geo(v: Vec2) -> GeoPoint {
    GeoPoint::new(
        f64::from(v.y / WORLD_UNITS_PER_DEGREE),
        f64::from(v.x / WORLD_UNITS_PER_DEGREE),
    )
}

/// Orthographic scale (world units per screen pixel) for a zoom level.
pub fn zoom_to_scale(zoom: f32) -> f32 {
    ZOOM_SCALE_REF / 2f32.powf(zoom.clamp(MIN_ZOOM, MAX_ZOOM))
}

/// The map viewport. Defaults to the country-wide view.
#[derive(Resource)]
pub struct MapViewport {
    pub center: GeoPoint,
    pub zoom: f32,
}

impl Default for MapViewport {
    fn default() -> Self {
        let (center, zoom) = EmirateFilter::All.map_view();
        Self { center, zoom }
    }
}

impl MapViewport {
    pub fn set_view(&mut self, center: GeoPoint, zoom: f32) {
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

pub fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// System: push the viewport state onto the actual camera each frame.
pub fn apply_viewport(
    viewport: Res<MapViewport>,
    mut query: Query<(&mut Transform, &mut OrthographicProjection), With<Camera2d>>,
) {
    if !viewport.is_changed() {
        return;
    }
    let Ok((mut transform, mut projection)) = query.get_single_mut() else {
        return;
    };
    let center = geo_to_world(&viewport.center);
    transform.translation.x = center.x;
    transform.translation.y = center.y;
    projection.scale = zoom_to_scale(viewport.zoom);
}

/// System: recenter on the selected zone at the zone zoom level. Zones
/// without coordinates keep the current view.
pub fn recenter_on_selected_zone(
    mut selections: EventReader<ZoneSelected>,
    catalogue: Res<ZoneCatalogue>,
    mut viewport: ResMut<MapViewport>,
) {
    let Some(ZoneSelected(id)) = selections.read().last() else {
        return;
    };
    if let Some(centroid) = catalogue.get(id).and_then(|z| z.centroid) {
        viewport.set_view(centroid, SELECTED_ZONE_ZOOM);
    }
}

/// System: jump to the per-emirate preset when the filter changes.
pub fn apply_emirate_view(
    mut filters: EventReader<EmirateFilterApplied>,
    mut viewport: ResMut<MapViewport>,
) {
    let Some(EmirateFilterApplied(filter)) = filters.read().last() else {
        return;
    };
    let (center, zoom) = filter.map_view();
    viewport.set_view(center, zoom);
}

/// WASD/arrow keys: pan the viewport, scaled so a keypress moves the same
/// number of screen pixels at any zoom.
pub fn camera_pan_keyboard(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut viewport: ResMut<MapViewport>,
) {
    let mut dir = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) || keys.pressed(KeyCode::ArrowUp) {
        dir.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) || keys.pressed(KeyCode::ArrowDown) {
        dir.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft) {
        dir.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight) {
        dir.x += 1.0;
    }
    if dir == Vec2::ZERO {
        return;
    }
    let degrees_per_sec =
        PAN_SPEED * zoom_to_scale(viewport.zoom) / WORLD_UNITS_PER_DEGREE * time.delta_secs();
    let dir = dir.normalize();
    viewport.center.lat += f64::from(dir.y * degrees_per_sec);
    viewport.center.lon += f64::from(dir.x * degrees_per_sec);
}

/// Mouse wheel: zoom in/out around the current center.
pub fn camera_zoom_wheel(mut wheel: EventReader<MouseWheel>, mut viewport: ResMut<MapViewport>) {
    let mut delta = 0.0;
    for event in wheel.read() {
        delta += match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / 20.0,
        };
    }
    if delta != 0.0 {
        let zoom = viewport.zoom + delta * ZOOM_STEP;
        let center = viewport.center;
        viewport.set_view(center, zoom);
    }
}

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MapViewport>()
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (
                    recenter_on_selected_zone,
                    apply_emirate_view,
                    camera_pan_keyboard,
                    camera_zoom_wheel,
                    apply_viewport,
                ),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_scale_halves_per_level() {
        let s10 = zoom_to_scale(10.0);
        let s11 = zoom_to_scale(11.0);
        assert!((s10 / s11 - 2.0).abs() < 1e-5);
    }

    #[test]
    fn zoom_scale_clamps_extremes() {
        assert_eq!(zoom_to_scale(0.0), zoom_to_scale(MIN_ZOOM));
        assert_eq!(zoom_to_scale(99.0), zoom_to_scale(MAX_ZOOM));
    }

    #[test]
    fn geo_world_round_trip() {
        let p = GeoPoint::new(25.2048, 55.2708);
        let back = world_to_geo(geo_to_world(&p));
        assert!((back.lat - p.lat).abs() < 1e-4);
        assert!((back.lon - p.lon).abs() < 1e-4);
    }

    #[test]
    fn set_view_clamps_zoom() {
        let mut viewport = MapViewport::default();
        viewport.set_view(GeoPoint::new(25.0, 55.0), 99.0);
        assert_eq!(viewport.zoom, MAX_ZOOM);
        viewport.set_view(GeoPoint::new(25.0, 55.0), -3.0);
        assert_eq!(viewport.zoom, MIN_ZOOM);
    }

    #[test]
    fn default_viewport_is_country_wide() {
        let viewport = MapViewport::default();
        assert!(viewport.zoom < 8.0);
        assert!(viewport.center.lat > 22.0 && viewport.center.lat < 27.0);
    }
}

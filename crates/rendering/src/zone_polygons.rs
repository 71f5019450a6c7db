//! Per-zone boundary polygons, colored by the congestion heuristic.
//!
//! Each polygon becomes drawable the moment its boundary fetch lands in the
//! cache — zones appear one by one, in whatever order their fetches
//! resolve, and a zone whose fetch failed simply never shows up.

use bevy::prelude::*;

use traffic::boundary::BoundaryCache;
use traffic::clock::ViewClock;
use traffic::congestion::{estimate_congestion, zone_band, CongestionBand};
use traffic::selection::SelectedZone;
use traffic::zone::ZoneCatalogue;

use crate::camera::geo_to_world;

const SELECTION_RING_RADIUS: f32 = 26.0;

/// Polygon color for a congestion band.
pub fn zone_band_color(band: CongestionBand) -> Color {
    match band {
        CongestionBand::Green => Color::srgb(0.20, 0.72, 0.30),
        CongestionBand::Amber => Color::srgb(0.95, 0.69, 0.13),
        CongestionBand::Red => Color::srgb(0.82, 0.13, 0.11),
    }
}

pub fn draw_zone_polygons(
    catalogue: Res<ZoneCatalogue>,
    boundaries: Res<BoundaryCache>,
    clock: Res<ViewClock>,
    selected: Res<SelectedZone>,
    mut gizmos: Gizmos,
) {
    for zone in &catalogue.zones {
        let Some(boundary) = boundaries.0.get(&zone.id) else {
            // Boundary not fetched (yet, or ever) — nothing to draw.
            continue;
        };
        let level = estimate_congestion(zone.kind, clock.hour, &zone.name);
        let color = zone_band_color(zone_band(level));

        let mut ring: Vec<Vec2> = boundary.exterior.iter().map(geo_to_world).collect();
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
        gizmos.linestrip_2d(ring, color);

        if selected.0.as_ref() == Some(&zone.id) {
            if let Some(centroid) = zone.centroid {
                gizmos.circle_2d(geo_to_world(&centroid), SELECTION_RING_RADIUS, Color::WHITE);
            }
        }
    }
}

pub struct ZonePolygonsPlugin;

impl Plugin for ZonePolygonsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, draw_zone_polygons);
    }
}

//! Heatmap layer: one translucent disc per segment path point, colored by
//! congestion intensity on the inferno ramp.

use bevy::prelude::*;

use crate::camera::geo_to_world;
use crate::color_ramps::INFERNO;
use crate::overlay::OverlayLayers;

/// Disc radius in world units at full intensity.
const HEAT_RADIUS: f32 = 14.0;

const HEAT_ALPHA: f32 = 0.55;

/// Ramp color for a heat intensity in `[0, 1]`.
pub fn heat_color(intensity: f32) -> Color {
    INFERNO.sample(intensity).with_alpha(HEAT_ALPHA)
}

pub fn draw_heatmap(layers: Res<OverlayLayers>, mut gizmos: Gizmos) {
    for point in &layers.heat {
        let radius = HEAT_RADIUS * (0.6 + 0.4 * point.intensity);
        gizmos.circle_2d(
            geo_to_world(&point.location),
            radius,
            heat_color(point.intensity),
        );
    }
}

pub struct HeatmapPlugin;

impl Plugin for HeatmapPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, draw_heatmap);
    }
}

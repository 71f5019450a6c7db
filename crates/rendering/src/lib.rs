use bevy::prelude::*;

pub mod camera;
pub mod color_ramps;
pub mod contextual;
pub mod flow_lines;
pub mod heatmap;
pub mod incident_markers;
pub mod overlay;
pub mod speed_labels;
pub mod zone_polygons;

#[cfg(test)]
mod integration_tests;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(camera::CameraPlugin)
            .add_plugins(overlay::OverlayPlugin)
            .add_plugins(zone_polygons::ZonePolygonsPlugin)
            .add_plugins(heatmap::HeatmapPlugin)
            .add_plugins(flow_lines::FlowLinesPlugin)
            .add_plugins(speed_labels::SpeedLabelsPlugin)
            .add_plugins(incident_markers::IncidentMarkersPlugin)
            .add_plugins(contextual::ContextualOverlayPlugin);
    }
}

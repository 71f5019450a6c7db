//! Speed label layer: one `Text2d` entity per segment, synced to the
//! overlay layer set (despawn-all-respawn on change, never diffed).

use bevy::prelude::*;

use crate::camera::geo_to_world;
use crate::overlay::OverlayLayers;

const LABEL_FONT_SIZE: f32 = 14.0;
const LABEL_Z: f32 = 5.0;

#[derive(Component)]
pub struct SpeedLabelMarker;

/// System: rebuild the label entities whenever the layer set changes.
pub fn sync_speed_labels(
    mut commands: Commands,
    layers: Res<OverlayLayers>,
    existing: Query<Entity, With<SpeedLabelMarker>>,
) {
    if !layers.is_changed() {
        return;
    }
    for entity in &existing {
        commands.entity(entity).despawn();
    }
    for label in &layers.speeds {
        commands.spawn((
            SpeedLabelMarker,
            Text2d::new(format!("{} km/h", label.speed_kmh)),
            TextFont {
                font_size: LABEL_FONT_SIZE,
                ..default()
            },
            TextColor(Color::WHITE),
            Transform::from_translation(geo_to_world(&label.location).extend(LABEL_Z)),
        ));
    }
}

pub struct SpeedLabelsPlugin;

impl Plugin for SpeedLabelsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, sync_speed_labels);
    }
}

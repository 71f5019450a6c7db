//! Zone selection.
//!
//! Selection is the pivot of the whole view: the overlay renderer only
//! paints traffic for the selected zone, and the camera recenters on it
//! (the rendering crate listens to the same [`ZoneSelected`] events).

use bevy::prelude::*;

use crate::zone::ZoneId;
use crate::{RepaintRequested, ViewGeneration};

#[derive(Resource, Default)]
pub struct SelectedZone(pub Option<ZoneId>);

/// User clicked a zone (map polygon or list entry).
#[derive(Event, Clone)]
pub struct ZoneSelected(pub ZoneId);

/// Update: apply the newest selection (last value wins) and repaint.
pub fn apply_zone_selection(
    mut selections: EventReader<ZoneSelected>,
    mut selected: ResMut<SelectedZone>,
    mut generation: ResMut<ViewGeneration>,
    mut repaint: EventWriter<RepaintRequested>,
) {
    let Some(ZoneSelected(id)) = selections.read().last() else {
        return;
    };
    selected.0 = Some(id.clone());
    generation.bump();
    repaint.send(RepaintRequested::default());
}

pub struct SelectionPlugin;

impl Plugin for SelectionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SelectedZone>()
            .add_event::<ZoneSelected>()
            .add_systems(Update, apply_zone_selection);
    }
}

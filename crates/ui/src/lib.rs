use bevy::prelude::*;
use bevy_egui::EguiPlugin;

pub mod control_panel;
pub mod incident_popup;
pub mod zone_list;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<control_panel::LastLoadError>()
            .add_systems(
                Update,
                (
                    control_panel::record_load_errors,
                    control_panel::control_panel_ui,
                    zone_list::zone_list_ui,
                    incident_popup::incident_popup_ui,
                ),
            );
    }
}

//! Zone browser: the catalogue for the active filter, one row per zone,
//! click to select.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use traffic::clock::ViewClock;
use traffic::congestion::{estimate_congestion, zone_band};
use traffic::selection::{SelectedZone, ZoneSelected};
use traffic::zone::{Zone, ZoneCatalogue};

/// Row text: zone name plus its current congestion band.
pub fn zone_row_label(zone: &Zone, hour: u8) -> String {
    let level = estimate_congestion(zone.kind, hour, &zone.name);
    format!("{} — {}", zone.name, zone_band(level).label())
}

pub fn zone_list_ui(
    mut contexts: EguiContexts,
    catalogue: Res<ZoneCatalogue>,
    selected: Res<SelectedZone>,
    clock: Res<ViewClock>,
    mut selections: EventWriter<ZoneSelected>,
) {
    egui::SidePanel::left("zone-list")
        .default_width(220.0)
        .show(contexts.ctx_mut(), |ui| {
            ui.heading("Zones");
            if catalogue.is_empty() {
                ui.label("Loading zones...");
                return;
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                for zone in &catalogue.zones {
                    let is_selected = selected.0.as_ref() == Some(&zone.id);
                    let label = zone_row_label(zone, clock.hour);
                    if ui.selectable_label(is_selected, label).clicked() {
                        selections.send(ZoneSelected(zone.id.clone()));
                    }
                }
            });
        });
}

//! Traffic controls panel.
//!
//! One egui window carrying the mode switch, the time scrub + animation
//! controls, the emirate filter, the manual reload button, the selected
//! zone summary, and the overlay data-source badge. Only foreground reload
//! failures surface here; background ones never reach the panel.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use rendering::overlay::OverlayLayers;
use traffic::clock::{TimeScrubbed, ViewClock, DEFAULT_CADENCE_TICKS};
use traffic::congestion::{estimate_congestion, zone_band};
use traffic::mode::{DisplayMode, ModeState, SetMode, MODE_CHOICES};
use traffic::provider::ProviderHandle;
use traffic::selection::SelectedZone;
use traffic::zone::{
    ActiveEmirateFilter, EmirateFilter, EmirateFilterApplied, ManualReloadRequested,
    ZoneCatalogue, ZoneLoadFailed, ALL_EMIRATES,
};

/// Fast animation cadence: 5 ticks = 0.5 s per hour step.
pub const FAST_CADENCE_TICKS: u32 = 5;

/// Most recent foreground reload failure, if any.
#[derive(Resource, Default)]
pub struct LastLoadError(pub Option<String>);

/// System: remember foreground reload failures for display.
pub fn record_load_errors(
    mut failures: EventReader<ZoneLoadFailed>,
    mut last: ResMut<LastLoadError>,
) {
    if let Some(failure) = failures.read().last() {
        last.0 = Some(failure.message.clone());
    }
}

#[allow(clippy::too_many_arguments)]
pub fn control_panel_ui(
    mut contexts: EguiContexts,
    mode: Res<ModeState>,
    provider: Res<ProviderHandle>,
    mut clock: ResMut<ViewClock>,
    filter: Res<ActiveEmirateFilter>,
    selected: Res<SelectedZone>,
    catalogue: Res<ZoneCatalogue>,
    layers: Res<OverlayLayers>,
    last_error: Res<LastLoadError>,
    mut set_mode: EventWriter<SetMode>,
    mut scrub: EventWriter<TimeScrubbed>,
    mut filters: EventWriter<EmirateFilterApplied>,
    mut reload: EventWriter<ManualReloadRequested>,
) {
    egui::Window::new("Traffic Controls")
        .default_width(280.0)
        .show(contexts.ctx_mut(), |ui| {
            ui.spacing_mut().item_spacing.y = 6.0;

            // --- Display mode ---
            ui.label("Display mode:");
            ui.horizontal(|ui| {
                for choice in MODE_CHOICES {
                    let label =
                        if choice == DisplayMode::Live && !provider.0.is_live_available() {
                            "Live (offline)".to_string()
                        } else {
                            choice.label().to_string()
                        };
                    if ui.selectable_label(mode.effective == choice, label).clicked() {
                        set_mode.send(SetMode(choice));
                    }
                }
            });

            ui.separator();

            // --- Time of day ---
            ui.label(format!("Time of day — {}", clock.formatted()));
            let mut hour = i32::from(clock.hour);
            let response = ui.add(
                egui::Slider::new(&mut hour, 0..=23)
                    .custom_formatter(|v, _| format!("{:02}:00", v as i64)),
            );
            if response.changed() {
                scrub.send(TimeScrubbed(hour as u8));
            }
            ui.horizontal(|ui| {
                let toggle = if clock.animating { "Pause" } else { "Animate" };
                if ui.button(toggle).clicked() {
                    clock.animating = !clock.animating;
                }
                if ui
                    .selectable_label(clock.cadence_ticks == DEFAULT_CADENCE_TICKS, "Normal")
                    .clicked()
                {
                    clock.cadence_ticks = DEFAULT_CADENCE_TICKS;
                }
                if ui
                    .selectable_label(clock.cadence_ticks == FAST_CADENCE_TICKS, "Fast")
                    .clicked()
                {
                    clock.cadence_ticks = FAST_CADENCE_TICKS;
                }
            });

            ui.separator();

            // --- Emirate filter + reload ---
            ui.label("Emirate:");
            egui::ComboBox::from_id_salt("emirate-filter")
                .selected_text(filter.0.label())
                .show_ui(ui, |ui| {
                    if ui
                        .selectable_label(filter.0 == EmirateFilter::All, "All")
                        .clicked()
                    {
                        filters.send(EmirateFilterApplied(EmirateFilter::All));
                    }
                    for emirate in ALL_EMIRATES {
                        let active = filter.0 == EmirateFilter::Only(emirate);
                        if ui.selectable_label(active, emirate.label()).clicked() {
                            filters.send(EmirateFilterApplied(EmirateFilter::Only(emirate)));
                        }
                    }
                });
            if ui.button("Reload zones").clicked() {
                reload.send(ManualReloadRequested);
            }
            if let Some(message) = &last_error.0 {
                ui.colored_label(egui::Color32::from_rgb(220, 80, 60), message);
            }

            ui.separator();

            // --- Selected zone ---
            match selected.0.as_ref().and_then(|id| catalogue.get(id)) {
                Some(zone) => {
                    ui.heading(&zone.name);
                    ui.label(format!("{} — {}", zone.emirate.label(), zone.kind.label()));
                    ui.label(format!(
                        "Base rate: AED {:.2} (peak ×{:.1})",
                        zone.base_rate_aed, zone.peak_multiplier
                    ));
                    let level = estimate_congestion(zone.kind, clock.hour, &zone.name);
                    ui.label(format!(
                        "Estimated congestion: {} ({})",
                        level,
                        zone_band(level).label()
                    ));
                }
                None => {
                    ui.label("No zone selected");
                }
            }

            // --- Overlay status ---
            if let Some(source) = layers.source {
                ui.separator();
                ui.label(format!(
                    "{} — avg {:.0} km/h, {}% congestion",
                    source.label(),
                    layers.average_speed_kmh,
                    layers.congestion_level
                ));
                for kind in &layers.contextual {
                    ui.label(format!("• {}", kind.label()));
                }
            }
        });
}

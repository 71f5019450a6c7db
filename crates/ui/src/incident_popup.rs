//! Popup window for the incident marker the user clicked.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use rendering::incident_markers::ActiveIncidentPopup;

pub fn incident_popup_ui(mut contexts: EguiContexts, mut popup: ResMut<ActiveIncidentPopup>) {
    let Some(incident) = popup.0.clone() else {
        return;
    };
    let mut open = true;
    egui::Window::new(incident.kind.label())
        .open(&mut open)
        .resizable(false)
        .show(contexts.ctx_mut(), |ui| {
            ui.label(format!("Severity: {}", incident.severity.label()));
            ui.label(&incident.description);
            if let Some((start, end)) = incident.window {
                ui.label(format!(
                    "Window: {} - {}",
                    start.format("%H:%M"),
                    end.format("%H:%M")
                ));
            }
            ui.small(format!(
                "({:.4}, {:.4})",
                incident.location.lat, incident.location.lon
            ));
        });
    if !open {
        popup.0 = None;
    }
}

use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;
use bevy::window::PresentMode;
use bevy::winit::{UpdateMode, WinitSettings};

use traffic::provider::{
    HttpTrafficBackend, OfflineBackend, ProviderHandle, TrafficDataProvider, ENV_LIVE_UNAVAILABLE,
};

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "ZoneView".to_string(),
            resolution: (1280.0, 720.0).into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }))
    .insert_resource(WinitSettings {
        focused_mode: UpdateMode::reactive_low_power(Duration::from_millis(16)),
        unfocused_mode: UpdateMode::reactive_low_power(Duration::from_millis(100)),
    });

    // Wire the traffic feed from the environment. Without a configured URL
    // the dashboard runs entirely on synthetic data, which is a supported
    // mode, not an error.
    let live_available = std::env::var(ENV_LIVE_UNAVAILABLE).is_err();
    let provider = match HttpTrafficBackend::from_env() {
        Some(backend) => TrafficDataProvider::new(Arc::new(backend), live_available),
        None => TrafficDataProvider::new(Arc::new(OfflineBackend), live_available),
    };
    app.insert_resource(ProviderHandle(Arc::new(provider)));

    app.add_plugins((
        traffic::TrafficPlugin,
        rendering::RenderingPlugin,
        ui::UiPlugin,
    ));

    app.run();
}

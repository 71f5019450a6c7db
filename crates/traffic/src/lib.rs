use bevy::prelude::*;

pub mod boundary;
pub mod clock;
pub mod congestion;
pub mod geo;
pub mod lifecycle;
pub mod mode;
pub mod provider;
pub mod selection;
pub mod zone;

#[cfg(test)]
pub mod test_harness;

/// Fixed-update rate that every periodic counter in the engine is expressed
/// against: 10 ticks per second.
pub const TICK_HZ: f64 = 10.0;

/// Monotonic render generation.
///
/// Bumped whenever the viewing context changes (zone selection, display mode,
/// time index, disposal). In-flight overlay fetches carry the generation they
/// were issued under; results from a stale generation are dropped instead of
/// repainting over newer state.
#[derive(Resource, Default)]
pub struct ViewGeneration(pub u64);

impl ViewGeneration {
    pub fn bump(&mut self) {
        self.0 += 1;
    }

    pub fn current(&self) -> u64 {
        self.0
    }
}

/// Request a full repaint of the overlay layer set for the current zone,
/// mode, and time.
///
/// Repaints are coalesced per frame: when several requests land in the same
/// frame only the newest is serviced (last value wins). `bbox` optionally
/// overrides the rendered envelope with an explicit "lat,lon,lat,lon" box;
/// malformed strings are ignored downstream.
#[derive(Event, Default, Clone)]
pub struct RepaintRequested {
    pub bbox: Option<String>,
}

pub struct TrafficPlugin;

impl Plugin for TrafficPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
            .init_resource::<ViewGeneration>()
            .add_event::<RepaintRequested>();

        // Feature plugins. Data flow: zones feed boundaries, the provider
        // feeds the overlay renderer (crates/rendering), mode/clock/selection
        // drive repaints, lifecycle tears everything down.
        app.add_plugins(provider::ProviderPlugin);
        app.add_plugins(zone::ZonesPlugin);
        app.add_plugins(boundary::BoundaryPlugin);
        app.add_plugins(mode::ModePlugin);
        app.add_plugins(clock::ClockPlugin);
        app.add_plugins(selection::SelectionPlugin);
        app.add_plugins(lifecycle::LifecyclePlugin);
    }
}

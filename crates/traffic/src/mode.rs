//! Display mode state machine.
//!
//! Exactly one mode is effective per zone view. Live mode owns the only
//! periodic refresh timer; switching away from it resets (cancels) that
//! timer before the next mode activates. Requesting live while the
//! provider reports the capability unavailable silently coerces the
//! effective mode to historical — no error is surfaced, the mode control
//! simply shows historical.

use bevy::prelude::*;

use crate::lifecycle::ViewLifecycle;
use crate::provider::ProviderHandle;
use crate::selection::SelectedZone;
use crate::{RepaintRequested, ViewGeneration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    Live,
    #[default]
    Historical,
    Simulation,
}

/// All modes, for UI iteration.
pub const MODE_CHOICES: [DisplayMode; 3] = [
    DisplayMode::Live,
    DisplayMode::Historical,
    DisplayMode::Simulation,
];

impl DisplayMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Historical => "Historical",
            Self::Simulation => "Simulation",
        }
    }
}

/// Requested vs effective mode. They differ only when live was requested
/// while unavailable.
#[derive(Resource, Default)]
pub struct ModeState {
    pub requested: DisplayMode,
    pub effective: DisplayMode,
}

/// Tick counter for the live refresh cadence.
#[derive(Resource, Default)]
pub struct LivePollTimer {
    pub counter: u32,
}

impl LivePollTimer {
    /// Re-render every 3000 ticks (5 minutes at 10 Hz) while live.
    pub const INTERVAL: u32 = 3000;
}

/// User picked a display mode.
#[derive(Event, Clone, Copy)]
pub struct SetMode(pub DisplayMode);

/// Update: apply the newest mode request (last value wins).
///
/// Entering live renders immediately; the poll counter then takes over.
/// Leaving live resets the counter so no further live fetches can fire.
pub fn apply_mode_requests(
    mut requests: EventReader<SetMode>,
    provider: Res<ProviderHandle>,
    mut mode: ResMut<ModeState>,
    mut poll: ResMut<LivePollTimer>,
    mut generation: ResMut<ViewGeneration>,
    mut repaint: EventWriter<RepaintRequested>,
) {
    let Some(SetMode(requested)) = requests.read().last().copied() else {
        return;
    };
    mode.requested = requested;
    mode.effective = if requested == DisplayMode::Live && !provider.0.is_live_available() {
        debug!("live mode requested but unavailable; degrading to historical");
        DisplayMode::Historical
    } else {
        requested
    };
    // Any switch tears down the previous mode's timer before the next mode
    // starts; entering live starts from a fresh interval.
    poll.counter = 0;
    generation.bump();
    repaint.send(RepaintRequested::default());
}

/// FixedUpdate: the live refresh loop. Only counts while the effective mode
/// is live and a zone is selected; everything else leaves the counter
/// untouched at zero.
pub fn tick_live_poll(
    lifecycle: Res<ViewLifecycle>,
    mode: Res<ModeState>,
    selected: Res<SelectedZone>,
    mut poll: ResMut<LivePollTimer>,
    mut repaint: EventWriter<RepaintRequested>,
) {
    if lifecycle.disposed || mode.effective != DisplayMode::Live || selected.0.is_none() {
        return;
    }
    poll.counter += 1;
    if poll.counter >= LivePollTimer::INTERVAL {
        poll.counter = 0;
        repaint.send(RepaintRequested::default());
    }
}

pub struct ModePlugin;

impl Plugin for ModePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModeState>()
            .init_resource::<LivePollTimer>()
            .add_event::<SetMode>()
            .add_systems(Update, apply_mode_requests)
            .add_systems(FixedUpdate, tick_live_poll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_labels_are_distinct() {
        for (i, a) in MODE_CHOICES.iter().enumerate() {
            for b in &MODE_CHOICES[i + 1..] {
                assert_ne!(a.label(), b.label());
            }
        }
    }

    #[test]
    fn default_mode_is_historical() {
        let state = ModeState::default();
        assert_eq!(state.requested, DisplayMode::Historical);
        assert_eq!(state.effective, DisplayMode::Historical);
    }
}

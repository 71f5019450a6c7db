//! View clock: the hour-of-day index and its animation loop.
//!
//! The hour is independent of the display mode — historical and simulation
//! rendering read it, and the zone polygon colors follow it in every mode.
//! It advances either by explicit user scrub (last value wins) or by the
//! animation counter, which can run regardless of mode.

use bevy::prelude::*;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use crate::lifecycle::ViewLifecycle;
use crate::{RepaintRequested, ViewGeneration};

/// Default animation cadence: 15 ticks = 1.5 s per hour step at 10 Hz.
pub const DEFAULT_CADENCE_TICKS: u32 = 15;

/// Hour-of-day index (0-23) plus the calendar date it is scrubbed against.
#[derive(Resource, Debug, Clone)]
pub struct ViewClock {
    pub hour: u8,
    pub date: NaiveDate,
    pub animating: bool,
    /// Ticks per animated hour step; adjustable from the UI.
    pub cadence_ticks: u32,
    pub counter: u32,
}

impl Default for ViewClock {
    fn default() -> Self {
        Self {
            hour: 8, // morning peak reads well as a first impression
            date: Utc::now().date_naive(),
            animating: false,
            cadence_ticks: DEFAULT_CADENCE_TICKS,
            counter: 0,
        }
    }
}

impl ViewClock {
    pub fn advance_hour(&mut self) {
        self.hour = (self.hour + 1) % 24;
    }

    pub fn set_hour(&mut self, hour: u8) {
        self.hour = hour % 24;
        self.counter = 0;
    }

    /// The timestamp queried for historical/simulation rendering.
    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_time(NaiveTime::MIN))
            + Duration::hours(i64::from(self.hour))
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// 0-indexed calendar month (January = 0).
    pub fn month0(&self) -> u32 {
        self.date.month0()
    }

    pub fn formatted(&self) -> String {
        format!("{:02}:00", self.hour)
    }
}

/// User dragged the time slider. Values wrap modulo 24.
#[derive(Event, Clone, Copy)]
pub struct TimeScrubbed(pub u8);

/// FixedUpdate: the animation loop.
pub fn tick_time_animation(
    lifecycle: Res<ViewLifecycle>,
    mut clock: ResMut<ViewClock>,
    mut generation: ResMut<ViewGeneration>,
    mut repaint: EventWriter<RepaintRequested>,
) {
    if lifecycle.disposed || !clock.animating {
        return;
    }
    clock.counter += 1;
    if clock.counter >= clock.cadence_ticks {
        clock.counter = 0;
        clock.advance_hour();
        generation.bump();
        repaint.send(RepaintRequested::default());
    }
}

/// Update: apply the newest scrub (last value wins).
pub fn apply_time_scrub(
    mut scrubs: EventReader<TimeScrubbed>,
    mut clock: ResMut<ViewClock>,
    mut generation: ResMut<ViewGeneration>,
    mut repaint: EventWriter<RepaintRequested>,
) {
    let Some(TimeScrubbed(hour)) = scrubs.read().last().copied() else {
        return;
    };
    let hour = hour % 24;
    if hour == clock.hour {
        return;
    }
    clock.set_hour(hour);
    generation.bump();
    repaint.send(RepaintRequested::default());
}

pub struct ClockPlugin;

impl Plugin for ClockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewClock>()
            .add_event::<TimeScrubbed>()
            .add_systems(FixedUpdate, tick_time_animation)
            .add_systems(Update, apply_time_scrub);
    }
}

//! Time-conditioned contextual overlays for historical rendering.
//!
//! Three independent overlays, each a pure function of the scrubbed
//! wall-clock time (never of live data): prayer-time calm, school-zone
//! morning activity, and the construction season. Simulation mode skips
//! them entirely.

use bevy::prelude::*;
use chrono::Weekday;

use crate::camera::geo_to_world;
use crate::overlay::OverlayLayers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextualKind {
    PrayerTime,
    SchoolZone,
    ConstructionSeason,
}

impl ContextualKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::PrayerTime => "Prayer time",
            Self::SchoolZone => "School zone hours",
            Self::ConstructionSeason => "Construction season",
        }
    }

    /// Tint drawn over the zone envelope while the overlay is active.
    pub fn color(self) -> Color {
        match self {
            Self::PrayerTime => Color::srgba(0.30, 0.65, 0.40, 0.85),
            Self::SchoolZone => Color::srgba(0.95, 0.80, 0.20, 0.85),
            Self::ConstructionSeason => Color::srgba(0.90, 0.45, 0.15, 0.85),
        }
    }
}

/// Friday prayers run 12:00-13:00; on other days the midday and afternoon
/// windows both apply.
pub fn prayer_window(weekday: Weekday, hour: u8) -> bool {
    if weekday == Weekday::Fri {
        hour == 12
    } else {
        hour == 12 || hour == 15
    }
}

/// School-zone activity on weekday mornings, 07:00-09:59.
pub fn school_window(weekday: Weekday, hour: u8) -> bool {
    weekday.number_from_monday() <= 5 && (7..=9).contains(&hour)
}

/// Construction season runs July through October (0-indexed months 6-9).
pub fn construction_season(month0: u32) -> bool {
    (6..=9).contains(&month0)
}

/// The overlays active at a given instant, in stable display order.
pub fn active_contextual(weekday: Weekday, hour: u8, month0: u32) -> Vec<ContextualKind> {
    let mut active = Vec::new();
    if prayer_window(weekday, hour) {
        active.push(ContextualKind::PrayerTime);
    }
    if school_window(weekday, hour) {
        active.push(ContextualKind::SchoolZone);
    }
    if construction_season(month0) {
        active.push(ContextualKind::ConstructionSeason);
    }
    active
}

/// System: frame the active envelope once per active contextual overlay,
/// inset a little per layer so stacked overlays stay readable.
pub fn draw_contextual_overlays(layers: Res<OverlayLayers>, mut gizmos: Gizmos) {
    let Some(bounds) = layers.bounds else {
        return;
    };
    let min = geo_to_world(&bounds.interior_point(0.0, 0.0));
    let max = geo_to_world(&bounds.interior_point(1.0, 1.0));
    let center = (min + max) / 2.0;
    let size = max - min;
    for (i, kind) in layers.contextual.iter().enumerate() {
        let inset = 1.0 - 0.04 * i as f32;
        gizmos.rect_2d(
            Isometry2d::from_translation(center),
            size * inset,
            kind.color(),
        );
    }
}

pub struct ContextualOverlayPlugin;

impl Plugin for ContextualOverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, draw_contextual_overlays);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friday_prayer_is_midday_only() {
        assert!(prayer_window(Weekday::Fri, 12));
        assert!(!prayer_window(Weekday::Fri, 15));
        assert!(!prayer_window(Weekday::Fri, 13));
    }

    #[test]
    fn weekday_prayer_has_two_windows() {
        assert!(prayer_window(Weekday::Tue, 12));
        assert!(prayer_window(Weekday::Tue, 15));
        assert!(!prayer_window(Weekday::Tue, 14));
        assert!(!prayer_window(Weekday::Tue, 16));
    }

    #[test]
    fn school_zone_is_weekday_mornings() {
        assert!(school_window(Weekday::Mon, 7));
        assert!(school_window(Weekday::Fri, 9));
        assert!(!school_window(Weekday::Mon, 10));
        assert!(!school_window(Weekday::Mon, 6));
        assert!(!school_window(Weekday::Sat, 8));
        assert!(!school_window(Weekday::Sun, 8));
    }

    #[test]
    fn construction_season_is_july_through_october() {
        assert!(!construction_season(5)); // June
        assert!(construction_season(6)); // July
        assert!(construction_season(9)); // October
        assert!(!construction_season(10)); // November
    }

    #[test]
    fn active_overlays_stack_in_display_order() {
        // A Tuesday 15:00 in August: prayer + construction, no school.
        let active = active_contextual(Weekday::Tue, 15, 7);
        assert_eq!(
            active,
            vec![ContextualKind::PrayerTime, ContextualKind::ConstructionSeason]
        );

        // Monday 08:00 in March: school only.
        let active = active_contextual(Weekday::Mon, 8, 2);
        assert_eq!(active, vec![ContextualKind::SchoolZone]);

        // Saturday 03:00 in January: nothing.
        assert!(active_contextual(Weekday::Sat, 3, 0).is_empty());
    }
}

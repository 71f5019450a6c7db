//! Deterministic synthetic traffic data.
//!
//! Used whenever the remote backend errors or is disabled, so the map never
//! shows an empty or broken state. Everything here is a pure function of
//! the queried time.

use chrono::{DateTime, Timelike, Utc};

use super::types::{
    DataSource, FlowDirection, HistoricalPattern, TrafficSegment, TrafficSnapshot,
};

/// Floor for synthetic segment speeds.
pub const MIN_SEGMENT_SPEED_KMH: f32 = 15.0;

/// Speed offsets of the four canonical segments relative to the base speed.
const SEGMENT_SPEED_OFFSETS: [f32; 4] = [-5.0, 0.0, 6.0, -8.0];

/// Congestion levels of the four canonical segments.
const SEGMENT_CONGESTION: [u8; 4] = [60, 40, 30, 70];

const SEGMENT_DIRECTIONS: [FlowDirection; 4] = [
    FlowDirection::North,
    FlowDirection::South,
    FlowDirection::East,
    FlowDirection::West,
];

/// Hour-of-day base speed/congestion profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseProfile {
    pub speed_kmh: f32,
    pub congestion_level: u8,
}

/// Morning peak 07:00–09:59, evening peak 16:00–19:59, free flow otherwise.
pub fn base_profile(hour: u8) -> BaseProfile {
    match hour {
        7..=9 => BaseProfile {
            speed_kmh: 25.0,
            congestion_level: 75,
        },
        16..=19 => BaseProfile {
            speed_kmh: 28.0,
            congestion_level: 70,
        },
        _ => BaseProfile {
            speed_kmh: 55.0,
            congestion_level: 40,
        },
    }
}

/// Four canonical segments spread around the base speed, with empty paths.
/// The overlay renderer positions them inside the active bounds.
pub fn synthetic_segments(base_speed_kmh: f32) -> Vec<TrafficSegment> {
    SEGMENT_SPEED_OFFSETS
        .iter()
        .zip(SEGMENT_CONGESTION)
        .zip(SEGMENT_DIRECTIONS)
        .map(|((offset, congestion_level), direction)| TrafficSegment {
            path: Vec::new(),
            speed_kmh: (base_speed_kmh + offset).max(MIN_SEGMENT_SPEED_KMH),
            congestion_level,
            direction,
        })
        .collect()
}

fn average_speed(segments: &[TrafficSegment]) -> f32 {
    if segments.is_empty() {
        return 0.0;
    }
    segments.iter().map(|s| s.speed_kmh).sum::<f32>() / segments.len() as f32
}

/// Synthetic live snapshot for the given wall-clock time.
pub fn synthetic_snapshot(at: DateTime<Utc>) -> TrafficSnapshot {
    let profile = base_profile(at.hour() as u8);
    let segments = synthetic_segments(profile.speed_kmh);
    TrafficSnapshot {
        average_speed_kmh: average_speed(&segments),
        congestion_level: profile.congestion_level,
        incidents: Vec::new(),
        taken_at: at,
        source: DataSource::Synthetic,
        segments,
    }
}

/// Synthetic historical pattern for the queried timestamp.
pub fn synthetic_pattern(queried_at: DateTime<Utc>) -> HistoricalPattern {
    let profile = base_profile(queried_at.hour() as u8);
    let segments = synthetic_segments(profile.speed_kmh);
    HistoricalPattern {
        average_speed_kmh: average_speed(&segments),
        congestion_level: profile.congestion_level,
        incidents: Vec::new(),
        queried_at,
        raw_points: Vec::new(),
        source: DataSource::Synthetic,
        segments,
    }
}

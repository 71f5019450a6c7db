//! Zone congestion heuristic and color band classification.
//!
//! The per-zone polygon color is a deterministic function of zone kind,
//! hour of day, and a stable per-zone jitter derived from the zone name, so
//! the map reads the same on every load without any live data. The
//! thresholds here are load-bearing for the rest of the dashboard — change
//! them and every polygon and flow line shifts band.

use crate::zone::ZoneKind;

const MORNING_PEAK_BONUS: i32 = 18;
const MIDDAY_BONUS: i32 = 8;
const EVENING_PEAK_BONUS: i32 = 22;
const NIGHT_RELIEF: i32 = -12;

const MIN_LEVEL: i32 = 15;
const MAX_LEVEL: i32 = 95;

/// Three-band classification shared by zone polygons and flow lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CongestionBand {
    Green,
    Amber,
    Red,
}

impl CongestionBand {
    pub fn label(self) -> &'static str {
        match self {
            Self::Green => "Light",
            Self::Amber => "Moderate",
            Self::Red => "Heavy",
        }
    }
}

/// Baseline congestion by zone kind.
fn base_level(kind: ZoneKind) -> i32 {
    match kind {
        ZoneKind::Commercial => 60,
        ZoneKind::Industrial => 55,
        ZoneKind::Mixed => 50,
        ZoneKind::Residential => 40,
    }
}

/// Additive time-of-day adjustment.
fn hour_adjustment(hour: u8) -> i32 {
    match hour {
        7..=9 => MORNING_PEAK_BONUS,
        12..=14 => MIDDAY_BONUS,
        16..=19 => EVENING_PEAK_BONUS,
        21..=23 | 0..=5 => NIGHT_RELIEF,
        _ => 0,
    }
}

/// Stable per-zone jitter in [-3, 3], from a rolling hash of the name.
pub fn name_jitter(name: &str) -> i32 {
    let mut h: u64 = 0;
    for b in name.bytes() {
        h = h.wrapping_mul(31).wrapping_add(u64::from(b));
    }
    (h % 7) as i32 - 3
}

/// Estimate a zone's congestion level in [15, 95] for the given hour.
///
/// Pure and side-effect-free; used for the polygon color of every zone in
/// the catalogue, independent of the overlay data path.
pub fn estimate_congestion(kind: ZoneKind, hour: u8, name: &str) -> u8 {
    let level = base_level(kind) + hour_adjustment(hour) + name_jitter(name);
    level.clamp(MIN_LEVEL, MAX_LEVEL) as u8
}

/// Band for zone polygons: green below 30, red above 70, amber otherwise
/// (30 and 70 are both amber).
pub fn zone_band(level: u8) -> CongestionBand {
    if level < 30 {
        CongestionBand::Green
    } else if level > 70 {
        CongestionBand::Red
    } else {
        CongestionBand::Amber
    }
}

/// Band for flow lines: green below 35, red at 70 and above.
pub fn flow_band(level: u8) -> CongestionBand {
    if level < 35 {
        CongestionBand::Green
    } else if level >= 70 {
        CongestionBand::Red
    } else {
        CongestionBand::Amber
    }
}

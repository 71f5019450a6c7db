//! Wire-level traffic data types shared by the HTTP backend and the
//! synthetic fallback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Eight-point compass flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowDirection {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "NE")]
    NorthEast,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "SE")]
    SouthEast,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "SW")]
    SouthWest,
    #[serde(rename = "W")]
    West,
    #[serde(rename = "NW")]
    NorthWest,
}

impl FlowDirection {
    /// Compass heading in degrees, clockwise from north.
    pub fn heading_degrees(self) -> f32 {
        match self {
            Self::North => 0.0,
            Self::NorthEast => 45.0,
            Self::East => 90.0,
            Self::SouthEast => 135.0,
            Self::South => 180.0,
            Self::SouthWest => 225.0,
            Self::West => 270.0,
            Self::NorthWest => 315.0,
        }
    }
}

/// One renderable stretch of road.
///
/// `path` may arrive empty or with a single point; the overlay renderer
/// inflates such segments with a synthetic two-point path inside the active
/// bounds so every segment stays drawable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSegment {
    #[serde(default)]
    pub path: Vec<GeoPoint>,
    pub speed_kmh: f32,
    pub congestion_level: u8,
    pub direction: FlowDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentKind {
    Accident,
    Roadworks,
    Closure,
    Event,
}

impl IncidentKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Accident => "Accident",
            Self::Roadworks => "Roadworks",
            Self::Closure => "Road closure",
            Self::Event => "Event",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
}

impl IncidentSeverity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficIncident {
    pub id: String,
    pub kind: IncidentKind,
    pub description: String,
    pub severity: IncidentSeverity,
    pub location: GeoPoint,
    #[serde(default)]
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

/// Whether a bundle came from the live backend or was synthesized
/// client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSource {
    Live,
    #[default]
    Synthetic,
}

impl DataSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Live => "Live data",
            Self::Synthetic => "Synthetic fallback",
        }
    }
}

/// A momentary bundle of segments, incidents, and aggregate stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSnapshot {
    #[serde(default)]
    pub segments: Vec<TrafficSegment>,
    #[serde(default)]
    pub incidents: Vec<TrafficIncident>,
    pub average_speed_kmh: f32,
    pub congestion_level: u8,
    #[serde(default = "Utc::now")]
    pub taken_at: DateTime<Utc>,
    #[serde(skip)]
    pub source: DataSource,
}

/// A time-indexed bundle keyed by the queried timestamp. `raw_points` is
/// carried for wire parity with the historical endpoint but not consumed by
/// the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPattern {
    #[serde(default)]
    pub segments: Vec<TrafficSegment>,
    #[serde(default)]
    pub incidents: Vec<TrafficIncident>,
    pub average_speed_kmh: f32,
    pub congestion_level: u8,
    #[serde(default = "Utc::now")]
    pub queried_at: DateTime<Utc>,
    #[serde(default)]
    pub raw_points: Vec<GeoPoint>,
    #[serde(skip)]
    pub source: DataSource,
}

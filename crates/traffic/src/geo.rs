//! Geographic value types: points, rectangular envelopes, zone boundary
//! polygons.
//!
//! Everything here is plain data with no ECS dependency so the rendering
//! pipeline and the provider can share it freely.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Margin (as a fraction of each axis) kept when sampling a point that must
/// land strictly inside an envelope.
const INTERIOR_MARGIN: f64 = 0.02;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Chebyshev distance in degrees; good enough for "within 0.02°" checks
    /// at city scale.
    pub fn degree_distance(&self, other: &GeoPoint) -> f64 {
        (self.lat - other.lat).abs().max((self.lon - other.lon).abs())
    }
}

/// A rectangular lat/lon envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Build an envelope from two corners, normalizing min/max ordering.
    pub fn new(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> Self {
        Self {
            min_lat: lat_a.min(lat_b),
            min_lon: lon_a.min(lon_b),
            max_lat: lat_a.max(lat_b),
            max_lon: lon_a.max(lon_b),
        }
    }

    /// A square box of `half_deg` degrees around a center point.
    pub fn around(center: GeoPoint, half_deg: f64) -> Self {
        Self::new(
            center.lat - half_deg,
            center.lon - half_deg,
            center.lat + half_deg,
            center.lon + half_deg,
        )
    }

    /// Smallest envelope containing all points; `None` for an empty slice.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self::new(first.lat, first.lon, first.lat, first.lon);
        for p in &points[1..] {
            bounds.min_lat = bounds.min_lat.min(p.lat);
            bounds.min_lon = bounds.min_lon.min(p.lon);
            bounds.max_lat = bounds.max_lat.max(p.lat);
            bounds.max_lon = bounds.max_lon.max(p.lon);
        }
        Some(bounds)
    }

    /// Parse an explicit "lat,lon,lat,lon" box. Accepts exactly four
    /// comma-separated finite numbers; anything else returns `None` and the
    /// caller falls back to cached/derived bounds.
    pub fn parse_bbox(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.split(',').collect();
        if parts.len() != 4 {
            return None;
        }
        let mut nums = [0.0_f64; 4];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            let v: f64 = part.trim().parse().ok()?;
            if !v.is_finite() {
                return None;
            }
            *slot = v;
        }
        Some(Self::new(nums[0], nums[1], nums[2], nums[3]))
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn contains(&self, p: &GeoPoint) -> bool {
        p.lat >= self.min_lat
            && p.lat <= self.max_lat
            && p.lon >= self.min_lon
            && p.lon <= self.max_lon
    }

    /// True when the point lies inside the envelope but not on its edge.
    pub fn contains_strictly(&self, p: &GeoPoint) -> bool {
        p.lat > self.min_lat && p.lat < self.max_lat && p.lon > self.min_lon && p.lon < self.max_lon
    }

    /// A point at the given relative offsets (0..1 on each axis).
    pub fn interior_point(&self, lat_frac: f64, lon_frac: f64) -> GeoPoint {
        GeoPoint::new(
            self.min_lat + self.lat_span() * lat_frac,
            self.min_lon + self.lon_span() * lon_frac,
        )
    }

    /// A uniformly random point strictly inside the envelope (a small margin
    /// keeps samples off the edges even for degenerate spans).
    pub fn random_interior(&self, rng: &mut impl Rng) -> GeoPoint {
        let lat_frac = rng.gen_range(INTERIOR_MARGIN..(1.0 - INTERIOR_MARGIN));
        let lon_frac = rng.gen_range(INTERIOR_MARGIN..(1.0 - INTERIOR_MARGIN));
        self.interior_point(lat_frac, lon_frac)
    }
}

/// A zone boundary polygon: the exterior ring of a GeoJSON-like geometry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneBoundary {
    pub exterior: Vec<GeoPoint>,
}

impl ZoneBoundary {
    pub fn new(exterior: Vec<GeoPoint>) -> Self {
        Self { exterior }
    }

    /// Parse the exterior ring out of a GeoJSON `Polygon` or `MultiPolygon`
    /// geometry value (first polygon, first ring; coordinates are
    /// `[lon, lat]` per the GeoJSON convention).
    pub fn from_geojson(value: &serde_json::Value) -> Option<Self> {
        let coords = value.get("coordinates")?;
        let ring = match value.get("type")?.as_str()? {
            "Polygon" => coords.get(0)?,
            "MultiPolygon" => coords.get(0)?.get(0)?,
            _ => return None,
        };
        let mut exterior = Vec::new();
        for pair in ring.as_array()? {
            let lon = pair.get(0)?.as_f64()?;
            let lat = pair.get(1)?.as_f64()?;
            exterior.push(GeoPoint::new(lat, lon));
        }
        if exterior.len() < 3 {
            return None;
        }
        Some(Self { exterior })
    }

    /// The rectangular envelope of the ring; `None` for an empty boundary.
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(&self.exterior)
    }
}

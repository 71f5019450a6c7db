//! Flow-line layer: dashed polylines colored by the three-band congestion
//! scale, with a direction glyph at the segment head.

use bevy::prelude::*;

use traffic::congestion::CongestionBand;

use crate::camera::geo_to_world;
use crate::overlay::OverlayLayers;

const DASH_LEN: f32 = 12.0;
const GAP_LEN: f32 = 8.0;

/// Arrow glyph dimensions in world units.
const ARROW_LEN: f32 = 10.0;
const ARROW_HALF_WIDTH: f32 = 5.0;

/// Band color with the layer's opacity applied.
pub fn band_color(band: CongestionBand, opacity: f32) -> Color {
    match band {
        CongestionBand::Green => Color::srgba(0.18, 0.70, 0.28, opacity),
        CongestionBand::Amber => Color::srgba(0.93, 0.68, 0.13, opacity),
        CongestionBand::Red => Color::srgba(0.84, 0.15, 0.12, opacity),
    }
}

/// Chop a polyline into dash start/end pairs. The dash phase restarts at
/// each vertex, which keeps the math trivial and looks fine at map scale.
pub fn dash_segments(points: &[Vec2], dash_len: f32, gap_len: f32) -> Vec<(Vec2, Vec2)> {
    let mut dashes = Vec::new();
    if dash_len <= 0.0 {
        return dashes;
    }
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let length = a.distance(b);
        if length <= f32::EPSILON {
            continue;
        }
        let dir = (b - a) / length;
        let mut t = 0.0;
        while t < length {
            let end = (t + dash_len).min(length);
            dashes.push((a + dir * t, a + dir * end));
            t += dash_len + gap_len;
        }
    }
    dashes
}

/// Unit vector for a compass heading (degrees clockwise from north).
pub fn heading_vector(heading_degrees: f32) -> Vec2 {
    let rad = heading_degrees.to_radians();
    Vec2::new(rad.sin(), rad.cos())
}

pub fn draw_flow_lines(layers: Res<OverlayLayers>, mut gizmos: Gizmos) {
    for line in &layers.flow {
        let color = band_color(line.band, line.opacity);
        let world: Vec<Vec2> = line.path.iter().map(geo_to_world).collect();

        for (start, end) in dash_segments(&world, DASH_LEN, GAP_LEN) {
            gizmos.line_2d(start, end, color);
        }

        // Direction glyph at the head of the segment.
        if let Some(&head) = world.last() {
            let dir = heading_vector(line.heading_degrees);
            let perp = Vec2::new(-dir.y, dir.x);
            let tip = head + dir * ARROW_LEN;
            gizmos.line_2d(head + perp * ARROW_HALF_WIDTH, tip, color);
            gizmos.line_2d(head - perp * ARROW_HALF_WIDTH, tip, color);
        }
    }
}

pub struct FlowLinesPlugin;

impl Plugin for FlowLinesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, draw_flow_lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_count_on_a_straight_edge() {
        let points = [Vec2::ZERO, Vec2::new(100.0, 0.0)];
        let dashes = dash_segments(&points, 10.0, 10.0);
        // Dashes start at 0, 20, 40, 60, 80.
        assert_eq!(dashes.len(), 5);
        assert_eq!(dashes[0], (Vec2::ZERO, Vec2::new(10.0, 0.0)));
        assert_eq!(dashes[4].1, Vec2::new(90.0, 0.0));
    }

    #[test]
    fn dashes_never_overshoot_the_edge() {
        let points = [Vec2::ZERO, Vec2::new(25.0, 0.0)];
        for (start, end) in dash_segments(&points, 10.0, 5.0) {
            assert!(start.x >= 0.0 && end.x <= 25.0);
            assert!(end.x > start.x);
        }
    }

    #[test]
    fn degenerate_edges_produce_no_dashes() {
        let points = [Vec2::ZERO, Vec2::ZERO];
        assert!(dash_segments(&points, 10.0, 5.0).is_empty());
        assert!(dash_segments(&[Vec2::ZERO], 10.0, 5.0).is_empty());
    }

    #[test]
    fn band_colors_are_distinct() {
        let bands = [
            CongestionBand::Green,
            CongestionBand::Amber,
            CongestionBand::Red,
        ];
        for (i, a) in bands.iter().enumerate() {
            for b in &bands[i + 1..] {
                let ca = band_color(*a, 1.0).to_srgba();
                let cb = band_color(*b, 1.0).to_srgba();
                let diff = (ca.red - cb.red).abs()
                    + (ca.green - cb.green).abs()
                    + (ca.blue - cb.blue).abs();
                assert!(diff > 0.1, "{a:?} and {b:?} too close");
            }
        }
    }

    #[test]
    fn band_color_carries_opacity() {
        assert!((band_color(CongestionBand::Red, 0.7).to_srgba().alpha - 0.7).abs() < 1e-6);
    }

    #[test]
    fn heading_vector_cardinal_directions() {
        assert!(heading_vector(0.0).abs_diff_eq(Vec2::Y, 1e-5));
        assert!(heading_vector(90.0).abs_diff_eq(Vec2::X, 1e-5));
        assert!(heading_vector(180.0).abs_diff_eq(-Vec2::Y, 1e-5));
        assert!(heading_vector(270.0).abs_diff_eq(-Vec2::X, 1e-5));
    }
}

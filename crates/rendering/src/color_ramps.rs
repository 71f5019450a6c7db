//! Continuous color ramp for the congestion heatmap.
//!
//! The inferno ramp (sampled from the matplotlib original) is perceptually
//! uniform and reads naturally as "heat", which is exactly what congestion
//! intensity is. Defined as an sRGB lookup table interpolated linearly.

use bevy::prelude::*;

/// A continuous color ramp defined by evenly-spaced sRGB control points.
pub struct ColorRamp {
    points: &'static [[f32; 3]],
}

impl ColorRamp {
    /// Sample the ramp at parameter `t` (clamped to `[0, 1]`).
    pub fn sample(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let n = self.points.len();
        if n == 0 {
            return Color::BLACK;
        }
        if n == 1 {
            let p = self.points[0];
            return Color::srgb(p[0], p[1], p[2]);
        }
        let max_idx = (n - 1) as f32;
        let scaled = t * max_idx;
        let lo = (scaled as usize).min(n - 2);
        let hi = lo + 1;
        let frac = scaled - lo as f32;
        let a = self.points[lo];
        let b = self.points[hi];
        Color::srgb(
            a[0] + (b[0] - a[0]) * frac,
            a[1] + (b[1] - a[1]) * frac,
            a[2] + (b[2] - a[2]) * frac,
        )
    }
}

/// Inferno ramp (16 control points sampled from matplotlib inferno).
/// Near-black at zero through purple and orange to pale yellow at one.
pub static INFERNO: ColorRamp = ColorRamp {
    points: &[
        [0.001, 0.000, 0.014], // 0 - near-black
        [0.044, 0.027, 0.130],
        [0.125, 0.044, 0.247],
        [0.212, 0.032, 0.339],
        [0.306, 0.030, 0.389],
        [0.398, 0.057, 0.400],
        [0.486, 0.100, 0.378],
        [0.569, 0.154, 0.329],
        [0.646, 0.217, 0.265],
        [0.715, 0.290, 0.197],
        [0.775, 0.373, 0.135],
        [0.824, 0.467, 0.085],
        [0.860, 0.571, 0.058],
        [0.882, 0.682, 0.076],
        [0.888, 0.797, 0.170],
        [0.988, 0.998, 0.645], // 1 - pale yellow
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(c: Color) -> (f32, f32, f32) {
        let s = c.to_srgba();
        (s.red, s.green, s.blue)
    }

    #[test]
    fn inferno_endpoints() {
        let (r0, g0, b0) = rgb(INFERNO.sample(0.0));
        assert!(
            r0 < 0.05 && g0 < 0.05 && b0 < 0.05,
            "inferno(0) should be near-black"
        );

        let (r1, g1, _b1) = rgb(INFERNO.sample(1.0));
        assert!(r1 > 0.90 && g1 > 0.90, "inferno(1) should be pale yellow");
    }

    #[test]
    fn sample_clamps_out_of_range() {
        assert_eq!(rgb(INFERNO.sample(-0.5)), rgb(INFERNO.sample(0.0)));
        assert_eq!(rgb(INFERNO.sample(1.5)), rgb(INFERNO.sample(1.0)));
    }

    #[test]
    fn luminance_rises_with_intensity() {
        let mut prev = -1.0_f32;
        for i in 0..=8 {
            let t = i as f32 / 8.0;
            let (r, g, b) = rgb(INFERNO.sample(t));
            let lum = 0.2126 * r + 0.7152 * g + 0.0722 * b;
            assert!(lum >= prev - 0.02, "luminance dipped at t={t}");
            prev = lum;
        }
    }
}

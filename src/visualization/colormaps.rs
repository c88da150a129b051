//! Color mapping functions for data visualization
//!
//! Maps a scalar inside a `[min, max]` range to an RGBA color. Used by the whisker transform,
//! the model shell texture and the orbit path coloring.

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

/// Named color palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    #[default]
    Turbo,
    BlueRed,
    Cool,
    Inferno,
    Plasma,
    Spring,
    Viridis,
}

impl Palette {
    pub fn sample(self, t: f32) -> [f32; 4] {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        match self {
            Palette::Turbo => turbo_colormap(t),
            Palette::BlueRed => linear_stops(t, &[[0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]),
            Palette::Cool => linear_stops(t, &[[0.0, 1.0, 1.0], [1.0, 0.0, 1.0]]),
            Palette::Spring => linear_stops(t, &[[1.0, 0.0, 1.0], [1.0, 1.0, 0.0]]),
            Palette::Inferno => linear_stops(
                t,
                &[
                    [0.001, 0.000, 0.014],
                    [0.258, 0.039, 0.406],
                    [0.578, 0.148, 0.404],
                    [0.865, 0.317, 0.226],
                    [0.988, 0.645, 0.040],
                    [0.988, 1.000, 0.644],
                ],
            ),
            Palette::Plasma => linear_stops(
                t,
                &[
                    [0.050, 0.030, 0.528],
                    [0.417, 0.001, 0.658],
                    [0.693, 0.165, 0.565],
                    [0.881, 0.393, 0.383],
                    [0.988, 0.652, 0.211],
                    [0.940, 0.975, 0.131],
                ],
            ),
            Palette::Viridis => linear_stops(
                t,
                &[
                    [0.267, 0.005, 0.329],
                    [0.254, 0.265, 0.530],
                    [0.164, 0.471, 0.558],
                    [0.134, 0.659, 0.518],
                    [0.478, 0.821, 0.318],
                    [0.993, 0.906, 0.144],
                ],
            ),
        }
    }
}

/// Scalar -> color lookup.
pub trait ColorMapper {
    /// Color for `value` within `[min, max]`. Values outside the range clamp to the ends;
    /// a degenerate range maps everything to the top of the palette.
    fn interpolate(&self, value: f64, min: f64, max: f64, palette: Palette) -> [f32; 4];
}

/// Default mapper over the built-in palettes.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PaletteMapper;

impl ColorMapper for PaletteMapper {
    fn interpolate(&self, value: f64, min: f64, max: f64, palette: Palette) -> [f32; 4] {
        palette.sample(normalize(value, min, max) as f32)
    }
}

/// Position of `value` in `[min, max]`, clamped to `[0, 1]`.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span.abs() < f64::EPSILON {
        1.0
    } else {
        ((value - min) / span).clamp(0.0, 1.0)
    }
}

fn linear_stops(t: f32, stops: &[[f32; 3]]) -> [f32; 4] {
    if stops.len() == 1 {
        let [r, g, b] = stops[0];
        return [r, g, b, 1.0];
    }
    let scaled = t * (stops.len() - 1) as f32;
    let i = (scaled.floor() as usize).min(stops.len() - 2);
    let s = scaled - i as f32;
    let a = stops[i];
    let b = stops[i + 1];
    [
        a[0] + (b[0] - a[0]) * s,
        a[1] + (b[1] - a[1]) * s,
        a[2] + (b[2] - a[2]) * s,
        1.0,
    ]
}

/// Turbo colormap implementation
///
/// Maps values from 0.0 to 1.0 to colors ranging from dark blue through cyan, green,
/// yellow, orange, to red.
pub fn turbo_colormap(t: f32) -> [f32; 4] {
    let t = t.clamp(0.0, 1.0);

    // Source: https://gist.github.com/mikhailov-work/ee72ba4191942acecc03fe6da94fc73f
    let r = polynomial_eval(
        t,
        &[0.13572138, 4.61539260, -42.66032258, 132.13108234, -152.94239396, 59.28637943],
    );
    let g = polynomial_eval(
        t,
        &[0.09140261, 2.19418839, 4.84296658, -14.18503333, 4.27729857, 2.82956604],
    );
    let b = polynomial_eval(
        t,
        &[0.10342779, -3.29743107, 24.81307239, -78.43245046, 93.38840218, -36.22902374],
    );

    [r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0), 1.0]
}

/// Coefficients are ordered from constant to highest degree
fn polynomial_eval(x: f32, coeffs: &[f32]) -> f32 {
    let mut result = 0.0;
    let mut x_power = 1.0;
    for &coeff in coeffs {
        result += coeff * x_power;
        x_power *= x;
    }
    result
}

/// Pack a float color into RGBA8 with the given alpha.
pub fn to_rgba8(color: [f32; 4], alpha: f32) -> [u8; 4] {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [
        channel(color[0]),
        channel(color[1]),
        channel(color[2]),
        channel(alpha),
    ]
}

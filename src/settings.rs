// SPDX: CC0-1.0

use crate::{render::Color, Number};
use core::fmt;

/// Default pixels per mathematical unit.
pub const DEFAULT_SCALE: Number = 40.0;

/// Colours used for everything that is not a curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub grid: Color,
    pub axis: Color,
    pub label: Color,
    pub overlay: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::rgb(0x1e, 0x1e, 0x1e),
            grid: Color::rgb(0x66, 0x66, 0x66),
            axis: Color::rgb(0xa0, 0xa0, 0xa0),
            label: Color::rgb(0xa0, 0xa0, 0xa0),
            overlay: Color::rgb(0xe0, 0xe0, 0xe0),
        }
    }
}

/// Tunables for one rendering surface and its numeric queries.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Pixels per unit after a reset.
    pub default_scale: Number,
    /// Wheel zoom factor is `exp(±intensity)`.
    pub wheel_zoom_intensity: Number,
    pub zoom_in_factor: Number,
    pub zoom_out_factor: Number,
    /// Grid lines are never closer than this many pixels.
    pub min_grid_spacing: Number,
    pub root_precision: Number,
    pub quadrature_nodes: usize,
    pub curve_color: Color,
    pub curve_width: f32,
    pub label_size: f32,
    pub overlay_size: f32,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_scale: DEFAULT_SCALE,
            wheel_zoom_intensity: 0.1,
            zoom_in_factor: 1.2,
            zoom_out_factor: 0.8,
            min_grid_spacing: 40.0,
            root_precision: 1e-3,
            quadrature_nodes: 1000,
            curve_color: Color::rgb(0xbb, 0x86, 0xfc),
            curve_width: 2.0,
            label_size: 12.0,
            overlay_size: 14.0,
            theme: Theme::default(),
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("default scale", &self.default_scale)
            .field("wheel zoom intensity", &self.wheel_zoom_intensity)
            .field("zoom in factor", &self.zoom_in_factor)
            .field("zoom out factor", &self.zoom_out_factor)
            .field("min grid spacing", &self.min_grid_spacing)
            .field("root precision", &self.root_precision)
            .field("quadrature nodes", &self.quadrature_nodes)
            .field("curve color", &format_args!("{}", self.curve_color))
            .field("curve width", &self.curve_width)
            .finish()
    }
}

// SPDX: CC0-1.0

//! The affine map between device pixels and mathematical coordinates.

use crate::{settings::DEFAULT_SCALE, Number, Point};
use core::fmt;

/// Pan and zoom state of one rendering surface.
///
/// The mathematical origin sits at the surface centre shifted by `offset`
/// pixels; `scale` is pixels per unit and always positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scale: Number,
    offset: Point<Number>,
    width: Number,
    height: Number,
    default_scale: Number,
}

impl Viewport {
    /// A viewport of the given pixel size with the origin centred.
    ///
    /// A non-positive or non-finite `default_scale` falls back to
    /// [`DEFAULT_SCALE`].
    pub fn new(width: Number, height: Number, default_scale: Number) -> Self {
        let default_scale = if default_scale.is_finite() && default_scale > 0.0 {
            default_scale
        } else {
            DEFAULT_SCALE
        };
        Self {
            scale: default_scale,
            offset: Point::new(0.0, 0.0),
            width: sanitize_len(width),
            height: sanitize_len(height),
            default_scale,
        }
    }

    pub const fn scale(&self) -> Number {
        self.scale
    }

    pub const fn default_scale(&self) -> Number {
        self.default_scale
    }

    pub const fn offset(&self) -> Point<Number> {
        self.offset
    }

    pub const fn width(&self) -> Number {
        self.width
    }

    pub const fn height(&self) -> Number {
        self.height
    }

    /// Pixel at the centre of the surface.
    pub fn center(&self) -> Point<Number> {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Pixel position of the mathematical origin.
    pub fn origin(&self) -> Point<Number> {
        Point::new(
            self.width / 2.0 + self.offset.x,
            self.height / 2.0 + self.offset.y,
        )
    }

    pub fn to_math(&self, pixel: Point<Number>) -> Point<Number> {
        Point::new(
            (pixel.x - self.width / 2.0 - self.offset.x) / self.scale,
            -(pixel.y - self.height / 2.0 - self.offset.y) / self.scale,
        )
    }

    pub fn to_pixel(&self, math: Point<Number>) -> Point<Number> {
        Point::new(
            math.x * self.scale + self.width / 2.0 + self.offset.x,
            -math.y * self.scale + self.height / 2.0 + self.offset.y,
        )
    }

    /// Shift the origin by a pixel delta. Panning is unbounded.
    pub fn pan(&mut self, dx: Number, dy: Number) {
        self.offset.x += dx;
        self.offset.y += dy;
    }

    pub fn set_offset(&mut self, offset: Point<Number>) {
        self.offset = offset;
    }

    /// Multiply the scale by `factor` while the mathematical point under
    /// `pixel` stays under `pixel`.
    ///
    /// Returns `false` and leaves the viewport untouched when the factor or
    /// the resulting scale is not a positive finite number.
    pub fn zoom_at(&mut self, pixel: Point<Number>, factor: Number) -> bool {
        let scale = self.scale * factor;
        if !(factor.is_finite() && factor > 0.0 && scale.is_finite() && scale > 0.0) {
            return false;
        }
        let fixed = self.to_math(pixel);
        self.scale = scale;
        self.offset = Point::new(
            pixel.x - self.width / 2.0 - fixed.x * scale,
            pixel.y - self.height / 2.0 + fixed.y * scale,
        );
        true
    }

    /// Zoom about the surface centre, as toolbar buttons do.
    pub fn zoom(&mut self, factor: Number) -> bool {
        self.zoom_at(self.center(), factor)
    }

    pub fn reset(&mut self) {
        self.scale = self.default_scale;
        self.offset = Point::new(0.0, 0.0);
    }

    /// Adopt a new surface size; scale and offset are kept.
    pub fn resize(&mut self, width: Number, height: Number) {
        self.width = sanitize_len(width);
        self.height = sanitize_len(height);
    }

    /// Set the scale directly, e.g. from a settings dialog.
    pub fn set_scale(&mut self, scale: Number) -> bool {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
            true
        } else {
            false
        }
    }

    /// Mathematical x range covered by the pixel columns.
    pub fn x_range(&self) -> core::ops::Range<Number> {
        self.to_math(Point::new(0.0, 0.0)).x..self.to_math(Point::new(self.width, 0.0)).x
    }

    /// Mathematical y range covered by the pixel rows, bottom to top.
    pub fn y_range(&self) -> core::ops::Range<Number> {
        self.to_math(Point::new(0.0, self.height)).y..self.to_math(Point::new(0.0, 0.0)).y
    }
}

fn sanitize_len(len: Number) -> Number {
    if len.is_finite() && len > 0.0 {
        len
    } else {
        0.0
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("scale", &self.scale)
            .field("offset x", &self.offset.x)
            .field("offset y", &self.offset.y)
            .field("size", &format_args!("{}x{}", self.width, self.height))
            .field("x range", &self.x_range())
            .field("y range", &self.y_range())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    fn close(a: Point<Number>, b: Point<Number>, tol: Number) -> bool {
        (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol
    }

    fn viewport(width: u16, height: u16, scale: u16, ox: i16, oy: i16) -> Viewport {
        let mut vp = Viewport::new(
            Number::from(width % 4000) + 1.0,
            Number::from(height % 4000) + 1.0,
            Number::from(scale % 2000) / 4.0 + 0.25,
        );
        vp.set_offset(Point::new(Number::from(ox) / 8.0, Number::from(oy) / 8.0));
        vp
    }

    #[test]
    fn origin_is_centered_by_default() {
        let vp = Viewport::new(800.0, 600.0, 40.0);
        assert_eq!(vp.to_math(Point::new(400.0, 300.0)), Point::new(0.0, 0.0));
        assert_eq!(vp.to_pixel(Point::new(1.0, 1.0)), Point::new(440.0, 260.0));
    }

    #[test]
    fn pixel_math_roundtrip() {
        fn prop(size: (u16, u16), scale: u16, offset: (i16, i16), p: (i16, i16)) -> bool {
            let vp = viewport(size.0, size.1, scale, offset.0, offset.1);
            let pixel = Point::new(Number::from(p.0) / 4.0, Number::from(p.1) / 4.0);
            close(vp.to_pixel(vp.to_math(pixel)), pixel, 1e-9)
        }
        QuickCheck::new()
            .tests(2000)
            .quickcheck(prop as fn((u16, u16), u16, (i16, i16), (i16, i16)) -> bool);
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        fn prop(size: (u16, u16), scale: u16, offset: (i16, i16), p: (u16, u16), f: u8) -> TestResult {
            let mut vp = viewport(size.0, size.1, scale, offset.0, offset.1);
            let pixel = Point::new(Number::from(p.0 % 4000), Number::from(p.1 % 4000));
            let factor = 0.5 + Number::from(f) / 170.0;
            let before = vp.to_math(pixel);
            if !vp.zoom_at(pixel, factor) {
                return TestResult::discard();
            }
            TestResult::from_bool(close(vp.to_math(pixel), before, 1e-9))
        }
        QuickCheck::new()
            .tests(2000)
            .quickcheck(prop as fn((u16, u16), u16, (i16, i16), (u16, u16), u8) -> TestResult);
    }

    #[test]
    fn zoom_rejects_bad_factors() {
        let mut vp = Viewport::new(100.0, 100.0, 40.0);
        assert!(!vp.zoom_at(Point::new(10.0, 10.0), 0.0));
        assert!(!vp.zoom_at(Point::new(10.0, 10.0), -2.0));
        assert!(!vp.zoom_at(Point::new(10.0, 10.0), Number::NAN));
        assert_eq!(vp.scale(), 40.0);
        assert_eq!(vp.offset(), Point::new(0.0, 0.0));
    }

    #[test]
    fn button_zoom_uses_center() {
        let mut vp = Viewport::new(200.0, 100.0, 40.0);
        vp.pan(30.0, -10.0);
        let before = vp.to_math(vp.center());
        assert!(vp.zoom(1.2));
        let after = vp.to_math(vp.center());
        assert!(close(before, after, 1e-9));
        assert!((vp.scale() - 48.0).abs() < 1e-12);
    }

    #[test]
    fn pan_then_reset() {
        let mut vp = Viewport::new(640.0, 480.0, 25.0);
        for (dx, dy) in [(10.0, -4.0), (-300.5, 22.0), (1e6, 1e6)] {
            vp.pan(dx, dy);
        }
        vp.zoom_at(Point::new(3.0, 7.0), 3.0);
        vp.reset();
        assert_eq!(vp.scale(), 25.0);
        assert_eq!(vp.offset(), Point::new(0.0, 0.0));
    }

    #[test]
    fn invalid_default_scale_falls_back() {
        let vp = Viewport::new(10.0, 10.0, -1.0);
        assert_eq!(vp.scale(), DEFAULT_SCALE);
    }

    #[test]
    fn visible_ranges() {
        let vp = Viewport::new(400.0, 200.0, 40.0);
        assert_eq!(vp.x_range(), -5.0..5.0);
        assert_eq!(vp.y_range(), -2.5..2.5);
    }
}

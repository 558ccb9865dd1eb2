// SPDX: CC0-1.0

//! Offscreen rasterization of a [`Frame`] into a PNG.
//!
//! Draw commands are replayed onto a `plotters` bitmap and the pixels are
//! handed to `image` for encoding.

use crate::{
    render::{Color, DrawCommand, Frame, HAlign, LineStyle, TextStyle, VAlign},
    GraphError, Number, Point,
};
use chrono::{DateTime, Local};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use plotters::{
    coord::Shift,
    prelude::{BitMapBackend, Circle, DrawingArea, IntoDrawingArea, IntoFont, PathElement, RGBAColor, ShapeStyle},
    style::text_anchor::{HPos, Pos, VPos},
};
use std::path::Path;

/// Coordinates beyond this many pixels are not drawn.
const COORD_LIMIT: Number = 1e6;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// `grapher-graph-2024-01-02_03-04-05.png` style name for an export taken at
/// `now`.
pub fn default_filename(now: DateTime<Local>) -> String {
    format!(
        "{}-graph-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "png"
    )
}

/// Rasterize and write `frame` as PNG to `path`.
pub fn save_png(frame: &Frame, pixel_ratio: Number, path: impl AsRef<Path>) -> Result<(), GraphError> {
    let path = path.as_ref();
    let image = rasterize(frame, pixel_ratio)?;
    image.save_with_format(path, ImageFormat::Png)?;
    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "exported frame"
    );
    Ok(())
}

/// Replay `frame` onto a fresh bitmap `pixel_ratio` times its size.
///
/// The bitmap starts black and has no alpha channel of its own, so
/// translucent colours blend over what is already there and every output
/// pixel is opaque. A label the font backend cannot render is skipped.
pub fn rasterize(frame: &Frame, pixel_ratio: Number) -> Result<RgbaImage, GraphError> {
    let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        pixel_ratio
    } else {
        1.0
    };
    let (width, height) = (image_len(frame.width * ratio), image_len(frame.height * ratio));
    if width == 0 || height == 0 {
        return Ok(RgbaImage::new(width, height));
    }

    let mut buf = vec![0; width as usize * height as usize * 3];
    {
        let area = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        let mut replay = Replay {
            area: &area,
            ratio,
            skipped_text: 0,
        };
        for command in &frame.commands {
            replay.command(command)?;
        }
        area.present().map_err(raster_err)?;
        if replay.skipped_text > 0 {
            tracing::warn!(count = replay.skipped_text, "labels could not be rendered");
        }
    }

    let rgb = RgbImage::from_raw(width, height, buf)
        .ok_or_else(|| GraphError::Raster(String::from("bitmap buffer has the wrong size")))?;
    Ok(DynamicImage::ImageRgb8(rgb).into_rgba8())
}

fn raster_err(err: impl std::fmt::Display) -> GraphError {
    GraphError::Raster(err.to_string())
}

fn image_len(len: Number) -> u32 {
    if len.is_finite() && len > 0.0 {
        len.ceil() as u32
    } else {
        0
    }
}

fn rgba(color: Color) -> RGBAColor {
    RGBAColor(color.r, color.g, color.b, f64::from(color.a) / 255.0)
}

struct Replay<'a, 'b> {
    area: &'a Area<'b>,
    ratio: Number,
    skipped_text: usize,
}

impl Replay<'_, '_> {
    fn px(&self, p: Point<Number>) -> Option<(i32, i32)> {
        let (x, y) = ((p.x * self.ratio).round(), (p.y * self.ratio).round());
        (x.abs() < COORD_LIMIT && y.abs() < COORD_LIMIT).then_some((x as i32, y as i32))
    }

    /// A length in frame pixels as a whole number of bitmap pixels, at least 1.
    fn len(&self, len: Number) -> u32 {
        (len * self.ratio).round().clamp(1.0, COORD_LIMIT) as u32
    }

    fn command(&mut self, command: &DrawCommand) -> Result<(), GraphError> {
        match command {
            DrawCommand::Clear(color) => self.area.fill(&rgba(*color)).map_err(raster_err),
            DrawCommand::Polyline { points, style } => self.polyline(points, *style),
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => self.circle(*center, *radius, *color),
            DrawCommand::Text {
                position,
                text,
                style,
            } => {
                self.text(*position, text, *style);
                Ok(())
            }
        }
    }

    fn polyline(&self, points: &[Point<Number>], style: LineStyle) -> Result<(), GraphError> {
        let Some(path) = points.iter().map(|p| self.px(*p)).collect::<Option<Vec<_>>>() else {
            return Ok(());
        };
        if path.len() < 2 {
            return Ok(());
        }
        let shape = ShapeStyle {
            color: rgba(style.color),
            filled: false,
            stroke_width: self.len(Number::from(style.width)),
        };
        self.area
            .draw(&PathElement::new(path, shape))
            .map_err(raster_err)
    }

    fn circle(&self, center: Point<Number>, radius: Number, color: Color) -> Result<(), GraphError> {
        let Some(center) = self.px(center) else {
            return Ok(());
        };
        if !(radius.is_finite() && radius > 0.0) {
            return Ok(());
        }
        let shape = ShapeStyle {
            color: rgba(color),
            filled: true,
            stroke_width: 1,
        };
        self.area
            .draw(&Circle::new(center, self.len(radius), shape))
            .map_err(raster_err)
    }

    fn text(&mut self, position: Point<Number>, text: &str, style: TextStyle) {
        let Some(position) = self.px(position) else {
            return;
        };
        let hpos = match style.halign {
            HAlign::Left => HPos::Left,
            HAlign::Center => HPos::Center,
            HAlign::Right => HPos::Right,
        };
        let vpos = match style.valign {
            VAlign::Top => VPos::Top,
            VAlign::Middle => VPos::Center,
            VAlign::Bottom => VPos::Bottom,
        };
        let font = ("sans-serif", f64::from(style.size) * self.ratio)
            .into_font()
            .color(&rgba(style.color))
            .pos(Pos::new(hpos, vpos));
        if let Err(err) = self.area.draw_text(text, &font, position) {
            tracing::debug!(text, %err, "skipped label");
            self.skipped_text += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::Rgba;

    const BG: Color = Color::rgb(0x1e, 0x1e, 0x1e);
    const FG: Color = Color::rgb(0xff, 0x00, 0x00);

    fn frame(commands: Vec<DrawCommand>) -> Frame {
        Frame {
            width: 40.0,
            height: 30.0,
            commands,
        }
    }

    fn px(c: Color) -> Rgba<u8> {
        Rgba([c.r, c.g, c.b, 255])
    }

    fn horizontal_line(width: f32) -> DrawCommand {
        DrawCommand::Polyline {
            points: vec![Point::new(0.0, 15.0), Point::new(20.0, 15.0), Point::new(40.0, 15.0)],
            style: LineStyle { color: FG, width },
        }
    }

    #[test]
    fn filename() {
        let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(default_filename(now), "grapher-graph-2024-01-02_03-04-05.png");
    }

    #[test]
    fn clear_fills_everything() {
        let img = rasterize(&frame(vec![DrawCommand::Clear(BG)]), 1.0).unwrap();
        assert_eq!(img.dimensions(), (40, 30));
        assert!(img.pixels().all(|p| *p == px(BG)));
    }

    #[test]
    fn empty_frames() {
        let img = rasterize(&frame(vec![]), 1.0).unwrap();
        assert!(img.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
        let img = rasterize(&Frame::default(), 1.0).unwrap();
        assert_eq!(img.dimensions(), (0, 0));
    }

    #[test]
    fn stroked_line() {
        let img = rasterize(&frame(vec![DrawCommand::Clear(BG), horizontal_line(3.0)]), 1.0).unwrap();
        assert_eq!(*img.get_pixel(30, 15), px(FG));
        assert_eq!(*img.get_pixel(10, 5), px(BG));
        assert_eq!(*img.get_pixel(10, 25), px(BG));
    }

    #[test]
    fn filled_circle() {
        let img = rasterize(
            &frame(vec![
                DrawCommand::Clear(BG),
                DrawCommand::Circle {
                    center: Point::new(20.0, 15.0),
                    radius: 4.0,
                    color: FG,
                },
            ]),
            1.0,
        )
        .unwrap();
        assert_eq!(*img.get_pixel(20, 15), px(FG));
        assert_eq!(*img.get_pixel(0, 0), px(BG));
    }

    #[test]
    fn non_finite_geometry_is_ignored() {
        let img = rasterize(
            &frame(vec![
                DrawCommand::Clear(BG),
                DrawCommand::Polyline {
                    points: vec![Point::new(0.0, 0.0), Point::new(Number::NAN, 5.0)],
                    style: LineStyle { color: FG, width: 1.0 },
                },
                DrawCommand::Circle {
                    center: Point::new(5.0, 5.0),
                    radius: Number::INFINITY,
                    color: FG,
                },
            ]),
            1.0,
        )
        .unwrap();
        assert!(img.pixels().all(|p| *p == px(BG)));
    }

    #[test]
    fn text_stays_near_its_anchor() {
        let style = TextStyle {
            color: FG,
            size: 8.0,
            halign: HAlign::Left,
            valign: VAlign::Top,
        };
        let img = rasterize(
            &frame(vec![
                DrawCommand::Clear(BG),
                DrawCommand::Text {
                    position: Point::new(2.0, 2.0),
                    text: String::from("-1.5e3 \u{2603}"),
                    style,
                },
            ]),
            1.0,
        )
        .unwrap();
        for y in 20..30 {
            for x in 0..40 {
                assert_eq!(*img.get_pixel(x, y), px(BG));
            }
        }
    }

    #[test]
    fn pixel_ratio_scales_the_bitmap() {
        let f = frame(vec![DrawCommand::Clear(BG), horizontal_line(2.0)]);
        let img = rasterize(&f, 2.0).unwrap();
        assert_eq!(img.dimensions(), (80, 60));
        assert_eq!(*img.get_pixel(60, 30), px(FG));
        assert_eq!(*img.get_pixel(60, 10), px(BG));
        // nonsense ratios fall back to 1
        assert_eq!(rasterize(&f, 0.0).unwrap().dimensions(), (40, 30));
        assert_eq!(rasterize(&f, Number::NAN).unwrap().dimensions(), (40, 30));
    }

    #[test]
    fn save_and_reload() {
        let path = std::env::temp_dir().join(format!("grapher-export-test-{}.png", std::process::id()));
        let f = frame(vec![DrawCommand::Clear(BG), horizontal_line(2.0)]);
        save_png(&f, 1.0, &path).unwrap();
        let img = image::open(&path).unwrap().to_rgba8();
        let _ = std::fs::remove_file(&path);
        assert_eq!(img, rasterize(&f, 1.0).unwrap());
    }
}

// SPDX: CC0-1.0

//! Backend-agnostic drawing primitives and the repaint scheduler.
//!
//! A paint turns the current [`Viewport`] and curve list into a [`Frame`]:
//! a flat list of [`DrawCommand`]s that fully describes the surface. No
//! drawing state survives between frames, so any backend (the PNG
//! rasterizer in [`crate::export`], a canvas, a terminal) can replay it.

use crate::{
    axis,
    graph::{Curve, Graph},
    sample::{self, Sampling},
    settings::Settings,
    viewport::Viewport,
    Number, Point,
};
use core::fmt;

/// 8-bit sRGB colour with alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: u8::MAX }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != u8::MAX {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseColorErr(pub String);

impl fmt::Display for ParseColorErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid colour '{}' (expected #rgb, #rrggbb or #rrggbbaa)",
            self.0
        )
    }
}

impl std::error::Error for ParseColorErr {}

impl core::str::FromStr for Color {
    type Err = ParseColorErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorErr(s.to_string());
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        match hex.len() {
            3 => {
                let nibble = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|n| n * 17)
                        .map_err(|_| err())
                };
                Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(err()),
        }
    }
}

/// Stroke styling; width is in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub width: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    /// Font size in pixels.
    pub size: f32,
    pub halign: HAlign,
    pub valign: VAlign,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole surface.
    Clear(Color),
    Polyline {
        points: Vec<Point<Number>>,
        style: LineStyle,
    },
    /// Filled disc, used as a marker.
    Circle {
        center: Point<Number>,
        radius: Number,
        color: Color,
    },
    Text {
        position: Point<Number>,
        text: String,
        style: TextStyle,
    },
}

/// Everything drawn in one paint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub width: Number,
    pub height: Number,
    pub commands: Vec<DrawCommand>,
}

/// Output of [`paint`]: the frame plus the per-curve samples it was built
/// from, in curve order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Painted {
    pub frame: Frame,
    pub samples: Vec<Sampling>,
}

/// Y labels are never pushed closer than this to the left edge.
const LABEL_GUTTER: Number = 48.0;
const LABEL_PAD: Number = 5.0;
const OVERLAY_MARGIN: Number = 10.0;

fn line(from: Point<Number>, to: Point<Number>, style: LineStyle) -> DrawCommand {
    DrawCommand::Polyline {
        points: vec![from, to],
        style,
    }
}

fn paint_axes(viewport: &Viewport, settings: &Settings, out: &mut Vec<DrawCommand>) {
    let (w, h) = (viewport.width(), viewport.height());
    let theme = &settings.theme;
    let origin = viewport.origin();

    let Some(step) = axis::grid_step(viewport.scale(), settings.min_grid_spacing) else {
        return;
    };
    let xs: Vec<Number> = axis::ticks(viewport.x_range(), step).collect();
    let ys: Vec<Number> = axis::ticks(viewport.y_range(), step).collect();

    let grid = LineStyle {
        color: theme.grid,
        width: 1.0,
    };
    for &x in &xs {
        let px = viewport.to_pixel(Point::new(x, 0.0)).x;
        out.push(line(Point::new(px, 0.0), Point::new(px, h), grid));
    }
    for &y in &ys {
        let py = viewport.to_pixel(Point::new(0.0, y)).y;
        out.push(line(Point::new(0.0, py), Point::new(w, py), grid));
    }

    let axis_style = LineStyle {
        color: theme.axis,
        width: 2.0,
    };
    if (0.0..=h).contains(&origin.y) {
        out.push(line(Point::new(0.0, origin.y), Point::new(w, origin.y), axis_style));
    }
    if (0.0..=w).contains(&origin.x) {
        out.push(line(Point::new(origin.x, 0.0), Point::new(origin.x, h), axis_style));
    }

    let label = |halign, valign| TextStyle {
        color: theme.label,
        size: settings.label_size,
        halign,
        valign,
    };
    // pinned to the nearest edge when the axis itself is off-screen
    let label_y = origin
        .y
        .min(h - Number::from(settings.label_size) - 2.0 * LABEL_PAD)
        .max(0.0)
        + LABEL_PAD;
    let label_x = origin.x.min(w).max(LABEL_GUTTER.min(w)) - LABEL_PAD;
    for &x in xs.iter().filter(|x| **x != 0.0) {
        out.push(DrawCommand::Text {
            position: Point::new(viewport.to_pixel(Point::new(x, 0.0)).x, label_y),
            text: axis::format_label(x, step),
            style: label(HAlign::Center, VAlign::Top),
        });
    }
    for &y in ys.iter().filter(|y| **y != 0.0) {
        out.push(DrawCommand::Text {
            position: Point::new(label_x, viewport.to_pixel(Point::new(0.0, y)).y),
            text: axis::format_label(y, step),
            style: label(HAlign::Right, VAlign::Middle),
        });
    }
    if (0.0..=w).contains(&origin.x) && (0.0..=h).contains(&origin.y) {
        out.push(DrawCommand::Text {
            position: Point::new(origin.x - LABEL_PAD, origin.y + LABEL_PAD),
            text: String::from("0"),
            style: label(HAlign::Right, VAlign::Top),
        });
    }
}

fn paint_curve(curve: &Curve, sampling: &Sampling, out: &mut Vec<DrawCommand>) {
    let style = LineStyle {
        color: curve.color,
        width: curve.line_width,
    };
    for polyline in &sampling.polylines {
        match polyline.as_slice() {
            [] => {}
            [only] => out.push(DrawCommand::Circle {
                center: *only,
                radius: Number::from(curve.line_width).max(1.5),
                color: curve.color,
            }),
            points => out.push(DrawCommand::Polyline {
                points: points.to_vec(),
                style,
            }),
        }
    }
}

fn paint_overlay(viewport: &Viewport, curves: &[Curve], settings: &Settings, out: &mut Vec<DrawCommand>) {
    if curves.is_empty() {
        return;
    }
    let style = |halign| TextStyle {
        color: settings.theme.overlay,
        size: settings.overlay_size,
        halign,
        valign: VAlign::Top,
    };
    out.push(DrawCommand::Text {
        position: Point::new(OVERLAY_MARGIN, OVERLAY_MARGIN),
        text: format!("Curves: {}", curves.len()),
        style: style(HAlign::Left),
    });
    out.push(DrawCommand::Text {
        position: Point::new(viewport.width() - OVERLAY_MARGIN, OVERLAY_MARGIN),
        text: format!("Scale: 1 unit = {}px", axis::format_number(viewport.scale())),
        style: style(HAlign::Right),
    });
}

/// Sample every curve against `viewport` and emit the full frame.
///
/// Pure: the same inputs always produce the same [`Painted`].
pub fn paint(viewport: &Viewport, curves: &[Curve], settings: &Settings, overlay: bool) -> Painted {
    let mut commands = vec![DrawCommand::Clear(settings.theme.background)];
    paint_axes(viewport, settings, &mut commands);

    let mut samples = Vec::with_capacity(curves.len());
    for curve in curves {
        let sampling = sample::sample(curve.evaluator(), viewport);
        paint_curve(curve, &sampling, &mut commands);
        samples.push(sampling);
    }

    if overlay {
        paint_overlay(viewport, curves, settings, &mut commands);
    }

    Painted {
        frame: Frame {
            width: viewport.width(),
            height: viewport.height(),
            commands,
        },
        samples,
    }
}

/// Handle for one scheduled paint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepaintRequest {
    pub id: u64,
}

/// Single in-flight repaint scheduler.
///
/// Requests made while one is pending replace it; [`RenderLoop::tick`]
/// performs at most one paint per call.
#[derive(Debug, Default)]
pub struct RenderLoop {
    pending: Option<RepaintRequest>,
    next_id: u64,
    frame: Option<Frame>,
    painted: u64,
    coalesced: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a repaint, superseding any pending one.
    pub fn request(&mut self) -> RepaintRequest {
        let req = RepaintRequest { id: self.next_id };
        self.next_id += 1;
        if let Some(old) = self.pending.replace(req) {
            self.coalesced += 1;
            tracing::trace!(superseded = old.id, by = req.id, "repaint coalesced");
        }
        req
    }

    pub const fn pending(&self) -> Option<RepaintRequest> {
        self.pending
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Run the pending paint, if any, and cache the samples on each curve.
    pub fn tick(&mut self, viewport: &Viewport, graph: &mut Graph, settings: &Settings) -> Option<&Frame> {
        let req = self.pending.take()?;
        let Painted { frame, samples } = paint(viewport, graph.curves(), settings, true);
        graph.store_samples(samples);
        self.painted += 1;
        tracing::trace!(
            id = req.id,
            commands = frame.commands.len(),
            "painted frame"
        );
        self.frame = Some(frame);
        self.frame.as_ref()
    }

    /// Most recently painted frame.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Number of paints performed.
    pub const fn painted(&self) -> u64 {
        self.painted
    }

    /// Number of requests dropped because a newer one replaced them.
    pub const fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(exprs: &[&str]) -> Graph {
        let mut graph = Graph::new();
        let settings = Settings::default();
        for e in exprs {
            graph
                .add_curve(e, settings.curve_color, settings.curve_width)
                .unwrap();
        }
        graph
    }

    fn texts(frame: &Frame) -> Vec<&str> {
        frame
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn colour_parsing() {
        assert_eq!("#bb86fc".parse::<Color>(), Ok(Color::rgb(0xbb, 0x86, 0xfc)));
        assert_eq!("fff".parse::<Color>(), Ok(Color::rgb(255, 255, 255)));
        assert_eq!("#10203040".parse::<Color>(), Ok(Color::rgba(0x10, 0x20, 0x30, 0x40)));
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gggggg".parse::<Color>().is_err());
        assert!("#ééé".parse::<Color>().is_err());
        assert_eq!(Color::rgb(0xbb, 0x86, 0xfc).to_string(), "#bb86fc");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_string(), "#01020304");
    }

    #[test]
    fn frame_starts_with_clear() {
        let vp = Viewport::new(400.0, 300.0, 40.0);
        let settings = Settings::default();
        let painted = paint(&vp, &[], &settings, true);
        assert_eq!(
            painted.frame.commands[0],
            DrawCommand::Clear(settings.theme.background)
        );
        assert_eq!(painted.frame.width, 400.0);
        // no overlay without curves
        assert!(!texts(&painted.frame).iter().any(|t| t.starts_with("Curves")));
    }

    #[test]
    fn unit_grid_labels_at_default_scale() {
        let vp = Viewport::new(400.0, 300.0, 40.0);
        let painted = paint(&vp, &[], &Settings::default(), false);
        let labels = texts(&painted.frame);
        for want in ["-4", "-1", "1", "4", "3", "-3"] {
            assert!(labels.contains(&want), "missing {want} in {labels:?}");
        }
        assert_eq!(labels.iter().filter(|t| **t == "0").count(), 1);
    }

    #[test]
    fn labels_stay_distinct_when_zoomed_in() {
        let mut vp = Viewport::new(800.0, 600.0, 40.0);
        assert!(vp.set_scale(200_000.0));
        let painted = paint(&vp, &[], &Settings::default(), false);
        let by_align = |halign| -> Vec<&str> {
            painted
                .frame
                .commands
                .iter()
                .filter_map(|c| match c {
                    DrawCommand::Text { text, style, .. } if style.halign == halign => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        };
        // x labels are centred, y labels (and the origin "0") right-aligned
        for labels in [by_align(HAlign::Center), by_align(HAlign::Right)] {
            assert!(labels.len() > 5, "{labels:?}");
            let mut unique = labels.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), labels.len(), "{labels:?}");
        }
    }

    #[test]
    fn overlay_reports_curves_and_scale() {
        let vp = Viewport::new(400.0, 300.0, 40.0);
        let graph = graph_with(&["x", "x^2"]);
        let painted = paint(&vp, graph.curves(), &Settings::default(), true);
        let labels = texts(&painted.frame);
        assert!(labels.contains(&"Curves: 2"));
        assert!(labels.contains(&"Scale: 1 unit = 40px"));

        let exported = paint(&vp, graph.curves(), &Settings::default(), false);
        assert!(!texts(&exported.frame).contains(&"Curves: 2"));
    }

    #[test]
    fn isolated_points_become_markers() {
        // defined only in a single column
        let vp = Viewport::new(400.0, 300.0, 40.0);
        let mut graph = Graph::new();
        graph.add_curve("sqrt(-abs(x))", Color::rgb(1, 2, 3), 2.0).unwrap();
        let painted = paint(&vp, graph.curves(), &Settings::default(), false);
        let circles = painted
            .frame
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { color, .. } if *color == Color::rgb(1, 2, 3)))
            .count();
        assert_eq!(circles, 1);
    }

    #[test]
    fn requests_coalesce() {
        let mut rl = RenderLoop::new();
        let mut graph = graph_with(&["0"]);
        let vp = Viewport::new(100.0, 100.0, 40.0);
        let settings = Settings::default();

        assert!(rl.tick(&vp, &mut graph, &settings).is_none());
        rl.request();
        rl.request();
        let last = rl.request();
        assert_eq!(rl.pending(), Some(last));
        assert_eq!(rl.coalesced(), 2);
        assert!(rl.tick(&vp, &mut graph, &settings).is_some());
        assert!(rl.tick(&vp, &mut graph, &settings).is_none());
        assert_eq!(rl.painted(), 1);
        assert_eq!(graph.sample_points(0).unwrap().len(), 100);
    }

    #[test]
    fn redraw_is_idempotent() {
        let mut rl = RenderLoop::new();
        let mut graph = graph_with(&["sin(x)", "1/x", "sqrt(x)"]);
        let vp = Viewport::new(320.0, 240.0, 40.0);
        let settings = Settings::default();

        rl.request();
        let first = rl.tick(&vp, &mut graph, &settings).cloned();
        rl.request();
        let second = rl.tick(&vp, &mut graph, &settings).cloned();
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}

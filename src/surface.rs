// SPDX: CC0-1.0

//! One rendering surface and everything it owns.

use crate::{
    export,
    graph::Graph,
    input::{InputController, InputEvent},
    integrate::{Method, Quadrature},
    render::{self, Color, Frame, RenderLoop},
    settings::Settings,
    viewport::Viewport,
    GraphError, Number,
};
use chrono::{DateTime, Local};
use core::ops::Range;
use image::RgbaImage;
use std::path::Path;

/// Viewport, curves, input state and repaint scheduler for a single canvas.
///
/// Every mutation that changes what would be drawn requests a repaint;
/// call [`Surface::tick`] from the frame callback to actually paint.
#[derive(Debug)]
pub struct Surface {
    settings: Settings,
    viewport: Viewport,
    graph: Graph,
    input: InputController,
    render: RenderLoop,
    pixel_ratio: Number,
}

impl Surface {
    pub fn new(width: Number, height: Number, settings: Settings) -> Self {
        Self::with_graph(width, height, settings, Graph::new())
    }

    /// Use a graph with a custom expression compiler.
    pub fn with_graph(width: Number, height: Number, settings: Settings, graph: Graph) -> Self {
        let viewport = Viewport::new(width, height, settings.default_scale);
        let input = InputController::new(settings.wheel_zoom_intensity);
        let mut render = RenderLoop::new();
        render.request();
        Self {
            settings,
            viewport,
            graph,
            input,
            render,
            pixel_ratio: 1.0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render
    }

    /// Device pixels per CSS pixel, as of the last [`Surface::resize`].
    pub const fn pixel_ratio(&self) -> Number {
        self.pixel_ratio
    }

    fn repaint_if(&mut self, changed: bool) -> bool {
        if changed {
            self.render.request();
        }
        changed
    }

    /// Route an input event. Returns `true` when the viewport changed.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        let changed = self.input.handle(&event, &mut self.viewport);
        self.repaint_if(changed)
    }

    /// Adopt a new CSS size and device pixel ratio.
    ///
    /// The viewport and painted frames stay in CSS pixels; exports are
    /// rasterized at `device_pixel_ratio` times that size. A ratio that is
    /// not a positive number counts as 1.
    pub fn resize(&mut self, width: Number, height: Number, device_pixel_ratio: Number) {
        self.viewport.resize(width, height);
        self.pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            tracing::warn!(device_pixel_ratio, "ignoring device pixel ratio");
            1.0
        };
        tracing::debug!(width, height, pixel_ratio = self.pixel_ratio, "resized surface");
        self.render.request();
    }

    pub fn zoom_in(&mut self) -> bool {
        let changed = self.viewport.zoom(self.settings.zoom_in_factor);
        self.repaint_if(changed)
    }

    pub fn zoom_out(&mut self) -> bool {
        let changed = self.viewport.zoom(self.settings.zoom_out_factor);
        self.repaint_if(changed)
    }

    /// Zoom by an arbitrary factor about the surface centre.
    pub fn zoom(&mut self, factor: Number) -> bool {
        let changed = self.viewport.zoom(factor);
        self.repaint_if(changed)
    }

    pub fn pan(&mut self, dx: Number, dy: Number) {
        self.viewport.pan(dx, dy);
        self.render.request();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        tracing::debug!(scale = self.viewport.scale(), "view reset");
        self.render.request();
    }

    /// Replace the whole viewport, e.g. after editing it field by field.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.render.request();
    }

    pub fn add_curve(&mut self, expression: &str) -> Result<usize, GraphError> {
        let (color, width) = (self.settings.curve_color, self.settings.curve_width);
        self.add_curve_styled(expression, color, width)
    }

    pub fn add_curve_styled(&mut self, expression: &str, color: Color, line_width: f32) -> Result<usize, GraphError> {
        let index = self.graph.add_curve(expression, color, line_width)?;
        self.render.request();
        Ok(index)
    }

    pub fn remove_curve(&mut self, index: usize) -> Result<(), GraphError> {
        self.graph.remove_curve(index)?;
        self.render.request();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.render.request();
    }

    pub fn set_color(&mut self, index: usize, color: Color) -> Result<(), GraphError> {
        self.graph.set_color(index, color)?;
        self.render.request();
        Ok(())
    }

    pub fn set_line_width(&mut self, index: usize, width: f32) -> Result<(), GraphError> {
        self.graph.set_line_width(index, width)?;
        self.render.request();
        Ok(())
    }

    pub fn set_last_color(&mut self, color: Color) -> Result<(), GraphError> {
        self.graph.set_last_color(color)?;
        self.render.request();
        Ok(())
    }

    pub fn set_last_line_width(&mut self, width: f32) -> Result<(), GraphError> {
        self.graph.set_last_line_width(width)?;
        self.render.request();
        Ok(())
    }

    pub fn evaluate_curve(&self, index: usize, x: Number) -> Result<Option<Number>, GraphError> {
        self.graph.evaluate_curve(index, x)
    }

    /// Roots of a curve, refined to the configured precision.
    pub fn find_roots(&self, index: usize, interval: Range<Number>) -> Result<Vec<Number>, GraphError> {
        self.graph
            .find_roots(index, interval, self.settings.root_precision)
    }

    /// Integral of a curve with the configured node count.
    pub fn integrate(&self, index: usize, a: Number, b: Number, method: Method) -> Result<Quadrature, GraphError> {
        self.graph
            .integrate(index, a, b, method, self.settings.quadrature_nodes)
    }

    /// Animation-frame callback: paints when a repaint is pending.
    pub fn tick(&mut self) -> Option<&Frame> {
        self.render
            .tick(&self.viewport, &mut self.graph, &self.settings)
    }

    /// Frame for export: same content as the live surface minus the
    /// overlay. Leaves the viewport and the scheduler untouched.
    pub fn export_frame(&self) -> Frame {
        render::paint(&self.viewport, self.graph.curves(), &self.settings, false).frame
    }

    /// The export frame rasterized at the device pixel ratio.
    pub fn export_image(&self) -> Result<RgbaImage, GraphError> {
        export::rasterize(&self.export_frame(), self.pixel_ratio)
    }

    pub fn export_png(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        export::save_png(&self.export_frame(), self.pixel_ratio, path)
    }

    pub fn export_filename(&self, now: DateTime<Local>) -> String {
        export::default_filename(now)
    }
}

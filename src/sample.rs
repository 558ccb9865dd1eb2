// SPDX: CC0-1.0

//! Per-column sampling of a function against a viewport.

use crate::{viewport::Viewport, Evaluator, Number, Point};

/// One sampled curve: pixel polylines plus the mathematical samples that
/// produced them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sampling {
    /// Connected runs of on-screen pixels, never empty.
    pub polylines: Vec<Vec<Point<Number>>>,
    /// `(x, f(x))` for every point that made it into a polyline.
    pub samples: Vec<Point<Number>>,
}

impl Sampling {
    /// Number of disjoint runs.
    pub fn segments(&self) -> usize {
        self.polylines.len()
    }
}

fn brk(current: &mut Vec<Point<Number>>, polylines: &mut Vec<Vec<Point<Number>>>) {
    if !current.is_empty() {
        polylines.push(core::mem::take(current));
    }
}

/// Walk every pixel column of `viewport` and evaluate `f` there.
///
/// Undefined, non-finite and off-screen values break the current polyline,
/// so asymptotes are never bridged by a near-vertical line.
pub fn sample<E>(f: &E, viewport: &Viewport) -> Sampling
where
    E: Evaluator + ?Sized,
{
    let columns = viewport.width().floor() as usize;
    let height = viewport.height();

    let mut out = Sampling::default();
    let mut current: Vec<Point<Number>> = Vec::new();

    for column in 0..columns {
        let px = column as Number;
        let x = viewport.to_math(Point::new(px, 0.0)).x;
        let Some(y) = f.defined_at(x) else {
            brk(&mut current, &mut out.polylines);
            continue;
        };
        let py = viewport.to_pixel(Point::new(x, y)).y;
        if !(0.0..height).contains(&py) {
            brk(&mut current, &mut out.polylines);
            continue;
        }
        current.push(Point::new(px, py));
        out.samples.push(Point::new(x, y));
    }
    brk(&mut current, &mut out.polylines);

    out
}

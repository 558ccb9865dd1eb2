// SPDX: CC0-1.0

use crate::{
    integrate::{self, Method, Quadrature},
    render::Color,
    roots,
    sample::Sampling,
    Evaluator, ExpressionEvaluator, GraphError, Interpreter, Number, Point,
};
use core::{fmt, ops::Range};

/// A plotted function with its presentation attributes.
pub struct Curve {
    expression: String,
    evaluator: Box<dyn Evaluator>,
    pub color: Color,
    /// Stroke width in pixels.
    pub line_width: f32,
    samples: Vec<Point<Number>>,
}

impl Curve {
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    /// `(x, f(x))` pairs from the last repaint, one per visible column.
    pub fn sample_points(&self) -> &[Point<Number>] {
        &self.samples
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curve")
            .field("expression", &self.expression)
            .field("color", &format_args!("{}", self.color))
            .field("line_width", &self.line_width)
            .field("samples", &self.samples.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "y = {expr} ({color}, {width}px)",
            expr = self.expression,
            color = self.color,
            width = self.line_width
        )
    }
}

fn check_width(width: f32) -> Result<(), GraphError> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidParameter {
            name: "line width",
            value: width.to_string(),
        })
    }
}

/// Ordered collection of curves plus the compiler that produced them.
pub struct Graph {
    compiler: Box<dyn ExpressionEvaluator>,
    curves: Vec<Curve>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("curves", &self.curves)
            .finish_non_exhaustive()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// A graph that compiles expressions with the bundled [`Interpreter`].
    pub fn new() -> Self {
        Self::with_compiler(Box::new(Interpreter::new()))
    }

    pub fn with_compiler(compiler: Box<dyn ExpressionEvaluator>) -> Self {
        Self {
            compiler,
            curves: Vec::new(),
        }
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    fn curve(&self, index: usize) -> Result<&Curve, GraphError> {
        self.curves.get(index).ok_or(GraphError::OutOfRangeIndex {
            index,
            len: self.curves.len(),
        })
    }

    fn curve_mut(&mut self, index: usize) -> Result<&mut Curve, GraphError> {
        let len = self.curves.len();
        self.curves
            .get_mut(index)
            .ok_or(GraphError::OutOfRangeIndex { index, len })
    }

    fn last_index(&self) -> Result<usize, GraphError> {
        self.curves
            .len()
            .checked_sub(1)
            .ok_or(GraphError::OutOfRangeIndex { index: 0, len: 0 })
    }

    /// Compile `expression` and append it. Nothing is added on failure.
    pub fn add_curve(&mut self, expression: &str, color: Color, line_width: f32) -> Result<usize, GraphError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(GraphError::EmptyExpression);
        }
        check_width(line_width)?;
        let evaluator = self.compiler.compile(expression)?;
        self.curves.push(Curve {
            expression: expression.to_string(),
            evaluator,
            color,
            line_width,
            samples: Vec::new(),
        });
        let index = self.curves.len() - 1;
        tracing::debug!(index, expression, "added curve");
        Ok(index)
    }

    pub fn remove_curve(&mut self, index: usize) -> Result<Curve, GraphError> {
        self.curve(index)?;
        let curve = self.curves.remove(index);
        tracing::debug!(index, expression = %curve.expression, "removed curve");
        Ok(curve)
    }

    pub fn clear(&mut self) {
        tracing::debug!(count = self.curves.len(), "cleared curves");
        self.curves.clear();
    }

    /// `Ok(None)` when the curve is undefined at `x`.
    pub fn evaluate_curve(&self, index: usize, x: Number) -> Result<Option<Number>, GraphError> {
        Ok(self.curve(index)?.evaluator.defined_at(x))
    }

    /// Roots in `interval`, scanning it in [`roots::DEFAULT_STEPS`] steps.
    pub fn find_roots(&self, index: usize, interval: Range<Number>, precision: Number) -> Result<Vec<Number>, GraphError> {
        let curve = self.curve(index)?;
        let step = roots::default_step(&interval);
        roots::find_roots(curve.evaluator(), interval, step, precision)
    }

    pub fn integrate(&self, index: usize, a: Number, b: Number, method: Method, n: usize) -> Result<Quadrature, GraphError> {
        integrate::integrate(self.curve(index)?.evaluator(), a, b, method, n)
    }

    pub fn set_color(&mut self, index: usize, color: Color) -> Result<(), GraphError> {
        self.curve_mut(index)?.color = color;
        Ok(())
    }

    pub fn set_line_width(&mut self, index: usize, width: f32) -> Result<(), GraphError> {
        check_width(width)?;
        self.curve_mut(index)?.line_width = width;
        Ok(())
    }

    /// Recolour the most recently added curve.
    pub fn set_last_color(&mut self, color: Color) -> Result<(), GraphError> {
        let index = self.last_index()?;
        self.set_color(index, color)
    }

    pub fn set_last_line_width(&mut self, width: f32) -> Result<(), GraphError> {
        let index = self.last_index()?;
        self.set_line_width(index, width)
    }

    pub fn sample_points(&self, index: usize) -> Result<&[Point<Number>], GraphError> {
        Ok(self.curve(index)?.sample_points())
    }

    pub(crate) fn store_samples(&mut self, samples: Vec<Sampling>) {
        for (curve, sampling) in self.curves.iter_mut().zip(samples) {
            curve.samples = sampling.samples;
        }
    }
}

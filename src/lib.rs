// SPDX: CC0-1.0

//! Function graphing and numerical analysis on a pannable, zoomable
//! Cartesian viewport.
//!
//! Expressions in one free variable `x` are compiled by an
//! [`ExpressionEvaluator`], sampled once per pixel column against a
//! [`viewport::Viewport`], and painted as backend-agnostic
//! [`render::DrawCommand`]s. Root finding and quadrature run on demand
//! against any [`Evaluator`].

pub mod axis;
pub mod error;
pub mod eval;
pub mod export;
pub mod graph;
pub mod input;
pub mod integrate;
pub mod lex;
pub mod parse;
pub mod render;
pub mod roots;
pub mod sample;
pub mod settings;
pub mod shell;
pub mod stdlib;
pub mod surface;
pub mod viewport;

use core::fmt;

pub use error::GraphError;
pub use eval::{CompileErr, Interpreter, Program};
pub use graph::{Curve, Graph};
pub use input::{InputController, InputEvent};
pub use integrate::{Method, Quadrature};
pub use render::{Color, DrawCommand, Frame, RenderLoop};
pub use settings::Settings;
pub use surface::Surface;
pub use viewport::Viewport;

pub type Number = f64;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    #[inline]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

/// A function has no real value at the requested point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Undefined;

impl fmt::Display for Undefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "undefined")
    }
}

impl std::error::Error for Undefined {}

/// A compiled function of one real variable.
///
/// Both `Err(Undefined)` and a non-finite `Ok` mean "undefined at this
/// point"; use [`Evaluator::defined_at`] to fold the two together.
pub trait Evaluator {
    fn evaluate(&self, x: Number) -> Result<Number, Undefined>;

    fn defined_at(&self, x: Number) -> Option<Number> {
        match self.evaluate(x) {
            Ok(y) if y.is_finite() => Some(y),
            _ => None,
        }
    }
}

impl<F> Evaluator for F
where
    F: Fn(Number) -> Number,
{
    fn evaluate(&self, x: Number) -> Result<Number, Undefined> {
        Ok(self(x))
    }
}

/// Turns source text into an [`Evaluator`].
pub trait ExpressionEvaluator {
    fn compile(&self, src: &str) -> Result<Box<dyn Evaluator>, CompileErr>;
}

// SPDX: CC0-1.0

//! Fixed-node quadrature rules.

use crate::{error::check_interval, Evaluator, GraphError, Number};
use core::fmt;

/// Node count used when the caller does not choose one.
pub const DEFAULT_NODES: usize = 1000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Simpson,
    Trapezoidal,
    Midpoint,
}

impl Method {
    pub const fn exhaustive() -> &'static [Method] {
        &[Self::Simpson, Self::Trapezoidal, Self::Midpoint]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Simpson => "simpson",
            Self::Trapezoidal => "trapezoidal",
            Self::Midpoint => "midpoint",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown quadrature method '{}' (expected one of ", self.0)?;
        for (i, m) in Method::exhaustive().iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{m}")?;
        }
        write!(f, ")")
    }
}

impl std::error::Error for UnknownMethod {}

impl core::str::FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "trapezoid" {
            return Ok(Self::Trapezoidal);
        }
        for m in Self::exhaustive() {
            if lower == m.name() {
                return Ok(*m);
            }
        }
        Err(UnknownMethod(s.to_string()))
    }
}

/// Result of a quadrature rule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quadrature {
    pub value: Number,
    /// Nodes actually used; Simpson rounds an odd request up.
    pub nodes: usize,
    /// Nodes where the function was undefined and contributed zero.
    pub skipped: usize,
}

impl fmt::Display for Quadrature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if self.skipped != 0 {
            write!(
                f,
                " ({skipped} of {nodes} nodes undefined)",
                skipped = self.skipped,
                nodes = self.nodes
            )?;
        }
        Ok(())
    }
}

/// Running sum that counts undefined samples instead of failing.
struct Sum<'f, E: ?Sized> {
    f: &'f E,
    total: Number,
    skipped: usize,
}

impl<E> Sum<'_, E>
where
    E: Evaluator + ?Sized,
{
    fn add(&mut self, x: Number, weight: Number) {
        match self.f.defined_at(x) {
            Some(y) => self.total += weight * y,
            None => self.skipped += 1,
        }
    }
}

/// Approximate the integral of `f` over `[a, b]` with `n` sub-intervals.
pub fn integrate<E>(f: &E, a: Number, b: Number, method: Method, n: usize) -> Result<Quadrature, GraphError>
where
    E: Evaluator + ?Sized,
{
    check_interval(a, b)?;
    if n == 0 {
        return Err(GraphError::InvalidParameter {
            name: "node count",
            value: n.to_string(),
        });
    }
    let n = match method {
        Method::Simpson if n % 2 == 1 => n + 1,
        _ => n,
    };
    let h = (b - a) / n as Number;
    let mut sum = Sum {
        f,
        total: 0.0,
        skipped: 0,
    };

    let value = match method {
        Method::Simpson => {
            sum.add(a, 1.0);
            sum.add(b, 1.0);
            for i in 1..n {
                let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
                sum.add(a + i as Number * h, weight);
            }
            sum.total * h / 3.0
        }
        Method::Trapezoidal => {
            sum.add(a, 0.5);
            sum.add(b, 0.5);
            for i in 1..n {
                sum.add(a + i as Number * h, 1.0);
            }
            sum.total * h
        }
        Method::Midpoint => {
            for i in 0..n {
                sum.add(a + (i as Number + 0.5) * h, 1.0);
            }
            sum.total * h
        }
    };

    tracing::debug!(a, b, %method, n, skipped = sum.skipped, value, "integrated");
    Ok(Quadrature {
        value,
        nodes: n,
        skipped: sum.skipped,
    })
}

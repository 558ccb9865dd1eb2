// SPDX: CC0-1.0

//! Sign-change scan with bisection refinement.
//!
//! Only roots where the function changes sign (or hits zero exactly on a
//! scan node) are found. Tangential roots such as `x^2` at `0` are not
//! detected.

use crate::{error::check_interval, Evaluator, GraphError, Number};
use core::ops::Range;

/// Scan steps used when the caller does not choose a step.
pub const DEFAULT_STEPS: usize = 200;

/// Bisection always stops after this many halvings.
pub const MAX_ITERATIONS: usize = 100;

/// Upper bound on scan nodes, so a tiny step cannot stall the caller.
const MAX_NODES: Number = 10_000_000.0;

/// Step that divides `interval` into [`DEFAULT_STEPS`] pieces.
pub fn default_step(interval: &Range<Number>) -> Number {
    (interval.end - interval.start) / DEFAULT_STEPS as Number
}

/// Find the roots of `f` in `interval`, in ascending order.
///
/// Sub-intervals where either end is undefined are skipped.
pub fn find_roots<E>(
    f: &E,
    interval: Range<Number>,
    step: Number,
    precision: Number,
) -> Result<Vec<Number>, GraphError>
where
    E: Evaluator + ?Sized,
{
    check_interval(interval.start, interval.end)?;
    if !(step.is_finite() && step > 0.0) {
        return Err(GraphError::InvalidParameter {
            name: "step",
            value: step.to_string(),
        });
    }
    if !(precision.is_finite() && precision > 0.0) {
        return Err(GraphError::InvalidParameter {
            name: "precision",
            value: precision.to_string(),
        });
    }
    let nodes = ((interval.end - interval.start) / step).ceil();
    if nodes > MAX_NODES {
        return Err(GraphError::InvalidParameter {
            name: "step",
            value: format!("{step} (more than {MAX_NODES} scan nodes)"),
        });
    }
    let nodes = nodes as usize;

    // the last node is `end` itself, never a rounded neighbour of it
    let node = |i: usize| {
        if i == nodes {
            interval.end
        } else {
            (interval.start + i as Number * step).min(interval.end)
        }
    };

    let mut roots = Vec::new();
    let mut lo = interval.start;
    let mut f_lo = f.defined_at(lo);
    if f_lo == Some(0.0) {
        roots.push(lo);
    }
    for i in 1..=nodes {
        let hi = node(i);
        if hi <= lo {
            continue;
        }
        let f_hi = f.defined_at(hi);
        if let (Some(a), Some(b)) = (f_lo, f_hi) {
            if a * b < 0.0 {
                roots.push(bisect(f, lo, hi, a, precision));
            }
        }
        if f_hi == Some(0.0) {
            roots.push(hi);
        }
        lo = hi;
        f_lo = f_hi;
    }

    tracing::debug!(
        start = interval.start,
        end = interval.end,
        step,
        found = roots.len(),
        "root scan finished"
    );
    Ok(roots)
}

/// Refine a bracket `[lo, hi]` with `f(lo) * f(hi) < 0`.
///
/// Stops when `|f(mid)| < precision`, when the midpoint is undefined, or
/// after [`MAX_ITERATIONS`] halvings.
pub fn bisect<E>(f: &E, mut lo: Number, mut hi: Number, f_lo: Number, precision: Number) -> Number
where
    E: Evaluator + ?Sized,
{
    let lo_positive = f_lo > 0.0;
    let mut mid = (lo + hi) / 2.0;
    for _ in 0..MAX_ITERATIONS {
        mid = (lo + hi) / 2.0;
        let Some(f_mid) = f.defined_at(mid) else {
            return mid;
        };
        if f_mid.abs() < precision {
            return mid;
        }
        if (f_mid > 0.0) == lo_positive {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Interpreter;

    fn roots_of(src: &str, interval: Range<Number>) -> Vec<Number> {
        let f = Interpreter::new().compile_program(src).unwrap();
        let step = default_step(&interval);
        find_roots(&f, interval, step, 1e-3).unwrap()
    }

    #[test]
    fn linear_root() {
        let roots = roots_of("x - 2", -10.0..10.0);
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn several_roots_in_order() {
        let roots = roots_of("sin(x)", -7.0..7.0);
        let expected = [
            -2.0 * core::f64::consts::PI,
            -core::f64::consts::PI,
            0.0,
            core::f64::consts::PI,
            2.0 * core::f64::consts::PI,
        ];
        assert_eq!(roots.len(), expected.len());
        for (got, want) in roots.iter().zip(expected) {
            assert!((got - want).abs() < 2e-3, "{got} vs {want}");
        }
    }

    #[test]
    fn exact_zero_on_a_node_is_reported_once() {
        // nodes land on every integer
        let roots = find_roots(&|x: Number| x - 3.0, 0.0..10.0, 1.0, 1e-6).unwrap();
        assert_eq!(roots, [3.0]);
        let roots = find_roots(&|x: Number| x, 0.0..1.0, 0.25, 1e-6).unwrap();
        assert_eq!(roots, [0.0]);
        let roots = find_roots(&|x: Number| x - 1.0, 0.0..1.0, 0.25, 1e-6).unwrap();
        assert_eq!(roots, [1.0]);
    }

    #[test]
    fn zero_at_the_end_of_the_interval() {
        // (b - a) / 200 is not representable, so a + k * step drifts off b
        for (a, b) in [(-3.0, 1.1), (0.2, 0.9), (-1.0, 0.7)] {
            let f = |x: Number| x - b;
            let roots = find_roots(&f, a..b, default_step(&(a..b)), 1e-9).unwrap();
            assert_eq!(roots, [b], "[{a}, {b}]");
        }
    }

    #[test]
    fn tangential_roots_are_missed() {
        // no scan node lands exactly on 0 here
        assert!(roots_of("x^2", -1.0..1.3).is_empty());
    }

    #[test]
    fn undefined_subintervals_are_skipped() {
        let roots = roots_of("sqrt(x) - 1", -5.0..5.0);
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 1.0).abs() < 1e-2);
    }

    #[test]
    fn invalid_arguments_fail_fast() {
        let f = |x: Number| x;
        assert!(matches!(
            find_roots(&f, 1.0..-1.0, 0.1, 1e-3),
            Err(GraphError::InvalidInterval { .. })
        ));
        assert!(matches!(
            find_roots(&f, Number::NEG_INFINITY..1.0, 0.1, 1e-3),
            Err(GraphError::InvalidInterval { .. })
        ));
        assert!(matches!(
            find_roots(&f, -1.0..1.0, 0.0, 1e-3),
            Err(GraphError::InvalidParameter { name: "step", .. })
        ));
        assert!(matches!(
            find_roots(&f, -1.0..1.0, 1e-12, 1e-3),
            Err(GraphError::InvalidParameter { name: "step", .. })
        ));
        assert!(matches!(
            find_roots(&f, -1.0..1.0, 0.1, -1.0),
            Err(GraphError::InvalidParameter { name: "precision", .. })
        ));
    }

    #[test]
    fn bisection_terminates_on_a_pole() {
        // 1/x changes sign across 0 without a root; the cap still ends it
        let mid = bisect(&|x: Number| 1.0 / x, -1.0, 0.5, -1.0, 1e-9);
        assert!(mid.abs() < 1e-6);
    }
}

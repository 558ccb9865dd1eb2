// SPDX: CC0-1.0

use crate::{eval::CompileErr, Number};
use thiserror::Error;

/// Errors surfaced by the graph and its numeric queries.
///
/// Per-point evaluation failures never show up here; they become gaps in a
/// sampled curve or skipped quadrature nodes.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("expression is empty")]
    EmptyExpression,

    #[error("failed to compile expression")]
    Compile(#[from] CompileErr),

    #[error("invalid interval [{start}, {end}]: bounds must be finite with start < end")]
    InvalidInterval { start: Number, end: Number },

    #[error("no curve at index {index} (curve count is {len})")]
    OutOfRangeIndex { index: usize, len: usize },

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("failed to rasterize frame: {0}")]
    Raster(String),

    #[error("failed to export image")]
    Export(#[from] image::ImageError),
}

/// Reject intervals that would make a scan or quadrature loop meaningless.
pub(crate) fn check_interval(start: Number, end: Number) -> Result<(), GraphError> {
    if start.is_finite() && end.is_finite() && start < end {
        Ok(())
    } else {
        tracing::warn!(start, end, "rejected interval");
        Err(GraphError::InvalidInterval { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_validation() {
        assert!(check_interval(-1.0, 1.0).is_ok());
        assert!(check_interval(1.0, 1.0).is_err());
        assert!(check_interval(2.0, 1.0).is_err());
        assert!(check_interval(Number::NAN, 1.0).is_err());
        assert!(check_interval(0.0, Number::INFINITY).is_err());
    }

    #[test]
    fn messages() {
        let err = GraphError::OutOfRangeIndex { index: 3, len: 1 };
        assert_eq!(err.to_string(), "no curve at index 3 (curve count is 1)");
        let err = GraphError::InvalidInterval {
            start: 2.0,
            end: 1.0,
        };
        assert!(err.to_string().starts_with("invalid interval [2, 1]"));
    }
}

//! Error types for the metrics engine.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Errors raised by statistics, metrics and spectral estimation.
///
/// The type is `Clone + PartialEq` so that per-step and per-candidate
/// failures can be stored inside otherwise successful result tables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// Malformed input detected before any numeric work.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Compared arrays do not share a shape.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Statistic has no defined value (all-missing input, zero variance).
    #[error("Undefined statistic: {0}")]
    UndefinedStatistic(String),

    /// Valid but unusable analysis outcome (e.g. SNR never crosses its threshold).
    #[error("Numerically degenerate: {0}")]
    NumericDegenerate(String),
}

impl MetricsError {
    /// Create a shape mismatch error.
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an undefined statistic error.
    pub fn undefined(message: impl Into<String>) -> Self {
        Self::UndefinedStatistic(message.into())
    }

    /// True for errors in the `InvalidInput` category (including shape mismatches).
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::ShapeMismatch { .. })
    }

    /// True for `UndefinedStatistic`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::UndefinedStatistic(_))
    }
}

/// Fail with `ShapeMismatch` unless both shapes are identical.
pub(crate) fn ensure_same_shape(expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected != actual {
        return Err(MetricsError::shape_mismatch(expected, actual));
    }
    Ok(())
}

//! Pointwise and gradient error metrics for reconstructed fields.
//!
//! This module provides tools for:
//! - NaN-aware descriptive statistics (mean, population std, percentiles)
//! - Per-field error metrics (mean-removed MSE, nRMSE, gradient MSE)
//! - Per-time-step error series and multi-method summary tables
//!
//! # Mathematical Background
//!
//! For a reference field `r` and a reconstruction `p` on the same grid:
//!
//! ```text
//! mse(r, p)   = mean( ((r - r̄) - (p - p̄))² )
//! nrmse(r, p) = sqrt(mse(r, p)) / σ(r)
//! ```
//!
//! where the means and the population standard deviation `σ` skip missing
//! points. The gradient variant applies `mse` to `|∇r|` and `|∇p|` from the
//! Sobel operator.
//!
//! # Example
//!
//! ```
//! use ndarray::Array3;
//! use ssh_eval::analysis::{Aggregator, Metric};
//!
//! let truth = Array3::from_shape_fn((10, 16, 16), |(t, r, c)| {
//!     ((r as f64 + t as f64) * 0.4).sin() * (c as f64 * 0.2).cos()
//! });
//! let reconstruction = &truth * 0.9;
//!
//! let series = Aggregator::new(Metric::Nrmse)
//!     .error_series(truth.view(), reconstruction.view())
//!     .unwrap();
//! let summary = series.summary().unwrap();
//! assert!((summary.mean - 0.1).abs() < 1e-9);
//! ```

mod aggregate;
mod metrics;
pub mod stats;

pub use aggregate::{
    Aggregator, ErrorTimeSeries, LOWER_PERCENTILE, SummaryRow, SummaryStats, SummaryTable,
    UPPER_PERCENTILE,
};
pub use metrics::{
    Metric, ReconstructionScores, gradient_mse, mse, nrmse, relative_improvement,
};
pub use stats::{NanStats, nan_count, nan_mean, nan_percentile, nan_std, nan_var};

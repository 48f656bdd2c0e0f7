//! # ssh-eval
//!
//! Error metrics and spectral effective-resolution scores for reconstructed
//! sea surface height fields.
//!
//! This crate provides the building blocks for scoring a gridded
//! reconstruction against a reference field:
//! - NaN-aware statistics (mean, population std, percentiles)
//! - Sobel gradient operator with explicit boundary handling
//! - Pointwise and gradient error metrics (MSE, nRMSE, gradient MSE)
//! - Per-time-step error series and multi-method summary tables
//! - Radially averaged power spectra and the wavenumber where the
//!   spectral signal-to-noise ratio falls below a threshold
//! - Plain-text report output
//!
//! Fields are `ndarray` arrays with missing values stored as `NaN`;
//! sequences are indexed (time, row, column).
//!
//! Enable the `parallel` feature for a rayon-backed error series.

pub mod analysis;
pub mod error;
pub mod io;
pub mod operators;
pub mod spectral;
pub mod types;

// Re-export main types for convenience
pub use analysis::{
    Aggregator, ErrorTimeSeries, Metric, NanStats, ReconstructionScores, SummaryRow, SummaryStats,
    SummaryTable, gradient_mse, mse, nan_mean, nan_percentile, nan_std, nrmse,
    relative_improvement,
};
pub use error::{MetricsError, Result};
pub use io::{ReportError, write_error_series, write_spectral_curve, write_summary_table};
pub use operators::{BoundaryPolicy, GradientOperator, GradientOrder, central_gradient};
pub use spectral::{
    Crossing, CrossingDirection, NanPolicy, NoCrossing, RadialBinning, ResolutionPoint, SnrAnalysis, SpectralConfig,
    SpectralCurve, SpectralEstimator, SpectralScore, Window, find_crossing, rapsd, rapsd_stack,
    snr_analysis, snr_analysis_2d,
};
pub use types::{Field, FieldSequence, GridShape, GridSpacing, Wavenumber};

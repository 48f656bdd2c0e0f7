//! Error metrics between a reference field and a reconstruction.
//!
//! Provides per-field scalar scores (mean-removed MSE, nRMSE, gradient MSE)
//! plus whole-stack scores for a complete reconstruction.
//!
//! # Mean removal
//!
//! [`mse`] subtracts each field's own spatial mean before differencing:
//!
//! ```text
//! mse = mean( ((ref - mean(ref)) - (pred - mean(pred)))² )
//! ```
//!
//! A constant offset between reference and reconstruction therefore scores
//! zero. This matches the historical scoring of SSH reconstructions and is
//! kept for comparability, even though it hides bias errors. Use
//! [`ReconstructionScores`] for the raw (bias-sensitive) MSE.

use std::fmt;

use ndarray::{ArrayView2, ArrayView3, Axis, Zip};

use super::stats::{nan_mean, nan_std};
use crate::error::{MetricsError, Result, ensure_same_shape};
use crate::operators::{GradientOperator, gradient_norm};

/// Mean-removed mean squared error over the non-missing points.
///
/// # Errors
///
/// - `ShapeMismatch` if the fields differ in shape
/// - `UndefinedStatistic` if either field, or their overlap, is all-missing
pub fn mse(reference: ArrayView2<f64>, candidate: ArrayView2<f64>) -> Result<f64> {
    ensure_same_shape(reference.shape(), candidate.shape())?;

    let ref_mean = nan_mean(reference.iter())?;
    let cand_mean = nan_mean(candidate.iter())?;

    let mut squared = Vec::with_capacity(reference.len());
    Zip::from(&reference)
        .and(&candidate)
        .for_each(|&r, &p| squared.push(((r - ref_mean) - (p - cand_mean)).powi(2)));

    nan_mean(&squared)
        .map_err(|_| MetricsError::undefined("reference and candidate share no present values"))
}

/// Normalized RMSE: `sqrt(mse) / std(reference)`.
///
/// # Errors
///
/// `UndefinedStatistic` if the reference has zero spread (constant field);
/// the ratio would otherwise be `inf` or `NaN`.
pub fn nrmse(reference: ArrayView2<f64>, candidate: ArrayView2<f64>) -> Result<f64> {
    let error = mse(reference, candidate)?;
    let spread = nan_std(reference.iter())?;

    if spread == 0.0 {
        return Err(MetricsError::undefined(
            "nRMSE of a constant reference field (zero standard deviation)",
        ));
    }
    Ok(error.sqrt() / spread)
}

/// Mean-removed MSE between the gradient magnitudes of both fields.
pub fn gradient_mse(
    reference: ArrayView2<f64>,
    candidate: ArrayView2<f64>,
    operator: &GradientOperator,
) -> Result<f64> {
    ensure_same_shape(reference.shape(), candidate.shape())?;
    let grad_ref = operator.magnitude(reference);
    let grad_cand = operator.magnitude(candidate);
    mse(grad_ref.view(), grad_cand.view())
}

/// Per-field error metric selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Mean-removed MSE
    Mse,
    /// Normalized RMSE
    Nrmse,
    /// Mean-removed MSE of the gradient magnitude
    GradientMse,
}

impl Metric {
    /// Score one reference/candidate pair.
    pub fn evaluate(
        &self,
        reference: ArrayView2<f64>,
        candidate: ArrayView2<f64>,
        operator: &GradientOperator,
    ) -> Result<f64> {
        match self {
            Self::Mse => mse(reference, candidate),
            Self::Nrmse => nrmse(reference, candidate),
            Self::GradientMse => gradient_mse(reference, candidate, operator),
        }
    }

    /// Short name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mse => "mse",
            Self::Nrmse => "nrmse",
            Self::GradientMse => "grad_mse",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whole-stack scores of a reconstruction against the truth.
///
/// Unlike [`mse`], these are raw (not mean-removed) and use central
/// differences for the gradient, over every time step at once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReconstructionScores {
    /// Raw mean squared error: mean((truth - rec)²)
    pub mse: f64,
    /// MSE of the gradient norms: mean((|∇truth| - |∇rec|)²)
    pub mse_grad: f64,
    /// Mean squared gradient norm of the reconstruction: mean(|∇rec|²)
    pub mean_grad: f64,
}

impl ReconstructionScores {
    /// Compute scores over (time, row, column) stacks.
    ///
    /// Missing values are skipped in every mean.
    pub fn compute(truth: ArrayView3<f64>, reconstruction: ArrayView3<f64>) -> Result<Self> {
        ensure_same_shape(truth.shape(), reconstruction.shape())?;
        if truth.is_empty() {
            return Err(MetricsError::invalid("empty field sequence"));
        }

        let squared_error: Vec<f64> = truth
            .iter()
            .zip(reconstruction.iter())
            .map(|(t, r)| (t - r).powi(2))
            .collect();
        let mse = nan_mean(&squared_error)?;

        let mut grad_error = Vec::with_capacity(truth.len());
        let mut grad_energy = Vec::with_capacity(truth.len());
        for (t, r) in truth
            .axis_iter(Axis(0))
            .zip(reconstruction.axis_iter(Axis(0)))
        {
            let gt = gradient_norm(t)?;
            let gr = gradient_norm(r)?;
            Zip::from(&gt).and(&gr).for_each(|&a, &b| {
                grad_error.push((a - b).powi(2));
                grad_energy.push(b * b);
            });
        }

        Ok(Self {
            mse,
            mse_grad: nan_mean(&grad_error)?,
            mean_grad: nan_mean(&grad_energy)?,
        })
    }
}

/// Relative change of a mean score from a baseline method to a candidate.
///
/// `|mean(baseline) - mean(candidate)| / mean(baseline)`, with missing
/// entries skipped in both means.
///
/// # Errors
///
/// `UndefinedStatistic` if either series is all-missing or the baseline mean is zero.
pub fn relative_improvement(baseline: &[f64], candidate: &[f64]) -> Result<f64> {
    let base = nan_mean(baseline)?;
    let cand = nan_mean(candidate)?;
    if base == 0.0 {
        return Err(MetricsError::undefined(
            "relative improvement against a zero baseline",
        ));
    }
    Ok((base - cand).abs() / base)
}

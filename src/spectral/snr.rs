//! Wavenumber-dependent signal-to-noise ratio and effective resolution.
//!
//! The error field `candidate - truth` and the truth itself are both reduced
//! to stack-averaged RAPSD curves. Their ratio, bin by bin, is the score
//! curve, and the first wavenumber where it passes the threshold (falling
//! for signal-to-noise, rising for error-to-signal) is the method's
//! effective resolution.

use std::fmt;

use ndarray::{ArrayView2, ArrayView3, Axis};
use tracing::debug;

use super::rapsd::{SpectralCurve, SpectralEstimator};
use super::{SpectralConfig, SpectralScore};
use crate::error::{MetricsError, Result, ensure_same_shape};
use crate::types::{GridShape, Wavenumber};

/// Where a score curve reaches its threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolutionPoint {
    /// Crossing wavenumber (cycles per unit length)
    pub wavenumber: Wavenumber,
}

impl ResolutionPoint {
    /// Physical length scale `1 / k` of the crossing.
    pub fn wavelength(&self) -> f64 {
        self.wavenumber.wavelength()
    }
}

impl fmt::Display for ResolutionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k = {:.4e}, λ = {:.1}", self.wavenumber.value(), self.wavelength())
    }
}

/// Why no crossing was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoCrossing {
    /// No value lies below the threshold.
    AlwaysAbove,
    /// No value lies above the threshold.
    AlwaysBelow,
    /// The curve passes the threshold, but only in the other direction.
    OppositeDirection,
    /// The curve has no points.
    EmptyCurve,
}

/// Direction in which a score curve must pass its threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossingDirection {
    /// From above the threshold to at or below it.
    Falling,
    /// From below the threshold to at or above it.
    Rising,
}

impl CrossingDirection {
    /// The other direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Falling => Self::Rising,
            Self::Rising => Self::Falling,
        }
    }
}

/// Outcome of a threshold search on a score curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Crossing {
    /// The curve reaches the threshold here.
    Found(ResolutionPoint),
    /// The curve never reaches the threshold.
    NotFound(NoCrossing),
}

impl Crossing {
    /// The crossing point, if any.
    pub fn point(&self) -> Option<ResolutionPoint> {
        match self {
            Self::Found(p) => Some(*p),
            Self::NotFound(_) => None,
        }
    }

    /// True if a crossing was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Treat "no crossing" as a `NumericDegenerate` error.
    pub fn into_result(self) -> Result<ResolutionPoint> {
        match self {
            Self::Found(p) => Ok(p),
            Self::NotFound(reason) => Err(MetricsError::NumericDegenerate(format!(
                "score curve never crosses its threshold ({:?})",
                reason
            ))),
        }
    }
}

/// First wavenumber at which `curve` passes `threshold` in `direction`.
///
/// Scans upward in wavenumber for the first pair of neighbours that passes
/// the threshold the requested way and interpolates linearly in `k` between
/// them. A point exactly on the threshold counts as reached. An infinite
/// neighbour snaps the crossing to the finite one. No extrapolation past
/// either end.
///
/// # Errors
///
/// `InvalidInput` if `threshold` is not finite.
pub fn find_crossing(
    curve: &SpectralCurve,
    threshold: f64,
    direction: CrossingDirection,
) -> Result<Crossing> {
    if !threshold.is_finite() {
        return Err(MetricsError::invalid(format!(
            "crossing threshold must be finite, got {}",
            threshold
        )));
    }

    let k = curve.wavenumbers();
    let v = curve.values();
    if v.is_empty() {
        return Ok(Crossing::NotFound(NoCrossing::EmptyCurve));
    }

    if let Some(wavenumber) = first_crossing(k, v, threshold, direction) {
        return Ok(Crossing::Found(ResolutionPoint {
            wavenumber: Wavenumber::new(wavenumber),
        }));
    }

    let reason = if first_crossing(k, v, threshold, direction.reversed()).is_some() {
        NoCrossing::OppositeDirection
    } else if v.iter().any(|&x| x > threshold) {
        NoCrossing::AlwaysAbove
    } else {
        NoCrossing::AlwaysBelow
    };
    Ok(Crossing::NotFound(reason))
}

fn first_crossing(k: &[f64], v: &[f64], threshold: f64, direction: CrossingDirection) -> Option<f64> {
    // Signed distance, positive on the side the curve must leave
    let side = |x: f64| match direction {
        CrossingDirection::Falling => x - threshold,
        CrossingDirection::Rising => threshold - x,
    };

    (0..v.len().saturating_sub(1)).find_map(|i| {
        let (d0, d1) = (side(v[i]), side(v[i + 1]));
        if d0 > 0.0 && d1 == 0.0 {
            Some(k[i + 1])
        } else if d0 >= 0.0 && d1 < 0.0 {
            let frac = if d0.is_infinite() {
                1.0
            } else if d1.is_infinite() {
                0.0
            } else {
                d0 / (d0 - d1)
            };
            Some(k[i] + frac * (k[i + 1] - k[i]))
        } else {
            None
        }
    })
}

/// Spectra, score curve and crossing for one candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct SnrAnalysis {
    /// RAPSD of `candidate - truth`
    pub error_spectrum: SpectralCurve,
    /// RAPSD of the truth
    pub signal_spectrum: SpectralCurve,
    /// Score per wavenumber (see [`SpectralScore`])
    pub score: SpectralCurve,
    /// Convention used for `score`
    pub convention: SpectralScore,
    /// Threshold searched for
    pub threshold: f64,
    /// Where `score` reaches `threshold`
    pub resolution: Crossing,
}

/// Spectral signal-to-noise analysis over (time, row, column) stacks.
///
/// Power is averaged over time before the ratio is taken.
///
/// # Errors
///
/// - `ShapeMismatch`/`InvalidInput` for mismatched or empty stacks and bad config
/// - `InvalidInput` for missing values under `NanPolicy::Reject`
pub fn snr_analysis(
    candidate: ArrayView3<f64>,
    truth: ArrayView3<f64>,
    config: &SpectralConfig,
) -> Result<SnrAnalysis> {
    ensure_same_shape(truth.shape(), candidate.shape())?;
    if truth.len_of(Axis(0)) == 0 {
        return Err(MetricsError::invalid("empty field sequence"));
    }

    let estimator = SpectralEstimator::new(GridShape::of_stack(&truth), config.clone())?;
    let error = &candidate - &truth;

    let error_power = estimator.binned_power_stack(error.view())?;
    let signal_power = estimator.binned_power_stack(truth)?;

    let mut k_score = Vec::new();
    let mut score = Vec::new();
    for ((&k, &e), &s) in estimator
        .bin_wavenumbers()
        .iter()
        .zip(&error_power)
        .zip(&signal_power)
    {
        if k <= 0.0 || e.is_nan() || s.is_nan() || (e == 0.0 && s == 0.0) {
            continue;
        }
        let value = match config.score {
            SpectralScore::SignalToNoise => s / e,
            SpectralScore::ErrorToSignal => e / s,
        };
        k_score.push(k);
        score.push(value);
    }
    let score = SpectralCurve::new(k_score, score)?;
    let resolution = find_crossing(&score, config.threshold, config.score.crossing_direction())?;

    debug!(
        steps = truth.len_of(Axis(0)),
        bins = score.len(),
        convention = ?config.score,
        ?resolution,
        "snr analysis complete"
    );

    Ok(SnrAnalysis {
        error_spectrum: estimator.to_curve(&error_power)?,
        signal_spectrum: estimator.to_curve(&signal_power)?,
        score,
        convention: config.score,
        threshold: config.threshold,
        resolution,
    })
}

/// [`snr_analysis`] for a single field pair.
pub fn snr_analysis_2d(
    candidate: ArrayView2<f64>,
    truth: ArrayView2<f64>,
    config: &SpectralConfig,
) -> Result<SnrAnalysis> {
    snr_analysis(
        candidate.insert_axis(Axis(0)),
        truth.insert_axis(Axis(0)),
        config,
    )
}

//! Spectral analysis of reconstruction error.
//!
//! Computes radially averaged power spectral densities of fields and the
//! wavenumber-dependent signal-to-noise ratio between a reconstruction and
//! the truth. The wavenumber where the SNR falls to a threshold (0.5 by
//! default) is the effective resolution of the reconstruction.
//!
//! # Example
//!
//! ```
//! use ndarray::Array3;
//! use ssh_eval::spectral::{SpectralConfig, Window, snr_analysis};
//! use ssh_eval::types::GridSpacing;
//!
//! // Broadband field on a 2 km grid
//! let truth = Array3::from_shape_fn((3, 32, 32), |(t, r, c)| {
//!     (0.37 * c as f64 + t as f64).sin() + (0.23 * r as f64).cos()
//! });
//! let candidate = &truth * 0.9;
//!
//! let config = SpectralConfig::new(GridSpacing::new(2.0).unwrap())
//!     .with_window(Window::Rectangular);
//! let analysis = snr_analysis(candidate.view(), truth.view(), &config).unwrap();
//!
//! // The error is a tenth of the signal at every scale: no loss of resolution
//! assert!(analysis.resolution.point().is_none());
//! ```

mod fft;
mod rapsd;
mod snr;

pub use fft::{Fft2d, fftfreq};
pub use rapsd::{RadialBinning, SpectralCurve, SpectralEstimator, rapsd, rapsd_stack};
pub use snr::{
    Crossing, CrossingDirection, NoCrossing, ResolutionPoint, SnrAnalysis, find_crossing,
    snr_analysis, snr_analysis_2d,
};

use crate::error::{MetricsError, Result};
use crate::types::GridSpacing;

/// Default score threshold defining the effective resolution.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Taper applied before the transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Window {
    /// No taper.
    Rectangular,
    /// Separable symmetric Hann taper.
    #[default]
    Hann,
}

/// Handling of missing values before the transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NanPolicy {
    /// Fail with `InvalidInput`.
    #[default]
    Reject,
    /// Replace missing values with the mean of the present ones.
    FillMean,
    /// Replace missing values with zero.
    FillZero,
}

/// Orientation of the spectral score curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpectralScore {
    /// Signal power over error power; large at well-resolved scales.
    #[default]
    SignalToNoise,
    /// Error power over signal power; small at well-resolved scales.
    ErrorToSignal,
}

impl SpectralScore {
    /// Direction in which the score leaves the well-resolved regime.
    pub fn crossing_direction(self) -> CrossingDirection {
        match self {
            Self::SignalToNoise => CrossingDirection::Falling,
            Self::ErrorToSignal => CrossingDirection::Rising,
        }
    }
}

/// Configuration of the spectral estimator.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralConfig {
    /// Physical grid spacing (same along both axes)
    pub spacing: GridSpacing,
    /// Taper applied to every field
    pub window: Window,
    /// Subtract the field mean before windowing
    pub remove_mean: bool,
    /// Radial bin layout
    pub binning: RadialBinning,
    /// Missing-value handling
    pub nan_policy: NanPolicy,
    /// Score value defining the resolution crossing
    pub threshold: f64,
    /// Orientation of the score curve
    pub score: SpectralScore,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self::new(GridSpacing::UNIT)
    }
}

impl SpectralConfig {
    /// Default configuration for a grid with the given spacing.
    pub fn new(spacing: GridSpacing) -> Self {
        Self {
            spacing,
            window: Window::default(),
            remove_mean: true,
            binning: RadialBinning::default(),
            nan_policy: NanPolicy::default(),
            threshold: DEFAULT_THRESHOLD,
            score: SpectralScore::default(),
        }
    }

    /// Set the taper.
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Set the radial binning.
    pub fn with_binning(mut self, binning: RadialBinning) -> Self {
        self.binning = binning;
        self
    }

    /// Set the missing-value policy.
    pub fn with_nan_policy(mut self, nan_policy: NanPolicy) -> Self {
        self.nan_policy = nan_policy;
        self
    }

    /// Set the crossing threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the score orientation.
    pub fn with_score(mut self, score: SpectralScore) -> Self {
        self.score = score;
        self
    }

    /// Keep the field mean (it then lands in the dropped DC bin and leaks
    /// through the window).
    pub fn without_mean_removal(mut self) -> Self {
        self.remove_mean = false;
        self
    }

    /// Check bin parameters and threshold.
    pub fn validate(&self) -> Result<()> {
        self.binning.validate()?;
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(MetricsError::invalid(format!(
                "threshold must be finite and positive, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

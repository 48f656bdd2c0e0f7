//! Radially averaged power spectral density (RAPSD).
//!
//! The estimator is an explicit two-stage pipeline:
//!
//! 1. Prepare the field (missing-value policy, mean removal, window) and take
//!    its periodogram `|F|² / (rows * cols)` with [`Fft2d`].
//! 2. Average the periodogram over rings of equal radial wavenumber
//!    `k = sqrt(fx² + fy²)`, in cycles per unit of the grid spacing.
//!
//! # Bin conventions
//!
//! Let `L` be the longer grid axis and `k_f = 1 / (L d)` its fundamental
//! wavenumber. Radii are measured in units of `k_f`, `ρ = k / k_f`.
//!
//! - [`RadialBinning::Linear`] with width `w`: bin `b` covers
//!   `[(b - ½) w, (b + ½) w)` and is reported at `k = b w k_f`. A radius
//!   exactly on an edge belongs to the upper bin.
//! - [`RadialBinning::Log`] with `n` bins per decade: bin `j` covers
//!   `[10^(j/n), 10^((j+1)/n))` and is reported at the geometric centre.
//!
//! Only radii `ρ < L/2` (inside the Nyquist circle of the longer axis)
//! contribute. The zero-wavenumber bin and bins that receive no frequency
//! are left out of the resulting [`SpectralCurve`].

use std::f64::consts::PI;

use ndarray::{Array2, ArrayView2, ArrayView3, Axis};
use tracing::debug;

use super::fft::{Fft2d, fft_index};
use super::{NanPolicy, SpectralConfig, Window};
use crate::analysis::stats::nan_mean;
use crate::error::{MetricsError, Result, ensure_same_shape};
use crate::types::{GridShape, GridSpacing};

/// How frequencies are grouped into radial bins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RadialBinning {
    /// Equal-width bins, `width` in units of the fundamental wavenumber.
    Linear { width: f64 },
    /// Logarithmically spaced bins starting at the fundamental wavenumber.
    Log { bins_per_decade: f64 },
}

impl Default for RadialBinning {
    fn default() -> Self {
        Self::Linear { width: 1.0 }
    }
}

impl RadialBinning {
    /// Check that the bin parameter is finite and positive.
    pub fn validate(&self) -> Result<()> {
        let (name, value) = match *self {
            Self::Linear { width } => ("bin width", width),
            Self::Log { bins_per_decade } => ("bins per decade", bins_per_decade),
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(MetricsError::invalid(format!(
                "{} must be finite and positive, got {}",
                name, value
            )));
        }
        Ok(())
    }

    /// Number of bins inside the Nyquist circle of `shape`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the parameter is invalid or the layout needs more
    /// bins than the grid has frequencies.
    pub fn bin_count(&self, shape: GridShape) -> Result<usize> {
        self.validate()?;
        let rho_max = shape.longest_axis() as f64 / 2.0;
        let n = match *self {
            Self::Linear { width } => (rho_max / width).ceil(),
            Self::Log { bins_per_decade } => (bins_per_decade * rho_max.log10()).ceil().max(0.0),
        };
        let limit = shape.total_points();
        if n > limit as f64 {
            return Err(MetricsError::invalid(format!(
                "{:?} needs {:e} bins but a {} grid has only {} frequencies",
                self, n, shape, limit
            )));
        }
        Ok(n as usize)
    }
}

/// A 1-D curve over strictly increasing, strictly positive wavenumbers.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralCurve {
    wavenumbers: Vec<f64>,
    values: Vec<f64>,
}

impl SpectralCurve {
    /// Create a curve, checking its invariants.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the lengths differ, the wavenumbers are not
    /// strictly positive and strictly increasing, or a value is `NaN`.
    pub fn new(wavenumbers: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if wavenumbers.len() != values.len() {
            return Err(MetricsError::invalid(format!(
                "{} wavenumbers for {} values",
                wavenumbers.len(),
                values.len()
            )));
        }
        if wavenumbers.iter().any(|&k| k <= 0.0 || !k.is_finite()) {
            return Err(MetricsError::invalid("wavenumbers must be finite and positive"));
        }
        if wavenumbers.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MetricsError::invalid("wavenumbers must be strictly increasing"));
        }
        if values.iter().any(|v| v.is_nan()) {
            return Err(MetricsError::invalid("curve values must not be NaN"));
        }
        Ok(Self {
            wavenumbers,
            values,
        })
    }

    /// Wavenumbers in cycles per unit length.
    pub fn wavenumbers(&self) -> &[f64] {
        &self.wavenumbers
    }

    /// Values at each wavenumber.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Wavelengths `1 / k`, for axis labelling.
    pub fn wavelengths(&self) -> Vec<f64> {
        self.wavenumbers.iter().map(|k| 1.0 / k).collect()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(wavenumber, value)` pairs in increasing wavenumber.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavenumbers.iter().copied().zip(self.values.iter().copied())
    }

    /// Wavenumber of the largest finite value.
    pub fn peak_wavenumber(&self) -> Option<f64> {
        self.iter()
            .filter(|(_, v)| v.is_finite())
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(k, _)| k)
    }
}

/// Precomputed ring membership for one grid shape and binning.
#[derive(Clone, Debug)]
struct RadialAverager {
    /// Bin index per periodogram entry, row-major; `None` if excluded
    assignment: Vec<Option<usize>>,
    /// Reported wavenumber per bin
    centers: Vec<f64>,
    /// Number of frequencies per bin
    counts: Vec<usize>,
}

impl RadialAverager {
    fn new(shape: GridShape, spacing: GridSpacing, binning: RadialBinning) -> Result<Self> {
        let n_bins = binning.bin_count(shape)?;
        let (rows, cols) = shape.as_tuple();
        let longest = shape.longest_axis() as f64;
        let k_f = 1.0 / (longest * spacing.value());
        let rho_max = longest / 2.0;

        // Radius in units of the fundamental, from integer indices to keep
        // edge cases exact on square grids.
        let row_scale = longest / rows as f64;
        let col_scale = longest / cols as f64;
        let row_idx = fft_index(rows);
        let col_idx = fft_index(cols);

        let centers: Vec<f64> = match binning {
            RadialBinning::Linear { width } => (0..n_bins).map(|b| b as f64 * width * k_f).collect(),
            RadialBinning::Log { bins_per_decade } => (0..n_bins)
                .map(|j| k_f * 10f64.powf((j as f64 + 0.5) / bins_per_decade))
                .collect(),
        };

        let mut assignment = Vec::with_capacity(rows * cols);
        let mut counts = vec![0usize; n_bins];
        for &iy in &row_idx {
            for &ix in &col_idx {
                let rho = (iy as f64 * row_scale).hypot(ix as f64 * col_scale);
                let bin = (if rho == 0.0 || rho >= rho_max {
                    None
                } else {
                    match binning {
                        RadialBinning::Linear { width } => {
                            let b = (rho / width + 0.5).floor() as usize;
                            (b > 0).then_some(b)
                        }
                        RadialBinning::Log { bins_per_decade } if rho >= 1.0 => {
                            Some((bins_per_decade * rho.log10()).floor() as usize)
                        }
                        RadialBinning::Log { .. } => None,
                    }
                })
                .filter(|&b| b < n_bins);

                if let Some(b) = bin {
                    counts[b] += 1;
                }
                assignment.push(bin);
            }
        }

        Ok(Self {
            assignment,
            centers,
            counts,
        })
    }

    /// Mean power per bin; `NaN` for empty bins.
    fn average(&self, power: &Array2<f64>) -> Vec<f64> {
        let mut sums = vec![0.0; self.centers.len()];
        for (bin, &p) in self.assignment.iter().zip(power.iter()) {
            if let Some(b) = bin {
                sums[*b] += p;
            }
        }
        sums.iter()
            .zip(&self.counts)
            .map(|(&s, &n)| if n == 0 { f64::NAN } else { s / n as f64 })
            .collect()
    }
}

/// Separable window weights for a grid (`None` for a rectangular window).
fn window_weights(window: Window, shape: GridShape) -> Option<Array2<f64>> {
    let hann = |n: usize| -> Vec<f64> {
        if n == 1 {
            return vec![1.0];
        }
        (0..n)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
            .collect()
    };

    match window {
        Window::Rectangular => None,
        Window::Hann => {
            let wr = hann(shape.rows());
            let wc = hann(shape.cols());
            Some(Array2::from_shape_fn(shape.as_tuple(), |(r, c)| wr[r] * wc[c]))
        }
    }
}

/// RAPSD estimator planned for one grid shape.
///
/// Holds the FFT plan, ring membership and window weights, so a stack of
/// fields is transformed without re-planning.
#[derive(Clone, Debug)]
pub struct SpectralEstimator {
    config: SpectralConfig,
    fft: Fft2d,
    averager: RadialAverager,
    window: Option<Array2<f64>>,
}

impl SpectralEstimator {
    /// Plan an estimator for fields of `shape`.
    pub fn new(shape: GridShape, config: SpectralConfig) -> Result<Self> {
        config.validate()?;
        let fft = Fft2d::new(shape)?;
        let averager = RadialAverager::new(shape, config.spacing, config.binning)?;
        debug!(
            %shape,
            bins = averager.centers.len(),
            window = ?config.window,
            "spectral estimator planned"
        );
        Ok(Self {
            window: window_weights(config.window, shape),
            config,
            fft,
            averager,
        })
    }

    /// Grid shape accepted by this estimator.
    pub fn shape(&self) -> GridShape {
        self.fft.shape()
    }

    /// Configuration in use.
    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }

    /// Apply the missing-value policy, mean removal and window.
    fn prepare(&self, field: ArrayView2<f64>) -> Result<Array2<f64>> {
        if field.iter().any(|v| v.is_infinite()) {
            return Err(MetricsError::invalid("field contains infinite values"));
        }

        let missing = field.iter().filter(|v| v.is_nan()).count();
        let mut prepared = field.to_owned();
        if missing > 0 {
            let fill = match self.config.nan_policy {
                NanPolicy::Reject => {
                    return Err(MetricsError::invalid(format!(
                        "field has {} missing values; spectral estimation needs a filled field",
                        missing
                    )));
                }
                NanPolicy::FillMean => nan_mean(field.iter())?,
                NanPolicy::FillZero => 0.0,
            };
            debug!(missing, fill, "filling missing values before transform");
            prepared.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }

        if self.config.remove_mean {
            let mean = prepared.mean().unwrap_or(0.0);
            prepared -= mean;
        }
        if let Some(w) = &self.window {
            prepared *= w;
        }
        Ok(prepared)
    }

    /// Mean power in every bin (including empty ones as `NaN`).
    fn binned_power(&self, field: ArrayView2<f64>) -> Result<Vec<f64>> {
        let shape = self.shape();
        ensure_same_shape(&[shape.rows(), shape.cols()], field.shape())?;
        let prepared = self.prepare(field)?;
        let power = self.fft.power(prepared.view())?;
        Ok(self.averager.average(&power))
    }

    /// Mean binned power over every step of a (time, row, column) stack.
    pub(crate) fn binned_power_stack(&self, stack: ArrayView3<f64>) -> Result<Vec<f64>> {
        let steps = stack.len_of(Axis(0));
        if steps == 0 {
            return Err(MetricsError::invalid("empty field sequence"));
        }

        let mut total = vec![0.0; self.averager.centers.len()];
        for field in stack.axis_iter(Axis(0)) {
            let binned = self.binned_power(field)?;
            total.iter_mut().zip(&binned).for_each(|(t, p)| *t += p);
        }
        total.iter_mut().for_each(|t| *t /= steps as f64);
        Ok(total)
    }

    /// Reported wavenumber of every bin.
    pub(crate) fn bin_wavenumbers(&self) -> &[f64] {
        &self.averager.centers
    }

    /// RAPSD of one field.
    pub fn curve(&self, field: ArrayView2<f64>) -> Result<SpectralCurve> {
        let binned = self.binned_power(field)?;
        self.to_curve(&binned)
    }

    /// RAPSD averaged over a stack.
    pub fn stack_curve(&self, stack: ArrayView3<f64>) -> Result<SpectralCurve> {
        let binned = self.binned_power_stack(stack)?;
        self.to_curve(&binned)
    }

    /// Keep the defined, non-DC bins.
    pub(crate) fn to_curve(&self, binned: &[f64]) -> Result<SpectralCurve> {
        let (k, v): (Vec<f64>, Vec<f64>) = self
            .averager
            .centers
            .iter()
            .zip(binned)
            .filter(|&(&k, p)| k > 0.0 && !p.is_nan())
            .map(|(&k, &p)| (k, p))
            .unzip();
        SpectralCurve::new(k, v)
    }
}

/// RAPSD of a single field.
pub fn rapsd(field: ArrayView2<f64>, config: &SpectralConfig) -> Result<SpectralCurve> {
    let shape = GridShape::of(&field);
    SpectralEstimator::new(shape, config.clone())?.curve(field)
}

/// RAPSD averaged over all steps of a (time, row, column) stack.
pub fn rapsd_stack(stack: ArrayView3<f64>, config: &SpectralConfig) -> Result<SpectralCurve> {
    let shape = GridShape::of_stack(&stack);
    SpectralEstimator::new(shape, config.clone())?.stack_curve(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn wave(n: usize, ky: f64, kx: f64) -> Array2<f64> {
        Array2::from_shape_fn((n, n), |(r, c)| {
            (2.0 * PI * (ky * r as f64 + kx * c as f64) / n as f64).sin()
        })
    }

    #[test]
    fn test_single_wavenumber_peak() {
        let n = 64;
        let config = SpectralConfig::default();
        let curve = rapsd(wave(n, 0.0, 8.0).view(), &config).unwrap();

        let expected = 8.0 / n as f64;
        let peak = curve.peak_wavenumber().unwrap();
        assert!((peak - expected).abs() <= 1.0 / n as f64);
    }

    #[test]
    fn test_oblique_wave_peak() {
        let n = 64;
        // |(3, 4)| = 5 cycles per domain
        let config = SpectralConfig::default().with_window(Window::Rectangular);
        let curve = rapsd(wave(n, 3.0, 4.0).view(), &config).unwrap();
        let peak = curve.peak_wavenumber().unwrap();
        assert!((peak - 5.0 / n as f64).abs() < 1e-12);
    }

    #[test]
    fn test_wavenumbers_follow_spacing() {
        let spacing = GridSpacing::new(4.0).unwrap();
        let config = SpectralConfig::new(spacing).with_window(Window::Rectangular);
        let curve = rapsd(wave(32, 0.0, 2.0).view(), &config).unwrap();

        // Linear bins of unit width, DC dropped: k = b / (32 * 4), b = 1..15
        assert_eq!(curve.len(), 15);
        assert!((curve.wavenumbers()[0] - 1.0 / 128.0).abs() < 1e-15);
        assert!((curve.peak_wavenumber().unwrap() - 2.0 / 128.0).abs() < 1e-15);
        assert!((curve.wavelengths()[1] - 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_odd_grid_bin_count() {
        let config = SpectralConfig::default();
        let field = Array2::from_shape_fn((5, 5), |(r, c)| (r * c) as f64);
        let curve = rapsd(field.view(), &config).unwrap();
        // Bins 0, 1, 2 have centres below 2.5; DC is dropped
        assert_eq!(curve.len(), 2);
    }

    #[test]
    fn test_wide_bins() {
        let config = SpectralConfig::default()
            .with_window(Window::Rectangular)
            .with_binning(RadialBinning::Linear { width: 4.0 });
        let curve = rapsd(wave(32, 0.0, 8.0).view(), &config).unwrap();
        // Bins at 0, 4, 8, 12 (x k_f); the wave at radius 8 is centred in bin 2
        assert_eq!(curve.len(), 3);
        assert!((curve.peak_wavenumber().unwrap() - 8.0 / 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_edge_radius_goes_to_upper_bin() {
        // Width 2: radius 1 sits on the edge between bins 0 and 1
        let shape = GridShape::new(8, 8);
        let averager = RadialAverager::new(
            shape,
            GridSpacing::UNIT,
            RadialBinning::Linear { width: 2.0 },
        )
        .unwrap();
        // Entry [0, 1] has radius exactly 1
        assert_eq!(averager.assignment[1], Some(1));
        // DC never belongs to a bin
        assert_eq!(averager.assignment[0], None);
    }

    #[test]
    fn test_log_bins() {
        let config = SpectralConfig::default()
            .with_window(Window::Rectangular)
            .with_binning(RadialBinning::Log { bins_per_decade: 5.0 });
        let curve = rapsd(wave(64, 0.0, 10.0).view(), &config).unwrap();

        assert!(curve.wavenumbers().windows(2).all(|w| w[1] > w[0]));
        // Radius 10 falls in [10^(5/5), 10^(6/5)), reported at 10^(5.5/5) k_f
        let expected = 10f64.powf(1.1) / 64.0;
        assert!((curve.peak_wavenumber().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_nan_policy() {
        let mut field = wave(16, 1.0, 2.0);
        field[[3, 3]] = f64::NAN;

        let reject = SpectralConfig::default();
        assert!(rapsd(field.view(), &reject).unwrap_err().is_invalid_input());

        let fill = SpectralConfig::default().with_nan_policy(NanPolicy::FillMean);
        let curve = rapsd(field.view(), &fill).unwrap();
        assert!(curve.values().iter().all(|v| v.is_finite()));

        let zero = SpectralConfig::default().with_nan_policy(NanPolicy::FillZero);
        assert!(rapsd(field.view(), &zero).is_ok());

        let all_nan = Array2::from_elem((8, 8), f64::NAN);
        assert!(rapsd(all_nan.view(), &fill).unwrap_err().is_undefined());
    }

    #[test]
    fn test_stack_average() {
        let a = wave(32, 0.0, 4.0);
        let b = wave(32, 0.0, 4.0) * 3.0;
        let mut stack = Array3::zeros((2, 32, 32));
        stack.index_axis_mut(Axis(0), 0).assign(&a);
        stack.index_axis_mut(Axis(0), 1).assign(&b);

        let config = SpectralConfig::default();
        let single_a = rapsd(a.view(), &config).unwrap();
        let single_b = rapsd(b.view(), &config).unwrap();
        let averaged = rapsd_stack(stack.view(), &config).unwrap();

        for ((x, y), z) in single_a
            .values()
            .iter()
            .zip(single_b.values())
            .zip(averaged.values())
        {
            assert!((0.5 * (x + y) - z).abs() < 1e-9 * (1.0 + z.abs()));
        }
    }

    #[test]
    fn test_bin_count_bounded_by_grid() {
        let shape = GridShape::new(16, 16);
        assert_eq!(RadialBinning::Linear { width: 1.0 }.bin_count(shape).unwrap(), 8);
        assert_eq!(RadialBinning::Linear { width: 3.0 }.bin_count(shape).unwrap(), 3);

        let field = wave(16, 0.0, 2.0);
        for binning in [
            RadialBinning::Linear { width: 1e-300 },
            RadialBinning::Linear { width: 1e-3 },
            RadialBinning::Log { bins_per_decade: 1e300 },
        ] {
            assert!(binning.bin_count(shape).unwrap_err().is_invalid_input());
            let config = SpectralConfig::default().with_binning(binning);
            assert!(
                rapsd(field.view(), &config).unwrap_err().is_invalid_input(),
                "{:?} should be rejected",
                binning
            );
        }
    }

    #[test]
    fn test_curve_invariants() {
        assert!(SpectralCurve::new(vec![0.1, 0.2], vec![1.0]).is_err());
        assert!(SpectralCurve::new(vec![0.0, 0.2], vec![1.0, 2.0]).is_err());
        assert!(SpectralCurve::new(vec![0.2, 0.2], vec![1.0, 2.0]).is_err());
        assert!(SpectralCurve::new(vec![0.1, 0.2], vec![1.0, f64::NAN]).is_err());
        assert!(SpectralCurve::new(vec![0.1, 0.2], vec![1.0, f64::INFINITY]).is_ok());
    }
}

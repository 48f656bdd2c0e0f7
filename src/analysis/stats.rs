//! NaN-aware descriptive statistics.
//!
//! Missing values are `NaN` and are dropped before any reduction. Mean and
//! variance are normalized by the number of *present* values, and the
//! standard deviation is the population (ddof = 0) form. The same convention
//! is used everywhere a reference field's spread enters a metric, so nRMSE
//! values are comparable across methods.
//!
//! A reduction over an input with no present values has no defined result
//! and returns `UndefinedStatistic`.

use crate::error::{MetricsError, Result};

/// Count, mean and population standard deviation of the present values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NanStats {
    /// Number of non-NaN values
    pub count: usize,
    /// Mean of the non-NaN values
    pub mean: f64,
    /// Population standard deviation of the non-NaN values
    pub std: f64,
}

impl NanStats {
    /// Compute count, mean and standard deviation in two passes.
    pub fn compute<'a, I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a f64>,
        I::IntoIter: Clone,
    {
        let iter = values.into_iter();
        let mean = nan_mean(iter.clone())?;
        let count = nan_count(iter.clone());
        let std = nan_std(iter)?;
        Ok(Self { count, mean, std })
    }
}

/// Number of non-NaN values.
pub fn nan_count<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a f64>,
{
    values.into_iter().filter(|v| !v.is_nan()).count()
}

/// Mean of the non-NaN values.
///
/// # Errors
///
/// `UndefinedStatistic` if no value is present.
pub fn nan_mean<'a, I>(values: I) -> Result<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    let (sum, n) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));

    if n == 0 {
        return Err(MetricsError::undefined("mean of an all-missing array"));
    }
    Ok(sum / n as f64)
}

/// Population variance of the non-NaN values.
///
/// Returns exactly `0.0` when every present value is identical, so that a
/// constant field is never reported with a rounding-noise spread.
pub fn nan_var<'a, I>(values: I) -> Result<f64>
where
    I: IntoIterator<Item = &'a f64>,
    I::IntoIter: Clone,
{
    let iter = values.into_iter();
    let mean = nan_mean(iter.clone())?;

    let mut present = iter.clone().filter(|v| !v.is_nan());
    if let Some(first) = present.next() {
        if present.all(|v| v == first) {
            return Ok(0.0);
        }
    }

    let (sum_sq, n) = iter
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), &v| (s + (v - mean).powi(2), n + 1));
    Ok(sum_sq / n as f64)
}

/// Population standard deviation of the non-NaN values.
pub fn nan_std<'a, I>(values: I) -> Result<f64>
where
    I: IntoIterator<Item = &'a f64>,
    I::IntoIter: Clone,
{
    nan_var(values).map(f64::sqrt)
}

/// Percentile `q` (in `[0, 100]`) of the non-NaN values.
///
/// Uses linear interpolation between the two closest ranks: the value at
/// fractional rank `q / 100 * (n - 1)` of the sorted present values.
///
/// # Errors
///
/// - `InvalidInput` if `q` is outside `[0, 100]`
/// - `UndefinedStatistic` if no value is present
pub fn nan_percentile<'a, I>(values: I, q: f64) -> Result<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    if !(0.0..=100.0).contains(&q) {
        return Err(MetricsError::invalid(format!(
            "percentile must be in [0, 100], got {}",
            q
        )));
    }

    let mut sorted: Vec<f64> = values.into_iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return Err(MetricsError::undefined("percentile of an all-missing array"));
    }
    sorted.sort_by(f64::total_cmp);

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    if lo == hi {
        return Ok(sorted[lo]);
    }
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

//! Per-time-step error series and summary tables.
//!
//! An [`Aggregator`] applies one [`Metric`] to every time-aligned pair of a
//! ground-truth stack and a candidate stack. Steps are independent: no state
//! flows from one step to the next, and the `parallel` feature evaluates them
//! concurrently while keeping the output in time order.
//!
//! # Example
//!
//! ```
//! use ndarray::Array3;
//! use ssh_eval::analysis::{Aggregator, Metric};
//!
//! let truth = Array3::from_shape_fn((4, 8, 8), |(t, r, c)| (t + r * c) as f64);
//! let baseline = &truth * 0.8;
//! let learned = &truth * 0.95;
//!
//! let table = Aggregator::new(Metric::Nrmse)
//!     .compare(truth.view(), &[("OI", baseline.view()), ("4DVarNet", learned.view())])
//!     .unwrap();
//!
//! let oi = table.row("OI").unwrap().stats().unwrap();
//! let net = table.row("4DVarNet").unwrap().stats().unwrap();
//! assert!(net.mean < oi.mean);
//! ```

use chrono::NaiveDate;
use ndarray::{ArrayView3, Axis};
use tracing::{debug, warn};

use super::metrics::Metric;
use super::stats::{nan_mean, nan_percentile};
use crate::error::{MetricsError, Result, ensure_same_shape};
use crate::operators::GradientOperator;

/// Lower percentile reported in summary rows.
pub const LOWER_PERCENTILE: f64 = 5.0;
/// Upper percentile reported in summary rows.
pub const UPPER_PERCENTILE: f64 = 95.0;

/// One error value per time step.
///
/// Steps whose metric is undefined (all-missing field, constant reference
/// for nRMSE) keep their error instead of a numeric placeholder.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorTimeSeries {
    metric: Metric,
    entries: Vec<Result<f64>>,
    dates: Option<Vec<NaiveDate>>,
}

impl ErrorTimeSeries {
    /// Create a series from per-step results.
    pub fn new(metric: Metric, entries: Vec<Result<f64>>) -> Self {
        Self {
            metric,
            entries,
            dates: None,
        }
    }

    /// Attach calendar dates, one per step. Used for labelling only.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the number of dates differs from the number of steps.
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self> {
        if dates.len() != self.entries.len() {
            return Err(MetricsError::invalid(format!(
                "{} dates for {} time steps",
                dates.len(),
                self.entries.len()
            )));
        }
        self.dates = Some(dates);
        Ok(self)
    }

    /// Metric that produced the series.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the series has no steps.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-step results in time order.
    pub fn entries(&self) -> &[Result<f64>] {
        &self.entries
    }

    /// Result at step `i`.
    pub fn get(&self, i: usize) -> Option<&Result<f64>> {
        self.entries.get(i)
    }

    /// Date labels, if attached.
    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    /// Values in time order, `NaN` at undefined steps (for plotting).
    pub fn values(&self) -> Vec<f64> {
        self.entries
            .iter()
            .map(|e| e.as_ref().copied().unwrap_or(f64::NAN))
            .collect()
    }

    /// Values of the defined steps only.
    pub fn defined_values(&self) -> Vec<f64> {
        self.entries
            .iter()
            .filter_map(|e| e.as_ref().ok().copied())
            .collect()
    }

    /// Indices of steps whose metric is undefined.
    pub fn undefined_steps(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.is_err().then_some(i))
            .collect()
    }

    /// Mean over the defined steps.
    pub fn mean(&self) -> Result<f64> {
        nan_mean(&self.defined_values())
    }

    /// Mean and 5th/95th percentiles over the defined steps.
    pub fn summary(&self) -> Result<SummaryStats> {
        SummaryStats::from_values(&self.defined_values())
    }
}

/// Mean and spread of an error series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SummaryStats {
    /// Mean error
    pub mean: f64,
    /// 5th percentile
    pub p5: f64,
    /// 95th percentile
    pub p95: f64,
}

impl SummaryStats {
    /// Summarize a set of values, skipping `NaN`.
    ///
    /// # Errors
    ///
    /// `UndefinedStatistic` if no value is present.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        Ok(Self {
            mean: nan_mean(values)?,
            p5: nan_percentile(values, LOWER_PERCENTILE)?,
            p95: nan_percentile(values, UPPER_PERCENTILE)?,
        })
    }

    /// As `[mean, p5, p95]`.
    pub fn as_array(&self) -> [f64; 3] {
        [self.mean, self.p5, self.p95]
    }
}

/// One method's row in a [`SummaryTable`].
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRow {
    label: String,
    stats: Result<SummaryStats>,
}

impl SummaryRow {
    /// Create a row.
    pub fn new(label: impl Into<String>, stats: Result<SummaryStats>) -> Self {
        Self {
            label: label.into(),
            stats,
        }
    }

    /// Method label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Summary statistics, or why they are undefined.
    pub fn stats(&self) -> std::result::Result<&SummaryStats, &MetricsError> {
        self.stats.as_ref()
    }

    /// True if the row holds numbers.
    pub fn is_defined(&self) -> bool {
        self.stats.is_ok()
    }
}

/// Rows = methods in caller order, columns = {mean, p5, p95}.
///
/// Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryTable {
    metric: Metric,
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Build a table from rows.
    pub fn new(metric: Metric, rows: Vec<SummaryRow>) -> Self {
        Self { metric, rows }
    }

    /// Metric summarized by the table.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// All rows in caller order.
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Row by label.
    pub fn row(&self, label: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows x 3 matrix, `NaN` in undefined rows.
    pub fn to_array(&self) -> ndarray::Array2<f64> {
        let mut out = ndarray::Array2::from_elem((self.rows.len(), 3), f64::NAN);
        for (mut dst, row) in out.axis_iter_mut(Axis(0)).zip(&self.rows) {
            if let Ok(stats) = &row.stats {
                dst.assign(&ndarray::arr1(&stats.as_array()));
            }
        }
        out
    }
}

/// Applies one metric across time-aligned field pairs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aggregator {
    /// Metric evaluated at each step
    pub metric: Metric,
    /// Gradient operator used by `Metric::GradientMse`
    pub gradient: GradientOperator,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Metric::Nrmse)
    }
}

impl Aggregator {
    /// Aggregator for `metric` with the default gradient operator.
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            gradient: GradientOperator::default(),
        }
    }

    /// Set the gradient operator.
    pub fn with_gradient(mut self, gradient: GradientOperator) -> Self {
        self.gradient = gradient;
        self
    }

    fn validate(truth: &ArrayView3<f64>, candidate: &ArrayView3<f64>) -> Result<()> {
        ensure_same_shape(truth.shape(), candidate.shape())?;
        if truth.len_of(Axis(0)) == 0 {
            return Err(MetricsError::invalid("empty field sequence"));
        }
        Ok(())
    }

    /// Error at each time step, in time order.
    ///
    /// # Errors
    ///
    /// `InvalidInput` (or `ShapeMismatch`) for mismatched or empty stacks.
    /// Degenerate steps do not fail the call; they are kept in the series.
    pub fn error_series(
        &self,
        truth: ArrayView3<f64>,
        candidate: ArrayView3<f64>,
    ) -> Result<ErrorTimeSeries> {
        Self::validate(&truth, &candidate)?;
        debug!(metric = %self.metric, shape = ?truth.shape(), "computing error series");

        let entries: Vec<Result<f64>> = truth
            .axis_iter(Axis(0))
            .zip(candidate.axis_iter(Axis(0)))
            .map(|(t, c)| self.metric.evaluate(t, c, &self.gradient))
            .collect();

        Ok(self.finish(entries))
    }

    /// Parallel version of [`Aggregator::error_series`] using Rayon.
    ///
    /// Produces the same series; steps are evaluated concurrently and
    /// collected back in time order.
    #[cfg(feature = "parallel")]
    pub fn error_series_parallel(
        &self,
        truth: ArrayView3<f64>,
        candidate: ArrayView3<f64>,
    ) -> Result<ErrorTimeSeries> {
        use rayon::prelude::*;

        Self::validate(&truth, &candidate)?;
        debug!(metric = %self.metric, shape = ?truth.shape(), "computing error series in parallel");

        let n_steps = truth.len_of(Axis(0));
        let entries: Vec<Result<f64>> = (0..n_steps)
            .into_par_iter()
            .map(|i| {
                self.metric.evaluate(
                    truth.index_axis(Axis(0), i),
                    candidate.index_axis(Axis(0), i),
                    &self.gradient,
                )
            })
            .collect();

        Ok(self.finish(entries))
    }

    fn finish(&self, entries: Vec<Result<f64>>) -> ErrorTimeSeries {
        let series = ErrorTimeSeries::new(self.metric, entries);
        let undefined = series.undefined_steps();
        if !undefined.is_empty() {
            debug!(
                metric = %self.metric,
                undefined = undefined.len(),
                steps = series.len(),
                "error series has undefined steps"
            );
        }
        series
    }

    /// Mean and 5th/95th percentiles of the error series for one candidate.
    pub fn summary(
        &self,
        truth: ArrayView3<f64>,
        candidate: ArrayView3<f64>,
    ) -> Result<SummaryStats> {
        self.error_series(truth, candidate)?.summary()
    }

    /// Summary table with one row per candidate, in the given order.
    ///
    /// Every candidate's shape is checked before any metric is computed. A
    /// candidate whose statistics are undefined gets an undefined row; the
    /// other rows are still produced.
    pub fn compare(
        &self,
        truth: ArrayView3<f64>,
        candidates: &[(&str, ArrayView3<f64>)],
    ) -> Result<SummaryTable> {
        for (_, candidate) in candidates {
            Self::validate(&truth, candidate)?;
        }

        let mut rows = Vec::with_capacity(candidates.len());
        for (label, candidate) in candidates {
            let stats = self.error_series(truth, *candidate)?.summary();
            if let Err(e) = &stats {
                warn!(method = %label, metric = %self.metric, error = %e, "summary row undefined");
            }
            rows.push(SummaryRow::new(*label, stats));
        }

        Ok(SummaryTable::new(self.metric, rows))
    }
}

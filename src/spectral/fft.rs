//! Two-dimensional forward FFT with reusable plans.
//!
//! A 2-D transform is a 1-D transform along every row followed by a 1-D
//! transform along every column. [`Fft2d`] plans both once for a grid shape
//! and can then be applied to any number of fields of that shape.

use std::sync::Arc;

use ndarray::{Array2, ArrayView2, Axis};
use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;
use rustfft::{Fft, FftPlanner};

use crate::error::{MetricsError, Result, ensure_same_shape};
use crate::types::GridShape;

/// Forward 2-D FFT planned for one grid shape.
#[derive(Clone)]
pub struct Fft2d {
    shape: GridShape,
    /// Transform along a row (length = cols)
    row_fft: Arc<dyn Fft<f64>>,
    /// Transform along a column (length = rows)
    col_fft: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for Fft2d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft2d").field("shape", &self.shape).finish()
    }
}

impl Fft2d {
    /// Plan a transform for `shape`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the shape has a zero dimension.
    pub fn new(shape: GridShape) -> Result<Self> {
        let mut planner = FftPlanner::new();
        Self::with_planner(&mut planner, shape)
    }

    /// Plan using an existing planner, sharing its cached 1-D plans.
    pub fn with_planner(planner: &mut FftPlanner<f64>, shape: GridShape) -> Result<Self> {
        if shape.is_empty() {
            return Err(MetricsError::invalid(format!(
                "cannot transform an empty {} grid",
                shape
            )));
        }
        Ok(Self {
            shape,
            row_fft: planner.plan_fft_forward(shape.cols()),
            col_fft: planner.plan_fft_forward(shape.rows()),
        })
    }

    /// Grid shape this plan accepts.
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Unnormalized forward transform of a real field.
    ///
    /// Output index `[i, j]` holds frequency `fftfreq(rows)[i]` along rows
    /// and `fftfreq(cols)[j]` along columns (zero frequency at `[0, 0]`).
    pub fn forward(&self, field: ArrayView2<f64>) -> Result<Array2<Complex<f64>>> {
        let (rows, cols) = self.shape.as_tuple();
        ensure_same_shape(&[rows, cols], field.shape())?;

        let mut data = Array2::from_shape_fn((rows, cols), |(r, c)| Complex::new(field[[r, c]], 0.0));

        transform_lanes(&mut data, Axis(1), self.row_fft.as_ref());
        transform_lanes(&mut data, Axis(0), self.col_fft.as_ref());

        Ok(data)
    }

    /// Periodogram `|F|² / (rows * cols)`.
    pub fn power(&self, field: ArrayView2<f64>) -> Result<Array2<f64>> {
        let n = self.shape.total_points() as f64;
        Ok(self.forward(field)?.mapv(|c| c.norm_sqr() / n))
    }
}

/// Apply `fft` in place to every lane of `data` along `axis`.
fn transform_lanes(data: &mut Array2<Complex<f64>>, axis: Axis, fft: &dyn Fft<f64>) {
    let len = data.len_of(axis);
    let mut buffer = vec![Complex::zero(); len];
    let mut scratch = vec![Complex::zero(); fft.get_inplace_scratch_len()];

    for mut lane in data.lanes_mut(axis) {
        buffer
            .iter_mut()
            .zip(lane.iter())
            .for_each(|(b, &v)| *b = v);
        fft.process_with_scratch(&mut buffer, &mut scratch);
        lane.iter_mut().zip(&buffer).for_each(|(v, &b)| *v = b);
    }
}

/// Sample frequencies of an `n`-point DFT with sample spacing `d`.
///
/// Same ordering as the transform output: `[0, 1, ..., ⌈n/2⌉-1, -⌊n/2⌋, ..., -1] / (n d)`.
pub fn fftfreq(n: usize, d: f64) -> Vec<f64> {
    fft_index(n)
        .into_iter()
        .map(|i| i as f64 / (n as f64 * d))
        .collect()
}

/// Signed integer frequency index for each output position of an `n`-point DFT.
pub(crate) fn fft_index(n: usize) -> Vec<isize> {
    let n_half = n.div_ceil(2);
    let mut out: Vec<isize> = (0..n_half as isize).collect();
    out.extend(-((n / 2) as isize)..0);
    out
}

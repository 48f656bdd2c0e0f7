//! Central finite differences on a unit-spaced grid.
//!
//! For a 1-D sequence `u` of length `n >= 2`:
//!
//! ```text
//! du_0     = u_1 - u_0                     (forward, first order)
//! du_i     = (u_{i+1} - u_{i-1}) / 2        (central, second order)
//! du_{n-1} = u_{n-1} - u_{n-2}             (backward, first order)
//! ```
//!
//! Applied along the row axis and the column axis of a 2-D field.

use ndarray::{Array2, ArrayView1, ArrayViewMut1, ArrayView2, Axis, Zip};

use crate::error::{MetricsError, Result};

fn diff_lane(u: ArrayView1<f64>, mut du: ArrayViewMut1<f64>) {
    let n = u.len();
    du[0] = u[1] - u[0];
    du[n - 1] = u[n - 1] - u[n - 2];
    for i in 1..n - 1 {
        du[i] = 0.5 * (u[i + 1] - u[i - 1]);
    }
}

/// Derivatives `(d/drow, d/dcol)` of a field.
///
/// # Errors
///
/// `InvalidInput` if either axis has fewer than two points.
pub fn central_gradient(field: ArrayView2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
    let (rows, cols) = field.dim();
    if rows < 2 || cols < 2 {
        return Err(MetricsError::invalid(format!(
            "central differences need at least 2 points per axis, got {}x{}",
            rows, cols
        )));
    }

    let mut d_row = Array2::zeros((rows, cols));
    let mut d_col = Array2::zeros((rows, cols));

    Zip::from(field.lanes(Axis(0)))
        .and(d_row.lanes_mut(Axis(0)))
        .for_each(|u, du| diff_lane(u, du));
    Zip::from(field.lanes(Axis(1)))
        .and(d_col.lanes_mut(Axis(1)))
        .for_each(|u, du| diff_lane(u, du));

    Ok((d_row, d_col))
}

/// Gradient norm `sqrt(d_row² + d_col²)` from central differences.
pub fn gradient_norm(field: ArrayView2<f64>) -> Result<Array2<f64>> {
    let (mut d_row, d_col) = central_gradient(field)?;
    d_row.zip_mut_with(&d_col, |a, &b| *a = a.hypot(b));
    Ok(d_row)
}

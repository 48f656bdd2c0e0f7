//! Sobel gradient operator for gridded fields.
//!
//! The horizontal derivative uses the 3x3 kernel
//!
//! ```text
//!        | -1  0  1 |
//! Kx =   | -2  0  2 |  / scale
//!        | -1  0  1 |
//! ```
//!
//! and the vertical derivative its transpose `Ky = Kxᵀ`. Here "horizontal"
//! is the column axis (x) and "vertical" the row axis (y). With the default
//! scale of 8 the response to a unit-slope ramp is 1 per grid cell.
//!
//! The kernel needs a one-pixel halo around the grid. How that halo is
//! filled is an explicit [`BoundaryPolicy`], so border behaviour is part of
//! the operator's configuration rather than an implicit library default.
//!
//! # Missing values
//!
//! All nine taps are multiplied, zero taps included, so `NaN * 0 = NaN`
//! propagates: every output pixel whose 3x3 neighbourhood (after halo
//! extension) touches a `NaN` input is `NaN`.

use ndarray::{Array2, ArrayView2};

use crate::error::{MetricsError, Result};

/// Normalization applied to the raw Sobel response.
pub const SOBEL_SCALE: f64 = 8.0;

const SOBEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Which gradient output to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GradientOrder {
    /// Derivative along columns (x).
    X,
    /// Derivative along rows (y).
    Y,
    /// `sqrt(dx² + dy²)`.
    Magnitude,
}

impl TryFrom<usize> for GradientOrder {
    type Error = MetricsError;

    /// 0 → X, 1 → Y, 2 → Magnitude.
    fn try_from(order: usize) -> Result<Self> {
        match order {
            0 => Ok(Self::X),
            1 => Ok(Self::Y),
            2 => Ok(Self::Magnitude),
            other => Err(MetricsError::invalid(format!(
                "gradient order must be 0, 1 or 2, got {}",
                other
            ))),
        }
    }
}

/// How the one-pixel halo outside the grid is filled.
///
/// Shown for a row `a b c d` extended by one pixel on each side:
///
/// ```text
/// Replicate   a | a b c d | d
/// Reflect     a | a b c d | d   (edge pixel repeated, wider halos mirror "dcba|abcd")
/// Reflect101  b | a b c d | c   (mirror without repeating the edge)
/// Constant(v) v | a b c d | v
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryPolicy {
    /// Repeat the edge pixel.
    Replicate,
    /// Mirror including the edge pixel.
    ///
    /// With the one-pixel halo of the 3×3 stencil this yields exactly the
    /// same values as [`BoundaryPolicy::Replicate`]; the two only differ
    /// for wider halos.
    Reflect,
    /// Mirror about the edge pixel without repeating it.
    Reflect101,
    /// Fill with a fixed value.
    Constant(f64),
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        Self::Reflect101
    }
}

impl BoundaryPolicy {
    /// Map a possibly out-of-range index (at most one cell outside) onto the grid.
    ///
    /// Returns `None` when the halo is filled with a constant.
    #[inline]
    pub fn resolve(&self, index: isize, len: usize) -> Option<usize> {
        let n = len as isize;
        if (0..n).contains(&index) {
            return Some(index as usize);
        }
        let mapped = match self {
            Self::Replicate | Self::Reflect => index.clamp(0, n - 1),
            Self::Reflect101 => {
                if n == 1 {
                    0
                } else if index < 0 {
                    -index
                } else {
                    2 * (n - 1) - index
                }
            }
            Self::Constant(_) => return None,
        };
        Some(mapped as usize)
    }

    /// Value of `field` at `(row, col)`, which may lie one cell outside the grid.
    #[inline]
    pub fn sample(&self, field: &ArrayView2<f64>, row: isize, col: isize) -> f64 {
        let (rows, cols) = field.dim();
        match (self.resolve(row, rows), self.resolve(col, cols)) {
            (Some(r), Some(c)) => field[[r, c]],
            _ => self.fill_value(),
        }
    }

    #[inline]
    fn fill_value(&self) -> f64 {
        match self {
            Self::Constant(v) => *v,
            _ => f64::NAN,
        }
    }
}

/// Fixed-kernel finite-difference gradient operator.
///
/// # Example
///
/// ```
/// use ndarray::Array2;
/// use ssh_eval::operators::{GradientOperator, GradientOrder};
///
/// // Unit slope along columns
/// let ramp = Array2::from_shape_fn((5, 5), |(_, c)| c as f64);
/// let op = GradientOperator::default();
/// let dx = op.apply(ramp.view(), GradientOrder::X);
/// assert!((dx[[2, 2]] - 1.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientOperator {
    /// Halo filling policy
    pub boundary: BoundaryPolicy,
    /// Divisor applied to the raw kernel response
    pub scale: f64,
}

impl Default for GradientOperator {
    fn default() -> Self {
        Self {
            boundary: BoundaryPolicy::default(),
            scale: SOBEL_SCALE,
        }
    }
}

impl GradientOperator {
    /// Operator with the given boundary policy and the standard scale.
    pub fn new(boundary: BoundaryPolicy) -> Self {
        Self {
            boundary,
            ..Default::default()
        }
    }

    /// Set the boundary policy.
    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    /// Set the normalization divisor.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Derivative along columns.
    pub fn dx(&self, field: ArrayView2<f64>) -> Array2<f64> {
        self.convolve(&field, &SOBEL_X)
    }

    /// Derivative along rows.
    pub fn dy(&self, field: ArrayView2<f64>) -> Array2<f64> {
        self.convolve(&field, &SOBEL_Y)
    }

    /// Both derivatives `(dx, dy)`.
    pub fn components(&self, field: ArrayView2<f64>) -> (Array2<f64>, Array2<f64>) {
        (self.dx(field), self.dy(field))
    }

    /// Gradient magnitude `sqrt(dx² + dy²)`.
    pub fn magnitude(&self, field: ArrayView2<f64>) -> Array2<f64> {
        let (mut gx, gy) = self.components(field);
        gx.zip_mut_with(&gy, |x, &y| *x = x.hypot(y));
        gx
    }

    /// Produce the output selected by `order`. Output shape equals input shape.
    pub fn apply(&self, field: ArrayView2<f64>, order: GradientOrder) -> Array2<f64> {
        match order {
            GradientOrder::X => self.dx(field),
            GradientOrder::Y => self.dy(field),
            GradientOrder::Magnitude => self.magnitude(field),
        }
    }

    fn convolve(&self, field: &ArrayView2<f64>, kernel: &[[f64; 3]; 3]) -> Array2<f64> {
        let (rows, cols) = field.dim();
        let inv_scale = 1.0 / self.scale;

        Array2::from_shape_fn((rows, cols), |(r, c)| {
            let mut acc = 0.0;
            for (kr, kernel_row) in kernel.iter().enumerate() {
                for (kc, &w) in kernel_row.iter().enumerate() {
                    let rr = r as isize + kr as isize - 1;
                    let cc = c as isize + kc as isize - 1;
                    acc += w * self.boundary.sample(field, rr, cc);
                }
            }
            acc * inv_scale
        })
    }
}

//! 2D grid shape type.

use std::fmt;

use ndarray::{ArrayBase, Data, Ix2, Ix3};

/// Shape of a 2-D field (number of rows and columns).
///
/// Provides a strongly-typed way to pass grid dimensions,
/// preventing mix-ups between rows/cols and other integer parameters.
///
/// # Example
///
/// ```
/// use ssh_eval::types::GridShape;
///
/// let shape = GridShape::new(100, 50);
/// assert_eq!(shape.rows(), 100);
/// assert_eq!(shape.cols(), 50);
/// assert_eq!(shape.total_points(), 5000);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridShape {
    /// Number of rows (y-direction)
    rows: usize,
    /// Number of columns (x-direction)
    cols: usize,
}

impl GridShape {
    /// Create a new grid shape.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Shape of a 2-D array.
    pub fn of<S: Data<Elem = f64>>(field: &ArrayBase<S, Ix2>) -> Self {
        let (rows, cols) = field.dim();
        Self { rows, cols }
    }

    /// Spatial shape of a (time, row, column) stack.
    pub fn of_stack<S: Data<Elem = f64>>(stack: &ArrayBase<S, Ix3>) -> Self {
        let (_, rows, cols) = stack.dim();
        Self { rows, cols }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of grid points.
    #[inline]
    pub fn total_points(&self) -> usize {
        self.rows * self.cols
    }

    /// Length of the longer axis.
    #[inline]
    pub fn longest_axis(&self) -> usize {
        self.rows.max(self.cols)
    }

    /// True if either dimension is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Return as tuple (rows, cols).
    #[inline]
    pub fn as_tuple(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.rows, self.cols)
    }
}

impl From<(usize, usize)> for GridShape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self::new(rows, cols)
    }
}

impl From<GridShape> for (usize, usize) {
    fn from(shape: GridShape) -> Self {
        (shape.rows, shape.cols)
    }
}

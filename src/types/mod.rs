//! Strongly-typed grid and spectral quantities.
//!
//! Fields are plain `ndarray` arrays. The newtypes here keep grid spacing,
//! wavenumbers and grid shapes from being mixed up with other `f64`/`usize`
//! parameters.
//!
//! # Example
//!
//! ```
//! use ssh_eval::types::{GridShape, GridSpacing, Wavenumber};
//!
//! let dx = GridSpacing::new(4.0).unwrap(); // 4 km grid
//! let shape = GridShape::new(200, 100);
//! assert_eq!(shape.longest_axis(), 200);
//!
//! // Fundamental wavenumber of the longest axis, in cycles per km
//! let k = Wavenumber::new(1.0 / (200.0 * dx.value()));
//! assert!((k.wavelength() - 800.0).abs() < 1e-9);
//! ```

mod physical;
mod resolution;

pub use physical::{GridSpacing, Wavenumber};
pub use resolution::GridShape;

use ndarray::{Array2, Array3};

/// A single 2-D field (row, column). Missing values are `NaN`.
pub type Field = Array2<f64>;

/// A time-indexed stack of fields (time, row, column).
pub type FieldSequence = Array3<f64>;

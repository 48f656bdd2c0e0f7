//! Discrete differential operators on regular grids.
//!
//! This module provides:
//! - The Sobel gradient operator with an explicit halo policy (`GradientOperator`)
//! - Second-order central differences with one-sided edges (`central_gradient`)

mod differentiation;
mod gradient;

pub use differentiation::{central_gradient, gradient_norm};
pub use gradient::{BoundaryPolicy, GradientOperator, GradientOrder, SOBEL_SCALE};

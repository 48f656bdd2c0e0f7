//! Physical quantity newtypes for grid spacing and spatial frequency.
//!
//! Both are plain `f64` underneath; the wrappers keep a spacing in km from
//! being passed where a wavenumber in cycles/km is expected.

use std::fmt;

use crate::error::{MetricsError, Result};

// =============================================================================
// GridSpacing (distance between neighbouring grid points)
// =============================================================================

/// Distance between neighbouring grid points, in the caller's length unit.
///
/// # Convention
///
/// Spacing is **strictly positive** and finite. All wavenumbers derived
/// from a spacing are in cycles per that same unit.
///
/// # Example
///
/// ```
/// use ssh_eval::types::GridSpacing;
///
/// let dx = GridSpacing::new(4.0).unwrap();
/// assert_eq!(dx.value(), 4.0);
/// assert!(GridSpacing::new(0.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct GridSpacing(f64);

impl GridSpacing {
    /// Create a new grid spacing.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the value is not finite and strictly positive.
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(MetricsError::invalid(format!(
                "grid spacing must be finite and positive, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Unit spacing.
    pub const UNIT: Self = Self(1.0);

    /// Get the raw spacing.
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Nyquist wavenumber (half the sampling rate).
    #[inline]
    pub fn nyquist(self) -> Wavenumber {
        Wavenumber(0.5 / self.0)
    }
}

impl Default for GridSpacing {
    fn default() -> Self {
        Self::UNIT
    }
}

impl fmt::Display for GridSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<GridSpacing> for f64 {
    #[inline]
    fn from(d: GridSpacing) -> f64 {
        d.0
    }
}

// =============================================================================
// Wavenumber (spatial frequency)
// =============================================================================

/// Spatial frequency in cycles per unit length.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Wavenumber(f64);

impl Wavenumber {
    /// Create a new wavenumber.
    #[inline]
    pub const fn new(cycles_per_unit: f64) -> Self {
        Self(cycles_per_unit)
    }

    /// Get the raw value.
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Physical wavelength `1 / k`.
    ///
    /// Infinite at `k = 0`; callers exclude the DC bin before asking.
    #[inline]
    pub fn wavelength(self) -> f64 {
        1.0 / self.0
    }
}

impl fmt::Display for Wavenumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4e} cyc/unit", self.0)
    }
}

impl From<Wavenumber> for f64 {
    #[inline]
    fn from(k: Wavenumber) -> f64 {
        k.0
    }
}

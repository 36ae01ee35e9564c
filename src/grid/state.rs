//! Per-cell shallow-water state.
//!
//! The external solver stores (h, hu, hv) where:
//! - h = fluid depth
//! - hu = x-momentum (h * u)
//! - hv = y-momentum (h * v)

use std::ops::{Add, Mul};

/// Conserved variables of one cell: (h, hu, hv).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellState {
    /// Fluid depth h (must be non-negative)
    pub h: f64,
    /// x-momentum hu = h * u
    pub hu: f64,
    /// y-momentum hv = h * v
    pub hv: f64,
}

impl CellState {
    /// Create a new cell state.
    #[inline(always)]
    pub fn new(h: f64, hu: f64, hv: f64) -> Self {
        Self { h, hu, hv }
    }

    /// Create a state from primitive variables (h, u, v).
    #[inline(always)]
    pub fn from_primitives(h: f64, u: f64, v: f64) -> Self {
        Self {
            h,
            hu: h * u,
            hv: h * v,
        }
    }

    /// Create a zero (dry, at rest) state.
    #[inline(always)]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Velocity (u, v); (0, 0) if `h <= dry_tol` to avoid NaN.
    #[inline(always)]
    pub fn velocity(&self, dry_tol: f64) -> (f64, f64) {
        if self.h > dry_tol {
            let h_inv = 1.0 / self.h;
            (self.hu * h_inv, self.hv * h_inv)
        } else {
            (0.0, 0.0)
        }
    }

    /// Velocity magnitude |u| = sqrt(u² + v²).
    #[inline]
    pub fn speed(&self, dry_tol: f64) -> f64 {
        let (u, v) = self.velocity(dry_tol);
        (u * u + v * v).sqrt()
    }

    /// Check if this cell is dry (h <= dry_tol).
    #[inline]
    pub fn is_dry(&self, dry_tol: f64) -> bool {
        self.h <= dry_tol
    }
}

impl Add for CellState {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.h + rhs.h, self.hu + rhs.hu, self.hv + rhs.hv)
    }
}

impl Mul<f64> for CellState {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.h * rhs, self.hu * rhs, self.hv * rhs)
    }
}

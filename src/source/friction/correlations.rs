//! Darcy-Weisbach friction factor correlations.
//!
//! All correlations use the hydraulic diameter of a wide sheet flow,
//! D = 4h, so the Reynolds number is
//!
//!   Re = 4 h |u| / ν
//!
//! | Regime     | Range              | Correlation                      |
//! |------------|--------------------|----------------------------------|
//! | Laminar    | Re < 2000          | f = 96 / Re                      |
//! | Transient  | 2000 ≤ Re < 1e5    | f = 0.3164 Re^(-1/4) (Blasius)   |
//! | Turbulent  | Re ≥ 1e5           | Colebrook-White                  |
//!
//! Churchill's (1977) correlation covers every regime with a single
//! expression.

/// Reynolds number below which flow is laminar.
pub const LAMINAR_LIMIT: f64 = 2000.0;

/// Reynolds number at and above which the three-regime model is turbulent.
pub const TURBULENT_LIMIT: f64 = 1e5;

const COLEBROOK_MAX_ITER: usize = 50;
const COLEBROOK_TOL: f64 = 1e-12;

/// Flow regime selected by a Reynolds number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    Laminar,
    Transient,
    Turbulent,
}

impl Regime {
    /// Three-regime classification.
    pub fn three_regime(re: f64) -> Self {
        if re < LAMINAR_LIMIT {
            Regime::Laminar
        } else if re < TURBULENT_LIMIT {
            Regime::Transient
        } else {
            Regime::Turbulent
        }
    }

    /// Two-regime classification (no transient band).
    pub fn two_regime(re: f64) -> Self {
        if re < LAMINAR_LIMIT {
            Regime::Laminar
        } else {
            Regime::Turbulent
        }
    }
}

/// Reynolds number on the hydraulic diameter 4h.
///
/// Returns 0 for a non-positive viscosity so callers never divide by zero.
#[inline]
pub fn reynolds_number(h: f64, speed: f64, nu: f64) -> f64 {
    if nu <= 0.0 {
        return 0.0;
    }
    4.0 * h * speed / nu
}

/// Laminar sheet-flow friction factor, f = 96 / Re.
#[inline]
pub fn laminar(re: f64) -> f64 {
    96.0 / re
}

/// Blasius smooth-wall friction factor.
#[inline]
pub fn blasius(re: f64) -> f64 {
    0.3164 / re.powf(0.25)
}

/// Haaland's explicit approximation of Colebrook-White.
///
/// `rel_roughness` is k / D.
pub fn haaland(re: f64, rel_roughness: f64) -> f64 {
    let x = -1.8 * ((rel_roughness / 3.7).powf(1.11) + 6.9 / re).log10();
    1.0 / (x * x)
}

/// Colebrook-White friction factor.
///
/// Solves 1/√f = -2 log10(k/(3.7 D) + 2.51/(Re √f)) by fixed-point
/// iteration on 1/√f, starting from Haaland's estimate.
pub fn colebrook_white(re: f64, rel_roughness: f64) -> f64 {
    let mut x = 1.0 / haaland(re, rel_roughness).sqrt();
    for _ in 0..COLEBROOK_MAX_ITER {
        let next = -2.0 * (rel_roughness / 3.7 + 2.51 * x / re).log10();
        let converged = (next - x).abs() <= COLEBROOK_TOL * next.abs();
        x = next;
        if converged {
            break;
        }
    }
    1.0 / (x * x)
}

/// Churchill's all-regime friction factor.
///
/// f = 8 [(8/Re)^12 + (A + B)^(-3/2)]^(1/12), with
/// A = [-2.457 ln((7/Re)^0.9 + 0.27 k/D)]^16 and B = (37530/Re)^16.
pub fn churchill(re: f64, rel_roughness: f64) -> f64 {
    let a = (-2.457 * ((7.0 / re).powf(0.9) + 0.27 * rel_roughness).ln()).powi(16);
    let b = (37530.0 / re).powi(16);
    let mixed = (a + b).powf(-1.5);
    let viscous = 8.0 / re;

    if viscous > 1.0 {
        // Factor out (8/Re)^12, which overflows for very small Re.
        8.0 * viscous * (1.0 + mixed / viscous.powi(12)).powf(1.0 / 12.0)
    } else {
        8.0 * (viscous.powi(12) + mixed).powf(1.0 / 12.0)
    }
}

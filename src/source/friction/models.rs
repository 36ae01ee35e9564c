//! The seven Darcy-Weisbach coefficient models.

use crate::source::friction::correlations::{self, Regime};
use crate::source::friction::lookup::{BlockTable, RasterField};
use crate::source::friction::{FrictionContext, FrictionModel};

/// No Darcy-Weisbach friction anywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFriction;

impl FrictionModel for NoFriction {
    fn coefficient(&self, _ctx: &FrictionContext) -> f64 {
        0.0
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// One coefficient everywhere.
#[derive(Clone, Copy, Debug)]
pub struct ConstantFriction {
    /// Darcy-Weisbach coefficient
    pub coefficient: f64,
}

impl ConstantFriction {
    pub fn new(coefficient: f64) -> Self {
        Self { coefficient }
    }
}

impl FrictionModel for ConstantFriction {
    #[inline]
    fn coefficient(&self, _ctx: &FrictionContext) -> f64 {
        self.coefficient
    }

    fn name(&self) -> &'static str {
        "constant"
    }
}

/// Piecewise-constant coefficient over rectangular blocks.
#[derive(Clone, Debug)]
pub struct BlockConstantFriction {
    table: BlockTable,
}

impl BlockConstantFriction {
    pub fn new(table: BlockTable) -> Self {
        Self { table }
    }

    /// Block table.
    pub fn table(&self) -> &BlockTable {
        &self.table
    }
}

impl FrictionModel for BlockConstantFriction {
    #[inline]
    fn coefficient(&self, ctx: &FrictionContext) -> f64 {
        self.table.lookup(ctx.position.0, ctx.position.1)
    }

    fn name(&self) -> &'static str {
        "block_constant"
    }
}

/// Coefficient read from a raster.
#[derive(Clone, Debug)]
pub struct CellRasterFriction {
    field: RasterField,
}

impl CellRasterFriction {
    pub fn new(field: RasterField) -> Self {
        Self { field }
    }
}

impl FrictionModel for CellRasterFriction {
    #[inline]
    fn coefficient(&self, ctx: &FrictionContext) -> f64 {
        self.field.lookup(ctx.position.0, ctx.position.1)
    }

    fn name(&self) -> &'static str {
        "cell_raster"
    }
}

/// Reynolds number and relative roughness k/(4h) of a wet, moving cell.
///
/// `None` when the Reynolds number is zero, which happens for zero speed.
#[inline]
fn regime_inputs(ctx: &FrictionContext, roughness: &RasterField, nu: f64) -> Option<(f64, f64)> {
    let h = ctx.state.h;
    let re = correlations::reynolds_number(h, ctx.speed, nu);
    if re <= 0.0 || !re.is_finite() {
        return None;
    }
    let k = roughness.lookup(ctx.position.0, ctx.position.1).max(0.0);
    Some((re, k / (4.0 * h)))
}

/// Laminar / Blasius / Colebrook-White, switched by Reynolds number.
#[derive(Clone, Debug)]
pub struct ThreeRegimeFriction {
    roughness: RasterField,
    nu: f64,
}

impl ThreeRegimeFriction {
    /// Create from a roughness field (m) and kinematic viscosity (m²/s).
    pub fn new(roughness: RasterField, nu: f64) -> Self {
        Self { roughness, nu }
    }
}

impl FrictionModel for ThreeRegimeFriction {
    fn coefficient(&self, ctx: &FrictionContext) -> f64 {
        let Some((re, rel)) = regime_inputs(ctx, &self.roughness, self.nu) else {
            return 0.0;
        };
        match Regime::three_regime(re) {
            Regime::Laminar => correlations::laminar(re),
            Regime::Transient => correlations::blasius(re),
            Regime::Turbulent => correlations::colebrook_white(re, rel),
        }
    }

    fn name(&self) -> &'static str {
        "three_regime"
    }
}

/// Laminar / Colebrook-White, switched at the laminar limit.
#[derive(Clone, Debug)]
pub struct TwoRegimeFriction {
    roughness: RasterField,
    nu: f64,
}

impl TwoRegimeFriction {
    /// Create from a roughness field (m) and kinematic viscosity (m²/s).
    pub fn new(roughness: RasterField, nu: f64) -> Self {
        Self { roughness, nu }
    }
}

impl FrictionModel for TwoRegimeFriction {
    fn coefficient(&self, ctx: &FrictionContext) -> f64 {
        let Some((re, rel)) = regime_inputs(ctx, &self.roughness, self.nu) else {
            return 0.0;
        };
        match Regime::two_regime(re) {
            Regime::Laminar => correlations::laminar(re),
            _ => correlations::colebrook_white(re, rel),
        }
    }

    fn name(&self) -> &'static str {
        "two_regime"
    }
}

/// Churchill's all-regime correlation.
#[derive(Clone, Debug)]
pub struct ChurchillFriction {
    roughness: RasterField,
    nu: f64,
}

impl ChurchillFriction {
    /// Create from a roughness field (m) and kinematic viscosity (m²/s).
    pub fn new(roughness: RasterField, nu: f64) -> Self {
        Self { roughness, nu }
    }
}

impl FrictionModel for ChurchillFriction {
    fn coefficient(&self, ctx: &FrictionContext) -> f64 {
        match regime_inputs(ctx, &self.roughness, self.nu) {
            Some((re, rel)) => correlations::churchill(re, rel),
            None => 0.0,
        }
    }

    fn name(&self) -> &'static str {
        "churchill"
    }
}

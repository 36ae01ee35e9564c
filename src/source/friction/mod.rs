//! Darcy-Weisbach bottom friction.
//!
//! The friction coefficient f of each cell is stored in the patch aux array
//! ([`AUX_FRICTION`]) before the solver's source-term step, and momentum is
//! then damped as
//!
//!   S_hu = -f |u| u / 8
//!   S_hv = -f |u| v / 8
//!
//! Friction becomes stiff in thin films, so the damping uses the
//! semi-implicit form of [`semi_implicit_damping`].
//!
//! Models are selected once from configuration and stored as a boxed
//! [`FrictionModel`]; the per-cell loop never branches on the model type.

pub mod correlations;
mod lookup;
mod models;
mod viscosity;

pub use lookup::{BlockTable, RasterField};
pub use models::{
    BlockConstantFriction, CellRasterFriction, ChurchillFriction, ConstantFriction, NoFriction,
    ThreeRegimeFriction, TwoRegimeFriction,
};
pub use viscosity::{FluidProperties, ANDRADE_B, KELVIN_OFFSET};

use crate::config::{ConfigError, FrictionConfig, FrictionKind, LandspillConfig};
use crate::grid::{CellState, Coverage, Patch, AUX_FRICTION};

/// Everything a friction model may look at for one cell.
#[derive(Clone, Copy, Debug)]
pub struct FrictionContext {
    /// Cell center (x, y)
    pub position: (f64, f64),
    /// Cell state (h, hu, hv)
    pub state: CellState,
    /// Velocity magnitude |u|
    pub speed: f64,
}

impl FrictionContext {
    /// Create a context, computing the speed with dry-cell desingularization.
    pub fn new(position: (f64, f64), state: CellState, dry_tol: f64) -> Self {
        Self {
            position,
            state,
            speed: state.speed(dry_tol),
        }
    }
}

/// A Darcy-Weisbach coefficient model.
///
/// Implementations are pure functions of the context and of lookup data
/// fixed at construction, and must be thread-safe (`Send + Sync`) for
/// parallel evaluation.
pub trait FrictionModel: Send + Sync {
    /// Non-negative friction coefficient for one wet cell.
    fn coefficient(&self, ctx: &FrictionContext) -> f64;

    /// Name of this model for logging.
    fn name(&self) -> &'static str;
}

/// Build the configured coefficient model.
///
/// Rasters are loaded here; failures surface as configuration errors.
pub fn build_model(
    friction: &FrictionConfig,
    fluid: &FluidProperties,
) -> Result<Box<dyn FrictionModel>, ConfigError> {
    let raster_path = || {
        friction.raster_file.as_ref().ok_or_else(|| {
            ConfigError::invalid("friction.raster_file", "required for raster-based friction models")
        })
    };

    let model: Box<dyn FrictionModel> = match friction.kind {
        FrictionKind::None => Box::new(NoFriction),
        FrictionKind::Constant => Box::new(ConstantFriction::new(friction.coefficient)),
        FrictionKind::BlockConstant => Box::new(BlockConstantFriction::new(BlockTable::new(
            friction.blocks.clone(),
            friction.default_coefficient,
        )?)),
        FrictionKind::CellRaster => Box::new(CellRasterFriction::new(RasterField::load(
            raster_path()?,
            friction.default_coefficient,
            friction.sampling,
        )?)),
        FrictionKind::ThreeRegime | FrictionKind::TwoRegime | FrictionKind::Churchill => {
            let roughness =
                RasterField::load(raster_path()?, friction.default_roughness, friction.sampling)?;
            let nu = fluid.kinematic_viscosity();
            log::info!("kinematic viscosity {:.6e} m²/s", nu);
            match friction.kind {
                FrictionKind::ThreeRegime => Box::new(ThreeRegimeFriction::new(roughness, nu)),
                FrictionKind::TwoRegime => Box::new(TwoRegimeFriction::new(roughness, nu)),
                _ => Box::new(ChurchillFriction::new(roughness, nu)),
            }
        }
    };
    Ok(model)
}

/// Semi-implicit Darcy-Weisbach damping of one cell.
///
/// Given du/dt = -f |u| u / (8h), linearize as du/dt ≈ -f |uⁿ| uⁿ⁺¹ / (8h):
///
///   uⁿ⁺¹ = uⁿ / (1 + dt f |uⁿ| / (8h))
///
/// The depth is unchanged and the update never reverses the flow.
#[inline]
pub fn semi_implicit_damping(state: CellState, f: f64, dt: f64, dry_tol: f64) -> CellState {
    if f <= 0.0 || state.is_dry(dry_tol) {
        return state;
    }
    let speed = state.speed(dry_tol);
    if speed < 1e-14 {
        return state;
    }
    let denom = 1.0 + dt * f * speed / (8.0 * state.h);
    CellState::new(state.h, state.hu / denom, state.hv / denom)
}

/// Darcy-Weisbach friction: a coefficient model plus its depth window.
///
/// Friction applies only where `dry_tol < h < friction_tol`; elsewhere the
/// coefficient is zero.
pub struct DarcyWeisbach {
    model: Box<dyn FrictionModel>,
    friction_tol: f64,
    dry_tol: f64,
}

impl DarcyWeisbach {
    /// Wrap a model with its depth window.
    pub fn new(model: Box<dyn FrictionModel>, friction_tol: f64, dry_tol: f64) -> Self {
        Self {
            model,
            friction_tol,
            dry_tol,
        }
    }

    /// Build from a run configuration.
    pub fn from_config(config: &LandspillConfig) -> Result<Self, ConfigError> {
        let fluid = FluidProperties::from_config(config);
        let model = build_model(&config.friction, &fluid)?;
        log::info!("Darcy-Weisbach friction model: {}", model.name());
        Ok(Self::new(
            model,
            config.friction.friction_tol,
            config.friction_dry_tol(),
        ))
    }

    /// Whether friction is disabled.
    pub fn is_disabled(&self) -> bool {
        self.model.name() == NoFriction.name()
    }

    /// Coefficient model.
    pub fn model(&self) -> &dyn FrictionModel {
        self.model.as_ref()
    }

    /// Dry tolerance used for the depth window.
    pub fn dry_tol(&self) -> f64 {
        self.dry_tol
    }

    /// Coefficient for one cell, zero outside the depth window.
    #[inline]
    pub fn coefficient_at(&self, position: (f64, f64), state: CellState) -> f64 {
        if state.h <= self.dry_tol || state.h >= self.friction_tol {
            return 0.0;
        }
        let ctx = FrictionContext::new(position, state, self.dry_tol);
        if ctx.speed <= 0.0 {
            return 0.0;
        }
        self.model.coefficient(&ctx).max(0.0)
    }

    /// Write the coefficient of every interior cell into the aux array.
    ///
    /// Cells covered by a finer level are updated too: their coefficient is
    /// harmless and keeps the aux field defined for the solver.
    pub fn update_aux(&self, patch: &mut Patch) {
        let g = patch.geometry();
        patch.map_rows(|row| {
            for i in 0..row.len() {
                let f = self.coefficient_at(g.cell_center(i, row.j), row.state(i));
                row.set_aux(i, AUX_FRICTION, f);
            }
        });
    }

    /// Damp momentum with the coefficients stored in the aux array.
    ///
    /// Cells overlaid by a finer level are skipped; restriction overwrites
    /// them.
    pub fn apply_damping(&self, patch: &mut Patch, dt: f64, coverage: &dyn Coverage) {
        if self.is_disabled() {
            return;
        }
        let g = patch.geometry();
        let dry_tol = self.dry_tol;
        patch.map_rows(|row| {
            for i in 0..row.len() {
                let (x, y) = g.cell_center(i, row.j);
                if coverage.covered_by_finer(g.level, x, y) {
                    continue;
                }
                let f = row.aux(i, AUX_FRICTION);
                let damped = semi_implicit_damping(row.state(i), f, dt, dry_tol);
                row.set_state(i, damped);
            }
        });
    }
}

impl std::fmt::Debug for DarcyWeisbach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DarcyWeisbach")
            .field("model", &self.model.name())
            .field("friction_tol", &self.friction_tol)
            .field("dry_tol", &self.dry_tol)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrictionBlock;
    use crate::grid::SingleLevel;
    use crate::types::Bounds2D;

    const TOL: f64 = 1e-12;

    fn constant(coefficient: f64) -> DarcyWeisbach {
        DarcyWeisbach::new(Box::new(ConstantFriction::new(coefficient)), 1e6, 1e-4)
    }

    #[test]
    fn test_depth_window() {
        let dw = DarcyWeisbach::new(Box::new(ConstantFriction::new(0.25)), 1.0, 1e-4);
        assert_eq!(dw.coefficient_at((0.0, 0.0), CellState::new(0.0, 0.0, 0.0)), 0.0);
        assert_eq!(dw.coefficient_at((0.0, 0.0), CellState::new(1e-4, 1e-5, 0.0)), 0.0);
        assert_eq!(dw.coefficient_at((0.0, 0.0), CellState::new(0.5, 0.1, 0.0)), 0.25);
        assert_eq!(dw.coefficient_at((0.0, 0.0), CellState::new(1.0, 0.1, 0.0)), 0.0);
        // Still water has no friction.
        assert_eq!(dw.coefficient_at((0.0, 0.0), CellState::new(0.5, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_semi_implicit_damping() {
        let state = CellState::new(0.5, 0.5, 0.0);
        let damped = semi_implicit_damping(state, 0.4, 10.0, 1e-4);
        // speed 1, denom = 1 + 10 * 0.4 * 1 / 4 = 2
        assert!((damped.h - 0.5).abs() < TOL);
        assert!((damped.hu - 0.25).abs() < TOL);
        assert_eq!(damped.hv, 0.0);

        let dry = semi_implicit_damping(CellState::new(1e-5, 1e-6, 0.0), 0.4, 10.0, 1e-4);
        assert_eq!(dry.hu, 1e-6);
    }

    #[test]
    fn test_damping_never_reverses_flow() {
        let state = CellState::new(0.01, -0.05, 0.02);
        let damped = semi_implicit_damping(state, 100.0, 1e3, 1e-4);
        assert!(damped.hu < 0.0 && damped.hu > state.hu);
        assert!(damped.hv > 0.0 && damped.hv < state.hv);
    }

    #[test]
    fn test_update_aux_and_damp_patch() {
        let mut patch = Patch::new(0, Bounds2D::new(0.0, 2.0, 0.0, 2.0), 2, 2, 2);
        patch.fill(CellState::new(0.5, 0.5, 0.0));
        patch.set_state(1, 1, CellState::new(0.0, 0.0, 0.0));

        let dw = constant(0.4);
        dw.update_aux(&mut patch);
        assert_eq!(patch.aux(0, 0, AUX_FRICTION), 0.4);
        assert_eq!(patch.aux(1, 1, AUX_FRICTION), 0.0);

        dw.apply_damping(&mut patch, 10.0, &SingleLevel);
        assert!((patch.state(0, 0).hu - 0.25).abs() < TOL);
        assert_eq!(patch.state(1, 1), CellState::new(0.0, 0.0, 0.0));
        assert!((patch.volume() - 1.5).abs() < TOL);
    }

    #[test]
    fn test_block_constant_through_builder() {
        let friction = FrictionConfig {
            kind: FrictionKind::BlockConstant,
            default_coefficient: 0.25,
            blocks: vec![FrictionBlock {
                bounds: Bounds2D::new(0.0, 1.0, 0.0, 1.0),
                coefficient: 0.05,
            }],
            ..FrictionConfig::default()
        };
        let fluid = FluidProperties::from_config(&LandspillConfig::default());
        let model = build_model(&friction, &fluid).unwrap();
        assert_eq!(model.name(), "block_constant");

        let inside = FrictionContext::new((0.5, 0.5), CellState::new(0.1, 0.1, 0.0), 1e-4);
        let outside = FrictionContext::new((5.0, 0.5), CellState::new(0.1, 0.1, 0.0), 1e-4);
        assert_eq!(model.coefficient(&inside), 0.05);
        assert_eq!(model.coefficient(&outside), 0.25);
    }

    #[test]
    fn test_raster_models_need_a_file() {
        let friction = FrictionConfig {
            kind: FrictionKind::Churchill,
            ..FrictionConfig::default()
        };
        let fluid = FluidProperties::from_config(&LandspillConfig::default());
        assert!(matches!(
            build_model(&friction, &fluid),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }
}

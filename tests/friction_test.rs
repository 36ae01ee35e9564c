//! Friction model integration tests.
//!
//! Covers the agreement of the Reynolds-number-based models outside the
//! transient band, block lookup semantics, and damping through the
//! aux array of a patch.

use approx::assert_relative_eq;
use landspill::config::{FrictionBlock, FrictionConfig, FrictionKind, LandspillConfig};
use landspill::grid::AUX_FRICTION;
use landspill::source::friction::{
    build_model, correlations, BlockConstantFriction, BlockTable, CellRasterFriction,
    ChurchillFriction, FluidProperties, RasterField, ThreeRegimeFriction, TwoRegimeFriction,
};
use landspill::source::{FrictionContext, FrictionModel};
use landspill::{AsciiRaster, Bounds2D, CellState, DarcyWeisbach, Patch, Sampling, SingleLevel};

const NU: f64 = 1e-6;
const DEPTH: f64 = 0.1;

fn roughness(value: f64) -> RasterField {
    let raster = AsciiRaster::from_values(2, 2, 0.0, 0.0, 50.0, -9999.0, vec![value; 4]).unwrap();
    RasterField::new(raster, 0.0, Sampling::Nearest)
}

/// Context whose Reynolds number 4 h |u| / ν equals `re`.
fn context_at(re: f64) -> FrictionContext {
    let u = re * NU / (4.0 * DEPTH);
    FrictionContext::new((25.0, 25.0), CellState::from_primitives(DEPTH, u, 0.0), 1e-6)
}

#[test]
fn test_three_and_two_regime_agree_outside_transient_band() {
    let three = ThreeRegimeFriction::new(roughness(1e-4), NU);
    let two = TwoRegimeFriction::new(roughness(1e-4), NU);

    for re in [1.0, 64.0, 1500.0, 1999.0, 2.0e5, 1.0e6, 5.0e7] {
        let ctx = context_at(re);
        assert_eq!(
            three.coefficient(&ctx),
            two.coefficient(&ctx),
            "models disagree at Re = {}",
            re
        );
    }
}

#[test]
fn test_regime_models_differ_in_transient_band() {
    let three = ThreeRegimeFriction::new(roughness(1e-4), NU);
    let two = TwoRegimeFriction::new(roughness(1e-4), NU);

    let ctx = context_at(1.0e4);
    let f3 = three.coefficient(&ctx);
    let f2 = two.coefficient(&ctx);
    assert_relative_eq!(f3, 0.3164 / 1.0e4_f64.powf(0.25), max_relative = 1e-12);
    assert!((f3 - f2).abs() > 1e-6);
}

#[test]
fn test_laminar_coefficient() {
    let three = ThreeRegimeFriction::new(roughness(1e-3), NU);
    let churchill = ChurchillFriction::new(roughness(1e-3), NU);
    let ctx = context_at(100.0);

    assert_relative_eq!(three.coefficient(&ctx), 0.96, max_relative = 1e-10);
    // Churchill tends to the pipe-flow limit 64 / Re.
    assert_relative_eq!(churchill.coefficient(&ctx), 0.64, max_relative = 1e-6);
}

#[test]
fn test_turbulent_coefficient_satisfies_colebrook() {
    let eps = 1e-3;
    let two = TwoRegimeFriction::new(roughness(eps), NU);
    let re = 1.0e6;
    let f = two.coefficient(&context_at(re));

    let lhs = 1.0 / f.sqrt();
    let rhs = -2.0 * (eps / (3.7 * 4.0 * DEPTH) + 2.51 / (re * f.sqrt())).log10();
    assert_relative_eq!(lhs, rhs, max_relative = 1e-8);
    assert_eq!(correlations::Regime::two_regime(re), correlations::Regime::Turbulent);
}

#[test]
fn test_block_lookup_default_and_inside() {
    let blocks = vec![
        FrictionBlock {
            bounds: Bounds2D::new(0.0, 10.0, 0.0, 10.0),
            coefficient: 0.1,
        },
        FrictionBlock {
            bounds: Bounds2D::new(10.0, 20.0, 0.0, 10.0),
            coefficient: 0.5,
        },
    ];
    let model = BlockConstantFriction::new(BlockTable::new(blocks, 0.25).unwrap());
    let state = CellState::from_primitives(0.1, 0.2, 0.0);

    let outside = FrictionContext::new((5.0, 15.0), state, 1e-4);
    let first = FrictionContext::new((5.0, 5.0), state, 1e-4);
    let second = FrictionContext::new((15.0, 2.5), state, 1e-4);

    assert_eq!(model.coefficient(&outside), 0.25);
    assert_eq!(model.coefficient(&first), 0.1);
    assert_eq!(model.coefficient(&second), 0.5);
}

/// 2 × 2 coefficient raster over [0, 20]²; top row first.
fn coefficient_raster() -> AsciiRaster {
    AsciiRaster::from_values(2, 2, 0.0, 0.0, 10.0, -9999.0, vec![0.1, 0.2, 0.3, 0.4]).unwrap()
}

fn coefficient_at(model: &dyn FrictionModel, x: f64, y: f64) -> f64 {
    let state = CellState::from_primitives(0.1, 0.2, 0.0);
    model.coefficient(&FrictionContext::new((x, y), state, 1e-4))
}

#[test]
fn test_cell_raster_nearest_and_default() {
    let model = CellRasterFriction::new(RasterField::new(coefficient_raster(), 0.05, Sampling::Nearest));

    assert_eq!(coefficient_at(&model, 5.0, 15.0), 0.1);
    assert_eq!(coefficient_at(&model, 15.0, 15.0), 0.2);
    assert_eq!(coefficient_at(&model, 5.0, 5.0), 0.3);
    assert_eq!(coefficient_at(&model, 12.0, 3.0), 0.4);
    assert_eq!(coefficient_at(&model, 25.0, 5.0), 0.05);
    assert_eq!(coefficient_at(&model, 5.0, -1.0), 0.05);
}

#[test]
fn test_cell_raster_bilinear_and_default() {
    let model =
        CellRasterFriction::new(RasterField::new(coefficient_raster(), 0.05, Sampling::Bilinear));

    // Cell centers reproduce the raster; the shared corner averages all four.
    assert_relative_eq!(coefficient_at(&model, 5.0, 15.0), 0.1, max_relative = 1e-12);
    assert_relative_eq!(coefficient_at(&model, 15.0, 5.0), 0.4, max_relative = 1e-12);
    assert_relative_eq!(coefficient_at(&model, 10.0, 10.0), 0.25, max_relative = 1e-12);
    assert_relative_eq!(coefficient_at(&model, 10.0, 5.0), 0.35, max_relative = 1e-12);
    assert_eq!(coefficient_at(&model, 30.0, 30.0), 0.05);
}

#[test]
fn test_cell_raster_built_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manning.asc");
    std::fs::write(
        &path,
        "ncols 2\nnrows 2\nxllcorner 0.0\nyllcorner 0.0\ncellsize 10.0\nNODATA_value -9999\n0.1 0.2\n0.3 -9999\n",
    )
    .unwrap();

    for sampling in [Sampling::Nearest, Sampling::Bilinear] {
        let friction = FrictionConfig {
            kind: FrictionKind::CellRaster,
            raster_file: Some(path.clone()),
            default_coefficient: 0.05,
            sampling,
            ..FrictionConfig::default()
        };
        let model = build_model(&friction, &FluidProperties::from_config(&LandspillConfig::default()))
            .unwrap();
        assert_eq!(model.name(), "cell_raster");

        assert_relative_eq!(coefficient_at(model.as_ref(), 5.0, 15.0), 0.1, max_relative = 1e-12);
        assert_relative_eq!(coefficient_at(model.as_ref(), 15.0, 15.0), 0.2, max_relative = 1e-12);
        // Nodata cell and outside the extent fall back to the default.
        assert_eq!(coefficient_at(model.as_ref(), 15.0, 5.0), 0.05);
        assert_eq!(coefficient_at(model.as_ref(), -5.0, 5.0), 0.05);
    }
}

#[test]
fn test_overlapping_blocks_rejected() {
    let config = LandspillConfig {
        friction: FrictionConfig {
            kind: FrictionKind::BlockConstant,
            blocks: vec![
                FrictionBlock {
                    bounds: Bounds2D::new(0.0, 10.0, 0.0, 10.0),
                    coefficient: 0.1,
                },
                FrictionBlock {
                    bounds: Bounds2D::new(5.0, 15.0, 5.0, 15.0),
                    coefficient: 0.5,
                },
            ],
            ..FrictionConfig::default()
        },
        ..LandspillConfig::default()
    };
    assert!(config.validate().is_err());
    assert!(DarcyWeisbach::from_config(&config).is_err());
}

#[test]
fn test_damping_through_aux_array() {
    let config = LandspillConfig {
        friction: FrictionConfig {
            kind: FrictionKind::Constant,
            coefficient: 0.2,
            friction_tol: 1.0,
            ..FrictionConfig::default()
        },
        ..LandspillConfig::default()
    };
    let friction = DarcyWeisbach::from_config(&config).unwrap();

    let mut patch = Patch::new(0, Bounds2D::new(0.0, 3.0, 0.0, 1.0), 3, 1, 2);
    patch.set_state(0, 0, CellState::from_primitives(0.1, 1.0, 0.0));
    patch.set_state(1, 0, CellState::from_primitives(2.0, 1.0, 0.0));
    patch.set_state(2, 0, CellState::from_primitives(1e-5, 1.0, 0.0));

    friction.update_aux(&mut patch);
    assert_eq!(patch.aux(0, 0, AUX_FRICTION), 0.2);
    // Deeper than friction_tol, and dry.
    assert_eq!(patch.aux(1, 0, AUX_FRICTION), 0.0);
    assert_eq!(patch.aux(2, 0, AUX_FRICTION), 0.0);

    let dt = 0.5;
    friction.apply_damping(&mut patch, dt, &SingleLevel);

    let expected_u = 1.0 / (1.0 + dt * 0.2 * 1.0 / (8.0 * 0.1));
    let (u, v) = patch.state(0, 0).velocity(1e-4);
    assert_relative_eq!(u, expected_u, max_relative = 1e-12);
    assert_eq!(v, 0.0);
    assert_eq!(patch.depth(0, 0), 0.1);
    assert_eq!(patch.state(1, 0), CellState::from_primitives(2.0, 1.0, 0.0));
}

//! # landspill
//!
//! Overland oil-spill plug-ins for an adaptive-mesh-refinement shallow-water
//! solver.
//!
//! The external solver owns the Riemann solver, the patch hierarchy and
//! regridding. This crate supplies the physics it calls once per sub-step:
//! - Point-source injection with piecewise-constant rate profiles
//! - Darcy-Weisbach bottom friction (constant, block, raster and
//!   Reynolds-number-based coefficient models)
//! - Fingas evaporation
//! - Absorption of fluid reaching in-land waterbodies
//! - Refinement flagging around sources, forced regions and wet cells
//!
//! Every volume booked by these plug-ins is tracked in a mass ledger so that
//! global conservation can be checked at any time.

pub mod config;
pub mod error;
pub mod grid;
pub mod io;
pub mod refinement;
pub mod source;
pub mod step;
pub mod types;

pub use config::{
    ConfigError, EvaporationConfig, EvaporationKind, FrictionBlock, FrictionConfig, FrictionKind,
    LandspillConfig, PointSourceConfig,
};
pub use error::LandspillError;
pub use grid::{CellState, Coverage, Footprint, Hierarchy, Patch, PatchGeometry, SingleLevel};
pub use io::{AsciiRaster, Sampling};
pub use refinement::{FlagGrid, FlagSummary, RefineFlag, RefinementPolicy, TopoRegion};
pub use source::{
    AbsorptionEvent, DarcyWeisbach, Evaporation, EvaporationRecord, FrictionModel,
    HydroFeatureCollection, PointSource, PointSourceCollection,
};
pub use step::{MassLedger, StepOrchestrator, StepReport};
pub use types::Bounds2D;

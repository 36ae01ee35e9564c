//! Land-spill source terms.
//!
//! Each plug-in acts on one patch at a time and only books volume on cells
//! not covered by a finer level:
//! - [`friction`]: Darcy-Weisbach coefficient models and momentum damping
//! - [`evaporation`]: Fingas evaporation with a global evaporated-volume counter
//! - [`point_source`]: piecewise-constant mass injection at fixed locations
//! - [`hydro_feature`]: waterbody absorption with an event ledger

pub mod evaporation;
pub mod friction;
pub mod hydro_feature;
pub mod point_source;

pub use evaporation::{Evaporation, EvaporationRecord};
pub use friction::{
    semi_implicit_damping, DarcyWeisbach, FluidProperties, FrictionContext, FrictionModel,
};
pub use hydro_feature::{AbsorptionEvent, HydroFeatureCollection};
pub use point_source::{PointSource, PointSourceCollection, Stage};

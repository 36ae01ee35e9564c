//! Grid data handed over by the external AMR solver.
//!
//! - [`CellState`]: conserved variables of one cell
//! - [`Patch`]: one rectangular patch with ghost-padded `q` and `aux` arrays
//! - [`Hierarchy`]: levels of patches, with restriction onto coarser levels
//! - [`Coverage`]: "is this location refined further?" queries

mod hierarchy;
mod patch;
mod state;

pub use hierarchy::{Coverage, Footprint, Hierarchy, SingleLevel};
pub use patch::{
    AUX_FRICTION, AUX_TOPO, NUM_AUX, NUM_EQN, Patch, PatchGeometry, RowView,
};
pub use state::CellState;

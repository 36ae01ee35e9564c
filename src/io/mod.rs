//! File input and output.
//!
//! - [`raster`]: Esri ASCII grids for friction, roughness and waterbody masks
//! - [`data_file`]: Clawpack `.data` parameter files
//! - [`ledger`]: evaporated-volume and absorption-event ledgers

pub mod data_file;
pub mod ledger;
pub mod raster;

pub use data_file::{DataEntry, DataFile, DataFileError};
pub use ledger::{
    append_absorption_events, save_evaporation_history, write_absorption_events,
    write_evaporation_history, EVAPORATED_FILE, REMOVED_FILE,
};
pub use raster::{AsciiRaster, RasterError, RasterStatistics, Sampling, DEFAULT_NODATA};

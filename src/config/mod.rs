//! Run configuration for the land-spill plug-ins.
//!
//! Everything here is resolved before the first sub-step. A configuration
//! that fails [`LandspillConfig::validate`] must abort the run before any
//! output is produced.
//!
//! Two loaders are provided:
//! - [`LandspillConfig::from_json_str`] / [`LandspillConfig::from_json_file`]
//! - [`LandspillConfig::from_data_file`], reading the `landspill.data` set
//!   written by the Python setup tools
//!
//! # Example
//!
//! ```
//! use landspill::config::{FrictionKind, LandspillConfig, PointSourceConfig};
//!
//! let mut config = LandspillConfig::default();
//! config.point_sources.push(PointSourceConfig::new(
//!     (10.0, 11.0),
//!     vec![60.0, 1800.0, 7200.0],
//!     vec![1.0, 0.5, 0.1],
//! ));
//! config.friction.kind = FrictionKind::ThreeRegime;
//! config.friction.raster_file = Some("roughness.asc".into());
//! config.validate().unwrap();
//! ```

mod data_files;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::io::{DataFileError, RasterError, Sampling};
use crate::refinement::TopoRegion;
use crate::types::Bounds2D;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed `.data` file
    #[error("data file error: {0}")]
    DataFile(#[from] DataFileError),

    /// Malformed or unreadable raster
    #[error("raster error: {0}")]
    Raster(#[from] RasterError),

    /// Malformed JSON configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two friction blocks share a region of positive area
    #[error("friction blocks {first} and {second} overlap")]
    OverlappingBlocks { first: usize, second: usize },

    /// Stage end times not strictly increasing
    #[error("point source {source_index}: stage {index} end time is not after the previous one")]
    NonMonotonicStages { source_index: usize, index: usize },

    /// Stage end-time and rate lists differ in length
    #[error("point source {source_index}: {n_times} end times but {n_rates} rates")]
    StageCountMismatch {
        source_index: usize,
        n_times: usize,
        n_rates: usize,
    },

    /// Friction type code outside 0..=6
    #[error("unknown friction model type {0}")]
    UnknownFrictionType(i64),

    /// Evaporation type code outside 0..=2
    #[error("unknown evaporation model type {0}")]
    UnknownEvaporationType(i64),

    /// Evaporation enabled without two coefficients
    #[error("evaporation model needs 2 coefficients, found {0}")]
    MissingCoefficients(usize),

    /// Any other out-of-range parameter
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// One point source: a fixed location and a piecewise-constant rate profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointSourceConfig {
    /// Location (x, y)
    pub location: (f64, f64),
    /// Stage end times, as elapsed time since the start time (s)
    pub end_times: Vec<f64>,
    /// Volumetric rate during each stage (m³/s)
    pub rates: Vec<f64>,
}

impl PointSourceConfig {
    /// Create a point-source configuration.
    pub fn new(location: (f64, f64), end_times: Vec<f64>, rates: Vec<f64>) -> Self {
        Self {
            location,
            end_times,
            rates,
        }
    }
}

/// Friction model selector, with the numeric codes of the `.data` files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrictionKind {
    /// 0: no Darcy-Weisbach friction
    #[default]
    None,
    /// 1: one coefficient everywhere
    Constant,
    /// 2: rectangular blocks with a default outside them
    BlockConstant,
    /// 3: coefficients from a raster
    CellRaster,
    /// 4: laminar / transient / turbulent correlations
    ThreeRegime,
    /// 5: Churchill's all-regime correlation
    Churchill,
    /// 6: laminar / Colebrook-White correlations
    TwoRegime,
}

impl FrictionKind {
    /// Map a `.data` type code to a kind.
    pub fn from_code(code: i64) -> Result<Self, ConfigError> {
        Ok(match code {
            0 => FrictionKind::None,
            1 => FrictionKind::Constant,
            2 => FrictionKind::BlockConstant,
            3 => FrictionKind::CellRaster,
            4 => FrictionKind::ThreeRegime,
            5 => FrictionKind::Churchill,
            6 => FrictionKind::TwoRegime,
            other => return Err(ConfigError::UnknownFrictionType(other)),
        })
    }

    /// The `.data` type code.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Whether the kind reads a raster file.
    pub fn needs_raster(self) -> bool {
        matches!(
            self,
            FrictionKind::CellRaster
                | FrictionKind::ThreeRegime
                | FrictionKind::Churchill
                | FrictionKind::TwoRegime
        )
    }

    /// Whether the kind derives the coefficient from a Reynolds number.
    pub fn is_regime_based(self) -> bool {
        matches!(
            self,
            FrictionKind::ThreeRegime | FrictionKind::Churchill | FrictionKind::TwoRegime
        )
    }
}

/// A rectangular region with its own friction coefficient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrictionBlock {
    /// Region
    pub bounds: Bounds2D,
    /// Darcy-Weisbach coefficient inside the region
    pub coefficient: f64,
}

/// Darcy-Weisbach friction settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrictionConfig {
    /// Which model to use
    pub kind: FrictionKind,
    /// Friction applies only where the depth is below this
    pub friction_tol: f64,
    /// Depth at or below which a cell is dry (defaults to the run's dry tolerance)
    pub dry_tol: Option<f64>,
    /// Coefficient for [`FrictionKind::Constant`]
    pub coefficient: f64,
    /// Coefficient outside blocks / raster coverage
    pub default_coefficient: f64,
    /// Blocks for [`FrictionKind::BlockConstant`]
    pub blocks: Vec<FrictionBlock>,
    /// Coefficient or roughness raster
    pub raster_file: Option<PathBuf>,
    /// Roughness (m) outside raster coverage for regime-based kinds
    pub default_roughness: f64,
    /// Raster sampling method
    pub sampling: Sampling,
}

impl Default for FrictionConfig {
    fn default() -> Self {
        Self {
            kind: FrictionKind::None,
            friction_tol: 1e6,
            dry_tol: None,
            coefficient: 0.25,
            default_coefficient: 0.25,
            blocks: Vec::new(),
            raster_file: None,
            default_roughness: 0.0,
            sampling: Sampling::Nearest,
        }
    }
}

/// Evaporation model selector, with the numeric codes of the `.data` files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaporationKind {
    /// 0: no evaporation
    #[default]
    None,
    /// 1: Fingas natural-log law
    FingasLog,
    /// 2: Fingas square-root law
    FingasSqrt,
}

impl EvaporationKind {
    /// Map a `.data` type code to a kind.
    pub fn from_code(code: i64) -> Result<Self, ConfigError> {
        Ok(match code {
            0 => EvaporationKind::None,
            1 => EvaporationKind::FingasLog,
            2 => EvaporationKind::FingasSqrt,
            other => return Err(ConfigError::UnknownEvaporationType(other)),
        })
    }
}

/// Evaporation settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaporationConfig {
    /// Which model to use
    pub kind: EvaporationKind,
    /// Model coefficients [C1, C2]
    pub coefficients: Vec<f64>,
}

/// Complete land-spill configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandspillConfig {
    /// Dynamic viscosity at the reference temperature (mPa·s)
    pub ref_mu: f64,
    /// Reference temperature (°C)
    pub ref_temperature: f64,
    /// Ambient temperature (°C)
    pub ambient_temperature: f64,
    /// Fluid density at ambient temperature (kg/m³)
    pub density: f64,
    /// Depth at or below which a cell is dry (m)
    pub dry_tolerance: f64,
    /// Depth below which restriction drops momentum (defaults to `dry_tolerance`)
    pub update_tol: Option<f64>,
    /// Depth above which a cell counts as wet for refinement (m)
    pub refine_tol: f64,
    /// Simulation start time t0 (s)
    pub start_time: f64,
    /// Point sources, in index order
    pub point_sources: Vec<PointSourceConfig>,
    /// Friction model
    pub friction: FrictionConfig,
    /// Hydrologic-feature rasters, in precedence order
    pub hydro_features: Vec<PathBuf>,
    /// Evaporation model
    pub evaporation: EvaporationConfig,
    /// Regions forcing refinement during a time window
    pub topo_regions: Vec<TopoRegion>,
}

impl Default for LandspillConfig {
    fn default() -> Self {
        Self {
            ref_mu: 332.0,
            ref_temperature: 15.0,
            ambient_temperature: 25.0,
            density: 926.6,
            dry_tolerance: 1e-4,
            update_tol: None,
            refine_tol: 0.0,
            start_time: 0.0,
            point_sources: Vec::new(),
            friction: FrictionConfig::default(),
            hydro_features: Vec::new(),
            evaporation: EvaporationConfig::default(),
            topo_regions: Vec::new(),
        }
    }
}

impl LandspillConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    ///
    /// Relative raster paths are resolved against the file's directory.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        config.validate()?;
        log::info!("loaded configuration {}", path.display());
        Ok(config)
    }

    /// Load the `landspill.data` file set.
    ///
    /// Child files are named by the parent and resolved against its directory.
    pub fn from_data_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = data_files::read_landspill_data(path.as_ref())?;
        config.validate()?;
        log::info!("loaded configuration {}", path.as_ref().display());
        Ok(config)
    }

    /// Set the start time.
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// `update_tol`, falling back to the dry tolerance.
    pub fn update_tol(&self) -> f64 {
        self.update_tol
            .filter(|v| v.is_finite())
            .unwrap_or(self.dry_tolerance)
    }

    /// Friction dry tolerance, falling back to the run's dry tolerance.
    pub fn friction_dry_tol(&self) -> f64 {
        self.friction
            .dry_tol
            .filter(|v| v.is_finite())
            .unwrap_or(self.dry_tolerance)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(file) = self.friction.raster_file.as_mut() {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
        for file in &mut self.hydro_features {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
    }

    /// Check every parameter; the first violation is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("ref_mu", self.ref_mu)?;
        positive("density", self.density)?;
        finite("ref_temperature", self.ref_temperature)?;
        finite("ambient_temperature", self.ambient_temperature)?;
        finite("start_time", self.start_time)?;
        non_negative("dry_tolerance", self.dry_tolerance)?;
        non_negative("refine_tol", self.refine_tol)?;
        non_negative("update_tol", self.update_tol())?;
        if self.ref_temperature <= -273.15 || self.ambient_temperature <= -273.15 {
            return Err(ConfigError::invalid("temperature", "below absolute zero"));
        }

        for (index, source) in self.point_sources.iter().enumerate() {
            validate_point_source(index, source)?;
        }

        for (k, region) in self.topo_regions.iter().enumerate() {
            if region.t1.is_nan() || region.t2.is_nan() || region.t1 > region.t2 {
                return Err(ConfigError::invalid(
                    format!("topo_regions[{}]", k),
                    format!("window [{}, {}] is empty", region.t1, region.t2),
                ));
            }
        }

        self.validate_friction()?;
        self.validate_evaporation()?;
        Ok(())
    }

    fn validate_friction(&self) -> Result<(), ConfigError> {
        let friction = &self.friction;
        if friction.kind == FrictionKind::None {
            return Ok(());
        }

        positive("friction.friction_tol", friction.friction_tol)?;
        non_negative("friction.dry_tol", self.friction_dry_tol())?;

        match friction.kind {
            FrictionKind::Constant => non_negative("friction.coefficient", friction.coefficient)?,
            FrictionKind::BlockConstant => {
                non_negative("friction.default_coefficient", friction.default_coefficient)?;
                for (k, block) in friction.blocks.iter().enumerate() {
                    non_negative(&format!("friction.blocks[{}].coefficient", k), block.coefficient)?;
                    let b = block.bounds;
                    if Bounds2D::try_new(b.x_min, b.x_max, b.y_min, b.y_max).is_none() {
                        return Err(ConfigError::invalid(
                            format!("friction.blocks[{}]", k),
                            "lower corner must be strictly below upper corner",
                        ));
                    }
                }
                for first in 0..friction.blocks.len() {
                    for second in first + 1..friction.blocks.len() {
                        if friction.blocks[first]
                            .bounds
                            .overlaps(&friction.blocks[second].bounds)
                        {
                            return Err(ConfigError::OverlappingBlocks { first, second });
                        }
                    }
                }
            }
            FrictionKind::CellRaster => {
                non_negative("friction.default_coefficient", friction.default_coefficient)?
            }
            _ => non_negative("friction.default_roughness", friction.default_roughness)?,
        }

        if friction.kind.needs_raster() && friction.raster_file.is_none() {
            return Err(ConfigError::invalid(
                "friction.raster_file",
                "required for raster-based friction models",
            ));
        }
        Ok(())
    }

    fn validate_evaporation(&self) -> Result<(), ConfigError> {
        let evaporation = &self.evaporation;
        if evaporation.kind == EvaporationKind::None {
            return Ok(());
        }
        if evaporation.coefficients.len() != 2 {
            return Err(ConfigError::MissingCoefficients(evaporation.coefficients.len()));
        }
        for (k, c) in evaporation.coefficients.iter().enumerate() {
            finite(&format!("evaporation.coefficients[{}]", k), *c)?;
        }
        Ok(())
    }
}

/// Check one point source's location and rate profile.
pub(crate) fn validate_point_source(index: usize, source: &PointSourceConfig) -> Result<(), ConfigError> {
    let (x, y) = source.location;
    if !x.is_finite() || !y.is_finite() {
        return Err(ConfigError::invalid(
            format!("point_sources[{}].location", index),
            "must be finite",
        ));
    }
    if source.end_times.len() != source.rates.len() {
        return Err(ConfigError::StageCountMismatch {
            source_index: index,
            n_times: source.end_times.len(),
            n_rates: source.rates.len(),
        });
    }
    if source.end_times.is_empty() {
        return Err(ConfigError::invalid(
            format!("point_sources[{}]", index),
            "needs at least one stage",
        ));
    }

    let mut previous = 0.0;
    for (k, (&end, &rate)) in source.end_times.iter().zip(&source.rates).enumerate() {
        if !end.is_finite() || end <= previous {
            return Err(ConfigError::NonMonotonicStages {
                source_index: index,
                index: k,
            });
        }
        non_negative(&format!("point_sources[{}].rates[{}]", index, k), rate)?;
        previous = end;
    }
    Ok(())
}

fn finite(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, format!("must be finite, got {}", value)))
    }
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, format!("must be positive, got {}", value)))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, format!("must be non-negative, got {}", value)))
    }
}

//! Esri ASCII grid reader.
//!
//! Friction coefficients, surface roughness and hydrologic-feature masks are
//! all supplied as Esri ASCII rasters addressed by world coordinate.
//!
//! # File Format
//!
//! ```text
//! ncols          4
//! nrows          4
//! xllcorner     -2.0
//! yllcorner     -2.0
//! cellsize       1.0
//! NODATA_value  -9999
//! 0.0 0.0 0.0 0.0
//! 0.0 0.0 0.0 0.0
//! 0.0 0.0 0.0 0.0
//! 0.0 0.0 0.0 0.0
//! ```
//!
//! Values are listed row by row starting from the northernmost row. Cells
//! holding the nodata value, NaN or infinity are treated as missing.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Bounds2D;

/// Nodata value assumed when the header does not declare one.
pub const DEFAULT_NODATA: f64 = -9999.0;

/// Error type for raster parsing.
#[derive(Debug, Error)]
pub enum RasterError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Header entry missing or malformed
    #[error("Invalid header at line {line}: {message}")]
    Header { line: usize, message: String },

    /// Required header key absent
    #[error("Missing header key: {0}")]
    MissingKey(&'static str),

    /// Data value could not be parsed
    #[error("Invalid value at line {line}: {token:?}")]
    Value { line: usize, token: String },

    /// Number of data values does not match ncols × nrows
    #[error("Expected {expected} values, found {found}")]
    ValueCount { expected: usize, found: usize },

    /// Grid dimensions or cell size are not usable
    #[error("Invalid grid geometry: {0}")]
    Geometry(String),
}

/// How a raster is sampled at an arbitrary point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    /// Value of the raster cell containing the point
    #[default]
    Nearest,
    /// Bilinear interpolation between the four surrounding cell centers
    Bilinear,
}

/// An Esri ASCII raster held in memory.
///
/// Immutable after loading, so one instance can be shared by every thread
/// sampling it.
#[derive(Clone, Debug)]
pub struct AsciiRaster {
    ncols: usize,
    nrows: usize,
    x_lower: f64,
    y_lower: f64,
    cellsize: f64,
    nodata: f64,
    /// Row-major values, northernmost row first
    values: Vec<f64>,
}

impl AsciiRaster {
    /// Build a raster from values listed northernmost row first.
    pub fn from_values(
        ncols: usize,
        nrows: usize,
        x_lower: f64,
        y_lower: f64,
        cellsize: f64,
        nodata: f64,
        values: Vec<f64>,
    ) -> Result<Self, RasterError> {
        if ncols == 0 || nrows == 0 {
            return Err(RasterError::Geometry(format!(
                "grid must have at least one cell, got {}x{}",
                ncols, nrows
            )));
        }
        if !(cellsize > 0.0 && cellsize.is_finite()) {
            return Err(RasterError::Geometry(format!(
                "cellsize must be positive, got {}",
                cellsize
            )));
        }
        if !x_lower.is_finite() || !y_lower.is_finite() {
            return Err(RasterError::Geometry("corner coordinates must be finite".into()));
        }
        if values.len() != ncols * nrows {
            return Err(RasterError::ValueCount {
                expected: ncols * nrows,
                found: values.len(),
            });
        }

        Ok(Self {
            ncols,
            nrows,
            x_lower,
            y_lower,
            cellsize,
            nodata,
            values,
        })
    }

    /// Load a raster file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RasterError> {
        let file = File::open(path.as_ref())?;
        let raster = Self::from_reader(BufReader::new(file))?;
        log::info!(
            "loaded raster {} ({}x{}, cellsize {})",
            path.as_ref().display(),
            raster.ncols,
            raster.nrows,
            raster.cellsize
        );
        Ok(raster)
    }

    /// Parse a raster from text.
    pub fn parse(text: &str) -> Result<Self, RasterError> {
        Self::from_reader(text.as_bytes())
    }

    /// Parse a raster from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, RasterError> {
        let mut ncols: Option<usize> = None;
        let mut nrows: Option<usize> = None;
        let mut x_corner: Option<f64> = None;
        let mut y_corner: Option<f64> = None;
        let mut x_center: Option<f64> = None;
        let mut y_center: Option<f64> = None;
        let mut cellsize: Option<f64> = None;
        let mut nodata = DEFAULT_NODATA;
        let mut values = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();
            let line_no = line_num + 1;

            if line.is_empty() {
                continue;
            }

            let first = line.split_whitespace().next().unwrap_or_default();
            let is_header = first.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && first.parse::<f64>().is_err();

            if is_header {
                if !values.is_empty() {
                    return Err(RasterError::Header {
                        line: line_no,
                        message: "header entry after data values".into(),
                    });
                }
                let mut parts = line.split_whitespace();
                let key = parts.next().unwrap_or_default().to_ascii_lowercase();
                let raw = parts.next().ok_or_else(|| RasterError::Header {
                    line: line_no,
                    message: format!("no value for {}", key),
                })?;
                let number: f64 = raw.parse().map_err(|_| RasterError::Header {
                    line: line_no,
                    message: format!("invalid value {:?} for {}", raw, key),
                })?;

                match key.as_str() {
                    "ncols" => ncols = Some(parse_count(number, line_no, "ncols")?),
                    "nrows" => nrows = Some(parse_count(number, line_no, "nrows")?),
                    "xllcorner" => x_corner = Some(number),
                    "yllcorner" => y_corner = Some(number),
                    "xllcenter" => x_center = Some(number),
                    "yllcenter" => y_center = Some(number),
                    "cellsize" => cellsize = Some(number),
                    "nodata_value" => nodata = number,
                    _ => {
                        return Err(RasterError::Header {
                            line: line_no,
                            message: format!("unknown key {}", key),
                        })
                    }
                }
                continue;
            }

            for token in line.split_whitespace() {
                let v: f64 = token.parse().map_err(|_| RasterError::Value {
                    line: line_no,
                    token: token.to_string(),
                })?;
                values.push(v);
            }
        }

        let ncols = ncols.ok_or(RasterError::MissingKey("ncols"))?;
        let nrows = nrows.ok_or(RasterError::MissingKey("nrows"))?;
        let cellsize = cellsize.ok_or(RasterError::MissingKey("cellsize"))?;
        let x_lower = match (x_corner, x_center) {
            (Some(x), _) => x,
            (None, Some(x)) => x - 0.5 * cellsize,
            (None, None) => return Err(RasterError::MissingKey("xllcorner")),
        };
        let y_lower = match (y_corner, y_center) {
            (Some(y), _) => y,
            (None, Some(y)) => y - 0.5 * cellsize,
            (None, None) => return Err(RasterError::MissingKey("yllcorner")),
        };

        Self::from_values(ncols, nrows, x_lower, y_lower, cellsize, nodata, values)
    }

    /// World-coordinate extent.
    pub fn bounds(&self) -> Bounds2D {
        Bounds2D::new(
            self.x_lower,
            self.x_lower + self.ncols as f64 * self.cellsize,
            self.y_lower,
            self.y_lower + self.nrows as f64 * self.cellsize,
        )
    }

    /// Dimensions (ncols, nrows).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.ncols, self.nrows)
    }

    /// Cell size.
    pub fn cellsize(&self) -> f64 {
        self.cellsize
    }

    /// Nodata sentinel.
    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    #[inline]
    fn is_valid_value(&self, v: f64) -> bool {
        v.is_finite() && v != self.nodata
    }

    /// Value at (row, col), row 0 being the northernmost; `None` for nodata.
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.nrows || col >= self.ncols {
            return None;
        }
        let v = self.values[row * self.ncols + col];
        self.is_valid_value(v).then_some(v)
    }

    /// Raster cell (row, col) containing `(x, y)`; edges inclusive.
    pub fn pixel(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        let col = (((x - self.x_lower) / self.cellsize).floor() as usize).min(self.ncols - 1);
        let from_bottom =
            (((y - self.y_lower) / self.cellsize).floor() as usize).min(self.nrows - 1);
        Some((self.nrows - 1 - from_bottom, col))
    }

    /// Value of the raster cell containing `(x, y)`.
    ///
    /// Returns `None` outside the extent or on nodata.
    pub fn sample_nearest(&self, x: f64, y: f64) -> Option<f64> {
        let (row, col) = self.pixel(x, y)?;
        self.value(row, col)
    }

    /// Bilinear interpolation between surrounding cell centers.
    ///
    /// Falls back to nearest sampling when any of the four corners is nodata.
    pub fn sample_bilinear(&self, x: f64, y: f64) -> Option<f64> {
        if !self.bounds().contains(x, y) {
            return None;
        }

        let max_col = (self.ncols - 1) as f64;
        let max_row = (self.nrows - 1) as f64;
        let fx = ((x - self.x_lower) / self.cellsize - 0.5).clamp(0.0, max_col);
        let fy = ((y - self.y_lower) / self.cellsize - 0.5).clamp(0.0, max_row);

        let c0 = fx.floor() as usize;
        let b0 = fy.floor() as usize;
        let c1 = (c0 + 1).min(self.ncols - 1);
        let b1 = (b0 + 1).min(self.nrows - 1);
        let s = fx - c0 as f64;
        let t = fy - b0 as f64;

        // b counts rows from the bottom
        let row = |b: usize| self.nrows - 1 - b;
        let corners = (
            self.value(row(b0), c0),
            self.value(row(b0), c1),
            self.value(row(b1), c0),
            self.value(row(b1), c1),
        );

        match corners {
            (Some(v00), Some(v10), Some(v01), Some(v11)) => Some(
                (1.0 - s) * (1.0 - t) * v00
                    + s * (1.0 - t) * v10
                    + (1.0 - s) * t * v01
                    + s * t * v11,
            ),
            _ => self.sample_nearest(x, y),
        }
    }

    /// Sample with the given method.
    #[inline]
    pub fn sample(&self, x: f64, y: f64, sampling: Sampling) -> Option<f64> {
        match sampling {
            Sampling::Nearest => self.sample_nearest(x, y),
            Sampling::Bilinear => self.sample_bilinear(x, y),
        }
    }

    /// Whether `(x, y)` falls on a cell carrying data.
    #[inline]
    pub fn has_data(&self, x: f64, y: f64) -> bool {
        self.sample_nearest(x, y).is_some()
    }

    /// Summary statistics.
    pub fn statistics(&self) -> RasterStatistics {
        let mut valid_count = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &self.values {
            if self.is_valid_value(v) {
                valid_count += 1;
                min = min.min(v);
                max = max.max(v);
            }
        }

        RasterStatistics {
            ncols: self.ncols,
            nrows: self.nrows,
            valid_count,
            nodata_count: self.values.len() - valid_count,
            min: if valid_count > 0 { min } else { 0.0 },
            max: if valid_count > 0 { max } else { 0.0 },
            bounds: self.bounds(),
        }
    }
}

fn parse_count(number: f64, line: usize, key: &str) -> Result<usize, RasterError> {
    if number >= 1.0 && number.fract() == 0.0 {
        Ok(number as usize)
    } else {
        Err(RasterError::Header {
            line,
            message: format!("{} must be a positive integer, got {}", key, number),
        })
    }
}

/// Statistics about a raster dataset.
#[derive(Debug, Clone)]
pub struct RasterStatistics {
    /// Columns
    pub ncols: usize,
    /// Rows
    pub nrows: usize,
    /// Cells carrying data
    pub valid_count: usize,
    /// Nodata cells
    pub nodata_count: usize,
    /// Smallest valid value
    pub min: f64,
    /// Largest valid value
    pub max: f64,
    /// World extent
    pub bounds: Bounds2D,
}

impl fmt::Display for RasterStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Raster Statistics:")?;
        writeln!(f, "  Dimensions: {}x{} cells", self.ncols, self.nrows)?;
        writeln!(f, "  Valid cells: {}", self.valid_count)?;
        writeln!(f, "  NoData cells: {}", self.nodata_count)?;
        writeln!(f, "  Value range: {} to {}", self.min, self.max)?;
        write!(f, "  Extent: {}", self.bounds)
    }
}

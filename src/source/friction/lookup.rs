//! Spatial lookup tables for friction coefficients and roughness.
//!
//! Both tables are built once from configuration and only read afterwards,
//! so they are shared by every thread evaluating friction.

use std::path::Path;

use crate::config::{ConfigError, FrictionBlock};
use crate::io::{AsciiRaster, Sampling};

/// Rectangular blocks with a default coefficient outside them.
///
/// Blocks never overlap with positive area. A point on an edge shared by two
/// blocks takes the coefficient of the block listed first.
#[derive(Clone, Debug)]
pub struct BlockTable {
    blocks: Vec<FrictionBlock>,
    default: f64,
}

impl BlockTable {
    /// Create a table, rejecting overlapping blocks.
    pub fn new(blocks: Vec<FrictionBlock>, default: f64) -> Result<Self, ConfigError> {
        for first in 0..blocks.len() {
            for second in first + 1..blocks.len() {
                if blocks[first].bounds.overlaps(&blocks[second].bounds) {
                    return Err(ConfigError::OverlappingBlocks { first, second });
                }
            }
        }
        Ok(Self { blocks, default })
    }

    /// Coefficient at `(x, y)`.
    #[inline]
    pub fn lookup(&self, x: f64, y: f64) -> f64 {
        self.blocks
            .iter()
            .find(|block| block.bounds.contains(x, y))
            .map_or(self.default, |block| block.coefficient)
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the table has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Coefficient used outside every block.
    pub fn default_value(&self) -> f64 {
        self.default
    }
}

/// A raster sampled at cell centers, with a fallback outside its data.
#[derive(Clone, Debug)]
pub struct RasterField {
    raster: AsciiRaster,
    default: f64,
    sampling: Sampling,
}

impl RasterField {
    /// Wrap an in-memory raster.
    pub fn new(raster: AsciiRaster, default: f64, sampling: Sampling) -> Self {
        Self {
            raster,
            default,
            sampling,
        }
    }

    /// Load the raster from disk.
    pub fn load<P: AsRef<Path>>(
        path: P,
        default: f64,
        sampling: Sampling,
    ) -> Result<Self, ConfigError> {
        let raster = AsciiRaster::load(path)?;
        log::info!("friction raster: {}", raster.statistics());
        Ok(Self::new(raster, default, sampling))
    }

    /// Value at `(x, y)`, or the default where the raster has no data.
    #[inline]
    pub fn lookup(&self, x: f64, y: f64) -> f64 {
        self.raster.sample(x, y, self.sampling).unwrap_or(self.default)
    }

    /// Underlying raster.
    pub fn raster(&self) -> &AsciiRaster {
        &self.raster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bounds2D;

    fn block(x0: f64, x1: f64, y0: f64, y1: f64, coefficient: f64) -> FrictionBlock {
        FrictionBlock {
            bounds: Bounds2D::new(x0, x1, y0, y1),
            coefficient,
        }
    }

    #[test]
    fn test_block_lookup() {
        let table = BlockTable::new(
            vec![block(0.0, 10.0, 0.0, 10.0, 0.1), block(10.0, 20.0, 0.0, 10.0, 0.5)],
            0.25,
        )
        .unwrap();

        assert_eq!(table.lookup(5.0, 5.0), 0.1);
        assert_eq!(table.lookup(15.0, 5.0), 0.5);
        assert_eq!(table.lookup(25.0, 5.0), 0.25);
        assert_eq!(table.lookup(5.0, -1.0), 0.25);
        // Shared edge: first listed block wins.
        assert_eq!(table.lookup(10.0, 5.0), 0.1);
    }

    #[test]
    fn test_overlap_rejected() {
        let result = BlockTable::new(
            vec![block(0.0, 10.0, 0.0, 10.0, 0.1), block(5.0, 15.0, 5.0, 15.0, 0.5)],
            0.25,
        );
        assert!(matches!(
            result,
            Err(ConfigError::OverlappingBlocks { first: 0, second: 1 })
        ));
    }

    #[test]
    fn test_raster_field_default_outside() {
        let raster = AsciiRaster::parse(
            "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\nNODATA_value -9999\n\
             0.1 -9999\n0.2 0.3\n",
        )
        .unwrap();
        let field = RasterField::new(raster, 0.05, Sampling::Nearest);
        assert_eq!(field.lookup(0.5, 1.5), 0.1);
        assert_eq!(field.lookup(1.5, 0.5), 0.3);
        assert_eq!(field.lookup(1.5, 1.5), 0.05);
        assert_eq!(field.lookup(3.0, 0.5), 0.05);
    }
}

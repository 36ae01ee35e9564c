//! In-land waterbodies absorbing the fluid that reaches them.
//!
//! Each feature is a raster mask: a location belongs to the feature when the
//! raster has data (anything but the nodata value) at that point, sampled
//! at cell centers with nearest-cell lookup. A waterbody is an infinite
//! sink; every wet cell inside a mask loses its whole depth and its
//! momentum.
//!
//! Masks are tried in configuration order and the first one containing a
//! cell claims it, so overlapping masks never remove the same fluid twice.
//! Every removal is logged as an [`AbsorptionEvent`].

use std::path::Path;

use crate::config::{ConfigError, LandspillConfig};
use crate::grid::{CellState, Coverage, Patch};
use crate::io::AsciiRaster;

/// Fluid removed from one cell by a waterbody.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbsorptionEvent {
    /// Simulation time of the removal (s)
    pub time: f64,
    /// Cell center x
    pub x: f64,
    /// Cell center y
    pub y: f64,
    /// Volume removed (m³)
    pub volume: f64,
    /// Index of the mask that claimed the cell
    pub feature: usize,
}

/// Waterbody masks and the ledger of absorbed fluid.
#[derive(Clone, Debug, Default)]
pub struct HydroFeatureCollection {
    masks: Vec<AsciiRaster>,
    events: Vec<AbsorptionEvent>,
    removed: f64,
}

impl HydroFeatureCollection {
    /// Create from in-memory masks, in precedence order.
    pub fn new(masks: Vec<AsciiRaster>) -> Self {
        Self {
            masks,
            events: Vec::new(),
            removed: 0.0,
        }
    }

    /// Load masks from raster files, in precedence order.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let masks = paths
            .iter()
            .map(|p| AsciiRaster::load(p))
            .collect::<Result<Vec<_>, _>>()?;
        for (index, mask) in masks.iter().enumerate() {
            log::info!("hydro feature {}: {}", index, mask.statistics());
        }
        Ok(Self::new(masks))
    }

    /// Build from a run configuration.
    pub fn from_config(config: &LandspillConfig) -> Result<Self, ConfigError> {
        Self::load(&config.hydro_features)
    }

    /// Number of masks.
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// Whether there are no masks.
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// First mask containing `(x, y)`.
    #[inline]
    pub fn feature_at(&self, x: f64, y: f64) -> Option<usize> {
        self.masks.iter().position(|mask| mask.has_data(x, y))
    }

    /// Absorb every wet cell of `patch` inside a mask at time `time`.
    ///
    /// Cells covered by a finer level are left to that level. Rows are
    /// scanned independently into their own event buffers, which are then
    /// appended to the ledger in row order. Returns the volume removed.
    pub fn absorb(&mut self, patch: &mut Patch, time: f64, coverage: &dyn Coverage) -> f64 {
        if self.masks.is_empty() {
            return 0.0;
        }
        let g = patch.geometry();
        let area = g.cell_area();
        let this = &*self;

        let rows = patch.map_rows(|row| {
            let mut buffer = Vec::new();
            for i in 0..row.len() {
                let h = row.depth(i);
                if h <= 0.0 {
                    continue;
                }
                let (x, y) = g.cell_center(i, row.j);
                let Some(feature) = this.feature_at(x, y) else {
                    continue;
                };
                if coverage.covered_by_finer(g.level, x, y) {
                    continue;
                }
                row.set_state(i, CellState::zero());
                buffer.push(AbsorptionEvent {
                    time,
                    x,
                    y,
                    volume: h * area,
                    feature,
                });
            }
            buffer
        });

        let mut removed = 0.0;
        for event in rows.into_iter().flatten() {
            removed += event.volume;
            self.events.push(event);
        }
        self.removed += removed;
        removed
    }

    /// Absorption events so far, in the order they were recorded.
    pub fn events(&self) -> &[AbsorptionEvent] {
        &self.events
    }

    /// Total volume removed so far.
    pub fn removed(&self) -> f64 {
        self.removed
    }

    /// Take the events recorded since the last call, keeping the total.
    pub fn drain_events(&mut self) -> Vec<AbsorptionEvent> {
        std::mem::take(&mut self.events)
    }
}

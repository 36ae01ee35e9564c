//! Refinement flagging for land-spill runs.
//!
//! During each regridding pass the external AMR driver hands over a flag
//! array for every patch of the level being regridded. The policy visits
//! each cell once and applies the first matching rule:
//!
//! 1. A cell already decided this pass is left alone.
//! 2. At the start time, a cell containing a point source is refined, so
//!    the finest level is in place before injection begins.
//! 3. A cell inside an active [`TopoRegion`] that requires a finer level
//!    is refined.
//! 4. A wet cell (depth above `refine_tol`) accepted by the driver's
//!    allow-flag predicate is refined.
//! 5. Anything else stays [`RefineFlag::Unset`] for the driver's own
//!    criteria.
//!
//! Levels are numbered from 0 (coarsest).

use serde::{Deserialize, Serialize};

use crate::config::LandspillConfig;
use crate::grid::{Patch, PatchGeometry};
use crate::source::PointSourceCollection;
use crate::types::Bounds2D;

/// Refinement decision for one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefineFlag {
    /// No decision yet
    #[default]
    Unset,
    /// Refine this cell
    Refine,
    /// Do not refine this cell
    DoNotRefine,
}

/// Per-cell flags of one patch.
#[derive(Clone, Debug)]
pub struct FlagGrid {
    mx: usize,
    my: usize,
    flags: Vec<RefineFlag>,
}

impl FlagGrid {
    /// All-unset flags sized for `geometry`.
    pub fn new(geometry: &PatchGeometry) -> Self {
        Self {
            mx: geometry.mx,
            my: geometry.my,
            flags: vec![RefineFlag::Unset; geometry.n_cells()],
        }
    }

    /// Dimensions (mx, my).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.mx, self.my)
    }

    #[inline]
    fn index(&self, i: usize, j: usize) -> usize {
        assert!(i < self.mx && j < self.my, "flag ({}, {}) outside {}x{} grid", i, j, self.mx, self.my);
        j * self.mx + i
    }

    /// Flag of cell `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> RefineFlag {
        self.flags[self.index(i, j)]
    }

    /// Set the flag of cell `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, flag: RefineFlag) {
        let k = self.index(i, j);
        self.flags[k] = flag;
    }

    /// Number of cells carrying `flag`.
    pub fn count(&self, flag: RefineFlag) -> usize {
        self.flags.iter().filter(|&&f| f == flag).count()
    }
}

/// A region forcing refinement to at least `min_level` during [t1, t2].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopoRegion {
    /// Region extent
    pub bounds: Bounds2D,
    /// Cells on levels below this are refined
    pub min_level: usize,
    /// Start of the active window (s)
    pub t1: f64,
    /// End of the active window (s)
    pub t2: f64,
}

impl TopoRegion {
    /// Create a region.
    pub fn new(bounds: Bounds2D, min_level: usize, t1: f64, t2: f64) -> Self {
        Self {
            bounds,
            min_level,
            t1,
            t2,
        }
    }

    /// Whether this region requires refining a cell centered at `(x, y)`
    /// on `level` at time `t`.
    #[inline]
    pub fn requires(&self, x: f64, y: f64, t: f64, level: usize) -> bool {
        self.min_level > level && t >= self.t1 && t <= self.t2 && self.bounds.contains(x, y)
    }
}

/// Which rule decided a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlagSummary {
    /// Cells refined for containing a point source at the start time
    pub point_source: usize,
    /// Cells refined by a topography region
    pub region: usize,
    /// Wet cells refined
    pub wet: usize,
}

impl FlagSummary {
    /// Total cells flagged for refinement this pass.
    pub fn total(&self) -> usize {
        self.point_source + self.region + self.wet
    }
}

/// The land-spill refinement rules.
#[derive(Clone, Debug, Default)]
pub struct RefinementPolicy {
    refine_tol: f64,
    regions: Vec<TopoRegion>,
}

impl RefinementPolicy {
    /// Create a policy with a wet-cell threshold and forced regions.
    pub fn new(refine_tol: f64, regions: Vec<TopoRegion>) -> Self {
        Self { refine_tol, regions }
    }

    /// Build from a run configuration.
    pub fn from_config(config: &LandspillConfig) -> Self {
        Self::new(config.refine_tol, config.topo_regions.clone())
    }

    /// Wet-cell depth threshold.
    pub fn refine_tol(&self) -> f64 {
        self.refine_tol
    }

    /// Forced-refinement regions.
    pub fn regions(&self) -> &[TopoRegion] {
        &self.regions
    }

    /// Flag the cells of `patch` at time `t`.
    ///
    /// `allow` is the driver's allow-flag predicate, called as
    /// `allow(x, y, t, level)` for wet cells only.
    pub fn flag_patch<F>(
        &self,
        patch: &Patch,
        flags: &mut FlagGrid,
        t: f64,
        sources: &PointSourceCollection,
        allow: F,
    ) -> FlagSummary
    where
        F: Fn(f64, f64, f64, usize) -> bool,
    {
        let g = patch.geometry();
        assert_eq!(
            flags.dimensions(),
            (g.mx, g.my),
            "flag grid does not match patch"
        );

        let at_start = !sources.is_empty() && sources.is_start_time(t);
        let mut summary = FlagSummary::default();

        for j in 0..g.my {
            for i in 0..g.mx {
                if flags.get(i, j) != RefineFlag::Unset {
                    continue;
                }

                if at_start && sources.any_in(&g.cell_bounds(i, j)) {
                    flags.set(i, j, RefineFlag::Refine);
                    summary.point_source += 1;
                    continue;
                }

                let (x, y) = g.cell_center(i, j);
                if self.regions.iter().any(|r| r.requires(x, y, t, g.level)) {
                    flags.set(i, j, RefineFlag::Refine);
                    summary.region += 1;
                    continue;
                }

                let h = patch.depth(i as isize, j as isize);
                if h > self.refine_tol && allow(x, y, t, g.level) {
                    flags.set(i, j, RefineFlag::Refine);
                    summary.wet += 1;
                }
            }
        }

        if summary.total() > 0 {
            log::debug!(
                "level {} at t = {}: flagged {} point-source, {} region, {} wet cells",
                g.level,
                t,
                summary.point_source,
                summary.region,
                summary.wet
            );
        }
        summary
    }
}

//! Levels of patches and finer-level coverage queries.
//!
//! The external AMR driver owns regridding; this module only mirrors the
//! shape it hands to the plug-ins: a list of levels, each a list of patches,
//! with level 0 the coarsest.

use crate::grid::{CellState, Patch};
use crate::types::Bounds2D;

/// Answers whether a location at a given level is overlaid by a finer level.
///
/// Plug-ins consult this so that volume is only booked on the finest level
/// present at a location; coarser cells underneath are reconciled by
/// restriction.
pub trait Coverage: Sync {
    /// True if some level finer than `level` has a patch containing `(x, y)`.
    fn covered_by_finer(&self, level: usize, x: f64, y: f64) -> bool;
}

/// Coverage for a grid with a single level: nothing is ever covered.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleLevel;

impl Coverage for SingleLevel {
    #[inline]
    fn covered_by_finer(&self, _level: usize, _x: f64, _y: f64) -> bool {
        false
    }
}

/// Snapshot of patch extents per level.
///
/// Taken before a level is advanced so coverage can be queried while the
/// patches themselves are mutably borrowed.
#[derive(Clone, Debug, Default)]
pub struct Footprint {
    levels: Vec<Vec<Bounds2D>>,
}

impl Footprint {
    /// Build from explicit per-level extents.
    pub fn new(levels: Vec<Vec<Bounds2D>>) -> Self {
        Self { levels }
    }

    /// Number of levels.
    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// Finest level whose patches contain `(x, y)`.
    pub fn finest_level_at(&self, x: f64, y: f64) -> Option<usize> {
        self.levels
            .iter()
            .enumerate()
            .rev()
            .find(|(_, patches)| patches.iter().any(|b| b.contains_half_open(x, y)))
            .map(|(level, _)| level)
    }
}

impl Coverage for Footprint {
    fn covered_by_finer(&self, level: usize, x: f64, y: f64) -> bool {
        self.levels
            .iter()
            .skip(level + 1)
            .any(|patches| patches.iter().any(|b| b.contains_half_open(x, y)))
    }
}

/// Levels of patches, coarsest first.
#[derive(Clone, Debug, Default)]
pub struct Hierarchy {
    levels: Vec<Vec<Patch>>,
}

impl Hierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hierarchy with one level made of one patch.
    pub fn single(patch: Patch) -> Self {
        let mut hierarchy = Self::new();
        hierarchy.add_patch(patch);
        hierarchy
    }

    /// Insert a patch at its own level, creating empty levels as needed.
    pub fn add_patch(&mut self, patch: Patch) {
        let level = patch.level();
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(patch);
    }

    /// Number of levels.
    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// Patches of `level` (empty slice past the finest level).
    pub fn level(&self, level: usize) -> &[Patch] {
        self.levels.get(level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mutable patches of `level`.
    pub fn level_mut(&mut self, level: usize) -> &mut [Patch] {
        match self.levels.get_mut(level) {
            Some(patches) => patches.as_mut_slice(),
            None => &mut [],
        }
    }

    /// Iterate all patches, coarsest level first.
    pub fn patches(&self) -> impl Iterator<Item = &Patch> {
        self.levels.iter().flatten()
    }

    /// Snapshot of the current patch extents.
    pub fn footprint(&self) -> Footprint {
        Footprint::new(
            self.levels
                .iter()
                .map(|patches| patches.iter().map(Patch::bounds).collect())
                .collect(),
        )
    }

    /// Fluid volume counted on the finest level present at each location.
    pub fn finest_volume(&self) -> f64 {
        let footprint = self.footprint();
        let mut total = 0.0;
        for patch in self.patches() {
            let g = patch.geometry();
            let area = g.cell_area();
            for j in 0..g.my {
                for i in 0..g.mx {
                    let (x, y) = g.cell_center(i, j);
                    if !footprint.covered_by_finer(g.level, x, y) {
                        total += patch.depth(i as isize, j as isize) * area;
                    }
                }
            }
        }
        total
    }

    /// Restrict every fine level onto the level below it.
    ///
    /// A coarse cell whose center lies in a finer patch takes the
    /// area-weighted average of the fine cells inside it, so volume is
    /// preserved. Where the averaged depth is below `update_tol` the
    /// momenta are zeroed: thin films averaged from a few wet fine cells
    /// would otherwise carry unphysical velocities.
    pub fn average_down(&mut self, update_tol: f64) {
        for fine_level in (1..self.levels.len()).rev() {
            let (coarse_levels, fine_levels) = self.levels.split_at_mut(fine_level);
            let coarse_patches = &mut coarse_levels[fine_level - 1];
            let fine_patches = &fine_levels[0];

            for coarse in coarse_patches.iter_mut() {
                for fine in fine_patches {
                    restrict_patch(fine, coarse, update_tol);
                }
            }
        }
    }
}

/// Average `fine` onto the cells of `coarse` it covers.
fn restrict_patch(fine: &Patch, coarse: &mut Patch, update_tol: f64) {
    let fg = fine.geometry();
    let cg = coarse.geometry();
    if !fg.bounds().overlaps(&cg.bounds()) {
        return;
    }

    let rx = (cg.dx / fg.dx).round().max(1.0) as usize;
    let ry = (cg.dy / fg.dy).round().max(1.0) as usize;
    let weight = 1.0 / (rx * ry) as f64;

    for j in 0..cg.my {
        for i in 0..cg.mx {
            let (xc, yc) = cg.cell_center(i, j);
            if !fg.bounds().contains_half_open(xc, yc) {
                continue;
            }

            let cell = cg.cell_bounds(i, j);
            let mut sum = CellState::zero();
            let mut n_found = 0;
            for sj in 0..ry {
                for si in 0..rx {
                    let x = cell.x_min + (si as f64 + 0.5) * fg.dx;
                    let y = cell.y_min + (sj as f64 + 0.5) * fg.dy;
                    if let Some((fi, fj)) = fg.locate(x, y) {
                        sum = sum + fine.state(fi as isize, fj as isize);
                        n_found += 1;
                    }
                }
            }
            if n_found != rx * ry {
                // Coarse cell only partially under this patch.
                continue;
            }

            let mut avg = sum * weight;
            if avg.h < update_tol {
                avg.hu = 0.0;
                avg.hv = 0.0;
            }
            coarse.set_state(i as isize, j as isize, avg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level() -> Hierarchy {
        let mut h = Hierarchy::new();
        h.add_patch(Patch::new(0, Bounds2D::new(0.0, 8.0, 0.0, 8.0), 4, 4, 2));
        h.add_patch(Patch::new(1, Bounds2D::new(2.0, 6.0, 2.0, 6.0), 4, 4, 2));
        h
    }

    #[test]
    fn test_footprint_coverage() {
        let h = two_level();
        let fp = h.footprint();
        assert!(fp.covered_by_finer(0, 3.0, 3.0));
        assert!(!fp.covered_by_finer(0, 1.0, 1.0));
        assert!(!fp.covered_by_finer(1, 3.0, 3.0));
        assert_eq!(fp.finest_level_at(3.0, 3.0), Some(1));
        assert_eq!(fp.finest_level_at(7.0, 1.0), Some(0));
        assert_eq!(fp.finest_level_at(9.0, 1.0), None);
    }

    #[test]
    fn test_finest_volume_ignores_covered_coarse_cells() {
        let mut h = two_level();
        h.level_mut(0)[0].fill(CellState::new(1.0, 0.0, 0.0));
        h.level_mut(1)[0].fill(CellState::new(1.0, 0.0, 0.0));
        // 64 m² at 1 m depth regardless of overlap.
        assert!((h.finest_volume() - 64.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_down_conserves_volume() {
        let mut h = two_level();
        {
            let fine = &mut h.level_mut(1)[0];
            fine.set_state(0, 0, CellState::new(4.0, 4.0, 0.0));
            fine.set_state(1, 1, CellState::new(0.4, 0.0, 0.0));
        }
        let before = h.finest_volume();
        h.average_down(1e-4);

        let coarse = &h.level(0)[0];
        // Fine cells (0,0)..(1,1) map onto coarse cell (1,1).
        let s = coarse.state(1, 1);
        assert!((s.h - 1.1).abs() < 1e-12);
        assert!((s.hu - 1.0).abs() < 1e-12);
        assert!((h.finest_volume() - before).abs() < 1e-12);
        assert!((coarse.volume() - before).abs() < 1e-12);
    }

    #[test]
    fn test_average_down_zeroes_momentum_below_update_tol() {
        let mut h = two_level();
        h.level_mut(1)[0].set_state(0, 0, CellState::new(4e-4, 1e-4, 1e-4));
        h.average_down(1e-3);
        let s = h.level(0)[0].state(1, 1);
        assert!((s.h - 1e-4).abs() < 1e-16);
        assert_eq!(s.hu, 0.0);
        assert_eq!(s.hv, 0.0);
    }
}

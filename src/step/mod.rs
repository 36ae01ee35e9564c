//! Sub-step orchestration of the land-spill plug-ins.
//!
//! [`StepOrchestrator`] is the simulation context: it owns every plug-in and
//! every volume counter, and the external AMR driver calls into it
//!
//! - once per level sub-step, after the flux update, through
//!   [`StepOrchestrator::advance_level`] (or [`StepOrchestrator::advance_patch`]
//!   for drivers that hold patches themselves)
//! - once per regridding pass and patch through [`StepOrchestrator::flag_cells`]
//! - after each coarse step through [`StepOrchestrator::restrict`]
//!
//! Within a pass each patch goes through, in order: negative-depth clamping,
//! point-source injection, friction, evaporation, then waterbody absorption.

mod report;

pub use report::{MassLedger, StepReport};

use std::path::Path;

use crate::config::LandspillConfig;
use crate::error::LandspillError;
use crate::grid::{CellState, Coverage, Hierarchy, Patch};
use crate::io;
use crate::refinement::{FlagGrid, FlagSummary, RefinementPolicy};
use crate::source::{DarcyWeisbach, Evaporation, HydroFeatureCollection, PointSourceCollection};

/// The land-spill simulation context.
#[derive(Debug)]
pub struct StepOrchestrator {
    friction: DarcyWeisbach,
    evaporation: Evaporation,
    point_sources: PointSourceCollection,
    hydro_features: HydroFeatureCollection,
    refinement: RefinementPolicy,
    update_tol: f64,
    clamped: f64,
    unplaced_sources: Vec<bool>,
}

impl StepOrchestrator {
    /// Assemble an orchestrator from ready-made plug-ins.
    pub fn new(
        friction: DarcyWeisbach,
        evaporation: Evaporation,
        point_sources: PointSourceCollection,
        hydro_features: HydroFeatureCollection,
        refinement: RefinementPolicy,
        update_tol: f64,
    ) -> Self {
        let n_sources = point_sources.len();
        Self {
            friction,
            evaporation,
            point_sources,
            hydro_features,
            refinement,
            update_tol,
            clamped: 0.0,
            unplaced_sources: vec![false; n_sources],
        }
    }

    /// Validate a configuration and build every plug-in from it.
    ///
    /// Rasters are loaded here, so every configuration error surfaces
    /// before the first sub-step.
    pub fn from_config(config: &LandspillConfig) -> Result<Self, LandspillError> {
        config.validate()?;
        let orchestrator = Self::new(
            DarcyWeisbach::from_config(config)?,
            Evaporation::from_config(config)?,
            PointSourceCollection::from_config(config)?,
            HydroFeatureCollection::from_config(config)?,
            RefinementPolicy::from_config(config),
            config.update_tol(),
        );
        log::info!(
            "land-spill plug-ins ready: {} point sources, {} hydro features, friction {}, evaporation {:?}",
            orchestrator.point_sources.len(),
            orchestrator.hydro_features.len(),
            orchestrator.friction.model().name(),
            orchestrator.evaporation.kind()
        );
        Ok(orchestrator)
    }

    /// Friction plug-in.
    pub fn friction(&self) -> &DarcyWeisbach {
        &self.friction
    }

    /// Evaporation plug-in.
    pub fn evaporation(&self) -> &Evaporation {
        &self.evaporation
    }

    /// Point sources.
    pub fn point_sources(&self) -> &PointSourceCollection {
        &self.point_sources
    }

    /// Waterbodies.
    pub fn hydro_features(&self) -> &HydroFeatureCollection {
        &self.hydro_features
    }

    /// Refinement rules.
    pub fn refinement(&self) -> &RefinementPolicy {
        &self.refinement
    }

    /// Depth below which restriction drops momentum.
    pub fn update_tol(&self) -> f64 {
        self.update_tol
    }

    /// Run every plug-in on one patch over [t, t + dt].
    ///
    /// `coverage` must describe the hierarchy the patch belongs to; cells
    /// under a finer level are not booked. The evaporated volume is added to
    /// the evaporation counter here.
    pub fn advance_patch(
        &mut self,
        patch: &mut Patch,
        t: f64,
        dt: f64,
        coverage: &dyn Coverage,
    ) -> StepReport {
        let clamped = clamp_negative_depths(patch, coverage);
        if clamped > 0.0 {
            log::warn!(
                "clamped negative depths on level {} at t = {}: {:.3e} m³ added",
                patch.level(),
                t,
                clamped
            );
            self.clamped += clamped;
        }

        let injected = self.point_sources.inject(patch, t, dt, coverage);

        self.friction.update_aux(patch);
        self.friction.apply_damping(patch, dt, coverage);

        let fraction = self.evaporation.step_fraction(t, dt);
        let evaporated = self.evaporation.apply_patch(patch, fraction, coverage);
        self.evaporation.record(evaporated);

        let absorbed = self.hydro_features.absorb(patch, t, coverage);

        StepReport {
            injected,
            evaporated,
            absorbed,
            clamped,
        }
    }

    /// Run every plug-in on all patches of `level` over [t, t + dt].
    pub fn advance_level(
        &mut self,
        hierarchy: &mut Hierarchy,
        level: usize,
        t: f64,
        dt: f64,
    ) -> StepReport {
        let footprint = hierarchy.footprint();

        for (index, source) in self.point_sources.iter().enumerate() {
            let (x, y) = source.location();
            if footprint.finest_level_at(x, y).is_none() && !self.unplaced_sources[index] {
                log::warn!("point source {} at ({}, {}) lies outside every patch", index, x, y);
                self.unplaced_sources[index] = true;
            }
        }

        let mut report = StepReport::default();
        for patch in hierarchy.level_mut(level) {
            report += self.advance_patch(patch, t, dt, &footprint);
        }

        log::debug!(
            "level {} t = {} dt = {}: injected {:.3e}, evaporated {:.3e}, absorbed {:.3e} m³",
            level,
            t,
            dt,
            report.injected,
            report.evaporated,
            report.absorbed
        );
        report
    }

    /// Advance every level by the same `dt`, finest first, then restrict.
    ///
    /// A convenience for drivers without time subcycling.
    pub fn advance_hierarchy(&mut self, hierarchy: &mut Hierarchy, t: f64, dt: f64) -> StepReport {
        let mut report = StepReport::default();
        for level in (0..hierarchy.n_levels()).rev() {
            report += self.advance_level(hierarchy, level, t, dt);
        }
        self.restrict(hierarchy);
        report
    }

    /// Average fine levels onto coarse ones, honoring `update_tol`.
    pub fn restrict(&self, hierarchy: &mut Hierarchy) {
        hierarchy.average_down(self.update_tol);
    }

    /// Flag the cells of `patch` for refinement at time `t`.
    ///
    /// `allow` is the driver's allow-flag predicate `(x, y, t, level)`.
    pub fn flag_cells<F>(&self, patch: &Patch, flags: &mut FlagGrid, t: f64, allow: F) -> FlagSummary
    where
        F: Fn(f64, f64, f64, usize) -> bool,
    {
        self.refinement
            .flag_patch(patch, flags, t, &self.point_sources, allow)
    }

    /// Current counters together with the fluid on `hierarchy`.
    pub fn mass_ledger(&self, hierarchy: &Hierarchy) -> MassLedger {
        MassLedger {
            fluid: hierarchy.finest_volume(),
            injected: self.point_sources.total_injected(),
            evaporated: self.evaporation.evaporated(),
            absorbed: self.hydro_features.removed(),
            clamped: self.clamped,
        }
    }

    /// Total volume added by clamping negative depths.
    pub fn clamped_volume(&self) -> f64 {
        self.clamped
    }

    /// Record the evaporated total at an output time.
    pub fn snapshot(&mut self, time: f64) {
        self.evaporation.snapshot(time);
    }

    /// Write the ledger files into `dir`.
    ///
    /// The evaporation history is rewritten in full; absorption events
    /// recorded since the previous call are appended. Events are only
    /// released once the append succeeds, so a failed write can be retried.
    pub fn write_ledgers<P: AsRef<Path>>(&mut self, dir: P) -> Result<(), LandspillError> {
        let dir = dir.as_ref();
        io::save_evaporation_history(dir, self.evaporation.history())?;
        io::append_absorption_events(dir, self.hydro_features.events())?;
        let written = self.hydro_features.drain_events().len();
        log::debug!(
            "wrote ledgers to {} ({} new absorption events)",
            dir.display(),
            written
        );
        Ok(())
    }
}

/// Set negative depths on uncovered cells to zero and return the volume
/// that added.
fn clamp_negative_depths(patch: &mut Patch, coverage: &dyn Coverage) -> f64 {
    let g = patch.geometry();
    let area = g.cell_area();
    patch
        .map_rows(|row| {
            let mut added = 0.0;
            for i in 0..row.len() {
                let h = row.depth(i);
                if h >= 0.0 {
                    continue;
                }
                let (x, y) = g.cell_center(i, row.j);
                if coverage.covered_by_finer(g.level, x, y) {
                    continue;
                }
                added -= h * area;
                row.set_state(i, CellState::zero());
            }
            added
        })
        .into_iter()
        .sum()
}

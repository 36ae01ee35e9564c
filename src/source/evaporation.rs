//! Evaporation of the spilled fluid (Fingas 1996).
//!
//! The percentage of the spilled mass evaporated after `m` minutes is
//!
//!   natural-log law:  P = (C1 + C2 T) ln(m)
//!   square-root law:  P = (C1 + C2 T) √m
//!
//! with T the ambient temperature in °C. Over a sub-step [t, t + dt] every
//! wet cell loses the fraction of its remaining depth
//!
//!   (F(t + dt) - F(t)) / (1 - F(t)),   F = clamp(P / 100, 0, 1)
//!
//! so that a cell present since the start follows the Fingas curve exactly.
//!
//! Elapsed time is measured from the simulation start time for every cell,
//! whichever point source the fluid came from.

use crate::config::{ConfigError, EvaporationKind, LandspillConfig};
use crate::grid::{CellState, Coverage, Patch};

/// Cumulative evaporated volume at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaporationRecord {
    /// Simulation time (s)
    pub time: f64,
    /// Total volume evaporated since the start (m³)
    pub volume: f64,
}

/// Fingas evaporation model with its global counter.
#[derive(Clone, Debug)]
pub struct Evaporation {
    kind: EvaporationKind,
    c1: f64,
    c2: f64,
    temperature: f64,
    start_time: f64,
    dry_tol: f64,
    evaporated: f64,
    history: Vec<EvaporationRecord>,
}

impl Evaporation {
    /// Create a model.
    ///
    /// `temperature` is the ambient temperature in °C.
    pub fn new(
        kind: EvaporationKind,
        coefficients: [f64; 2],
        temperature: f64,
        start_time: f64,
        dry_tol: f64,
    ) -> Self {
        Self {
            kind,
            c1: coefficients[0],
            c2: coefficients[1],
            temperature,
            start_time,
            dry_tol,
            evaporated: 0.0,
            history: Vec::new(),
        }
    }

    /// A model that never evaporates anything.
    pub fn disabled() -> Self {
        Self::new(EvaporationKind::None, [0.0, 0.0], 0.0, 0.0, 0.0)
    }

    /// Build from a run configuration.
    pub fn from_config(config: &LandspillConfig) -> Result<Self, ConfigError> {
        let evaporation = &config.evaporation;
        if evaporation.kind == EvaporationKind::None {
            return Ok(Self::disabled());
        }
        let coefficients: [f64; 2] = evaporation
            .coefficients
            .as_slice()
            .try_into()
            .map_err(|_| ConfigError::MissingCoefficients(evaporation.coefficients.len()))?;
        log::info!(
            "evaporation model {:?} with coefficients {:?} at {} °C",
            evaporation.kind,
            coefficients,
            config.ambient_temperature
        );
        Ok(Self::new(
            evaporation.kind,
            coefficients,
            config.ambient_temperature,
            config.start_time,
            config.dry_tolerance,
        ))
    }

    /// Model kind.
    pub fn kind(&self) -> EvaporationKind {
        self.kind
    }

    /// Whether evaporation is active.
    pub fn is_enabled(&self) -> bool {
        self.kind != EvaporationKind::None
    }

    /// Fingas percentage evaporated after `elapsed` seconds (unclamped).
    pub fn percentage(&self, elapsed: f64) -> f64 {
        let minutes = elapsed / 60.0;
        if minutes <= 0.0 {
            return 0.0;
        }
        let scale = self.c1 + self.c2 * self.temperature;
        match self.kind {
            EvaporationKind::None => 0.0,
            EvaporationKind::FingasLog => scale * minutes.ln(),
            EvaporationKind::FingasSqrt => scale * minutes.sqrt(),
        }
    }

    /// Evaporated mass fraction F in [0, 1] after `elapsed` seconds.
    pub fn fraction(&self, elapsed: f64) -> f64 {
        (self.percentage(elapsed) / 100.0).clamp(0.0, 1.0)
    }

    /// Fraction of the remaining depth lost over the sub-step [t, t + dt].
    pub fn step_fraction(&self, t: f64, dt: f64) -> f64 {
        if !self.is_enabled() || dt <= 0.0 {
            return 0.0;
        }
        let before = self.fraction(t - self.start_time);
        if before >= 1.0 {
            return 0.0;
        }
        let after = self.fraction(t + dt - self.start_time).max(before);
        ((after - before) / (1.0 - before)).clamp(0.0, 1.0)
    }

    /// Remove `fraction` of the depth of every wet cell not covered by a
    /// finer level, and return the volume removed.
    ///
    /// Momentum is scaled with depth so the velocity is unchanged. The
    /// counter is not touched; see [`Evaporation::record`].
    pub fn apply_patch(&self, patch: &mut Patch, fraction: f64, coverage: &dyn Coverage) -> f64 {
        if fraction <= 0.0 {
            return 0.0;
        }
        let g = patch.geometry();
        let area = g.cell_area();
        let dry_tol = self.dry_tol;
        let keep = 1.0 - fraction;

        patch
            .map_rows(|row| {
                let mut removed = 0.0;
                for i in 0..row.len() {
                    let state = row.state(i);
                    if state.h <= dry_tol {
                        continue;
                    }
                    let (x, y) = g.cell_center(i, row.j);
                    if coverage.covered_by_finer(g.level, x, y) {
                        continue;
                    }
                    removed += state.h * fraction * area;
                    row.set_state(i, CellState::new(state.h * keep, state.hu * keep, state.hv * keep));
                }
                removed
            })
            .into_iter()
            .sum()
    }

    /// Evaporate over [t, t + dt] on a set of patches and add the removed
    /// volume to the counter.
    pub fn evaporate(
        &mut self,
        patches: &mut [Patch],
        t: f64,
        dt: f64,
        coverage: &dyn Coverage,
    ) -> f64 {
        let fraction = self.step_fraction(t, dt);
        let removed: f64 = patches
            .iter_mut()
            .map(|patch| self.apply_patch(patch, fraction, coverage))
            .sum();
        self.record(removed);
        removed
    }

    /// Add evaporated volume to the counter. Negative volumes are ignored.
    pub fn record(&mut self, volume: f64) {
        if volume > 0.0 {
            self.evaporated += volume;
        }
    }

    /// Total volume evaporated so far.
    pub fn evaporated(&self) -> f64 {
        self.evaporated
    }

    /// Append the current total to the history.
    pub fn snapshot(&mut self, time: f64) {
        self.history.push(EvaporationRecord {
            time,
            volume: self.evaporated,
        });
    }

    /// Snapshots taken so far, in time order.
    pub fn history(&self) -> &[EvaporationRecord] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SingleLevel;
    use crate::types::Bounds2D;
    use approx::assert_relative_eq;

    const TOL: f64 = 1e-12;

    fn fingas(kind: EvaporationKind) -> Evaporation {
        Evaporation::new(kind, [1.38, 0.045], 25.0, 0.0, 1e-4)
    }

    #[test]
    fn test_percentage_laws() {
        let log = fingas(EvaporationKind::FingasLog);
        let sqrt = fingas(EvaporationKind::FingasSqrt);
        let scale = 1.38 + 0.045 * 25.0;
        assert_relative_eq!(log.percentage(600.0), scale * 10f64.ln(), max_relative = TOL);
        assert_relative_eq!(sqrt.percentage(6000.0), scale * 10.0, max_relative = TOL);
        assert_eq!(log.percentage(0.0), 0.0);
        // ln of less than one minute is negative and clamps to zero.
        assert_eq!(log.fraction(30.0), 0.0);
    }

    #[test]
    fn test_step_fractions_compose_to_curve() {
        let model = fingas(EvaporationKind::FingasSqrt);
        let mut remaining = 1.0;
        let dt = 30.0;
        for n in 0..240 {
            remaining *= 1.0 - model.step_fraction(n as f64 * dt, dt);
        }
        assert_relative_eq!(1.0 - remaining, model.fraction(240.0 * dt), max_relative = 1e-10);
    }

    #[test]
    fn test_elapsed_time_is_global() {
        // Same instant, different start times: only the global start matters.
        let early = Evaporation::new(EvaporationKind::FingasLog, [1.38, 0.045], 25.0, 0.0, 1e-4);
        let late = Evaporation::new(EvaporationKind::FingasLog, [1.38, 0.045], 25.0, 600.0, 1e-4);
        assert!(early.step_fraction(1200.0, 10.0) > 0.0);
        assert_relative_eq!(
            late.step_fraction(1200.0, 10.0),
            early.step_fraction(600.0, 10.0),
            max_relative = TOL
        );
    }

    #[test]
    fn test_fully_evaporated_stops() {
        let model = Evaporation::new(EvaporationKind::FingasSqrt, [50.0, 0.0], 25.0, 0.0, 1e-4);
        // P = 50 √m reaches 100 after 4 minutes.
        assert_eq!(model.fraction(240.0), 1.0);
        assert_eq!(model.step_fraction(240.0, 10.0), 0.0);
        assert_eq!(model.step_fraction(230.0, 10.0), 1.0);
    }

    #[test]
    fn test_evaporate_patch_updates_counter() {
        let mut patches = vec![Patch::new(0, Bounds2D::new(0.0, 2.0, 0.0, 2.0), 2, 2, 2)];
        patches[0].fill(CellState::new(0.2, 0.1, 0.0));
        patches[0].set_state(1, 1, CellState::new(5e-5, 0.0, 0.0));

        let mut model = fingas(EvaporationKind::FingasLog);
        let before = patches[0].volume();
        let fraction = model.step_fraction(600.0, 60.0);
        let removed = model.evaporate(&mut patches, 600.0, 60.0, &SingleLevel);

        assert_relative_eq!(removed, 3.0 * 0.2 * fraction, max_relative = TOL);
        assert_relative_eq!(patches[0].volume() + removed, before, max_relative = TOL);
        assert_eq!(model.evaporated(), removed);
        // Dry cells are left alone; velocity is preserved.
        assert_eq!(patches[0].depth(1, 1), 5e-5);
        let s = patches[0].state(0, 0);
        assert_relative_eq!(s.hu / s.h, 0.5, max_relative = TOL);
    }

    #[test]
    fn test_disabled_model() {
        let mut model = Evaporation::disabled();
        let mut patches = vec![Patch::new(0, Bounds2D::new(0.0, 1.0, 0.0, 1.0), 1, 1, 1)];
        patches[0].fill(CellState::new(1.0, 0.0, 0.0));
        assert_eq!(model.evaporate(&mut patches, 1e4, 10.0, &SingleLevel), 0.0);
        assert_eq!(patches[0].depth(0, 0), 1.0);
    }

    #[test]
    fn test_history() {
        let mut model = fingas(EvaporationKind::FingasLog);
        model.record(1.5);
        model.snapshot(10.0);
        model.record(-1.0);
        model.record(0.5);
        model.snapshot(20.0);
        assert_eq!(
            model.history(),
            &[
                EvaporationRecord { time: 10.0, volume: 1.5 },
                EvaporationRecord { time: 20.0, volume: 2.0 },
            ]
        );
    }
}

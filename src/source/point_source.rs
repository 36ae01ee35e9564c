//! Point sources: pipeline ruptures injecting fluid at fixed locations.
//!
//! Each source has a piecewise-constant volumetric rate. Stage `k` runs from
//! the end of stage `k - 1` (or the start time) to `end_times[k]`, with
//! every end time measured as elapsed time since the start time. After the
//! last stage the rate is zero.
//!
//! Fluid enters the cell containing the source on the finest level present
//! at its location, as a pure mass source with no momentum.

use crate::config::{validate_point_source, ConfigError, LandspillConfig, PointSourceConfig};
use crate::grid::{Coverage, Patch};
use crate::types::Bounds2D;

/// Relative tolerance for "time equals the start time".
const START_TIME_RTOL: f64 = 1e-10;

/// One stage of a rate profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stage {
    /// Elapsed time at which the stage ends (s)
    pub end_time: f64,
    /// Volumetric rate during the stage (m³/s)
    pub rate: f64,
}

/// A point source and its cumulative injected volume.
#[derive(Clone, Debug)]
pub struct PointSource {
    location: (f64, f64),
    stages: Vec<Stage>,
    injected: f64,
}

impl PointSource {
    /// Create a source from parallel end-time and rate lists.
    ///
    /// End times must be strictly increasing and rates non-negative.
    pub fn new(location: (f64, f64), end_times: &[f64], rates: &[f64]) -> Result<Self, ConfigError> {
        let config = PointSourceConfig::new(location, end_times.to_vec(), rates.to_vec());
        Self::from_config(0, &config)
    }

    /// Create source `index` from its configuration.
    pub fn from_config(index: usize, config: &PointSourceConfig) -> Result<Self, ConfigError> {
        validate_point_source(index, config)?;

        Ok(Self {
            location: config.location,
            stages: config
                .end_times
                .iter()
                .zip(&config.rates)
                .map(|(&end_time, &rate)| Stage { end_time, rate })
                .collect(),
            injected: 0.0,
        })
    }

    /// Location (x, y).
    pub fn location(&self) -> (f64, f64) {
        self.location
    }

    /// Rate profile.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Total volume injected so far.
    pub fn injected(&self) -> f64 {
        self.injected
    }

    /// Elapsed time at which the last stage ends.
    pub fn end_time(&self) -> f64 {
        self.stages.last().map_or(0.0, |s| s.end_time)
    }

    /// Rate at `elapsed` seconds: the first stage ending after it.
    pub fn rate_at(&self, elapsed: f64) -> f64 {
        if elapsed < 0.0 {
            return 0.0;
        }
        self.stages
            .iter()
            .find(|s| s.end_time > elapsed)
            .map_or(0.0, |s| s.rate)
    }

    /// Exact volume injected between two elapsed times.
    pub fn volume_between(&self, from: f64, to: f64) -> f64 {
        if to <= from {
            return 0.0;
        }
        let mut stage_start = 0.0;
        let mut volume = 0.0;
        for stage in &self.stages {
            let overlap = to.min(stage.end_time) - from.max(stage_start);
            if overlap > 0.0 {
                volume += stage.rate * overlap;
            }
            stage_start = stage.end_time;
        }
        volume
    }

    /// Whether `(x, y)` of this source lies in `bounds` (half-open).
    #[inline]
    pub fn is_in(&self, bounds: &Bounds2D) -> bool {
        bounds.contains_half_open(self.location.0, self.location.1)
    }
}

/// Ordered point sources sharing one start time.
#[derive(Clone, Debug, Default)]
pub struct PointSourceCollection {
    sources: Vec<PointSource>,
    start_time: f64,
}

impl PointSourceCollection {
    /// Create a collection.
    pub fn new(sources: Vec<PointSource>, start_time: f64) -> Self {
        Self {
            sources,
            start_time,
        }
    }

    /// Build from a run configuration.
    pub fn from_config(config: &LandspillConfig) -> Result<Self, ConfigError> {
        let sources = config
            .point_sources
            .iter()
            .enumerate()
            .map(|(index, source)| PointSource::from_config(index, source))
            .collect::<Result<Vec<_>, _>>()?;
        for (index, source) in sources.iter().enumerate() {
            log::info!(
                "point source {} at ({}, {}): {} stages ending at {} s",
                index,
                source.location.0,
                source.location.1,
                source.stages.len(),
                source.end_time()
            );
        }
        Ok(Self::new(sources, config.start_time))
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether there are no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source `index`.
    pub fn get(&self, index: usize) -> Option<&PointSource> {
        self.sources.get(index)
    }

    /// Iterate sources in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, PointSource> {
        self.sources.iter()
    }

    /// Start time t0.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Whether `t` is the start time, up to rounding.
    pub fn is_start_time(&self, t: f64) -> bool {
        (t - self.start_time).abs() <= START_TIME_RTOL * self.start_time.abs().max(1.0)
    }

    /// Total volume injected by all sources.
    pub fn total_injected(&self) -> f64 {
        self.sources.iter().map(PointSource::injected).sum()
    }

    /// Volume all sources inject over the simulation interval [t, t + dt].
    pub fn volume_between(&self, t: f64, dt: f64) -> f64 {
        let from = t - self.start_time;
        self.sources
            .iter()
            .map(|s| s.volume_between(from, from + dt))
            .sum()
    }

    /// Whether any source lies in `bounds`.
    pub fn any_in(&self, bounds: &Bounds2D) -> bool {
        self.sources.iter().any(|s| s.is_in(bounds))
    }

    /// Add the volume each source delivers over [t, t + dt] to the cell of
    /// `patch` containing it, unless a finer level covers the source.
    ///
    /// Returns the volume added to this patch; per-source counters are
    /// updated for each injection.
    pub fn inject(&mut self, patch: &mut Patch, t: f64, dt: f64, coverage: &dyn Coverage) -> f64 {
        let g = patch.geometry();
        let from = t - self.start_time;
        let mut total = 0.0;

        for source in &mut self.sources {
            let (x, y) = source.location;
            let Some((i, j)) = g.locate(x, y) else {
                continue;
            };
            if coverage.covered_by_finer(g.level, x, y) {
                continue;
            }
            let volume = source.volume_between(from, from + dt);
            if volume <= 0.0 {
                continue;
            }

            let (i, j) = (i as isize, j as isize);
            let mut state = patch.state(i, j);
            state.h += volume / g.cell_area();
            patch.set_state(i, j, state);

            source.injected += volume;
            total += volume;
        }
        total
    }
}

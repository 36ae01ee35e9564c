//! Per-sub-step reports and the global mass ledger.

use std::fmt;
use std::ops::AddAssign;

/// Volumes booked during one source-term pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Volume injected by point sources (m³)
    pub injected: f64,
    /// Volume evaporated (m³)
    pub evaporated: f64,
    /// Volume absorbed by waterbodies (m³)
    pub absorbed: f64,
    /// Volume added by clamping negative depths to zero (m³)
    pub clamped: f64,
}

impl StepReport {
    /// Net volume change the pass caused on the grid.
    pub fn net_change(&self) -> f64 {
        self.injected + self.clamped - self.evaporated - self.absorbed
    }
}

impl AddAssign for StepReport {
    fn add_assign(&mut self, other: Self) {
        self.injected += other.injected;
        self.evaporated += other.evaporated;
        self.absorbed += other.absorbed;
        self.clamped += other.clamped;
    }
}

/// Snapshot of every volume counter plus the fluid on the grid.
///
/// With no other sources or sinks,
///
///   fluid + evaporated + absorbed = injected + clamped
///
/// where `fluid` is counted on the finest level at each location.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MassLedger {
    /// Fluid volume on the grid (m³)
    pub fluid: f64,
    /// Total injected by point sources (m³)
    pub injected: f64,
    /// Total evaporated (m³)
    pub evaporated: f64,
    /// Total absorbed by waterbodies (m³)
    pub absorbed: f64,
    /// Total added by clamping negative depths (m³)
    pub clamped: f64,
}

impl MassLedger {
    /// Imbalance of the ledger (m³); zero up to rounding.
    pub fn balance_error(&self) -> f64 {
        self.fluid + self.evaporated + self.absorbed - self.injected - self.clamped
    }

    /// Imbalance relative to the injected volume (absolute if nothing was injected).
    pub fn relative_error(&self) -> f64 {
        let scale = self.injected + self.clamped;
        if scale > 0.0 {
            self.balance_error() / scale
        } else {
            self.balance_error()
        }
    }

    /// Single-line summary.
    pub fn summary_line(&self) -> String {
        format!(
            "fluid={:.6e} injected={:.6e} evaporated={:.6e} absorbed={:.6e} err={:.3e}",
            self.fluid,
            self.injected,
            self.evaporated,
            self.absorbed,
            self.balance_error()
        )
    }
}

impl fmt::Display for MassLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mass ledger:")?;
        writeln!(f, "  On grid:     {:.6e} m³", self.fluid)?;
        writeln!(f, "  Injected:    {:.6e} m³", self.injected)?;
        writeln!(f, "  Evaporated:  {:.6e} m³", self.evaporated)?;
        writeln!(f, "  Absorbed:    {:.6e} m³", self.absorbed)?;
        writeln!(f, "  Clamped:     {:.6e} m³", self.clamped)?;
        write!(f, "  Imbalance:   {:.3e} m³", self.balance_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance() {
        let ledger = MassLedger {
            fluid: 7.0,
            injected: 10.0,
            evaporated: 2.0,
            absorbed: 1.5,
            clamped: 0.5,
        };
        assert_eq!(ledger.balance_error(), 0.0);
        assert!(ledger.summary_line().contains("injected=1.000000e1"));
        assert!(ledger.to_string().starts_with("Mass ledger:"));
    }

    #[test]
    fn test_report_accumulates() {
        let mut total = StepReport::default();
        total += StepReport { injected: 2.0, evaporated: 0.5, absorbed: 0.25, clamped: 0.0 };
        total += StepReport { injected: 1.0, evaporated: 0.0, absorbed: 0.0, clamped: 0.125 };
        assert_eq!(total.injected, 3.0);
        assert_eq!(total.net_change(), 3.0 + 0.125 - 0.5 - 0.25);
    }
}

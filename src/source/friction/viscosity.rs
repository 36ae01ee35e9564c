//! Temperature-dependent viscosity of the spilled fluid.
//!
//! Dynamic viscosity follows Andrade's law
//!
//!   μ(T) = μ_ref exp(B (1/T - 1/T_ref))
//!
//! with absolute temperatures and B = 5000 K, a typical value for crude
//! and refined oils. Kinematic viscosity is ν = μ / ρ.

use crate::config::LandspillConfig;

/// Offset between Celsius and Kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Andrade activation temperature B (K).
pub const ANDRADE_B: f64 = 5000.0;

/// Fluid properties needed by the regime-based friction models.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluidProperties {
    /// Dynamic viscosity at the reference temperature (mPa·s)
    pub ref_mu: f64,
    /// Reference temperature (°C)
    pub ref_temperature: f64,
    /// Ambient temperature (°C)
    pub ambient_temperature: f64,
    /// Density at ambient temperature (kg/m³)
    pub density: f64,
}

impl FluidProperties {
    /// Create fluid properties.
    pub fn new(ref_mu: f64, ref_temperature: f64, ambient_temperature: f64, density: f64) -> Self {
        Self {
            ref_mu,
            ref_temperature,
            ambient_temperature,
            density,
        }
    }

    /// Properties taken from a run configuration.
    pub fn from_config(config: &LandspillConfig) -> Self {
        Self::new(
            config.ref_mu,
            config.ref_temperature,
            config.ambient_temperature,
            config.density,
        )
    }

    /// Dynamic viscosity at ambient temperature (Pa·s).
    pub fn dynamic_viscosity(&self) -> f64 {
        let t = self.ambient_temperature + KELVIN_OFFSET;
        let t_ref = self.ref_temperature + KELVIN_OFFSET;
        // mPa·s -> Pa·s
        1e-3 * self.ref_mu * (ANDRADE_B * (1.0 / t - 1.0 / t_ref)).exp()
    }

    /// Kinematic viscosity at ambient temperature (m²/s).
    pub fn kinematic_viscosity(&self) -> f64 {
        self.dynamic_viscosity() / self.density
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_temperature_returns_reference_viscosity() {
        let fluid = FluidProperties::new(332.0, 15.0, 15.0, 926.6);
        assert_relative_eq!(fluid.dynamic_viscosity(), 0.332, max_relative = 1e-14);
        assert_relative_eq!(fluid.kinematic_viscosity(), 0.332 / 926.6, max_relative = 1e-14);
    }

    #[test]
    fn test_warmer_fluid_is_thinner() {
        let cold = FluidProperties::new(332.0, 15.0, 5.0, 926.6);
        let warm = FluidProperties::new(332.0, 15.0, 25.0, 926.6);
        assert!(warm.dynamic_viscosity() < 0.332);
        assert!(cold.dynamic_viscosity() > 0.332);
    }

    #[test]
    fn test_default_config_viscosity() {
        let fluid = FluidProperties::from_config(&LandspillConfig::default());
        let t = 25.0 + KELVIN_OFFSET;
        let t_ref = 15.0 + KELVIN_OFFSET;
        let expected = 0.332 * (ANDRADE_B * (1.0 / t - 1.0 / t_ref)).exp() / 926.6;
        assert_relative_eq!(fluid.kinematic_viscosity(), expected, max_relative = 1e-14);
    }
}

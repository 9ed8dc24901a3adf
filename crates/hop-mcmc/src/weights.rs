use hop_core::errors::{ErrorInfo, HopError};
use tracing::debug;

use crate::simulation::{check_temperature, Simulation};

impl Simulation {
    /// Rebuilds the adaptive weights from the current density of states.
    ///
    /// For `temperature > 0` the weights flatten the sampled distribution between the lowest
    /// observed energy and the entropy peak, are held flat above the peak, and below the lowest
    /// observed energy continue linearly as a fixed-temperature ensemble. Negative temperatures
    /// mirror this about the peak. No two neighbouring weights differ by more than
    /// `energy_range / |temperature|`; steeper steps are clipped and the clipped amount is
    /// carried into the following steps.
    pub fn compute_weights_from_dos(&mut self, temperature: f64) -> Result<(), HopError> {
        self.require_adaptive("compute_weights_from_dos")?;
        check_temperature(temperature)?;
        let Some((lowest, highest)) = self.observed_bounds() else {
            return Err(HopError::DegenerateStatistics(
                ErrorInfo::new("no-observations", "weights need at least one observed energy")
                    .with_context("temperature", temperature),
            ));
        };

        let range = self.energy_range();
        let cap = range as f64 / temperature.abs();
        let peak = self.entropy_peak;
        let base = -self.ln_dos[peak];
        let mut weights = vec![base; range];

        if temperature > 0.0 {
            let mut excess = 0.0;
            for energy in (lowest..peak).rev() {
                let step = (-self.ln_dos[energy] - excess) - weights[energy + 1];
                let clipped = step.clamp(-cap, cap);
                excess += step - clipped;
                weights[energy] = weights[energy + 1] + clipped;
            }
            let anchor = lowest.min(peak);
            for energy in 0..anchor {
                weights[energy] = weights[anchor] + (anchor - energy) as f64 * cap;
            }
        } else {
            let mut excess = 0.0;
            for energy in peak + 1..=highest {
                let step = (-self.ln_dos[energy] - excess) - weights[energy - 1];
                let clipped = step.clamp(-cap, cap);
                excess += step - clipped;
                weights[energy] = weights[energy - 1] + clipped;
            }
            let anchor = highest.max(peak);
            for energy in anchor + 1..range {
                weights[energy] = weights[anchor] + (energy - anchor) as f64 * cap;
            }
        }

        debug!(temperature, peak, lowest, highest, cap, "weights from density of states");
        self.ln_weights = weights;
        Ok(())
    }

    /// Replaces the weights wholesale. Lengths must match the energy range.
    pub fn set_ln_weights(&mut self, weights: Vec<f64>) -> Result<(), HopError> {
        self.require_adaptive("set_ln_weights")?;
        if weights.len() != self.energy_range() {
            return Err(HopError::InvalidInput(
                ErrorInfo::new("weights-length", "weight array does not cover the energy range")
                    .with_context("expected", self.energy_range())
                    .with_context("found", weights.len()),
            ));
        }
        self.ln_weights = weights;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::simulation::{SamplingMode, Simulation};
    use hop_net::{parse_pattern, HopfieldNetwork};

    fn simulation(mode: SamplingMode) -> Simulation {
        let network = HopfieldNetwork::new(&[
            parse_pattern("1100").unwrap(),
            parse_pattern("1010").unwrap(),
        ])
        .unwrap();
        Simulation::new(network, vec![true, true, false, false], mode).unwrap()
    }

    #[test]
    fn fixed_mode_has_no_weights() {
        let mut sim = simulation(SamplingMode::FixedTemperature { temperature: 1.0 });
        let err = sim.compute_weights_from_dos(1.0).unwrap_err();
        assert_eq!(err.info().code, "adaptive-only");
    }

    #[test]
    fn empty_histogram_is_degenerate() {
        let mut sim = simulation(SamplingMode::Adaptive);
        let err = sim.compute_weights_from_dos(1.0).unwrap_err();
        assert_eq!(err.family(), "DegenerateStatistics");
    }

    #[test]
    fn zero_and_nan_temperatures_are_rejected() {
        let mut sim = simulation(SamplingMode::Adaptive);
        sim.record_move(0, 1, false);
        assert_eq!(sim.compute_weights_from_dos(0.0).unwrap_err().family(), "InvalidInput");
        assert_eq!(sim.compute_weights_from_dos(f64::NAN).unwrap_err().family(), "InvalidInput");
    }

    #[test]
    fn infinite_temperature_flattens() {
        let mut sim = simulation(SamplingMode::Adaptive);
        sim.record_move(0, 1, false);
        sim.ln_dos = vec![-3.0, 0.0, -2.0];
        sim.entropy_peak = 1;
        sim.compute_weights_from_dos(f64::INFINITY).unwrap();
        assert!(sim.ln_weights().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn positive_temperature_inverts_below_the_peak() {
        let mut sim = simulation(SamplingMode::Adaptive);
        sim.record_move(0, 1, false);
        sim.ln_dos = vec![-0.5, 0.0, -0.5];
        sim.entropy_peak = 1;
        sim.compute_weights_from_dos(1.0).unwrap();
        assert_eq!(sim.ln_weights(), &[0.5, 0.0, 0.0]);
    }
}

use crate::simulation::Simulation;

/// Returned by [`Simulation::fractional_sample_error`] when no estimate is possible.
pub const UNKNOWN_SAMPLE_ERROR: f64 = 2.0;

impl Simulation {
    /// Boltzmann-weighted fractional error of the density of states at `temperature`.
    ///
    /// Sums `b_e / √samples_e` over the sampled energies between the entropy peak and the
    /// furthest sampled energy on the side selected by the sign of `temperature`, normalized by
    /// `Σ b_e` with `ln b_e = ln_dos[e] − e/T`. Returns [`UNKNOWN_SAMPLE_ERROR`] when that side
    /// has no samples or the normalization degenerates.
    pub fn fractional_sample_error(&self, temperature: f64) -> f64 {
        if temperature == 0.0 || temperature.is_nan() {
            return UNKNOWN_SAMPLE_ERROR;
        }
        let samples = self.visits.samples();
        let peak = self.entropy_peak;
        let (low, high) = if temperature > 0.0 {
            match (0..=peak).find(|&energy| samples[energy] > 0) {
                Some(low) => (low, peak),
                None => return UNKNOWN_SAMPLE_ERROR,
            }
        } else {
            match (peak..self.energy_range()).rev().find(|&energy| samples[energy] > 0) {
                Some(high) => (peak, high),
                None => return UNKNOWN_SAMPLE_ERROR,
            }
        };

        let log_boltzmann = |energy: usize| self.ln_dos[energy] - energy as f64 / temperature;
        let offset = log_boltzmann((low + high) / 2);
        let mut error = 0.0;
        let mut norm = 0.0;
        for energy in low..=high {
            if samples[energy] == 0 {
                continue;
            }
            let boltzmann = (log_boltzmann(energy) - offset).exp();
            error += boltzmann / (samples[energy] as f64).sqrt();
            norm += boltzmann;
        }
        if norm > 0.0 && norm.is_finite() && error.is_finite() {
            error / norm
        } else {
            UNKNOWN_SAMPLE_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SamplingMode;
    use hop_net::{parse_pattern, HopfieldNetwork};

    fn simulation() -> Simulation {
        let network = HopfieldNetwork::new(&[
            parse_pattern("1100").unwrap(),
            parse_pattern("1010").unwrap(),
        ])
        .unwrap();
        Simulation::new(network, vec![true, true, false, false], SamplingMode::Adaptive).unwrap()
    }

    #[test]
    fn no_samples_gives_the_sentinel() {
        let sim = simulation();
        assert_eq!(sim.fractional_sample_error(1.0), UNKNOWN_SAMPLE_ERROR);
        assert_eq!(sim.fractional_sample_error(-1.0), UNKNOWN_SAMPLE_ERROR);
    }

    #[test]
    fn single_sample_per_energy_gives_unit_error() {
        let mut sim = simulation();
        // 0 -> 0 (rejected) marks energy 0, then 0 -> 1 reaches the peak
        sim.record_move(0, 1, false);
        sim.record_move(0, 1, true);
        assert_eq!(sim.sample_histogram(), &[1, 1, 0]);
        assert!((sim.fractional_sample_error(1.0) - 1.0).abs() < 1e-12);
    }

    fn with_samples(ln_dos: [f64; 3], peak: usize, samples: [u64; 3]) -> Simulation {
        let mut sim = simulation();
        sim.ln_dos = ln_dos.to_vec();
        sim.entropy_peak = peak;
        for (energy, count) in samples.into_iter().enumerate() {
            sim.visits.set_samples(energy, count);
        }
        sim
    }

    fn direct_error(sim: &Simulation, energies: std::ops::RangeInclusive<usize>, t: f64) -> f64 {
        let samples = sim.sample_histogram();
        let mut error = 0.0;
        let mut norm = 0.0;
        for energy in energies {
            let boltzmann = (sim.ln_dos()[energy] - energy as f64 / t).exp();
            error += boltzmann / (samples[energy] as f64).sqrt();
            norm += boltzmann;
        }
        error / norm
    }

    #[test]
    fn matches_the_unshifted_sum_on_both_sides() {
        let sim = with_samples([-0.5, 0.0, -0.7], 1, [4, 9, 16]);
        let below = direct_error(&sim, 0..=1, 2.0);
        let above = direct_error(&sim, 1..=2, -2.0);
        assert!((sim.fractional_sample_error(2.0) - below).abs() < 1e-12);
        assert!((sim.fractional_sample_error(-2.0) - above).abs() < 1e-12);
        assert!((below - above).abs() > 1e-3);
    }

    #[test]
    fn unsampled_side_gives_the_sentinel() {
        let sim = with_samples([-0.5, 0.0, -0.7], 1, [0, 0, 16]);
        assert_eq!(sim.fractional_sample_error(2.0), UNKNOWN_SAMPLE_ERROR);
        assert!(sim.fractional_sample_error(-2.0) < 1.0);
    }

    #[test]
    fn midpoint_offset_keeps_steep_weights_finite() {
        // e/T reaches 1000 at the top, beyond what exp can hold unshifted
        let sim = with_samples([-0.5, 0.0, -0.7], 1, [4, 9, 16]);
        assert!(!direct_error(&sim, 1..=2, -0.002).is_finite());
        let error = sim.fractional_sample_error(-0.002);
        assert!((error - 0.25).abs() < 1e-12, "error {error}");
    }
}

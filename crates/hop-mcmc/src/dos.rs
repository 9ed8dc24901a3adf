use hop_core::errors::{ErrorInfo, HopError};
use tracing::debug;

use crate::simulation::Simulation;

impl Simulation {
    /// Re-estimates the density of states from the transition histogram.
    ///
    /// Energies are processed in increasing order starting from `ln_dos[0] = 0`. Each index
    /// starts from its lower neighbour's value; indices with at least
    /// `max(max_energy_change, 1)` recorded moves are corrected by the flux balance
    /// `ln(flux_up / flux_down)` against their `max_energy_change` lower neighbours. The
    /// largest corrected value becomes the entropy peak and the array is shifted so the peak
    /// is zero.
    pub fn compute_dos_from_transitions(&mut self) -> Result<(), HopError> {
        let range = self.energy_range();
        let window = self.network.max_energy_change() as usize;
        let min_history = window.max(1) as u64;

        let mut ln_dos = vec![0.0f64; range];
        let mut first_qualified = None;
        let mut peak: Option<(usize, f64)> = None;
        for energy in 0..range {
            if energy > 0 {
                ln_dos[energy] = ln_dos[energy - 1];
            }
            if self.energy_histogram[energy] < min_history {
                continue;
            }
            let mut flux_up = 0.0;
            let mut flux_down = 0.0;
            for lower in energy.saturating_sub(window)..energy {
                flux_up +=
                    (ln_dos[lower] - ln_dos[energy]).exp() * self.transition_matrix(energy, lower);
                flux_down += self.transition_matrix(lower, energy);
            }
            if flux_up > 0.0 && flux_down > 0.0 {
                ln_dos[energy] += (flux_up / flux_down).ln();
            }
            first_qualified.get_or_insert(energy);
            if peak.map_or(true, |(_, best)| ln_dos[energy] > best) {
                peak = Some((energy, ln_dos[energy]));
            }
        }

        let (Some(first), Some((peak, max))) = (first_qualified, peak) else {
            return Err(HopError::DegenerateStatistics(
                ErrorInfo::new("no-history", "no energy has enough recorded moves")
                    .with_context("min_history", min_history)
                    .with_hint("simulate more moves before recomputing"),
            ));
        };
        // under-sampled energies below the first corrected one inherit its value
        let floor = ln_dos[first];
        ln_dos[..first].fill(floor);
        for value in &mut ln_dos {
            *value -= max;
        }
        debug!(peak, first, "density of states from transitions");
        self.ln_dos = ln_dos;
        self.entropy_peak = peak;
        Ok(())
    }

    /// Re-estimates the density of states from the energy histogram and current weights.
    ///
    /// Only valid in adaptive mode, where `ln g(E) = ln H(E) − w(E)` up to a constant. Energies
    /// never observed inherit the value of the nearest lower observed energy (the lowest ones
    /// inherit from the first observed energy).
    pub fn compute_dos_from_energy_histogram(&mut self) -> Result<(), HopError> {
        self.require_adaptive("compute_dos_from_energy_histogram")?;
        let Some((lowest, _)) = self.observed_bounds() else {
            return Err(HopError::DegenerateStatistics(ErrorInfo::new(
                "no-observations",
                "energy histogram is empty",
            )));
        };

        let range = self.energy_range();
        let mut ln_dos = vec![0.0f64; range];
        let mut peak = lowest;
        for energy in lowest..range {
            let count = self.energy_histogram[energy];
            if count == 0 {
                ln_dos[energy] = ln_dos[energy - 1];
                continue;
            }
            ln_dos[energy] = (count as f64).ln() - self.ln_weights[energy];
            if ln_dos[energy] > ln_dos[peak] {
                peak = energy;
            }
        }
        let floor = ln_dos[lowest];
        ln_dos[..lowest].fill(floor);
        let max = ln_dos[peak];
        for value in &mut ln_dos {
            *value -= max;
        }
        debug!(peak, "density of states from energy histogram");
        self.ln_dos = ln_dos;
        self.entropy_peak = peak;
        Ok(())
    }
}

use hop_core::errors::{ErrorInfo, HopError};
use hop_net::{pattern_distance, HopfieldNetwork};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::visits::VisitLog;

/// How move acceptance is biased.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SamplingMode {
    /// Plain Metropolis acceptance `exp(-Δ/T)` at a fixed temperature.
    FixedTemperature {
        /// Temperature in energy-index units. Negative values favour high energies.
        temperature: f64,
    },
    /// Acceptance driven by the adaptive log-weight array.
    #[default]
    Adaptive,
}

impl SamplingMode {
    /// Whether this mode carries adaptive weights.
    pub fn is_adaptive(&self) -> bool {
        matches!(self, SamplingMode::Adaptive)
    }
}

/// Result of a single proposed spin flip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    /// Node that was proposed for flipping.
    pub node: usize,
    /// Energy index change the flip would cause.
    pub energy_change: i64,
    /// Acceptance probability handed to the draw (may exceed one).
    pub probability: f64,
    /// Whether the flip was applied.
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DistanceLog {
    PerEnergy { records: Vec<u64>, sums: Vec<u64> },
    Pooled { records: u64, sum: u64 },
}

impl DistanceLog {
    fn new(mode: &SamplingMode, energy_range: usize) -> Self {
        if mode.is_adaptive() {
            DistanceLog::PerEnergy {
                records: vec![0; energy_range],
                sums: vec![0; energy_range],
            }
        } else {
            DistanceLog::Pooled { records: 0, sum: 0 }
        }
    }

    fn record(&mut self, energy: usize, distance: usize) {
        match self {
            DistanceLog::PerEnergy { records, sums } => {
                records[energy] += 1;
                sums[energy] += distance as u64;
            }
            DistanceLog::Pooled { records, sum } => {
                *records += 1;
                *sum += distance as u64;
            }
        }
    }
}

/// Density-of-states simulation of one Hopfield network.
///
/// Owns the current state, every histogram, the adaptive weights and the density-of-states
/// estimate. All energies are indices in `[0, energy_range)`; the network converts them to raw
/// energies. Randomness is always borrowed from the caller.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) network: HopfieldNetwork,
    pub(crate) mode: SamplingMode,
    pub(crate) state: Vec<bool>,
    pub(crate) energy: usize,
    pub(crate) entropy_peak: usize,
    pub(crate) energy_histogram: Vec<u64>,
    // energy_range × (2·max_energy_change + 1), keyed by (from, Δ + max_energy_change)
    pub(crate) transitions: Vec<u64>,
    // energy_range × nodes spin-up counts
    pub(crate) state_histograms: Vec<u64>,
    pub(crate) visits: VisitLog,
    pub(crate) distances: DistanceLog,
    pub(crate) ln_weights: Vec<f64>,
    pub(crate) ln_dos: Vec<f64>,
}

impl Simulation {
    /// Creates a simulation starting from `initial_state`.
    ///
    /// Fails with [`HopError::InvalidInput`] if the state length does not match the network or
    /// the fixed temperature is zero or NaN.
    pub fn new(
        network: HopfieldNetwork,
        initial_state: Vec<bool>,
        mode: SamplingMode,
    ) -> Result<Self, HopError> {
        if initial_state.len() != network.nodes() {
            return Err(HopError::InvalidInput(
                ErrorInfo::new("state-length", "initial state does not match the network size")
                    .with_context("expected", network.nodes())
                    .with_context("found", initial_state.len()),
            ));
        }
        if let SamplingMode::FixedTemperature { temperature } = mode {
            check_temperature(temperature)?;
        }
        let range = network.energy_range();
        let width = 2 * network.max_energy_change() as usize + 1;
        let energy = network.energy(&initial_state);
        let entropy_peak = (network.max_energy() / network.energy_scale()) as usize;
        Ok(Self {
            mode,
            state: initial_state,
            energy,
            entropy_peak,
            energy_histogram: vec![0; range],
            transitions: vec![0; range * width],
            state_histograms: vec![0; range * network.nodes()],
            visits: VisitLog::new(range),
            distances: DistanceLog::new(&mode, range),
            ln_weights: vec![0.0; range],
            ln_dos: vec![0.0; range],
            network,
        })
    }

    /// The network being sampled.
    pub fn network(&self) -> &HopfieldNetwork {
        &self.network
    }

    /// Sampling mode fixed at construction.
    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    /// Current spin configuration.
    pub fn state(&self) -> &[bool] {
        &self.state
    }

    /// Energy index of the current state.
    pub fn energy(&self) -> usize {
        self.energy
    }

    /// Number of energy indices.
    pub fn energy_range(&self) -> usize {
        self.network.energy_range()
    }

    /// Index of the current density-of-states maximum.
    pub fn entropy_peak(&self) -> usize {
        self.entropy_peak
    }

    /// Moves recorded from each energy.
    pub fn energy_histogram(&self) -> &[u64] {
        &self.energy_histogram
    }

    /// Independent excursions counted through each energy.
    pub fn sample_histogram(&self) -> &[u64] {
        self.visits.samples()
    }

    /// Log density of states, normalized so its maximum is zero.
    pub fn ln_dos(&self) -> &[f64] {
        &self.ln_dos
    }

    /// Adaptive log weights. All zero in fixed-temperature mode.
    pub fn ln_weights(&self) -> &[f64] {
        &self.ln_weights
    }

    fn width(&self) -> usize {
        2 * self.network.max_energy_change() as usize + 1
    }

    fn transition_slot(&self, energy: usize, change: i64) -> usize {
        let column = change + self.network.max_energy_change();
        debug_assert!(column >= 0 && (column as usize) < self.width());
        energy * self.width() + column as usize
    }

    /// Count of proposed moves from `energy` with energy change `change`.
    pub fn transitions(&self, energy: usize, change: i64) -> u64 {
        if change.abs() > self.network.max_energy_change() || energy >= self.energy_range() {
            return 0;
        }
        self.transitions[self.transition_slot(energy, change)]
    }

    /// Total proposed moves from `energy`.
    pub fn transitions_from(&self, energy: usize) -> u64 {
        let width = self.width();
        self.transitions[energy * width..(energy + 1) * width]
            .iter()
            .sum()
    }

    /// Estimated probability that a proposal from `from` lands on `to`. Zero for empty rows.
    pub fn transition_matrix(&self, to: usize, from: usize) -> f64 {
        let total = self.transitions_from(from);
        if total == 0 {
            return 0.0;
        }
        let change = to as i64 - from as i64;
        self.transitions(from, change) as f64 / total as f64
    }

    /// Lowest and highest energies with at least one recorded move.
    pub fn observed_bounds(&self) -> Option<(usize, usize)> {
        let lowest = self.energy_histogram.iter().position(|&count| count > 0)?;
        let highest = self.energy_histogram.iter().rposition(|&count| count > 0)?;
        Some((lowest, highest))
    }

    /// Energy index change caused by flipping `node` in the current state.
    pub fn node_flip_energy_change(&self, node: usize) -> i64 {
        self.network.flip_energy_change(&self.state, node)
    }

    /// Acceptance probability of a move from `energy` changing it by `change`.
    ///
    /// Targets outside the energy range are rejected with probability zero. Values above one
    /// mean certain acceptance.
    pub fn move_probability(&self, energy: usize, change: i64) -> f64 {
        let target = energy as i64 + change;
        if target < 0 || target as usize >= self.energy_range() {
            return 0.0;
        }
        match self.mode {
            SamplingMode::FixedTemperature { temperature } => (-(change as f64) / temperature).exp(),
            SamplingMode::Adaptive => {
                (self.ln_weights[target as usize] - self.ln_weights[energy]).exp()
            }
        }
    }

    /// Records a proposed flip of `node` from the current state, then applies it if accepted.
    ///
    /// The current energy is recorded into the energy and transition histograms, and the
    /// current state into the state and distance accumulators. In adaptive mode the visit log
    /// is updated with the new and old energies.
    pub fn record_move(&mut self, node: usize, change: i64, accepted: bool) {
        let from = self.energy;
        self.energy_histogram[from] += 1;
        let slot = self.transition_slot(from, change);
        self.transitions[slot] += 1;

        let nodes = self.network.nodes();
        let row = &mut self.state_histograms[from * nodes..(from + 1) * nodes];
        for (count, &bit) in row.iter_mut().zip(&self.state) {
            if bit {
                *count += 1;
            }
        }
        let distance = pattern_distance(&self.state, self.network.patterns());
        self.distances.record(from, distance);

        if accepted {
            self.state[node] = !self.state[node];
            self.energy = (from as i64 + change) as usize;
        }
        if self.mode.is_adaptive() {
            self.visits.update(self.energy, from, self.entropy_peak);
        }
    }

    /// Proposes a uniformly chosen single-spin flip, decides it and records it.
    pub fn attempt_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> MoveOutcome {
        let node = rng.gen_range(0..self.network.nodes());
        let energy_change = self.node_flip_energy_change(node);
        let probability = self.move_probability(self.energy, energy_change);
        let accepted = probability >= 1.0 || rng.gen::<f64>() < probability;
        self.record_move(node, energy_change, accepted);
        MoveOutcome {
            node,
            energy_change,
            probability,
            accepted,
        }
    }

    /// Expected spin `2·up/observations − 1` of every node at `energy`; `None` if unobserved.
    pub fn expected_spins(&self, energy: usize) -> Option<Vec<f64>> {
        let observations = *self.energy_histogram.get(energy)?;
        if observations == 0 {
            return None;
        }
        let nodes = self.network.nodes();
        let row = &self.state_histograms[energy * nodes..(energy + 1) * nodes];
        Some(
            row.iter()
                .map(|&up| 2.0 * up as f64 / observations as f64 - 1.0)
                .collect(),
        )
    }

    /// Mean pattern distance recorded at `energy`, or pooled over all energies in
    /// fixed-temperature mode (where `energy` is ignored).
    pub fn expected_distance(&self, energy: usize) -> Option<f64> {
        let (records, sum) = match &self.distances {
            DistanceLog::PerEnergy { records, sums } => (*records.get(energy)?, sums[energy]),
            DistanceLog::Pooled { records, sum } => (*records, *sum),
        };
        if records == 0 {
            None
        } else {
            Some(sum as f64 / records as f64)
        }
    }

    /// Clears every histogram, the visit log and the distance accumulators.
    ///
    /// Weights, the density of states, the entropy peak and the current state are kept.
    pub fn reset_histograms(&mut self) {
        self.energy_histogram.fill(0);
        self.transitions.fill(0);
        self.state_histograms.fill(0);
        self.visits.reset();
        self.distances = DistanceLog::new(&self.mode, self.energy_range());
    }

    pub(crate) fn require_adaptive(&self, operation: &str) -> Result<(), HopError> {
        if self.mode.is_adaptive() {
            Ok(())
        } else {
            Err(HopError::InvalidInput(
                ErrorInfo::new("adaptive-only", "operation requires adaptive sampling")
                    .with_context("operation", operation),
            ))
        }
    }
}

pub(crate) fn check_temperature(temperature: f64) -> Result<(), HopError> {
    if temperature == 0.0 || temperature.is_nan() {
        return Err(HopError::InvalidInput(
            ErrorInfo::new("temperature", "temperature must be non-zero and not NaN")
                .with_context("temperature", temperature),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hop_net::parse_pattern;

    fn network() -> HopfieldNetwork {
        HopfieldNetwork::new(&[parse_pattern("1100").unwrap(), parse_pattern("1010").unwrap()])
            .unwrap()
    }

    #[test]
    fn rejects_mismatched_state() {
        let err = Simulation::new(network(), vec![true; 3], SamplingMode::Adaptive).unwrap_err();
        assert_eq!(err.info().code, "state-length");
    }

    #[test]
    fn rejects_zero_temperature() {
        let mode = SamplingMode::FixedTemperature { temperature: 0.0 };
        let err = Simulation::new(network(), vec![true; 4], mode).unwrap_err();
        assert_eq!(err.info().code, "temperature");
    }

    #[test]
    fn out_of_range_targets_are_never_accepted() {
        let simulation =
            Simulation::new(network(), vec![true, true, false, false], SamplingMode::Adaptive)
                .unwrap();
        assert_eq!(simulation.energy(), 0);
        assert_eq!(simulation.move_probability(0, -1), 0.0);
        assert_eq!(simulation.move_probability(2, 1), 0.0);
        assert_eq!(simulation.move_probability(0, 1), 1.0);
    }

    #[test]
    fn fixed_temperature_uses_metropolis() {
        let mode = SamplingMode::FixedTemperature { temperature: 2.0 };
        let simulation = Simulation::new(network(), vec![true, true, false, false], mode).unwrap();
        assert!((simulation.move_probability(0, 1) - (-0.5f64).exp()).abs() < 1e-12);
        assert!(simulation.move_probability(1, -1) > 1.0);
    }

    #[test]
    fn recorded_moves_apply_only_when_accepted() {
        let mut simulation =
            Simulation::new(network(), vec![true, true, false, false], SamplingMode::Adaptive)
                .unwrap();
        let change = simulation.node_flip_energy_change(0);
        simulation.record_move(0, change, false);
        assert_eq!(simulation.state(), &[true, true, false, false]);
        simulation.record_move(0, change, true);
        assert_eq!(simulation.state(), &[false, true, false, false]);
        assert_eq!(simulation.energy(), change as usize);
        assert_eq!(simulation.transitions(0, change), 2);
        assert_eq!(simulation.energy_histogram()[0], 2);
        assert_eq!(simulation.expected_distance(0), Some(0.0));
        assert_eq!(simulation.expected_spins(0), Some(vec![1.0, 1.0, -1.0, -1.0]));
        assert_eq!(simulation.expected_spins(2), None);
    }
}

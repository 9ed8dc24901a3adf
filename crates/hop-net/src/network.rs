use hop_core::HopError;

use crate::discretize::Discretization;
use crate::patterns::{spin, validate_patterns};

/// Hopfield network with couplings fixed by a set of stored patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopfieldNetwork {
    nodes: usize,
    patterns: Vec<Vec<bool>>,
    // row-major nodes × nodes, symmetric with a zero diagonal
    couplings: Vec<i64>,
    constants: Discretization,
}

impl HopfieldNetwork {
    /// Builds the coupling matrix `J_ij = Σ_p s_p,i s_p,j` (i ≠ j) and its discretization.
    pub fn new(patterns: &[Vec<bool>]) -> Result<Self, HopError> {
        let nodes = validate_patterns(patterns)?;
        let mut couplings = vec![0i64; nodes * nodes];
        for i in 0..nodes {
            for j in (i + 1)..nodes {
                let coupling: i64 = patterns
                    .iter()
                    .map(|pattern| spin(pattern[i]) * spin(pattern[j]))
                    .sum();
                couplings[i * nodes + j] = coupling;
                couplings[j * nodes + i] = coupling;
            }
        }
        let constants = Discretization::derive(nodes, &couplings)?;
        Ok(Self {
            nodes,
            patterns: patterns.to_vec(),
            couplings,
            constants,
        })
    }

    /// Number of nodes (spins).
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Patterns the couplings were built from.
    pub fn patterns(&self) -> &[Vec<bool>] {
        &self.patterns
    }

    /// Coupling between nodes `i` and `j`.
    pub fn coupling(&self, i: usize, j: usize) -> i64 {
        self.couplings[i * self.nodes + j]
    }

    /// Couplings of node `i` to every node (zero at `i` itself).
    pub fn row(&self, i: usize) -> &[i64] {
        &self.couplings[i * self.nodes..(i + 1) * self.nodes]
    }

    /// Discretization constants.
    pub fn constants(&self) -> &Discretization {
        &self.constants
    }

    /// Lattice spacing of raw energies.
    pub fn energy_scale(&self) -> i64 {
        self.constants.energy_scale
    }

    /// Shift applied to raw energies before scaling.
    pub fn max_energy(&self) -> i64 {
        self.constants.max_energy
    }

    /// Largest single-flip energy change in scale units.
    pub fn max_energy_change(&self) -> i64 {
        self.constants.max_energy_change
    }

    /// Number of distinct energy indices.
    pub fn energy_range(&self) -> usize {
        self.constants.energy_range
    }

    /// Raw pairwise energy `-Σ_{i<j} J_ij s_i s_j`.
    pub fn raw_energy(&self, state: &[bool]) -> i64 {
        debug_assert_eq!(state.len(), self.nodes);
        let mut sum = 0i64;
        for i in 0..self.nodes {
            let si = spin(state[i]);
            for j in (i + 1)..self.nodes {
                sum += self.couplings[i * self.nodes + j] * si * spin(state[j]);
            }
        }
        -sum
    }

    /// Energy index of a state.
    pub fn energy(&self, state: &[bool]) -> usize {
        self.constants.index_of(self.raw_energy(state))
    }

    /// Raw energy of an energy index.
    pub fn actual_energy(&self, index: usize) -> i64 {
        self.constants.actual_energy(index)
    }

    /// Local field `h_k = Σ_j J_kj s_j` acting on `node`.
    pub fn node_field(&self, state: &[bool], node: usize) -> i64 {
        self.row(node)
            .iter()
            .zip(state)
            .map(|(&coupling, &bit)| coupling * spin(bit))
            .sum()
    }

    /// Change of the energy index caused by flipping `node` in `state`.
    pub fn flip_energy_change(&self, state: &[bool], node: usize) -> i64 {
        let raw_change = 2 * spin(state[node]) * self.node_field(state, node);
        debug_assert_eq!(raw_change % self.constants.energy_scale, 0);
        raw_change / self.constants.energy_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_pattern_network() -> HopfieldNetwork {
        HopfieldNetwork::new(&[
            vec![true, true, false, false],
            vec![true, false, true, false],
        ])
        .unwrap()
    }

    #[test]
    fn constants_for_two_patterns() {
        let network = two_pattern_network();
        assert_eq!(network.coupling(0, 3), -2);
        assert_eq!(network.coupling(0, 1), 0);
        assert_eq!(network.energy_scale(), 4);
        assert_eq!(network.max_energy(), 4);
        assert_eq!(network.max_energy_change(), 1);
        assert_eq!(network.energy_range(), 3);
    }

    #[test]
    fn stored_patterns_sit_at_the_bottom() {
        let network = two_pattern_network();
        for pattern in network.patterns() {
            assert_eq!(network.energy(pattern), 0);
            assert_eq!(network.actual_energy(0), network.raw_energy(pattern));
        }
    }
}

use hop_core::errors::{ErrorInfo, HopError};

/// Greatest common divisor, with `gcd(a, 0) == a`.
pub fn gcd(a: u64, b: u64) -> u64 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Constants mapping raw pairwise energies onto integer energy indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discretization {
    /// Lattice spacing of reachable raw energies.
    pub energy_scale: i64,
    /// Shift applied to raw energies; bounds |raw energy| and aligns the lattice to zero.
    pub max_energy: i64,
    /// Largest single-flip energy change, in units of `energy_scale`.
    pub max_energy_change: i64,
    /// Number of distinct energy indices.
    pub energy_range: usize,
}

impl Discretization {
    /// Derives the constants for a row-major `nodes × nodes` coupling matrix.
    ///
    /// Flipping node `k` changes the raw energy by `2 s_k h_k`, with `h_k = Σ_j J_kj s_j`. Over
    /// all states `h_k` takes the values `Σ_j |J_kj| − 2 Σ_{j∈S} |J_kj|`, whose gcd is
    /// `gcd(Σ_j |J_kj|, 2|J_kj| ...)`. Twice the gcd of those over every node is therefore the
    /// exact spacing of the reachable energy lattice.
    pub fn derive(nodes: usize, couplings: &[i64]) -> Result<Self, HopError> {
        let mut scale = 0u64;
        let mut bound = 0i64;
        let mut reference = 0i64;
        let mut widest_node = 0i64;
        for i in 0..nodes {
            let row = &couplings[i * nodes..(i + 1) * nodes];
            let node_magnitude: i64 = row.iter().map(|value| value.abs()).sum();
            widest_node = widest_node.max(node_magnitude);
            scale = gcd(scale, node_magnitude.unsigned_abs());
            for (j, &value) in row.iter().enumerate().skip(i + 1) {
                scale = gcd(scale, 2 * value.unsigned_abs());
                bound += value.abs();
                // raw energy of the all-up state, used to align the lattice
                reference -= value;
                debug_assert_eq!(value, couplings[j * nodes + i]);
            }
        }
        if scale == 0 {
            return Err(HopError::InvalidInput(
                ErrorInfo::new(
                    "vanishing-couplings",
                    "every coupling is zero, the network has no energy structure",
                )
                .with_context("nodes", nodes),
            ));
        }

        let energy_scale = 2 * scale as i64;
        let misalignment = (reference + bound).rem_euclid(energy_scale);
        let max_energy = bound + (energy_scale - misalignment) % energy_scale;
        let max_energy_change = 2 * widest_node / energy_scale;
        let energy_range = (2 * max_energy / energy_scale) as usize + 1;

        Ok(Self {
            energy_scale,
            max_energy,
            max_energy_change,
            energy_range,
        })
    }

    /// Index of a raw energy. The raw energy must lie on the reachable lattice.
    pub fn index_of(&self, raw_energy: i64) -> usize {
        let shifted = raw_energy + self.max_energy;
        debug_assert_eq!(shifted.rem_euclid(self.energy_scale), 0);
        (shifted / self.energy_scale) as usize
    }

    /// Raw energy represented by an index.
    pub fn actual_energy(&self, index: usize) -> i64 {
        index as i64 * self.energy_scale - self.max_energy
    }

    /// Index for a raw energy read back from a record, if it is on the lattice and in range.
    pub fn checked_index_of(&self, raw_energy: i64) -> Option<usize> {
        let shifted = raw_energy.checked_add(self.max_energy)?;
        if shifted < 0 || shifted % self.energy_scale != 0 {
            return None;
        }
        let index = (shifted / self.energy_scale) as usize;
        (index < self.energy_range).then_some(index)
    }
}

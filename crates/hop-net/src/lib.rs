#![deny(missing_docs)]

//! Hopfield network model: pattern-derived integer couplings and an exactly discretized energy.
//!
//! The network is immutable once built. Energies are reported as indices on a lattice whose
//! spacing is the finest resolution the coupling structure can produce, so single-flip energy
//! changes and energy differences are exact integers.

mod discretize;
mod hash;
mod network;
mod patterns;

pub use discretize::{gcd, Discretization};
pub use hash::canonical_hash;
pub use network::HopfieldNetwork;
pub use patterns::{
    flipped, format_pattern, hamming_distance, parse_pattern, pattern_distance, random_patterns,
    random_state, spin,
};

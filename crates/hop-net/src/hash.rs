use sha2::{Digest, Sha256};

use crate::network::HopfieldNetwork;

/// Computes the canonical structural hash of a network: node count, pattern count and couplings.
pub fn canonical_hash(network: &HopfieldNetwork) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"hopfield:v1");
    hasher.update((network.nodes() as u64).to_le_bytes());
    hasher.update((network.patterns().len() as u64).to_le_bytes());
    for i in 0..network.nodes() {
        for &coupling in network.row(i) {
            hasher.update(coupling.to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

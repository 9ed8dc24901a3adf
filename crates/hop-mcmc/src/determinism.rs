use hop_core::derive_substream_seed;

/// Derives the deterministic seed used for a specific replica.
pub fn replica_seed(master_seed: u64, replica_index: usize) -> u64 {
    derive_substream_seed(master_seed, replica_index as u64)
}

/// Derives the seed random patterns are drawn from. Shared by every replica of a run.
pub fn pattern_seed(master_seed: u64) -> u64 {
    derive_substream_seed(master_seed ^ 0xA5A5_A5A5_A5A5_A5A5, 0)
}

#![deny(missing_docs)]

//! Shared error taxonomy and deterministic randomness for the hopfield density-of-states crates.

pub mod errors;
pub mod rng;

pub use errors::{ErrorInfo, HopError};
pub use rng::{derive_substream_seed, RngHandle};

#![deny(missing_docs)]

//! Adaptive density-of-states Monte Carlo for Hopfield networks.
//!
//! [`Simulation`] is the engine: it records proposed single-spin flips into transition and
//! energy histograms, estimates the density of states from them, and turns the estimate into
//! adaptive acceptance weights. The [`kernel`] module drives it through configurable cycles and
//! writes checkpoints and a run manifest.

/// Text checkpoint files and their readers.
pub mod checkpoint;
/// YAML configuration schema and defaults.
pub mod config;
/// Deterministic seed derivation helpers.
pub mod determinism;
mod dos;
/// Cycle driver and public `run`/`run_replicas`/`run_from_config` entry points.
pub mod kernel;
/// Run manifest serialization helpers.
pub mod manifest;
/// Simulation state, move protocol and histograms.
pub mod simulation;
mod stats;
/// Independent-excursion sample accounting.
pub mod visits;
mod weights;

pub use checkpoint::{CheckpointKind, CheckpointSet};
pub use config::{
    CheckpointConfig, DosEstimator, OutputConfig, PatternSource, RunConfig, SeedPolicy,
};
pub use kernel::{build_network, run, run_from_config, run_replicas, CycleReport, RunSummary};
pub use manifest::{ReplicaRecord, RunManifest};
pub use simulation::{MoveOutcome, SamplingMode, Simulation};
pub use stats::UNKNOWN_SAMPLE_ERROR;
pub use visits::VisitLog;

use std::path::{Path, PathBuf};

use hop_core::errors::{ErrorInfo, HopError};
use hop_core::RngHandle;
use hop_net::{
    canonical_hash, format_pattern, parse_pattern, random_patterns, random_state, HopfieldNetwork,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::checkpoint::CheckpointSet;
use crate::config::{DosEstimator, PatternSource, RunConfig};
use crate::determinism;
use crate::manifest::{ReplicaRecord, RunManifest};
use crate::simulation::{check_temperature, Simulation};

/// Statistics gathered over one simulate-then-recompute cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleReport {
    /// Zero-based cycle number.
    pub cycle: usize,
    /// Moves proposed during the cycle.
    pub proposed: u64,
    /// Moves accepted during the cycle.
    pub accepted: u64,
    /// Entropy peak after the cycle's recomputation.
    pub entropy_peak: usize,
    /// Fractional sample error at `weight_temperature`. `None` in fixed-temperature mode, which
    /// counts no independent samples.
    pub sample_error: Option<f64>,
}

/// Summary returned to callers after a replica completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Replica index within the run.
    pub replica: usize,
    /// Seed the replica's RNG was created from.
    pub seed: u64,
    /// Canonical hash of the sampled network.
    pub network_hash: String,
    /// Number of energy indices.
    pub energy_range: usize,
    /// Accepted over proposed moves across all cycles.
    pub acceptance_rate: f64,
    /// Entropy peak of the final density of states.
    pub entropy_peak: usize,
    /// Final log density of states.
    pub ln_dos: Vec<f64>,
    /// Final adaptive weights (all zero in fixed-temperature mode).
    pub ln_weights: Vec<f64>,
    /// Per-cycle statistics.
    pub cycles: Vec<CycleReport>,
    /// Checkpoint files of the last write.
    pub checkpoints: Vec<PathBuf>,
    /// Manifest path, if emitted.
    pub manifest_path: Option<PathBuf>,
}

/// Builds the network described by `config`. Random patterns are drawn from `master_seed`.
pub fn build_network(config: &RunConfig, master_seed: u64) -> Result<HopfieldNetwork, HopError> {
    let patterns = match &config.patterns {
        PatternSource::Explicit { patterns } => patterns
            .iter()
            .map(|text| parse_pattern(text))
            .collect::<Result<Vec<_>, _>>()?,
        PatternSource::Random { nodes, count } => {
            let mut rng = RngHandle::from_seed(determinism::pattern_seed(master_seed));
            random_patterns(*nodes, *count, &mut rng)
        }
    };
    HopfieldNetwork::new(&patterns)
}

/// Runs a single replica from scratch with the provided configuration and seed.
pub fn run(config: &RunConfig, seed: u64) -> Result<RunSummary, HopError> {
    let mut summaries = execute(config, seed, 1)?;
    summaries.pop().ok_or_else(|| {
        HopError::InvalidInput(ErrorInfo::new("no-replicas", "run produced no replica"))
    })
}

/// Runs every configured replica under `config.seed_policy.master_seed`.
pub fn run_from_config(config: &RunConfig) -> Result<Vec<RunSummary>, HopError> {
    run_replicas(config, config.seed_policy.master_seed)
}

/// Runs `config.replicas` independent replicas of one network.
///
/// Replicas share the patterns and differ only in their RNG seed,
/// `derive_substream_seed(seed, replica)`. Aggregating their estimates is left to the caller.
pub fn run_replicas(config: &RunConfig, seed: u64) -> Result<Vec<RunSummary>, HopError> {
    execute(config, seed, config.replicas)
}

fn validate(config: &RunConfig, replicas: usize) -> Result<(), HopError> {
    for (field, value) in [
        ("cycles", config.cycles),
        ("sweeps_per_cycle", config.sweeps_per_cycle),
        ("replicas", replicas),
    ] {
        if value == 0 {
            return Err(HopError::InvalidInput(
                ErrorInfo::new("config-zero", "run configuration field must be positive")
                    .with_context("field", field),
            ));
        }
    }
    check_temperature(config.weight_temperature)
}

fn execute(config: &RunConfig, seed: u64, replicas: usize) -> Result<Vec<RunSummary>, HopError> {
    validate(config, replicas)?;
    let network = build_network(config, seed)?;
    let network_hash = canonical_hash(&network);
    info!(
        nodes = network.nodes(),
        patterns = network.patterns().len(),
        energy_range = network.energy_range(),
        replicas,
        "starting run"
    );

    let mut summaries = Vec::with_capacity(replicas);
    for replica in 0..replicas {
        summaries.push(run_replica(config, &network, &network_hash, seed, replica)?);
    }

    if let Some(run_dir) = &config.output.run_directory {
        let manifest_path = run_dir.join(&config.output.manifest_file);
        let manifest = RunManifest {
            config: config.clone(),
            master_seed: seed,
            seed_label: config.seed_policy.label.clone(),
            network_hash,
            patterns: network
                .patterns()
                .iter()
                .map(|pattern| format_pattern(pattern))
                .collect(),
            replicas: summaries
                .iter()
                .map(|summary| ReplicaRecord {
                    replica: summary.replica,
                    seed: summary.seed,
                    entropy_peak: summary.entropy_peak,
                    checkpoints: relative_paths(&summary.checkpoints, run_dir),
                })
                .collect(),
        };
        manifest.write(&manifest_path)?;
        for summary in &mut summaries {
            summary.manifest_path = Some(manifest_path.clone());
        }
    }
    Ok(summaries)
}

fn run_replica(
    config: &RunConfig,
    network: &HopfieldNetwork,
    network_hash: &str,
    master_seed: u64,
    replica: usize,
) -> Result<RunSummary, HopError> {
    let seed = determinism::replica_seed(master_seed, replica);
    let mut rng = RngHandle::from_seed(seed);
    let initial = random_state(network.nodes(), &mut rng);
    let mut simulation = Simulation::new(network.clone(), initial, config.mode)?;
    let checkpoint = config.output.run_directory.as_ref().map(|dir| {
        CheckpointSet::new(
            dir.join(&config.output.checkpoint_dir)
                .join(format!("replica_{replica:03}")),
            config.checkpoint.basename.clone(),
        )
    });
    let moves = (config.sweeps_per_cycle * network.nodes()) as u64;
    let mut accepted = 0u64;
    let mut cycles = Vec::with_capacity(config.cycles);
    let mut checkpoints = Vec::new();
    for cycle in 0..config.cycles {
        if cycle > 0 && config.estimator == DosEstimator::EnergyHistogram && config.mode.is_adaptive()
        {
            // the energy histogram estimate assumes one fixed weight set
            simulation.reset_histograms();
        }
        let mut cycle_accepted = 0u64;
        for _ in 0..moves {
            if simulation.attempt_move(&mut rng).accepted {
                cycle_accepted += 1;
            }
        }
        accepted += cycle_accepted;
        if config.mode.is_adaptive() {
            refresh_weights(&mut simulation, config)?;
        }

        let sample_error = config
            .mode
            .is_adaptive()
            .then(|| simulation.fractional_sample_error(config.weight_temperature));
        info!(
            replica,
            cycle,
            accepted = cycle_accepted,
            peak = simulation.entropy_peak(),
            sample_error = ?sample_error,
            "cycle complete"
        );
        cycles.push(CycleReport {
            cycle,
            proposed: moves,
            accepted: cycle_accepted,
            entropy_peak: simulation.entropy_peak(),
            sample_error,
        });

        let last = cycle + 1 == config.cycles;
        let interval = config.checkpoint.interval;
        if let Some(set) = &checkpoint {
            if last || (interval > 0 && (cycle + 1) % interval == 0) {
                checkpoints = set.store(&simulation)?;
            }
        }
    }
    if !config.mode.is_adaptive() {
        simulation.compute_dos_from_transitions()?;
    }

    let proposed = moves * config.cycles as u64;
    Ok(RunSummary {
        replica,
        seed,
        network_hash: network_hash.to_string(),
        energy_range: simulation.energy_range(),
        acceptance_rate: if proposed == 0 {
            0.0
        } else {
            accepted as f64 / proposed as f64
        },
        entropy_peak: simulation.entropy_peak(),
        ln_dos: simulation.ln_dos().to_vec(),
        ln_weights: simulation.ln_weights().to_vec(),
        cycles,
        checkpoints,
        manifest_path: None,
    })
}

fn refresh_weights(simulation: &mut Simulation, config: &RunConfig) -> Result<(), HopError> {
    let estimate = match config.estimator {
        DosEstimator::Transitions => simulation.compute_dos_from_transitions(),
        DosEstimator::EnergyHistogram => simulation.compute_dos_from_energy_histogram(),
    };
    match estimate {
        Ok(()) => simulation.compute_weights_from_dos(config.weight_temperature),
        Err(HopError::DegenerateStatistics(info)) => {
            warn!(%info, "keeping previous weights");
            Ok(())
        }
        Err(other) => Err(other),
    }
}

fn relative_paths(paths: &[PathBuf], root: &Path) -> Vec<PathBuf> {
    paths
        .iter()
        .filter_map(|path| path.strip_prefix(root).ok().map(Path::to_path_buf))
        .collect()
}

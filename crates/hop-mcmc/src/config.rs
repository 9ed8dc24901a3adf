use std::fs;
use std::path::{Path, PathBuf};

use hop_core::errors::{ErrorInfo, HopError};
use serde::{Deserialize, Serialize};

use crate::simulation::SamplingMode;

/// YAML-configurable parameters governing a density-of-states run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Where the stored patterns come from.
    #[serde(default)]
    pub patterns: PatternSource,
    /// Acceptance scheme.
    #[serde(default)]
    pub mode: SamplingMode,
    /// Temperature at which adaptive weights are extrapolated and sample errors reported.
    #[serde(default = "default_weight_temperature")]
    pub weight_temperature: f64,
    /// Density-of-states estimator used between cycles in adaptive mode.
    #[serde(default)]
    pub estimator: DosEstimator,
    /// Number of simulate-then-recompute cycles.
    #[serde(default = "default_cycles")]
    pub cycles: usize,
    /// Sweeps per cycle; one sweep proposes one flip per node.
    #[serde(default = "default_sweeps_per_cycle")]
    pub sweeps_per_cycle: usize,
    /// Number of independent replicas run by `run_replicas`.
    #[serde(default = "default_replicas")]
    pub replicas: usize,
    /// Checkpointing behaviour.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Master seed.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Output directory configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_weight_temperature() -> f64 {
    1.0
}

fn default_cycles() -> usize {
    8
}

fn default_sweeps_per_cycle() -> usize {
    256
}

fn default_replicas() -> usize {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            patterns: PatternSource::default(),
            mode: SamplingMode::default(),
            weight_temperature: default_weight_temperature(),
            estimator: DosEstimator::default(),
            cycles: default_cycles(),
            sweeps_per_cycle: default_sweeps_per_cycle(),
            replicas: default_replicas(),
            checkpoint: CheckpointConfig::default(),
            seed_policy: SeedPolicy::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parses a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, HopError> {
        serde_yaml::from_str(text)
            .map_err(|err| HopError::Serde(ErrorInfo::new("config-parse", err.to_string())))
    }

    /// Loads a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, HopError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            HopError::Io(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display()),
            )
        })?;
        Self::from_yaml_str(&contents).map_err(|err| match err {
            HopError::Serde(info) => HopError::Serde(info.with_context("path", path.display())),
            other => other,
        })
    }

    /// Renders the configuration as YAML.
    pub fn to_yaml_string(&self) -> Result<String, HopError> {
        serde_yaml::to_string(self)
            .map_err(|err| HopError::Serde(ErrorInfo::new("config-serialize", err.to_string())))
    }
}

/// Source of the stored patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PatternSource {
    /// Patterns spelled out as `0`/`1` strings.
    Explicit {
        /// One string per pattern.
        patterns: Vec<String>,
    },
    /// Independent uniformly random patterns drawn from the master seed.
    Random {
        /// Nodes per pattern.
        nodes: usize,
        /// Number of patterns.
        count: usize,
    },
}

impl Default for PatternSource {
    fn default() -> Self {
        PatternSource::Random {
            nodes: 16,
            count: 2,
        }
    }
}

/// Density-of-states estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DosEstimator {
    /// Flux-balance bootstrap over the transition histogram.
    #[default]
    Transitions,
    /// Energy histogram divided by the weights it was sampled with.
    EnergyHistogram,
}

/// Checkpointing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Interval in cycles between checkpoint writes (0 writes only the final one).
    #[serde(default = "default_checkpoint_interval")]
    pub interval: usize,
    /// Basename shared by the checkpoint files.
    #[serde(default = "default_basename")]
    pub basename: String,
}

fn default_checkpoint_interval() -> usize {
    1
}

fn default_basename() -> String {
    "hopfield".to_string()
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval: default_checkpoint_interval(),
            basename: default_basename(),
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded in manifests.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Output directory layout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for run artefacts. Nothing is written when unset.
    #[serde(default)]
    pub run_directory: Option<PathBuf>,
    /// Manifest filename relative to `run_directory`.
    #[serde(default = "default_manifest_filename")]
    pub manifest_file: PathBuf,
    /// Subdirectory holding one checkpoint directory per replica.
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
}

fn default_manifest_filename() -> PathBuf {
    PathBuf::from("manifest.json")
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("checkpoints")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            run_directory: None,
            manifest_file: default_manifest_filename(),
            checkpoint_dir: default_checkpoint_dir(),
        }
    }
}

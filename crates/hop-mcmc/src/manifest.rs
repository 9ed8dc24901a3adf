use std::fs;
use std::path::{Path, PathBuf};

use hop_core::errors::{ErrorInfo, HopError};
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;

/// Per-replica entry of a [`RunManifest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaRecord {
    /// Replica index.
    pub replica: usize,
    /// Seed the replica's RNG was created from.
    pub seed: u64,
    /// Entropy peak after the final recomputation.
    pub entropy_peak: usize,
    /// Checkpoint files relative to the run directory.
    pub checkpoints: Vec<PathBuf>,
}

/// Structured manifest describing a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Configuration used for the run.
    pub config: RunConfig,
    /// Master seed replicas were derived from.
    pub master_seed: u64,
    /// Optional seed label captured from the configuration.
    pub seed_label: Option<String>,
    /// Canonical hash of the sampled network.
    pub network_hash: String,
    /// Stored patterns as `0`/`1` strings.
    pub patterns: Vec<String>,
    /// One record per replica.
    pub replicas: Vec<ReplicaRecord>,
}

impl RunManifest {
    /// Writes the manifest to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), HopError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                HopError::Io(
                    ErrorInfo::new("manifest-mkdir", err.to_string())
                        .with_context("path", parent.display()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            HopError::Serde(
                ErrorInfo::new("manifest-serialize", err.to_string())
                    .with_context("path", path.display()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            HopError::Io(
                ErrorInfo::new("manifest-write", err.to_string())
                    .with_context("path", path.display()),
            )
        })
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, HopError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            HopError::Io(
                ErrorInfo::new("manifest-read", err.to_string())
                    .with_context("path", path.display()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            HopError::Serde(
                ErrorInfo::new("manifest-parse", err.to_string())
                    .with_context("path", path.display()),
            )
        })
    }
}

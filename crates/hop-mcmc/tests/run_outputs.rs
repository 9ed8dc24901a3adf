use hop_mcmc::{run_replicas, CheckpointSet, PatternSource, RunConfig, RunManifest, Simulation};
use tempfile::tempdir;

#[test]
fn runs_write_checkpoints_and_a_manifest() {
    let dir = tempdir().unwrap();
    let mut config = RunConfig::default();
    config.patterns = PatternSource::Explicit {
        patterns: vec!["1100110011".to_string(), "1010101010".to_string()],
    };
    config.cycles = 3;
    config.sweeps_per_cycle = 32;
    config.replicas = 2;
    config.checkpoint.interval = 2;
    config.checkpoint.basename = "hop".to_string();
    config.output.run_directory = Some(dir.path().join("run"));

    let summaries = run_replicas(&config, 314).unwrap();
    let manifest_path = summaries[0].manifest_path.clone().unwrap();
    let manifest = RunManifest::load(&manifest_path).unwrap();
    assert_eq!(manifest.config, config);
    assert_eq!(manifest.master_seed, 314);
    assert_eq!(manifest.patterns, vec!["1100110011", "1010101010"]);
    assert_eq!(manifest.replicas.len(), 2);

    for (record, summary) in manifest.replicas.iter().zip(&summaries) {
        assert_eq!(record.seed, summary.seed);
        assert_eq!(record.checkpoints.len(), 4);
        for relative in &record.checkpoints {
            assert!(dir.path().join("run").join(relative).exists());
        }
    }

    // the final checkpoint restores into a fresh simulation of the same network
    let network = hop_mcmc::build_network(&config, 314).unwrap();
    let nodes = network.nodes();
    let mut restored = Simulation::new(network, vec![true; nodes], config.mode).unwrap();
    let set = CheckpointSet::new(dir.path().join("run/checkpoints/replica_000"), "hop");
    set.load(&mut restored).unwrap();
    let recorded: u64 = restored.energy_histogram().iter().sum();
    assert_eq!(recorded, 3 * 32 * 10);
    assert_eq!(restored.entropy_peak(), summaries[0].entropy_peak);
}

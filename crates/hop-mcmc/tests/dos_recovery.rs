use hop_core::RngHandle;
use hop_mcmc::{SamplingMode, Simulation};
use hop_net::{parse_pattern, random_state, HopfieldNetwork};

fn network(patterns: &[&str]) -> HopfieldNetwork {
    let patterns: Vec<_> = patterns.iter().map(|p| parse_pattern(p).unwrap()).collect();
    HopfieldNetwork::new(&patterns).unwrap()
}

/// Number of states at each energy index, by enumeration.
fn exact_counts(network: &HopfieldNetwork) -> Vec<u64> {
    let nodes = network.nodes();
    let mut counts = vec![0u64; network.energy_range()];
    for bits in 0u32..(1 << nodes) {
        let state: Vec<bool> = (0..nodes).map(|i| bits & (1 << i) != 0).collect();
        counts[network.energy(&state)] += 1;
    }
    counts
}

/// Flat weights accept every move, so the walk samples all states uniformly.
fn uniform_walk(network: HopfieldNetwork, seed: u64, moves: usize) -> Simulation {
    let mut rng = RngHandle::from_seed(seed);
    let initial = random_state(network.nodes(), &mut rng);
    let mut simulation = Simulation::new(network, initial, SamplingMode::Adaptive).unwrap();
    for _ in 0..moves {
        assert!(simulation.attempt_move(&mut rng).accepted);
    }
    simulation
}

fn assert_recovers(estimate: &[f64], counts: &[u64], tolerance: f64) {
    let max = *counts.iter().max().unwrap() as f64;
    for (energy, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let exact = (count as f64 / max).ln();
        assert!(
            (estimate[energy] - exact).abs() < tolerance,
            "energy {energy}: estimated {} exact {exact}",
            estimate[energy]
        );
    }
}

#[test]
fn four_node_counts_are_exact() {
    let network = network(&["1100", "1010"]);
    assert_eq!(exact_counts(&network), vec![4, 8, 4]);
}

#[test]
fn transitions_recover_the_four_node_density() {
    let network = network(&["1100", "1010"]);
    let counts = exact_counts(&network);
    let mut simulation = uniform_walk(network, 11, 200_000);
    simulation.compute_dos_from_transitions().unwrap();

    assert_eq!(simulation.entropy_peak(), 1);
    assert_eq!(simulation.ln_dos()[1], 0.0);
    assert_recovers(simulation.ln_dos(), &counts, 0.05);
}

#[test]
fn energy_histogram_recovers_the_four_node_density() {
    let network = network(&["1100", "1010"]);
    let counts = exact_counts(&network);
    let mut simulation = uniform_walk(network, 12, 200_000);
    simulation.compute_dos_from_energy_histogram().unwrap();

    assert_eq!(simulation.entropy_peak(), 1);
    assert_recovers(simulation.ln_dos(), &counts, 0.05);
}

#[test]
fn transitions_recover_a_six_node_density() {
    let network = network(&["110100", "011010"]);
    let counts = exact_counts(&network);
    let mut simulation = uniform_walk(network, 13, 400_000);
    simulation.compute_dos_from_transitions().unwrap();

    let max = simulation.ln_dos().iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(max, 0.0);
    assert_recovers(simulation.ln_dos(), &counts, 0.1);
}

#[test]
fn bootstrap_without_history_is_degenerate() {
    let network = network(&["1100", "1010"]);
    let mut simulation =
        Simulation::new(network, vec![true, true, false, false], SamplingMode::Adaptive).unwrap();
    let err = simulation.compute_dos_from_transitions().unwrap_err();
    assert_eq!(err.family(), "DegenerateStatistics");
    let err = simulation.compute_dos_from_energy_histogram().unwrap_err();
    assert_eq!(err.family(), "DegenerateStatistics");
}

#[test]
fn energy_histogram_estimator_is_adaptive_only() {
    let network = network(&["1100", "1010"]);
    let mode = SamplingMode::FixedTemperature { temperature: 1.0 };
    let mut simulation = Simulation::new(network, vec![true; 4], mode).unwrap();
    let err = simulation.compute_dos_from_energy_histogram().unwrap_err();
    assert_eq!(err.info().code, "adaptive-only");
}

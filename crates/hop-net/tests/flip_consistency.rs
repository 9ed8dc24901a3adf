use hop_core::rng::RngHandle;
use hop_net::{flipped, random_patterns, random_state, HopfieldNetwork};
use rand::Rng;

#[test]
fn flip_changes_match_full_recomputation() {
    let mut rng = RngHandle::from_seed(0x5EED);
    let mut checked = 0usize;
    while checked < 1000 {
        let nodes = rng.gen_range(2..16);
        let count = rng.gen_range(1..6);
        let patterns = random_patterns(nodes, count, &mut rng);
        let Ok(network) = HopfieldNetwork::new(&patterns) else {
            continue;
        };
        let state = random_state(nodes, &mut rng);
        let node = rng.gen_range(0..nodes);

        let predicted = network.flip_energy_change(&state, node);
        let before = network.energy(&state) as i64;
        let after = network.energy(&flipped(&state, node)) as i64;
        assert_eq!(
            after - before,
            predicted,
            "patterns {patterns:?} state {state:?} node {node}"
        );
        checked += 1;
    }
}

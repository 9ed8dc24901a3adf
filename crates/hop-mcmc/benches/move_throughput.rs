use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hop_core::RngHandle;
use hop_mcmc::{SamplingMode, Simulation};
use hop_net::{random_patterns, random_state, HopfieldNetwork};

fn bench_moves(c: &mut Criterion) {
    let mut rng = RngHandle::from_seed(42);
    let patterns = random_patterns(64, 5, &mut rng);
    let network = HopfieldNetwork::new(&patterns).unwrap();
    let initial = random_state(64, &mut rng);
    let mut simulation = Simulation::new(network, initial, SamplingMode::Adaptive).unwrap();

    c.bench_function("adaptive_sweep_64", |b| {
        b.iter(|| {
            for _ in 0..64 {
                black_box(simulation.attempt_move(&mut rng));
            }
        })
    });
    c.bench_function("dos_from_transitions_64", |b| {
        b.iter(|| {
            let mut copy = simulation.clone();
            black_box(copy.compute_dos_from_transitions().is_ok())
        })
    });
}

criterion_group!(benches, bench_moves);
criterion_main!(benches);

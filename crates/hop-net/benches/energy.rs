use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hop_core::rng::RngHandle;
use hop_net::{random_patterns, random_state, HopfieldNetwork};

fn energy_bench(c: &mut Criterion) {
    let mut rng = RngHandle::from_seed(42);
    let patterns = random_patterns(64, 6, &mut rng);
    let network = HopfieldNetwork::new(&patterns).unwrap();
    let state = random_state(64, &mut rng);

    c.bench_function("full_energy_64", |b| {
        b.iter(|| black_box(network.energy(black_box(&state))));
    });
    c.bench_function("flip_energy_change_64", |b| {
        b.iter(|| black_box(network.flip_energy_change(black_box(&state), 17)));
    });
}

criterion_group!(benches, energy_bench);
criterion_main!(benches);

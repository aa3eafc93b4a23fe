//! Benchmarks for cayley-net.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use cayley_net::{
    set_temperature, Adjacency, CayleyTreeBuilder, DensityMode, LatticeBuilder, MonteCarlo,
    RateParams, Rule, TemperatureParams,
};

fn bench_builders(c: &mut Criterion) {
    c.bench_function("cayley_tree_8x3", |b| {
        b.iter(|| black_box(CayleyTreeBuilder::new(8, 3).unwrap().build()));
    });

    c.bench_function("lattice_20x20x20", |b| {
        b.iter(|| black_box(LatticeBuilder::new(20, 20, 20).unwrap().build()));
    });
}

fn bench_adjacency(c: &mut Criterion) {
    let tree = CayleyTreeBuilder::new(8, 3).unwrap().build();

    c.bench_function("adjacency_from_network", |b| {
        b.iter(|| black_box(Adjacency::from_network(&tree)));
    });
}

fn bench_rules(c: &mut Criterion) {
    let tree = CayleyTreeBuilder::new(8, 3).unwrap().build();
    let rules = [
        ("nearest_neighbor_step", Rule::NearestNeighbor),
        ("edge_interval_step", Rule::EdgeInterval),
        ("total_density_step", Rule::TotalDensity(DensityMode::Fixed)),
    ];

    for (name, rule) in rules {
        c.bench_function(name, |b| {
            let mut run = MonteCarlo::seeded(&tree, RateParams::default(), 42);
            run.start_random_threshold(0.5).unwrap();
            b.iter(|| {
                run.simulate(&rule).unwrap();
                black_box(run.timesteps());
            });
        });
    }
}

fn bench_temperature(c: &mut Criterion) {
    let mut lattice = LatticeBuilder::new(32, 32, 1).unwrap().build();
    let nodes: Vec<usize> = lattice.nodes().copied().collect();
    set_temperature(&mut lattice, nodes, 2.27).unwrap();

    c.bench_function("ising_32x32_step", |b| {
        let mut run = MonteCarlo::seeded(&lattice, RateParams::default(), 42);
        run.start_spin_random().unwrap();
        b.iter(|| {
            run.simulate_temperature(TemperatureParams::default()).unwrap();
            black_box(run.latest());
        });
    });
}

criterion_group!(
    benches,
    bench_builders,
    bench_adjacency,
    bench_rules,
    bench_temperature,
);
criterion_main!(benches);

//! Integration tests for cayley-net.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use cayley_net::{
    node_count, set_temperature, CayleyTreeBuilder, DensityMode, GraphBuilder, HistoryTable,
    LatticeBuilder, MonteCarlo, Network, NetworkError, RateParams, Rule, Senate,
    SimulationConfig, SimulationError, StartState, TemperatureParams, TrialBatch,
    VoteCalibration, IDEOLOGY,
};

#[test]
fn test_full_cayley_run() {
    let tree = CayleyTreeBuilder::new(5, 3).unwrap().build();
    assert_eq!(tree.len(), node_count(5, 3).unwrap());

    let params = RateParams::nearest_neighbor(0.6, 0.7, 0.05);
    let mut run = MonteCarlo::seeded(&tree, params, 2024);
    run.start_central().unwrap();
    for _ in 0..50 {
        run.simulate_nearest_neighbor().unwrap();
    }

    assert_eq!(run.timesteps(), 51);
    for t in 0..run.timesteps() {
        let ones = run.count_ones(t).unwrap();
        let zeros = run.count_zeros(t).unwrap();
        assert_eq!(ones + zeros, tree.len());
    }

    // Generation sums partition the total.
    let by_gen = run.density_by_generation().unwrap();
    for t in 0..run.timesteps() {
        let total: i64 = by_gen.iter().map(|row| row[t]).sum();
        assert_eq!(total as usize, run.count_ones(t).unwrap());
    }
}

#[test]
fn test_history_only_grows_by_one() {
    let lattice = LatticeBuilder::new(4, 4, 2).unwrap().build();
    let mut run = MonteCarlo::seeded(&lattice, RateParams::default(), 1);
    run.start_random_threshold(0.4).unwrap();

    let rules = [
        Rule::NearestNeighbor,
        Rule::EdgeInterval,
        Rule::TotalDensity(DensityMode::Fixed),
        Rule::TotalDensity(DensityMode::Incremental),
    ];
    for (i, rule) in rules.iter().cycle().take(12).enumerate() {
        let committed = run.history()[..=i].to_vec();
        run.simulate(rule).unwrap();
        assert_eq!(run.timesteps(), i + 2);
        assert_eq!(&run.history()[..=i], committed.as_slice());
        assert!(run.latest().unwrap().states().iter().all(|&s| s == 0 || s == 1));
    }
}

#[test]
fn test_custom_rng_injection() {
    let ring = LatticeBuilder::new(10, 1, 1).unwrap().looped(true).build();
    let make = || {
        let rng = ChaCha8Rng::seed_from_u64(77);
        let mut run = MonteCarlo::new(&ring, RateParams::default(), rng);
        run.start_random_threshold(0.5).unwrap();
        run.simulate_edge_interval().unwrap();
        run.history().to_vec()
    };
    assert_eq!(make(), make());
    // `seeded` is the same ChaCha8 stream.
    let mut seeded = MonteCarlo::seeded(&ring, RateParams::default(), 77);
    seeded.start_random_threshold(0.5).unwrap();
    seeded.simulate_edge_interval().unwrap();
    assert_eq!(seeded.history(), make().as_slice());
}

#[test]
fn test_ising_lattice_orders_when_cold() {
    let mut lattice = LatticeBuilder::new(6, 6, 1).unwrap().build();
    let nodes: Vec<usize> = lattice.nodes().copied().collect();
    set_temperature(&mut lattice, nodes.clone(), 0.05).unwrap();

    let mut run = MonteCarlo::seeded(&lattice, RateParams::default(), 3);
    run.start_spin_up().unwrap();
    for _ in 0..10 {
        run.simulate(&Rule::Temperature(TemperatureParams::default()))
            .unwrap();
    }
    assert_eq!(run.magnetization(10).unwrap(), 1.0);

    // Hot lattice scrambles the aligned state.
    set_temperature(&mut lattice, nodes, 1e6).unwrap();
    let mut hot = MonteCarlo::seeded(&lattice, RateParams::default(), 3);
    hot.start_spin_up().unwrap();
    for _ in 0..10 {
        hot.simulate_temperature(TemperatureParams::default()).unwrap();
    }
    assert!(hot.count_down(10).unwrap() > 0);
}

#[test]
fn test_senate_vote_run() {
    let members = [
        ("Adams", 0.15),
        ("Baker", 0.35),
        ("Clark", 0.50),
        ("Davis", 0.70),
        ("Evans", 0.90),
    ];
    let mut senate = Senate::build(members).unwrap();
    assert_eq!(senate.center(), 0.50);
    senate.assign_vote_rates(0.6, 0.6);
    let center = senate.center();
    let network = senate.into_network();

    let mut run = MonteCarlo::seeded(&network, RateParams::default(), 9);
    run.start_vote_biased(0.8, IDEOLOGY, center, &VoteCalibration::default())
        .unwrap();
    for _ in 0..5 {
        run.simulate_vote().unwrap();
    }
    assert_eq!(run.timesteps(), 6);
    let final_state = run.final_state().unwrap();
    assert_eq!(final_state.len(), 5);
    assert!(final_state.values().all(|&v| v == 0 || v == 1));
}

#[test]
fn test_vote_biased_needs_ideology() {
    let net = GraphBuilder::new().nodes(0..3).complete(true).build().unwrap();
    let mut run = MonteCarlo::seeded(&net, RateParams::default(), 1);
    let err = run
        .start_vote_biased(0.5, IDEOLOGY, 0.0, &VoteCalibration::default())
        .unwrap_err();
    assert!(matches!(err, SimulationError::MissingFeature { .. }));
    assert!(run.history().is_empty());
}

#[test]
fn test_shared_network_independent_histories() {
    let tree = CayleyTreeBuilder::new(3, 4).unwrap().build();
    let mut a = MonteCarlo::seeded(&tree, RateParams::default(), 1);
    let mut b = MonteCarlo::seeded(&tree, RateParams::default(), 1);
    a.start_full().unwrap();
    b.start_empty().unwrap();
    a.simulate_nearest_neighbor().unwrap();
    assert_eq!(a.timesteps(), 2);
    assert_eq!(b.timesteps(), 1);
}

#[test]
fn test_node_removal_shifts_ranks() {
    let mut net: Network<&str> = GraphBuilder::new()
        .nodes(["a", "b", "c", "d"])
        .edge("a", "b")
        .edge("b", "c")
        .edge("c", "d")
        .build()
        .unwrap();
    net.remove_node(&"b").unwrap();
    assert_eq!(net.position(&"c"), Some(1));
    assert_eq!(net.edge_list(), vec![(&"c", &"d")]);
    assert!(matches!(net.remove_node(&"b"), Err(NetworkError::UnknownNode(_))));

    let mut run = MonteCarlo::seeded(&net, RateParams::default(), 1);
    run.start_full().unwrap();
    assert_eq!(run.state_at(0, &"d").unwrap(), 1);
}

#[test]
fn test_cursor_detects_modification() {
    let mut net = LatticeBuilder::new(3, 1, 1).unwrap().build();
    let mut cursor = net.cursor();
    assert_eq!(cursor.next(&net).unwrap(), Some(&0));
    net.add_node(10);
    assert!(matches!(
        cursor.next(&net),
        Err(NetworkError::ConcurrentModification { .. })
    ));
}

#[test]
fn test_batch_and_export() {
    let tree = CayleyTreeBuilder::new(3, 3).unwrap().build();
    let config = SimulationConfig {
        params: RateParams::nearest_neighbor(0.5, 0.8, 0.2),
        seed: 11,
        timesteps: 8,
        trials: 5,
    };
    let batch = TrialBatch::new(config, StartState::Central, Rule::NearestNeighbor);
    let result = batch.run(&tree).unwrap();
    assert_eq!(result.mean_density.len(), 9);
    assert!(result.mean_density.iter().all(|d| (0.0..=1.0).contains(d)));

    let mut run = MonteCarlo::new(&tree, config_params(), batch.trial_rng(0));
    run.start_central().unwrap();
    for _ in 0..8 {
        run.simulate_nearest_neighbor().unwrap();
    }
    assert_eq!(run.density_series(), result.densities[0]);

    let table = HistoryTable::from_run(&run).unwrap();
    assert_eq!(table.rows.len(), tree.len());
    assert_eq!(table.timesteps(), 9);
    assert_eq!(table.generation_density.map(|g| g.len()), Some(4));
}

fn config_params() -> RateParams {
    RateParams::nearest_neighbor(0.5, 0.8, 0.2)
}

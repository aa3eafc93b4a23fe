//! Property tests for topology invariants and run determinism.

use cayley_net::{node_count, Adjacency, CayleyTreeBuilder, LatticeBuilder, MonteCarlo, RateParams};
use proptest::prelude::*;

proptest! {
    #[test]
    fn cayley_tree_degrees(generations in 1usize..6, links in 2usize..6) {
        let tree = CayleyTreeBuilder::new(generations, links).unwrap().build();
        let shape = tree.cayley_shape().unwrap();
        prop_assert_eq!(tree.len(), node_count(generations, links).unwrap());

        let leaves = shape.nodes_per_gen(generations).unwrap();
        for rank in 0..tree.len() {
            let degree = tree.degree(&rank).unwrap();
            if leaves.contains(&rank) {
                prop_assert_eq!(degree, 1);
            } else {
                prop_assert_eq!(degree, links);
            }
        }
        // A tree has exactly one fewer link than nodes.
        prop_assert_eq!(tree.edge_list().len(), tree.len() - 1);
    }

    #[test]
    fn lattice_degree_sum(x in 1usize..6, y in 1usize..6, z in 1usize..4) {
        let lattice = LatticeBuilder::new(x, y, z).unwrap().build();
        prop_assert_eq!(lattice.len(), x * y * z);

        let adjacency = Adjacency::from_network(&lattice);
        prop_assert_eq!(adjacency.degree_sum(), 2 * lattice.edge_list().len());
        for rank in 0..lattice.len() {
            prop_assert!(adjacency.degree(rank) <= 6);
        }
        let shape = lattice.lattice_shape().unwrap();
        if x >= 3 && y >= 3 && z >= 3 {
            let center = shape.rank_of([1, 1, 1]).unwrap();
            prop_assert_eq!(adjacency.degree(center), 6);
        }
    }

    #[test]
    fn seeded_runs_repeat(seed in any::<u64>(), p in 0.0f64..=1.0) {
        let tree = CayleyTreeBuilder::new(3, 3).unwrap().build();
        let run = || {
            let mut mc = MonteCarlo::seeded(&tree, RateParams::default(), seed);
            mc.start_random_threshold(p).unwrap();
            for _ in 0..5 {
                mc.simulate_nearest_neighbor().unwrap();
            }
            mc.history().to_vec()
        };
        prop_assert_eq!(run(), run());
    }

    #[test]
    fn gen_finder_agrees_with_ranges(generations in 0usize..6, links in 2usize..5) {
        let tree = CayleyTreeBuilder::new(generations, links).unwrap().build();
        let shape = tree.cayley_shape().unwrap();
        for gen in 0..=generations {
            for rank in shape.nodes_per_gen(gen).unwrap() {
                prop_assert_eq!(shape.gen_finder(rank), Some(gen));
            }
        }
    }
}

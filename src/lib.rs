//! # Cayley Net
//!
//! Networks of interacting sites (Cayley trees, rectangular lattices, hand-built
//! graphs and a senate network) with a reproducible, discrete-time Monte Carlo
//! engine over per-node occupancy or spin states.
//!
//! ## Features
//!
//! - **Arena Topology**: Nodes live in a `SlotMap` arena with ordered neighbor
//!   sets, so iteration order and edge lists are deterministic
//! - **Closed-Form Builders**: Cayley trees sized by generation and boundary-aware
//!   1/2/3-D lattices, with generation and coordinate features on every node
//! - **Synchronous Updates**: every timestep reads only the previous snapshot;
//!   node order is shuffled but cannot change the outcome distribution
//! - **Interchangeable Rules**: nearest-neighbor, edge-interval, total-density,
//!   temperature (Ising) and vote rules, plus caller-supplied rates
//! - **Injectable Randomness**: the engine owns its `Rng`, so a seed fixes the run
//!
//! ## Quick Start
//!
//! ```rust
//! use cayley_net::{CayleyTreeBuilder, MonteCarlo, RateParams};
//!
//! let tree = CayleyTreeBuilder::new(4, 3).unwrap().build();
//! let params = RateParams::nearest_neighbor(0.5, 0.8, 0.1);
//!
//! let mut run = MonteCarlo::seeded(&tree, params, 42);
//! run.start_central().unwrap();
//! for _ in 0..20 {
//!     run.simulate_nearest_neighbor().unwrap();
//! }
//!
//! assert_eq!(run.timesteps(), 21);
//! let outer = run.generation_density(4, 20).unwrap();
//! println!("outer generation occupancy: {outer}");
//! ```
//!
//! ## Architecture
//!
//! ### Network and Adjacency
//!
//! [`Network`] is the mutable store: labels, features and neighbor sets. Before
//! a run, the engine flattens it into an [`Adjacency`] (CSR offsets/targets
//! indexed by node rank), so the per-step inner loop is a slice walk.
//!
//! ### Snapshots
//!
//! A run's history is a `Vec<Snapshot>`, one state per node rank per timestep.
//! Start operations write the first snapshot; every simulate call appends
//! exactly one more or, on error, nothing.

pub mod analysis;
pub mod batch;
pub mod cayley;
pub mod error;
pub mod graph;
pub mod lattice;
pub mod montecarlo;
pub mod network;
pub mod node;
pub mod rules;
pub mod topology;

// Re-exports for convenience
pub use analysis::{HistoryRow, HistoryTable};
pub use batch::{BatchResult, SimulationConfig, StartState, TrialBatch};
pub use cayley::{node_count, CayleyShape, CayleyTreeBuilder, GENERATION};
pub use error::{NetworkError, SimulationError};
pub use graph::{GraphBuilder, Senate, IDEOLOGY};
pub use lattice::{LatticeBuilder, LatticeShape, COORDS};
pub use montecarlo::{set_temperature, MonteCarlo, Snapshot, TEMPERATURE, VOTE_BETA, VOTE_PHI};
pub use network::{Network, NetworkKind, NodeCursor};
pub use node::{FeatureValue, NodeKey, NodeLabel};
pub use rules::{
    flip_test, DensityMode, RateInputs, RateParams, Rule, TemperatureParams, VoteCalibration,
    VoteInputs,
};
pub use topology::Adjacency;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_runs_are_identical() {
        let tree = CayleyTreeBuilder::new(4, 3).unwrap().build();
        let params = RateParams::default();

        let run = |seed| {
            let mut mc = MonteCarlo::seeded(&tree, params, seed);
            mc.start_random_threshold(0.3).unwrap();
            for _ in 0..10 {
                mc.simulate_nearest_neighbor().unwrap();
                mc.simulate_edge_interval().unwrap();
            }
            mc.history().to_vec()
        };

        assert_eq!(run(99), run(99));
        assert_ne!(run(99), run(100));
    }

    #[test]
    fn test_failed_step_leaves_history_intact() {
        let lattice = LatticeBuilder::new(3, 3, 1).unwrap().build();
        let mut mc = MonteCarlo::seeded(&lattice, RateParams::default(), 1);
        mc.start_full().unwrap();
        mc.simulate_nearest_neighbor().unwrap();
        let before = mc.history().to_vec();

        assert!(mc.simulate_temperature(TemperatureParams::default()).is_err());
        assert!(mc.simulate_vote().is_err());
        assert_eq!(mc.history(), before.as_slice());
    }

    #[test]
    fn test_snapshot_serialization_roundtrip() {
        let tree = CayleyTreeBuilder::new(2, 4).unwrap().build();
        let mut mc = MonteCarlo::seeded(&tree, RateParams::default(), 5);
        mc.start_central().unwrap();
        mc.simulate_nearest_neighbor().unwrap();

        let json = serde_json::to_string(mc.history()).expect("Serialization failed");
        let restored: Vec<Snapshot> = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(restored, mc.history());
    }
}

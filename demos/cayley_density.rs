//! Density spreading outward from the root of a Cayley tree.
//!
//! Starts with only the root occupied, runs the nearest-neighbor rule over a
//! batch of trials and prints the mean density plus the per-generation
//! occupancy of the first trial.
//!
//! Run with: `RUST_LOG=debug cargo run --example cayley_density`

use cayley_net::{
    CayleyTreeBuilder, MonteCarlo, RateParams, Rule, SimulationConfig, StartState, TrialBatch,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Cayley Tree Density Example");
    println!("===========================\n");

    let generations = 6;
    let links = 3;
    let tree = match CayleyTreeBuilder::new(generations, links) {
        Ok(builder) => builder.build(),
        Err(e) => {
            eprintln!("cannot build tree: {e}");
            return;
        }
    };

    let config = SimulationConfig {
        params: RateParams::nearest_neighbor(0.5, 0.8, 0.05),
        seed: 42,
        timesteps: 30,
        trials: 20,
    };

    println!("Nodes: {}", tree.len());
    println!("Generations: {}", generations);
    println!("Links: {}", links);
    println!("Trials: {}", config.trials);
    println!();

    let batch = TrialBatch::new(config.clone(), StartState::Central, Rule::NearestNeighbor);
    let result = match batch.run(&tree) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("batch failed: {e}");
            return;
        }
    };

    for (t, density) in result.mean_density.iter().enumerate() {
        if t % 5 == 0 || t == config.timesteps {
            println!("t={:3}: mean density={:.4}", t, density);
        }
    }

    // Replay trial 0 to look at how occupancy spreads by generation.
    let mut run = MonteCarlo::new(&tree, config.params, batch.trial_rng(0));
    let by_generation = run.start_central().and_then(|()| {
        for _ in 0..config.timesteps {
            run.simulate_nearest_neighbor()?;
        }
        run.density_by_generation()
    });

    match by_generation {
        Ok(table) => {
            println!("\nTrial 0 occupancy by generation at t={}:", config.timesteps);
            for (gen, row) in table.iter().enumerate() {
                let size = tree
                    .cayley_shape()
                    .map_or(0, |shape| shape.generation_size(gen));
                println!(
                    "  gen {}: {:4} / {}",
                    gen,
                    row.last().copied().unwrap_or_default(),
                    size
                );
            }
        }
        Err(e) => eprintln!("replay failed: {e}"),
    }
}

//! Repeated independent runs of one experiment.
//!
//! Every trial gets its own ChaCha8 stream: the base seed picks the key and
//! the trial index picks the stream, so trial `i` is reproducible on its own
//! and adding trials never changes earlier ones.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SimulationError;
use crate::graph::IDEOLOGY;
use crate::montecarlo::{MonteCarlo, Snapshot};
use crate::network::Network;
use crate::node::NodeLabel;
use crate::rules::{RateParams, Rule, VoteCalibration};

/// Session settings for a batch of runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub params: RateParams,
    pub seed: u64,
    /// Steps simulated after the initial state.
    pub timesteps: usize,
    pub trials: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            params: RateParams::default(),
            seed: 42,
            timesteps: 10,
            trials: 1,
        }
    }
}

/// Initial-state strategy applied at the start of every trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StartState {
    Empty,
    Full,
    Random(f64),
    Central,
    SpinUp,
    SpinDown,
    SpinRandom,
    /// Reads each node's `ideology` feature.
    VoteBiased {
        issue_rating: f64,
        center: f64,
        calibration: VoteCalibration,
    },
}

impl StartState {
    fn apply<N: NodeLabel>(&self, run: &mut MonteCarlo<'_, N>) -> Result<(), SimulationError> {
        match *self {
            Self::Empty => run.start_empty(),
            Self::Full => run.start_full(),
            Self::Random(p) => run.start_random_threshold(p),
            Self::Central => run.start_central(),
            Self::SpinUp => run.start_spin_up(),
            Self::SpinDown => run.start_spin_down(),
            Self::SpinRandom => run.start_spin_random(),
            Self::VoteBiased {
                issue_rating,
                center,
                calibration,
            } => run.start_vote_biased(issue_rating, IDEOLOGY, center, &calibration),
        }
    }
}

/// Outcome of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Density series of each trial, `timesteps + 1` entries each.
    pub densities: Vec<Vec<f64>>,
    /// Mean over trials at each timestep.
    pub mean_density: Vec<f64>,
    /// Last snapshot of each trial.
    pub final_states: Vec<Snapshot>,
}

/// One experiment: a start strategy and a rule, repeated over trials.
#[derive(Debug, Clone)]
pub struct TrialBatch {
    config: SimulationConfig,
    start: StartState,
    rule: Rule,
}

impl TrialBatch {
    #[must_use]
    pub fn new(config: SimulationConfig, start: StartState, rule: Rule) -> Self {
        Self {
            config,
            start,
            rule,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The random source for trial `trial`.
    #[must_use]
    pub fn trial_rng(&self, trial: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        rng.set_stream(trial as u64);
        rng
    }

    /// Run every trial on `network`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidParameter`] for zero trials, and
    /// otherwise the first error any trial hits.
    pub fn run<N: NodeLabel>(&self, network: &Network<N>) -> Result<BatchResult, SimulationError> {
        if self.config.trials == 0 {
            return Err(SimulationError::InvalidParameter(
                "a batch needs at least one trial".to_owned(),
            ));
        }

        let mut densities = Vec::with_capacity(self.config.trials);
        let mut final_states = Vec::with_capacity(self.config.trials);
        for trial in 0..self.config.trials {
            let mut run = MonteCarlo::new(network, self.config.params, self.trial_rng(trial));
            self.start.apply(&mut run)?;
            for _ in 0..self.config.timesteps {
                run.simulate(&self.rule)?;
            }
            densities.push(run.density_series());
            if let Some(last) = run.latest() {
                final_states.push(last.clone());
            }
        }

        let steps = self.config.timesteps + 1;
        let trials = self.config.trials as f64;
        let mean_density = (0..steps)
            .map(|t| densities.iter().map(|series| series[t]).sum::<f64>() / trials)
            .collect();

        info!(
            rule = self.rule.tag(),
            trials = self.config.trials,
            timesteps = self.config.timesteps,
            "batch finished"
        );
        Ok(BatchResult {
            densities,
            mean_density,
            final_states,
        })
    }
}

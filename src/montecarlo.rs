//! Discrete-time Monte Carlo engine over a [`Network`].
//!
//! A [`MonteCarlo`] run owns a history of [`Snapshot`]s. Exactly one start
//! operation writes `history[0]`; each simulate call then reads only the
//! latest snapshot and appends exactly one new one (synchronous update).
//! Nodes are visited in a freshly shuffled order every step, but because all
//! reads come from the previous snapshot the order only decides which draw
//! goes to which node.
//!
//! ## Randomness
//!
//! The engine owns its random source, so a run is fully reproducible from the
//! seed, the network and the sequence of calls. Every node (or edge, for the
//! edge-interval rule) consumes exactly one uniform draw per step.
//!
//! ## Failure
//!
//! Inputs are checked before any draw is made. A failed call appends nothing
//! and leaves earlier snapshots untouched.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::SimulationError;
use crate::network::Network;
use crate::node::NodeLabel;
use crate::rules::{
    flip_occupancy, flip_spin, flip_test, DensityMode, RateInputs, RateParams, Rule,
    TemperatureParams, VoteCalibration, VoteInputs,
};
use crate::topology::Adjacency;

/// Feature read by the temperature rule.
pub const TEMPERATURE: &str = "temperature";
/// Per-node activation base read by the vote rule.
pub const VOTE_BETA: &str = "beta";
/// Per-node deactivation base read by the vote rule.
pub const VOTE_PHI: &str = "phi";

/// States the occupancy rules can read.
const OCCUPANCY: [i8; 2] = [0, 1];
/// States the temperature rule can read.
const SPIN: [i8; 2] = [-1, 1];

/// The state of every node at one timestep, indexed by node rank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snapshot {
    states: Vec<i8>,
}

impl Snapshot {
    #[must_use]
    pub fn new(states: Vec<i8>) -> Self {
        Self { states }
    }

    /// State of the node at `rank`.
    #[must_use]
    pub fn get(&self, rank: usize) -> Option<i8> {
        self.states.get(rank).copied()
    }

    #[must_use]
    pub fn states(&self) -> &[i8] {
        &self.states
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of nodes in `state`.
    #[must_use]
    pub fn count(&self, state: i8) -> usize {
        self.states.iter().filter(|&&s| s == state).count()
    }
}

/// A Monte Carlo run on one network.
///
/// The network is borrowed for the life of the run, so its links and
/// features cannot change while simulating. Several runs may share one
/// network; each keeps its own history.
pub struct MonteCarlo<'a, N: NodeLabel = usize, R: Rng = ChaCha8Rng> {
    network: &'a Network<N>,
    adjacency: Adjacency,
    params: RateParams,
    history: Vec<Snapshot>,
    rng: R,
}

impl<'a, N: NodeLabel> MonteCarlo<'a, N, ChaCha8Rng> {
    /// A run driven by a ChaCha8 stream seeded from `seed`.
    #[must_use]
    pub fn seeded(network: &'a Network<N>, params: RateParams, seed: u64) -> Self {
        Self::new(network, params, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<'a, N: NodeLabel, R: Rng> MonteCarlo<'a, N, R> {
    /// A run driven by `rng`.
    pub fn new(network: &'a Network<N>, params: RateParams, rng: R) -> Self {
        Self {
            network,
            adjacency: Adjacency::from_network(network),
            params,
            history: Vec::new(),
            rng,
        }
    }

    #[must_use]
    pub fn network(&self) -> &'a Network<N> {
        self.network
    }

    #[must_use]
    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    #[must_use]
    pub fn params(&self) -> &RateParams {
        &self.params
    }

    /// Replace the rate coefficients for subsequent steps.
    pub fn set_params(&mut self, params: RateParams) {
        self.params = params;
    }

    /// All snapshots so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    /// Number of snapshots recorded, including the initial one.
    #[must_use]
    pub fn timesteps(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Snapshot> {
        self.history.last()
    }

    /// Snapshot at `timestep`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::TimestepOutOfRange`] if it does not exist yet.
    pub fn snapshot(&self, timestep: usize) -> Result<&Snapshot, SimulationError> {
        self.history
            .get(timestep)
            .ok_or(SimulationError::TimestepOutOfRange {
                timestep,
                len: self.history.len(),
            })
    }

    /// State of `node` at `timestep`.
    ///
    /// # Errors
    ///
    /// Fails if the timestep or the node does not exist.
    pub fn state_at(&self, timestep: usize, node: &N) -> Result<i8, SimulationError> {
        let rank = self.rank_of(node)?;
        let snapshot = self.snapshot(timestep)?;
        snapshot
            .get(rank)
            .ok_or_else(|| SimulationError::UnknownNode(format!("{node:?}")))
    }

    /// State of `node` in the latest snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the run has not started or the node does not exist.
    pub fn previous_state(&self, node: &N) -> Result<i8, SimulationError> {
        let latest = self.history.len().checked_sub(1).ok_or(SimulationError::NotStarted)?;
        self.state_at(latest, node)
    }

    /// Drop all history. A start operation must run again before simulating.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub(crate) fn rank_of(&self, node: &N) -> Result<usize, SimulationError> {
        self.network
            .position(node)
            .ok_or_else(|| SimulationError::UnknownNode(format!("{node:?}")))
    }

    // Initial states

    fn begin(&mut self, states: Vec<i8>, label: &str) -> Result<(), SimulationError> {
        if !self.history.is_empty() {
            return Err(SimulationError::AlreadyStarted);
        }
        debug!(start = label, nodes = states.len(), "initial state set");
        self.history.push(Snapshot::new(states));
        Ok(())
    }

    fn ensure_unstarted(&self) -> Result<(), SimulationError> {
        if self.history.is_empty() {
            Ok(())
        } else {
            Err(SimulationError::AlreadyStarted)
        }
    }

    /// Every node empty (0).
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::AlreadyStarted`] if history is non-empty.
    pub fn start_empty(&mut self) -> Result<(), SimulationError> {
        self.begin(vec![0; self.network.len()], "empty")
    }

    /// Every node full (1).
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::AlreadyStarted`] if history is non-empty.
    pub fn start_full(&mut self) -> Result<(), SimulationError> {
        self.begin(vec![1; self.network.len()], "full")
    }

    /// Each node independently full with probability `p`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::AlreadyStarted`] if history is non-empty.
    pub fn start_random_threshold(&mut self, p: f64) -> Result<(), SimulationError> {
        self.ensure_unstarted()?;
        let states = (0..self.network.len())
            .map(|_| i8::from(flip_test(&mut self.rng, p)))
            .collect();
        self.begin(states, "random")
    }

    /// The tree root full, everything else empty.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NotACayleyTree`] on any other topology, or
    /// [`SimulationError::AlreadyStarted`] if history is non-empty.
    pub fn start_central(&mut self) -> Result<(), SimulationError> {
        self.ensure_unstarted()?;
        if self.network.cayley_shape().is_none() {
            return Err(SimulationError::NotACayleyTree);
        }
        let mut states = vec![0; self.network.len()];
        if let Some(root) = states.first_mut() {
            *root = 1;
        }
        self.begin(states, "central")
    }

    /// Every spin up (+1).
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::AlreadyStarted`] if history is non-empty.
    pub fn start_spin_up(&mut self) -> Result<(), SimulationError> {
        self.begin(vec![1; self.network.len()], "spin-up")
    }

    /// Every spin down (-1).
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::AlreadyStarted`] if history is non-empty.
    pub fn start_spin_down(&mut self) -> Result<(), SimulationError> {
        self.begin(vec![-1; self.network.len()], "spin-down")
    }

    /// Each spin independently up or down with equal probability.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::AlreadyStarted`] if history is non-empty.
    pub fn start_spin_random(&mut self) -> Result<(), SimulationError> {
        self.ensure_unstarted()?;
        let states = (0..self.network.len())
            .map(|_| if self.rng.random_bool(0.5) { 1 } else { -1 })
            .collect();
        self.begin(states, "spin-random")
    }

    /// Each member votes yes (1) with the calibrated probability derived from
    /// its `ideology_feature` value, the `center` ideology and the issue rating.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::MissingFeature`] if a node lacks a numeric
    /// ideology, or [`SimulationError::AlreadyStarted`] if history is non-empty.
    pub fn start_vote_biased(
        &mut self,
        issue_rating: f64,
        ideology_feature: &str,
        center: f64,
        calibration: &VoteCalibration,
    ) -> Result<(), SimulationError> {
        self.ensure_unstarted()?;
        let ideology = self.numeric_feature(ideology_feature)?;
        let states = ideology
            .iter()
            .map(|&eta| {
                let p = calibration.probability(eta, center, issue_rating);
                i8::from(flip_test(&mut self.rng, p))
            })
            .collect();
        self.begin(states, "vote-biased")
    }

    // Timestep rules

    fn previous(&self) -> Result<&Snapshot, SimulationError> {
        self.history.last().ok_or(SimulationError::NotStarted)
    }

    /// The latest snapshot, provided every state lies in `domain`.
    fn previous_in(&self, rule: &str, domain: [i8; 2]) -> Result<Vec<i8>, SimulationError> {
        let prev = self.previous()?.states();
        if let Some(rank) = prev.iter().position(|s| !domain.contains(s)) {
            return Err(SimulationError::StateOutOfDomain {
                rule: rule.to_owned(),
                node: self.describe(rank),
                state: prev[rank],
            });
        }
        Ok(prev.to_vec())
    }

    fn commit(&mut self, rule: &str, next: Vec<i8>, flips: usize) {
        trace!(rule, timestep = self.history.len(), flips, "step committed");
        self.history.push(Snapshot::new(next));
    }

    /// Visit every node once in shuffled order and flip it with the
    /// probability returned by `rate(rank, state)`.
    fn node_pass<F>(&mut self, rule: &str, flip: fn(i8) -> i8, rate: F) -> Result<(), SimulationError>
    where
        F: Fn(usize, i8) -> f64,
    {
        let prev = self.previous()?.states().to_vec();
        // Probabilities are computed up front so a bad one aborts the step
        // before any draw is consumed.
        let probabilities = prev
            .iter()
            .enumerate()
            .map(|(rank, &state)| checked(rate(rank, state), rank))
            .collect::<Result<Vec<_>, _>>()?;

        let mut order: Vec<usize> = (0..prev.len()).collect();
        order.shuffle(&mut self.rng);

        let mut next = prev.clone();
        for rank in order {
            if flip_test(&mut self.rng, probabilities[rank]) {
                next[rank] = flip(prev[rank]);
            }
        }
        let flips = changed_nodes(&prev, &next);
        self.commit(rule, next, flips);
        Ok(())
    }

    /// Nearest-neighbor rule: `p = gamma*s + (1-s)*alpha*beta^summ`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NotStarted`] before a start operation.
    pub fn simulate_nearest_neighbor(&mut self) -> Result<(), SimulationError> {
        let prev = self.previous_in(Rule::NearestNeighbor.tag(), OCCUPANCY)?;
        let adjacency = &self.adjacency;
        let params = self.params;
        let rates: Vec<f64> = (0..prev.len())
            .map(|rank| {
                let summ = adjacency.neighbor_sum(rank, &prev) as f64;
                params.nearest_neighbor_rate(prev[rank], summ)
            })
            .collect();
        self.node_pass(Rule::NearestNeighbor.tag(), flip_occupancy, |rank, _| {
            rates[rank]
        })
    }

    /// Edge-interval rule.
    ///
    /// Each link is visited once in shuffled order. One endpoint is picked
    /// at random to act and reads the other endpoint's previous state. Each
    /// acting visit is an independent trial against the previous snapshot, so
    /// a node that acts on several links keeps the outcome of its last one.
    /// A passive endpoint, and any node on no link, carries its previous
    /// state forward unless it acts elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NotStarted`] before a start operation.
    pub fn simulate_edge_interval(&mut self) -> Result<(), SimulationError> {
        let prev = self.previous_in(Rule::EdgeInterval.tag(), OCCUPANCY)?;
        let params = self.params;

        // Both orientations are checked up front so a bad rate aborts the
        // step before any draw is consumed.
        let mut edges = self.adjacency.edges();
        for &(a, b) in &edges {
            checked(params.edge_interval_rate(prev[a], prev[b]), a)?;
            checked(params.edge_interval_rate(prev[b], prev[a]), b)?;
        }
        edges.shuffle(&mut self.rng);

        let mut next: Vec<Option<i8>> = vec![None; prev.len()];
        for (a, b) in edges {
            let (acting, passive) = if self.rng.random_bool(0.5) { (a, b) } else { (b, a) };
            let probability = params.edge_interval_rate(prev[acting], prev[passive]);
            let outcome = if flip_test(&mut self.rng, probability) {
                flip_occupancy(prev[acting])
            } else {
                prev[acting]
            };
            next[acting] = Some(outcome);
            next[passive].get_or_insert(prev[passive]);
        }

        let next: Vec<i8> = next
            .into_iter()
            .zip(&prev)
            .map(|(state, &old)| state.unwrap_or(old))
            .collect();
        // A node that flips on one link and not on a later one ends unchanged.
        let flips = changed_nodes(&prev, &next);
        self.commit(Rule::EdgeInterval.tag(), next, flips);
        Ok(())
    }

    /// Total-density rule with the density held fixed for the pass.
    ///
    /// `dens` is the full fraction at `timestep`; in normal use that is the
    /// latest snapshot.
    ///
    /// # Errors
    ///
    /// Fails before a start operation or if `timestep` does not exist.
    pub fn simulate_total_density(&mut self, timestep: usize) -> Result<(), SimulationError> {
        self.simulate_total_density_with(timestep, DensityMode::Fixed)
    }

    /// Total-density rule: `p = gamma*s + (1-s)*(1-dens)*mu`.
    ///
    /// With [`DensityMode::Incremental`] the density moves by `1/N` with
    /// every flip, so later nodes in the shuffled order see earlier flips.
    ///
    /// # Errors
    ///
    /// Fails before a start operation or if `timestep` does not exist.
    pub fn simulate_total_density_with(
        &mut self,
        timestep: usize,
        mode: DensityMode,
    ) -> Result<(), SimulationError> {
        let prev = self.previous_in(Rule::TotalDensity(mode).tag(), OCCUPANCY)?;
        let nodes = prev.len();
        let mut ones = self.snapshot(timestep)?.count(1);
        let density_of = |ones: usize| {
            if nodes == 0 {
                0.0
            } else {
                ones as f64 / nodes as f64
            }
        };
        let density = density_of(ones);
        let params = self.params;

        if mode == DensityMode::Fixed {
            return self.node_pass(Rule::TotalDensity(mode).tag(), flip_occupancy, |_, state| {
                params.total_density_rate(state, density)
            });
        }

        checked(params.total_density_rate(0, density), 0)?;
        checked(params.total_density_rate(1, density), 0)?;

        let mut order: Vec<usize> = (0..nodes).collect();
        order.shuffle(&mut self.rng);
        let mut next = prev.clone();
        let mut flips = 0;
        for rank in order {
            let rate = params.total_density_rate(prev[rank], density_of(ones));
            let probability = checked(rate, rank)?;
            if flip_test(&mut self.rng, probability) {
                next[rank] = flip_occupancy(prev[rank]);
                if next[rank] == 1 {
                    ones += 1;
                } else {
                    ones = ones.saturating_sub(1);
                }
                flips += 1;
            }
        }
        self.commit(Rule::TotalDensity(mode).tag(), next, flips);
        Ok(())
    }

    /// Ising rule on spins: `p = 0.5*(1 - s*tanh(J*summ/(k*T)))`, with `T`
    /// the node's `temperature` feature.
    ///
    /// # Errors
    ///
    /// Fails before a start operation, if a node has no numeric temperature,
    /// or if `k*T` is zero or not finite.
    pub fn simulate_temperature(
        &mut self,
        temperature: TemperatureParams,
    ) -> Result<(), SimulationError> {
        let prev = self.previous_in(Rule::Temperature(temperature).tag(), SPIN)?;
        let temps = self.numeric_feature(TEMPERATURE)?;
        for (rank, &t) in temps.iter().enumerate() {
            let kt = temperature.k * t;
            if kt == 0.0 || !kt.is_finite() {
                return Err(SimulationError::InvalidParameter(format!(
                    "k*temperature = {kt} at node {}",
                    self.describe(rank)
                )));
            }
        }
        let adjacency = &self.adjacency;
        let rates: Vec<f64> = (0..prev.len())
            .map(|rank| {
                let summ = adjacency.neighbor_sum(rank, &prev) as f64;
                temperature.rate(prev[rank], temps[rank], summ)
            })
            .collect();
        self.node_pass(Rule::Temperature(temperature).tag(), flip_spin, |rank, _| {
            rates[rank]
        })
    }

    /// Vote rule with per-node `beta` and `phi` features:
    /// `p = gamma*s*phi^(unsumm/k) + (1-s)*alpha*beta^(summ/k)`.
    ///
    /// # Errors
    ///
    /// Fails before a start operation, if a node lacks `beta` or `phi`, or if
    /// a node has no neighbors.
    pub fn simulate_vote(&mut self) -> Result<(), SimulationError> {
        let prev = self.previous_in(Rule::Vote.tag(), OCCUPANCY)?;
        let betas = self.numeric_feature(VOTE_BETA)?;
        let phis = self.numeric_feature(VOTE_PHI)?;
        let adjacency = &self.adjacency;
        let params = self.params;

        let mut rates = Vec::with_capacity(prev.len());
        for rank in 0..prev.len() {
            let degree = adjacency.degree(rank);
            if degree == 0 {
                return Err(SimulationError::ZeroDegree {
                    node: self.describe(rank),
                });
            }
            let vote = VoteInputs {
                beta: betas[rank],
                phi: phis[rank],
                neighbor_sum: adjacency.neighbor_sum(rank, &prev) as f64,
                neighbor_unsum: adjacency.neighbor_unsum(rank, &prev) as f64,
                degree,
            };
            rates.push(params.vote_rate(prev[rank], &vote));
        }
        self.node_pass(Rule::Vote.tag(), flip_occupancy, |rank, _| rates[rank])
    }

    /// Occupancy step with a caller-supplied probability.
    ///
    /// # Errors
    ///
    /// Fails before a start operation or if `rate` returns a non-finite value.
    pub fn simulate_custom<F>(&mut self, rate: F) -> Result<(), SimulationError>
    where
        F: Fn(&RateInputs<'_>) -> f64,
    {
        let prev = self.previous_in("custom", OCCUPANCY)?;
        let adjacency = &self.adjacency;
        let params = self.params;
        let rates: Vec<f64> = (0..prev.len())
            .map(|rank| {
                rate(&RateInputs {
                    state: prev[rank],
                    neighbor_sum: adjacency.neighbor_sum(rank, &prev) as f64,
                    neighbor_unsum: adjacency.neighbor_unsum(rank, &prev) as f64,
                    degree: adjacency.degree(rank),
                    params: &params,
                })
            })
            .collect();
        self.node_pass("custom", flip_occupancy, |rank, _| rates[rank])
    }

    /// Run one step of a rule chosen at runtime. The total-density rule reads
    /// the latest snapshot.
    ///
    /// # Errors
    ///
    /// Propagates the chosen rule's errors.
    pub fn simulate(&mut self, rule: &Rule) -> Result<(), SimulationError> {
        match *rule {
            Rule::NearestNeighbor => self.simulate_nearest_neighbor(),
            Rule::EdgeInterval => self.simulate_edge_interval(),
            Rule::TotalDensity(mode) => {
                let latest = self.history.len().checked_sub(1).ok_or(SimulationError::NotStarted)?;
                self.simulate_total_density_with(latest, mode)
            }
            Rule::Temperature(params) => self.simulate_temperature(params),
            Rule::Vote => self.simulate_vote(),
        }
    }

    /// Numeric value of `name` for every node, in rank order.
    fn numeric_feature(&self, name: &str) -> Result<Vec<f64>, SimulationError> {
        self.network
            .nodes()
            .map(|node| {
                self.network
                    .feature(node, name)
                    .and_then(|v| v.as_f64())
                    .ok_or_else(|| SimulationError::MissingFeature {
                        feature: name.to_owned(),
                        node: format!("{node:?}"),
                    })
            })
            .collect()
    }

    fn describe(&self, rank: usize) -> String {
        self.network
            .node_at(rank)
            .map_or_else(|| format!("#{rank}"), |node| format!("{node:?}"))
    }
}

/// Number of ranks whose state differs between two snapshots.
fn changed_nodes(prev: &[i8], next: &[i8]) -> usize {
    prev.iter().zip(next).filter(|(old, new)| old != new).count()
}

/// Reject probabilities no flip test can interpret.
fn checked(probability: f64, rank: usize) -> Result<f64, SimulationError> {
    if !probability.is_finite() {
        return Err(SimulationError::InvalidParameter(format!(
            "transition probability {probability} at rank {rank}"
        )));
    }
    Ok(probability)
}

/// Assign `temp` as the `temperature` feature of every node in `nodes`.
///
/// # Errors
///
/// Fails without writing anything if any node is absent.
pub fn set_temperature<N, I>(
    network: &mut Network<N>,
    nodes: I,
    temp: f64,
) -> Result<(), crate::error::NetworkError>
where
    N: NodeLabel,
    I: IntoIterator<Item = N>,
{
    network.set_feature(TEMPERATURE, nodes.into_iter().map(|n| (n, temp)))
}

//! Transition-rate parameters and per-node flip probabilities.
//!
//! Occupancy rules work on states `{0, 1}`; the temperature rule works on
//! spins `{-1, +1}`. Every rule reduces to a probability that the node flips
//! this timestep, which is then settled by a single uniform draw (see
//! [`flip_test`]).

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Rate coefficients shared by the built-in rules.
///
/// Which fields matter depends on the rule:
/// - nearest neighbor: `alpha`, `beta`, `gamma`
/// - edge interval: `r1`, `r2`, `gamma`
/// - total density: `mu`, `gamma`
/// - vote: `alpha`, `gamma` (per-node `beta`/`phi` come from features)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub mu: f64,
    pub r1: f64,
    pub r2: f64,
}

impl Default for RateParams {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.8,
            gamma: 0.0,
            mu: 0.3,
            r1: 0.3,
            r2: 0.5,
        }
    }
}

impl RateParams {
    #[must_use]
    pub fn nearest_neighbor(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn edge_interval(r1: f64, r2: f64, gamma: f64) -> Self {
        Self {
            r1,
            r2,
            gamma,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn total_density(mu: f64, gamma: f64) -> Self {
        Self {
            mu,
            gamma,
            ..Default::default()
        }
    }

    /// `gamma*s + (1-s)*alpha*beta^summ`
    #[inline]
    #[must_use]
    pub fn nearest_neighbor_rate(&self, state: i8, neighbor_sum: f64) -> f64 {
        let s = f64::from(state);
        self.gamma * s + (1.0 - s) * self.alpha * self.beta.powf(neighbor_sum)
    }

    /// `gamma*s + (1-s)*(r1*summ + r2*(1-summ))`, with `summ` the passive
    /// endpoint's state.
    #[inline]
    #[must_use]
    pub fn edge_interval_rate(&self, state: i8, other: i8) -> f64 {
        let s = f64::from(state);
        let o = f64::from(other);
        self.gamma * s + (1.0 - s) * (self.r1 * o + self.r2 * (1.0 - o))
    }

    /// `gamma*s + (1-s)*(1-dens)*mu`
    #[inline]
    #[must_use]
    pub fn total_density_rate(&self, state: i8, density: f64) -> f64 {
        let s = f64::from(state);
        self.gamma * s + (1.0 - s) * (1.0 - density) * self.mu
    }

    /// `gamma*s*phi^(unsumm/k) + (1-s)*alpha*beta^(summ/k)` with `k` the degree.
    #[inline]
    #[must_use]
    pub fn vote_rate(&self, state: i8, vote: &VoteInputs) -> f64 {
        let s = f64::from(state);
        let k = vote.degree as f64;
        self.gamma * s * vote.phi.powf(vote.neighbor_unsum / k)
            + (1.0 - s) * self.alpha * vote.beta.powf(vote.neighbor_sum / k)
    }
}

/// Per-node inputs of the vote rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoteInputs {
    pub beta: f64,
    pub phi: f64,
    pub neighbor_sum: f64,
    pub neighbor_unsum: f64,
    pub degree: usize,
}

/// Ising coefficients: Boltzmann constant `k` and coupling `j`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureParams {
    pub k: f64,
    pub j: f64,
}

impl Default for TemperatureParams {
    fn default() -> Self {
        Self { k: 1.0, j: 1.0 }
    }
}

impl TemperatureParams {
    /// `0.5 * (1 - s * tanh(J * summ / (k * T)))`
    #[inline]
    #[must_use]
    pub fn rate(&self, spin: i8, temperature: f64, neighbor_sum: f64) -> f64 {
        let local_beta = 1.0 / (self.k * temperature);
        0.5 * (1.0 - f64::from(spin) * (local_beta * self.j * neighbor_sum).tanh())
    }
}

/// Calibration of the vote-biased initial state.
///
/// A member votes yes with probability `(eta * polarity + c1) / c2`, where
/// `eta` is the member's ideology minus the center and `polarity` is the issue
/// rating minus one half.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteCalibration {
    pub c1: f64,
    pub c2: f64,
}

impl Default for VoteCalibration {
    fn default() -> Self {
        Self { c1: 0.34, c2: 0.68 }
    }
}

impl VoteCalibration {
    #[inline]
    #[must_use]
    pub fn probability(&self, ideology: f64, center: f64, issue_rating: f64) -> f64 {
        let eta = ideology - center;
        let polarity = issue_rating - 0.5;
        (eta * polarity + self.c1) / self.c2
    }
}

/// How the total-density rule treats density within one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DensityMode {
    /// Density is read once from the referenced snapshot.
    #[default]
    Fixed,
    /// Density moves by `±1/N` after each flip within the pass.
    Incremental,
}

/// Everything a caller-supplied occupancy rule may depend on.
#[derive(Debug, Clone, Copy)]
pub struct RateInputs<'a> {
    /// Node's state in the previous snapshot.
    pub state: i8,
    /// `Σ s[n]` over neighbors.
    pub neighbor_sum: f64,
    /// `Σ (1 - s[n])` over neighbors.
    pub neighbor_unsum: f64,
    pub degree: usize,
    pub params: &'a RateParams,
}

/// A built-in transition rule, for callers that pick the rule at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Rule {
    NearestNeighbor,
    EdgeInterval,
    TotalDensity(DensityMode),
    Temperature(TemperatureParams),
    Vote,
}

impl Rule {
    /// Short tag, as used in run names and logs.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::NearestNeighbor => "NN",
            Self::EdgeInterval => "EI",
            Self::TotalDensity(_) => "TL",
            Self::Temperature(_) => "TM",
            Self::Vote => "VT",
        }
    }
}

/// One Bernoulli trial: `true` (flip) with probability `probability`.
///
/// Uses exactly one draw. The comparison is strict so that a zero
/// probability can never flip.
#[inline]
pub fn flip_test<R: Rng>(rng: &mut R, probability: f64) -> bool {
    rng.random::<f64>() < probability
}

/// 0 ↔ 1; anything else is left alone.
#[inline]
#[must_use]
pub fn flip_occupancy(state: i8) -> i8 {
    match state {
        0 => 1,
        1 => 0,
        other => other,
    }
}

/// -1 ↔ +1; anything else is left alone.
#[inline]
#[must_use]
pub fn flip_spin(state: i8) -> i8 {
    match state {
        -1 => 1,
        1 => -1,
        other => other,
    }
}

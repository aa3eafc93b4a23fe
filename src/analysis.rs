//! Read-only reducers over a run's snapshot history.
//!
//! Nothing here mutates the run, so every query may be retried freely.

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::montecarlo::MonteCarlo;
use crate::node::NodeLabel;

/// Map a state onto `{-1, +1}`: occupancy 0 becomes -1, spins pass through.
#[inline]
fn signed(state: i8) -> f64 {
    if state == 0 {
        -1.0
    } else {
        f64::from(state)
    }
}

impl<N: NodeLabel, R: Rng> MonteCarlo<'_, N, R> {
    /// Nodes in state 1 at `timestep`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::TimestepOutOfRange`] for a missing timestep.
    pub fn count_ones(&self, timestep: usize) -> Result<usize, SimulationError> {
        Ok(self.snapshot(timestep)?.count(1))
    }

    /// Nodes in state 0 at `timestep`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::TimestepOutOfRange`] for a missing timestep.
    pub fn count_zeros(&self, timestep: usize) -> Result<usize, SimulationError> {
        Ok(self.snapshot(timestep)?.count(0))
    }

    /// Spins up at `timestep`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::TimestepOutOfRange`] for a missing timestep.
    pub fn count_up(&self, timestep: usize) -> Result<usize, SimulationError> {
        Ok(self.snapshot(timestep)?.count(1))
    }

    /// Spins down at `timestep`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::TimestepOutOfRange`] for a missing timestep.
    pub fn count_down(&self, timestep: usize) -> Result<usize, SimulationError> {
        Ok(self.snapshot(timestep)?.count(-1))
    }

    /// Fraction of nodes in state 1 at `timestep`; zero on an empty network.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::TimestepOutOfRange`] for a missing timestep.
    pub fn density(&self, timestep: usize) -> Result<f64, SimulationError> {
        let snapshot = self.snapshot(timestep)?;
        Ok(fraction(snapshot.count(1), snapshot.len()))
    }

    /// Density at every recorded timestep.
    #[must_use]
    pub fn density_series(&self) -> Vec<f64> {
        self.history()
            .iter()
            .map(|s| fraction(s.count(1), s.len()))
            .collect()
    }

    /// Mean spin at `timestep`; zero on an empty network.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::TimestepOutOfRange`] for a missing timestep.
    pub fn magnetization(&self, timestep: usize) -> Result<f64, SimulationError> {
        let snapshot = self.snapshot(timestep)?;
        if snapshot.is_empty() {
            return Ok(0.0);
        }
        let total: i64 = snapshot.states().iter().map(|&s| i64::from(s)).sum();
        Ok(total as f64 / snapshot.len() as f64)
    }

    /// Sum of states over generation `gen` of a Cayley tree at `timestep`.
    ///
    /// # Errors
    ///
    /// Fails on a non-tree network, a generation past the last one, or a
    /// missing timestep.
    pub fn generation_density(&self, gen: usize, timestep: usize) -> Result<i64, SimulationError> {
        let shape = self
            .network()
            .cayley_shape()
            .ok_or(SimulationError::NotACayleyTree)?;
        let range = shape.nodes_per_gen(gen).ok_or_else(|| {
            SimulationError::InvalidParameter(format!(
                "generation {gen} beyond tree depth {}",
                shape.generations()
            ))
        })?;
        let states = self
            .snapshot(timestep)?
            .states()
            .get(range)
            .ok_or(SimulationError::NotACayleyTree)?;
        Ok(states.iter().map(|&s| i64::from(s)).sum())
    }

    /// Generation sums for every generation (rows) and timestep (columns).
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NotACayleyTree`] on any other topology.
    pub fn density_by_generation(&self) -> Result<Vec<Vec<i64>>, SimulationError> {
        let shape = self
            .network()
            .cayley_shape()
            .ok_or(SimulationError::NotACayleyTree)?;
        (0..=shape.generations())
            .map(|gen| {
                (0..self.timesteps())
                    .map(|t| self.generation_density(gen, t))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }

    /// Covariance of two nodes' `{-1, +1}`-mapped states over the whole run:
    /// `<a*b> - <a><b>`.
    ///
    /// # Errors
    ///
    /// Fails if the run has not started or either node is absent.
    pub fn correlation(&self, a: &N, b: &N) -> Result<f64, SimulationError> {
        if self.history().is_empty() {
            return Err(SimulationError::NotStarted);
        }
        let (ra, rb) = (self.rank_of(a)?, self.rank_of(b)?);

        let mut sum_a = 0.0;
        let mut sum_b = 0.0;
        let mut sum_ab = 0.0;
        for snapshot in self.history() {
            let sa = signed(snapshot.states()[ra]);
            let sb = signed(snapshot.states()[rb]);
            sum_a += sa;
            sum_b += sb;
            sum_ab += sa * sb;
        }
        let n = self.timesteps() as f64;
        Ok(sum_ab / n - (sum_a / n) * (sum_b / n))
    }

    /// Latest state of every node, keyed by node in rank order.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NotStarted`] before a start operation.
    pub fn final_state(&self) -> Result<IndexMap<&N, i8>, SimulationError> {
        let latest = self.latest().ok_or(SimulationError::NotStarted)?;
        Ok(self
            .network()
            .nodes()
            .zip(latest.states().iter().copied())
            .collect())
    }
}

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// One node's state over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow<N> {
    pub node: N,
    pub states: Vec<i8>,
}

/// Tabular view of a run for export: one row per node in rank order, one
/// column per timestep, plus density rollups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTable<N> {
    pub rows: Vec<HistoryRow<N>>,
    /// Per-generation sums (Cayley trees only), one row per generation.
    pub generation_density: Option<Vec<Vec<i64>>>,
    pub total_density: Vec<f64>,
}

impl<N: NodeLabel> HistoryTable<N> {
    /// Tabulate a run.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NotStarted`] if there is nothing to export.
    pub fn from_run<R: Rng>(run: &MonteCarlo<'_, N, R>) -> Result<Self, SimulationError> {
        if run.history().is_empty() {
            return Err(SimulationError::NotStarted);
        }
        let rows = run
            .network()
            .nodes()
            .enumerate()
            .map(|(rank, node)| HistoryRow {
                node: node.clone(),
                states: run
                    .history()
                    .iter()
                    .map(|s| s.get(rank).unwrap_or_default())
                    .collect(),
            })
            .collect();
        let generation_density = match run.density_by_generation() {
            Ok(table) => Some(table),
            Err(SimulationError::NotACayleyTree) => None,
            Err(e) => return Err(e),
        };
        Ok(Self {
            rows,
            generation_density,
            total_density: run.density_series(),
        })
    }

    #[must_use]
    pub fn timesteps(&self) -> usize {
        self.total_density.len()
    }
}

//! Dense adjacency snapshot in CSR format.
//!
//! Simulations touch every node's neighbors once per timestep. Walking the
//! arena's `BTreeSet`s for that is needlessly slow, so [`Adjacency`] flattens
//! the network into Compressed Sparse Row form once, with nodes addressed by
//! their rank (insertion order) rather than by label.
//!
//! ## Determinism
//!
//! Targets for each node are listed in arena-key order, which is the same on
//! every run for the same construction sequence. Edge lists built from the CSR
//! therefore come out in a fixed order and a seeded shuffle over them is
//! reproducible.

use std::collections::VecDeque;

use crate::network::Network;
use crate::node::NodeLabel;

/// CSR-format view of a network's links.
#[derive(Debug, Clone)]
pub struct Adjacency {
    /// Number of nodes.
    node_count: usize,
    /// CSR offsets. Length = node_count + 1.
    offsets: Vec<usize>,
    /// targets[offsets[i]..offsets[i+1]] are the neighbors of node i.
    targets: Vec<usize>,
}

impl Adjacency {
    /// Flatten a network's neighbor sets.
    #[must_use]
    pub fn from_network<N: NodeLabel>(network: &Network<N>) -> Self {
        let order = network.order();
        let node_count = order.len();

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::new();
        offsets.push(0);
        for &key in order {
            targets.extend(
                network
                    .record(key)
                    .neighbors
                    .iter()
                    .filter_map(|&k| network.rank_of_key(k)),
            );
            offsets.push(targets.len());
        }

        Self {
            node_count,
            offsets,
            targets,
        }
    }

    /// Number of nodes in the snapshot.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Iterate over the neighbors of node `idx`.
    #[inline]
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let start = self.offsets[idx];
        let end = self.offsets[idx + 1];
        self.targets[start..end].iter().copied()
    }

    #[inline]
    #[must_use]
    pub fn degree(&self, idx: usize) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    /// Sum of the degrees of all nodes.
    #[must_use]
    pub fn degree_sum(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn contains_edge(&self, from: usize, to: usize) -> bool {
        self.neighbors(from).any(|n| n == to)
    }

    /// Sum of neighbor states: `Σ s[n]`.
    #[inline]
    #[must_use]
    pub fn neighbor_sum(&self, idx: usize, states: &[i8]) -> i64 {
        self.neighbors(idx).map(|n| i64::from(states[n])).sum()
    }

    /// Sum of neighbor complements: `Σ (1 - s[n])`.
    #[inline]
    #[must_use]
    pub fn neighbor_unsum(&self, idx: usize, states: &[i8]) -> i64 {
        self.neighbors(idx).map(|n| 1 - i64::from(states[n])).sum()
    }

    /// Each link once as `(a, b)`, sorted by `a` then by `b`'s position in
    /// `a`'s neighbor list.
    ///
    /// An undirected link is reported from its lower-ranked end. A directed
    /// link with no reverse partner is reported as written. Self-links are
    /// skipped.
    #[must_use]
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::with_capacity(self.targets.len() / 2);
        for a in 0..self.node_count {
            for b in self.neighbors(a) {
                if b > a || (b < a && !self.contains_edge(b, a)) {
                    edges.push((a, b));
                }
            }
        }
        edges
    }

    /// Hop distance from `source` to every node, `None` where unreachable.
    #[must_use]
    pub fn distances_from(&self, source: usize) -> Vec<Option<usize>> {
        let mut distances = vec![None; self.node_count];
        let mut queue = VecDeque::new();
        distances[source] = Some(0);
        queue.push_back(source);

        while let Some(current) = queue.pop_front() {
            let next = distances[current].map_or(0, |d| d + 1);
            for n in self.neighbors(current) {
                if distances[n].is_none() {
                    distances[n] = Some(next);
                    queue.push_back(n);
                }
            }
        }

        distances
    }
}

//! Cayley tree generation.
//!
//! A Cayley tree with `G` generations and branching factor `L` has a root with
//! `L` children; every later non-leaf node has `L - 1` children, so interior
//! nodes all have degree `L`. Generation sizes are closed-form:
//!
//! ```text
//! size(0) = 1
//! size(g) = L * (L - 1)^(g - 1)     for g >= 1
//! ```
//!
//! Nodes are numbered by rank, generation by generation, so a generation is
//! always a contiguous rank range and no per-node parent table is needed.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NetworkError;
use crate::network::{validate_names, Network, NetworkKind};
use crate::node::NodeLabel;

/// Feature name holding each tree node's generation.
pub const GENERATION: &str = "generation";

/// Generation count and branching factor of a Cayley tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CayleyShape {
    generations: usize,
    links: usize,
    node_count: usize,
}

impl CayleyShape {
    /// Validate a tree shape.
    ///
    /// `links == 1` follows the `0^0 = 1` convention: the root gets one child
    /// and growth stops there.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidCayleyTree`] when `links == 0` with at
    /// least one generation, or when the node count overflows `usize`.
    pub fn new(generations: usize, links: usize) -> Result<Self, NetworkError> {
        let invalid = NetworkError::InvalidCayleyTree { generations, links };
        if links == 0 && generations > 0 {
            return Err(invalid);
        }
        let mut node_count: usize = 1;
        for g in 1..=generations {
            let size = generation_size(links, g).ok_or(invalid.clone())?;
            node_count = node_count.checked_add(size).ok_or(invalid.clone())?;
        }
        Ok(Self {
            generations,
            links,
            node_count,
        })
    }

    #[must_use]
    pub fn generations(&self) -> usize {
        self.generations
    }

    #[must_use]
    pub fn links(&self) -> usize {
        self.links
    }

    /// Total number of nodes over all generations.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of nodes in generation `gen`; zero past the last generation.
    #[must_use]
    pub fn generation_size(&self, gen: usize) -> usize {
        if gen > self.generations {
            return 0;
        }
        // Shape validation already proved every size fits.
        generation_size(self.links, gen).unwrap_or(0)
    }

    /// Node count of every generation, root first.
    #[must_use]
    pub fn generation_sizes(&self) -> Vec<usize> {
        (0..=self.generations)
            .map(|g| self.generation_size(g))
            .collect()
    }

    /// Generation containing `rank`, found by subtracting generation sizes
    /// until the remainder goes negative.
    #[must_use]
    pub fn gen_finder(&self, rank: usize) -> Option<usize> {
        let mut remaining = rank;
        for gen in 0..=self.generations {
            let size = self.generation_size(gen);
            if remaining < size {
                return Some(gen);
            }
            remaining -= size;
        }
        None
    }

    /// Contiguous rank range of generation `gen`.
    #[must_use]
    pub fn nodes_per_gen(&self, gen: usize) -> Option<Range<usize>> {
        if gen > self.generations {
            return None;
        }
        let start: usize = (0..gen).map(|g| self.generation_size(g)).sum();
        Some(start..start + self.generation_size(gen))
    }
}

/// `L * (L - 1)^(g - 1)`, with `size(0) = 1`. `None` on overflow.
fn generation_size(links: usize, gen: usize) -> Option<usize> {
    if gen == 0 {
        return Some(1);
    }
    let exp = u32::try_from(gen - 1).ok()?;
    links.saturating_sub(1).checked_pow(exp)?.checked_mul(links)
}

/// Number of nodes in a Cayley tree, `None` if the shape is invalid.
#[must_use]
pub fn node_count(generations: usize, links: usize) -> Option<usize> {
    CayleyShape::new(generations, links)
        .ok()
        .map(|shape| shape.node_count())
}

/// Builds Cayley tree networks.
#[derive(Debug, Clone, Copy)]
pub struct CayleyTreeBuilder {
    shape: CayleyShape,
}

impl CayleyTreeBuilder {
    /// # Errors
    ///
    /// See [`CayleyShape::new`].
    pub fn new(generations: usize, links: usize) -> Result<Self, NetworkError> {
        Ok(Self {
            shape: CayleyShape::new(generations, links)?,
        })
    }

    #[must_use]
    pub fn shape(&self) -> CayleyShape {
        self.shape
    }

    /// Build a tree whose nodes are their ranks `0..node_count`.
    #[must_use]
    pub fn build(&self) -> Network<usize> {
        self.populate((0..self.shape.node_count()).collect())
    }

    /// Build a tree whose nodes carry external names, assigned in rank order.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NameCountMismatch`] unless exactly one name is
    /// given per node, and [`NetworkError::DuplicateNodeName`] if a name repeats.
    pub fn build_named<N: NodeLabel>(&self, names: Vec<N>) -> Result<Network<N>, NetworkError> {
        validate_names(&names, self.shape.node_count())?;
        Ok(self.populate(names))
    }

    fn populate<N: NodeLabel>(&self, names: Vec<N>) -> Network<N> {
        let shape = self.shape;
        let mut network = Network::new();

        // All nodes first, in rank order, so that edges can refer to any rank.
        for gen in 0..=shape.generations() {
            if let Some(range) = shape.nodes_per_gen(gen) {
                for rank in range {
                    network.add_node_with(names[rank].clone(), [(GENERATION, gen)]);
                }
            }
        }

        let total = names.len();
        let first_gen = shape.generation_size(1).min(total.saturating_sub(1));
        for child in 1..=first_gen {
            connect(&mut network, &names, 0, child);
        }

        // Each interior node takes the next contiguous block of L - 1 ranks.
        let per_node = shape.links().saturating_sub(1);
        let mut next_child = 1 + first_gen;
        for parent in 1..total {
            if next_child >= total || per_node == 0 {
                break;
            }
            let end = (next_child + per_node).min(total);
            for child in next_child..end {
                connect(&mut network, &names, parent, child);
            }
            next_child = end;
        }

        network.set_kind(NetworkKind::CayleyTree(shape));
        debug!(
            generations = shape.generations(),
            links = shape.links(),
            nodes = network.len(),
            "built Cayley tree"
        );
        network
    }
}

fn connect<N: NodeLabel>(network: &mut Network<N>, names: &[N], a: usize, b: usize) {
    // Both ranks were inserted above, so the link cannot miss.
    let _ = network.add_edge(&names[a], &names[b]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Adjacency;

    #[test]
    fn test_generation_sizes() {
        let shape = CayleyShape::new(3, 3).unwrap();
        assert_eq!(shape.generation_sizes(), vec![1, 3, 6, 12]);
        assert_eq!(shape.node_count(), 22);
        assert_eq!(node_count(2, 3), Some(10));
    }

    #[test]
    fn test_single_link_tree() {
        let shape = CayleyShape::new(3, 1).unwrap();
        assert_eq!(shape.generation_sizes(), vec![1, 1, 0, 0]);
        let net = CayleyTreeBuilder::new(3, 1).unwrap().build();
        assert_eq!(net.len(), 2);
        assert_eq!(net.degree(&0).unwrap(), 1);
    }

    #[test]
    fn test_invalid_shapes() {
        assert_eq!(
            CayleyShape::new(2, 0),
            Err(NetworkError::InvalidCayleyTree {
                generations: 2,
                links: 0
            })
        );
        assert!(CayleyShape::new(0, 0).is_ok());
        assert!(CayleyShape::new(200, 5).is_err());
    }

    #[test]
    fn test_gen_finder_and_ranges() {
        let shape = CayleyShape::new(2, 3).unwrap();
        assert_eq!(shape.nodes_per_gen(0), Some(0..1));
        assert_eq!(shape.nodes_per_gen(1), Some(1..4));
        assert_eq!(shape.nodes_per_gen(2), Some(4..10));
        assert_eq!(shape.nodes_per_gen(3), None);
        assert_eq!(shape.gen_finder(0), Some(0));
        assert_eq!(shape.gen_finder(3), Some(1));
        assert_eq!(shape.gen_finder(4), Some(2));
        assert_eq!(shape.gen_finder(9), Some(2));
        assert_eq!(shape.gen_finder(10), None);
    }

    #[test]
    fn test_root_only_tree() {
        let net = CayleyTreeBuilder::new(0, 4).unwrap().build();
        assert_eq!(net.len(), 1);
        assert_eq!(net.degree(&0).unwrap(), 0);
        assert!(net.edge_list().is_empty());
    }

    #[test]
    fn test_tree_structure() {
        let net = CayleyTreeBuilder::new(2, 3).unwrap().build();
        assert_eq!(net.len(), 10);
        assert_eq!(net.neighbors(&0).unwrap().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(net.neighbors(&1).unwrap().copied().collect::<Vec<_>>(), vec![0, 4, 5]);
        assert_eq!(net.neighbors(&3).unwrap().copied().collect::<Vec<_>>(), vec![0, 8, 9]);
        for leaf in 4..10 {
            assert_eq!(net.degree(&leaf).unwrap(), 1);
        }
        assert_eq!(net.edge_list().len(), 9);
    }

    #[test]
    fn test_generation_feature_matches_distance() {
        let net = CayleyTreeBuilder::new(4, 3).unwrap().build();
        let shape = net.cayley_shape().unwrap();
        let distances = Adjacency::from_network(&net).distances_from(0);
        for (rank, distance) in distances.iter().enumerate() {
            assert_eq!(*distance, shape.gen_finder(rank));
            let gen = net.feature(&rank, GENERATION).and_then(|f| f.as_int());
            assert_eq!(gen, distance.map(|d| d as i64));
        }
    }

    #[test]
    fn test_named_tree() {
        let builder = CayleyTreeBuilder::new(1, 2).unwrap();
        let net = builder
            .build_named(vec!["root".to_string(), "l".into(), "r".into()])
            .unwrap();
        assert_eq!(net.degree(&"root".to_string()).unwrap(), 2);
        assert!(builder.build_named(vec!["x"]).is_err());
    }

    #[test]
    fn test_named_tree_rejects_repeated_names() {
        let builder = CayleyTreeBuilder::new(1, 2).unwrap();
        let err = builder.build_named(vec!["x", "x", "y"]).unwrap_err();
        assert_eq!(err, NetworkError::DuplicateNodeName("\"x\"".to_string()));
    }
}

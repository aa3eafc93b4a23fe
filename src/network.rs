//! Arena-backed network of nodes, features and links.
//!
//! [`Network`] is the one topology type every builder produces and every
//! simulation consumes. Nodes are stored in a `SlotMap` arena, iteration order
//! is insertion order, and each node carries a feature map plus an ordered
//! neighbor set.
//!
//! ## Iteration and modification
//!
//! [`Network::nodes`] borrows the network, so the borrow checker already rules
//! out mutation mid-walk. [`NodeCursor`] walks without holding a borrow and
//! instead compares the network's revision counter on every step, failing with
//! [`NetworkError::ConcurrentModification`] once a node is added or removed.

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;
use slotmap::{SecondaryMap, SlotMap};

use crate::cayley::CayleyShape;
use crate::error::NetworkError;
use crate::lattice::LatticeShape;
use crate::node::{FeatureValue, NodeKey, NodeLabel, NodeRecord};
use crate::topology::Adjacency;

/// Which generator produced a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    /// Hand-built graph with no implicit topology.
    Graph,
    CayleyTree(CayleyShape),
    Lattice(LatticeShape),
}

/// A network of labelled nodes with named per-node features.
#[derive(Debug, Clone)]
pub struct Network<N: NodeLabel = usize> {
    /// Arena storage for node records.
    nodes: SlotMap<NodeKey, NodeRecord<N>>,
    /// Keys in insertion order; this is the rank order used by simulations.
    order: Vec<NodeKey>,
    /// Position of each key in `order`.
    ranks: SecondaryMap<NodeKey, usize>,
    /// Label lookup.
    index: HashMap<N, NodeKey>,
    kind: NetworkKind,
    /// Bumped on every change to the node set.
    revision: u64,
}

impl<N: NodeLabel> Default for Network<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NodeLabel> Network<N> {
    /// Create an empty hand-built graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            order: Vec::new(),
            ranks: SecondaryMap::new(),
            index: HashMap::new(),
            kind: NetworkKind::Graph,
            revision: 0,
        }
    }

    /// Tag a freshly generated network with the shape that produced it.
    pub(crate) fn set_kind(&mut self, kind: NetworkKind) {
        self.kind = kind;
    }

    /// Record a change to the node set. A generated tree or lattice no longer
    /// matches its shape afterwards, so it becomes a plain graph.
    fn node_set_changed(&mut self) {
        self.revision += 1;
        self.kind = NetworkKind::Graph;
    }

    /// Generator of this network. Adding or removing a node afterwards turns
    /// a tree or lattice into [`NetworkKind::Graph`].
    #[must_use]
    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    /// Tree shape, if this network is a Cayley tree.
    #[must_use]
    pub fn cayley_shape(&self) -> Option<CayleyShape> {
        match self.kind {
            NetworkKind::CayleyTree(shape) => Some(shape),
            _ => None,
        }
    }

    /// Lattice shape, if this network is a lattice.
    #[must_use]
    pub fn lattice_shape(&self) -> Option<LatticeShape> {
        match self.kind {
            NetworkKind::Lattice(shape) => Some(shape),
            _ => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn contains(&self, node: &N) -> bool {
        self.index.contains_key(node)
    }

    /// Revision counter, advanced whenever a node is added or removed.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Node labels in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.order.iter().map(move |&key| &self.nodes[key].label)
    }

    /// Label of the node at `rank` in insertion order.
    #[must_use]
    pub fn node_at(&self, rank: usize) -> Option<&N> {
        self.order.get(rank).map(|&key| &self.nodes[key].label)
    }

    /// Rank of `node` in insertion order.
    #[must_use]
    pub fn position(&self, node: &N) -> Option<usize> {
        let key = self.index.get(node)?;
        self.ranks.get(*key).copied()
    }

    /// Start a detached walk over the nodes.
    #[must_use]
    pub fn cursor(&self) -> NodeCursor {
        NodeCursor {
            expected: self.revision,
            position: 0,
        }
    }

    /// Add a node with no features, or leave an existing node untouched.
    pub fn add_node(&mut self, node: N) {
        self.add_node_with(node, std::iter::empty::<(String, FeatureValue)>());
    }

    /// Add a node with features.
    ///
    /// An existing node keeps its neighbors; the given features overwrite or
    /// extend its feature map.
    pub fn add_node_with<I, K, V>(&mut self, node: N, features: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FeatureValue>,
    {
        let key = match self.index.get(&node) {
            Some(&key) => key,
            None => {
                let key = self.nodes.insert(NodeRecord::new(node.clone()));
                self.index.insert(node, key);
                self.ranks.insert(key, self.order.len());
                self.order.push(key);
                self.node_set_changed();
                key
            }
        };
        let record = &mut self.nodes[key];
        for (name, value) in features {
            record.features.insert(name.into(), value.into());
        }
    }

    /// Add every node in `nodes` with the same feature values.
    pub fn add_multiple_nodes<I>(&mut self, nodes: I, features: &[(&str, FeatureValue)])
    where
        I: IntoIterator<Item = N>,
    {
        for node in nodes {
            self.add_node_with(node, features.iter().map(|(k, v)| (*k, v.clone())));
        }
    }

    /// Remove a node and every link pointing at it.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownNode`] if `node` is absent.
    pub fn remove_node(&mut self, node: &N) -> Result<(), NetworkError> {
        let key = self.key_of(node)?;
        for record in self.nodes.values_mut() {
            record.neighbors.remove(&key);
        }
        self.nodes.remove(key);
        self.index.remove(node);
        if let Some(rank) = self.ranks.remove(key) {
            self.order.remove(rank);
            for (shifted, &k) in self.order.iter().enumerate().skip(rank) {
                self.ranks.insert(k, shifted);
            }
        }
        self.node_set_changed();
        Ok(())
    }

    /// Drop all nodes, links and features.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.ranks.clear();
        self.index.clear();
        self.node_set_changed();
    }

    /// Link two nodes in both directions. Linking twice has no further effect.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownNode`] if either end is absent; the
    /// network is left unchanged.
    pub fn add_edge(&mut self, a: &N, b: &N) -> Result<(), NetworkError> {
        let ka = self.key_of(a)?;
        let kb = self.key_of(b)?;
        self.nodes[ka].neighbors.insert(kb);
        self.nodes[kb].neighbors.insert(ka);
        Ok(())
    }

    /// Link `a` to `b` only: `b` becomes a neighbor of `a`, not the reverse.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownNode`] if either end is absent.
    pub fn add_directed_edge(&mut self, a: &N, b: &N) -> Result<(), NetworkError> {
        let ka = self.key_of(a)?;
        let kb = self.key_of(b)?;
        self.nodes[ka].neighbors.insert(kb);
        Ok(())
    }

    /// Link `node` to each of `others` with undirected edges.
    ///
    /// # Errors
    ///
    /// Stops at the first absent node; edges added before it are kept.
    pub fn add_multiple_edges<'b, I>(&mut self, node: &N, others: I) -> Result<(), NetworkError>
    where
        I: IntoIterator<Item = &'b N>,
        N: 'b,
    {
        for other in others {
            self.add_edge(node, other)?;
        }
        Ok(())
    }

    /// Connect every pair of distinct nodes. O(n²).
    pub fn complete_graph(&mut self) {
        for (i, &a) in self.order.iter().enumerate() {
            for &b in &self.order[i + 1..] {
                self.nodes[a].neighbors.insert(b);
                self.nodes[b].neighbors.insert(a);
            }
        }
    }

    /// Neighbors of `node`, ordered by arena key.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownNode`] if `node` is absent.
    pub fn neighbors(&self, node: &N) -> Result<impl Iterator<Item = &N> + '_, NetworkError> {
        let key = self.key_of(node)?;
        Ok(self.nodes[key]
            .neighbors
            .iter()
            .map(move |&k| &self.nodes[k].label))
    }

    /// Number of neighbors of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownNode`] if `node` is absent.
    pub fn degree(&self, node: &N) -> Result<usize, NetworkError> {
        let key = self.key_of(node)?;
        Ok(self.nodes[key].neighbors.len())
    }

    /// All features of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownNode`] if `node` is absent.
    pub fn features(&self, node: &N) -> Result<&BTreeMap<String, FeatureValue>, NetworkError> {
        let key = self.key_of(node)?;
        Ok(&self.nodes[key].features)
    }

    /// One feature of one node; `None` if the node is absent or lacks it.
    #[must_use]
    pub fn feature(&self, node: &N, name: &str) -> Option<&FeatureValue> {
        let key = self.index.get(node)?;
        self.nodes[*key].features.get(name)
    }

    /// Map of node to value for every node that has feature `name`, in node
    /// order.
    ///
    /// Nodes without the feature are left out, so the map may be partial.
    #[must_use]
    pub fn get_feature(&self, name: &str) -> IndexMap<&N, &FeatureValue> {
        self.order
            .iter()
            .filter_map(|&key| {
                let record = &self.nodes[key];
                record.features.get(name).map(|v| (&record.label, v))
            })
            .collect()
    }

    /// Assign feature `name` from a node-keyed mapping.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownNode`] if any key is absent; in that case
    /// nothing is written.
    pub fn set_feature<I, V>(&mut self, name: &str, data: I) -> Result<(), NetworkError>
    where
        I: IntoIterator<Item = (N, V)>,
        V: Into<FeatureValue>,
    {
        let resolved = data
            .into_iter()
            .map(|(node, value)| Ok((self.key_of(&node)?, value.into())))
            .collect::<Result<Vec<_>, NetworkError>>()?;
        for (key, value) in resolved {
            self.nodes[key].features.insert(name.to_owned(), value);
        }
        Ok(())
    }

    /// Every link reported once as a pair, in rank order.
    #[must_use]
    pub fn edge_list(&self) -> Vec<(&N, &N)> {
        let adjacency = Adjacency::from_network(self);
        adjacency
            .edges()
            .into_iter()
            .map(|(a, b)| {
                (
                    &self.nodes[self.order[a]].label,
                    &self.nodes[self.order[b]].label,
                )
            })
            .collect()
    }

    /// Dense 0/1 adjacency matrix in rank order; a link in either direction
    /// marks both cells.
    #[must_use]
    pub fn adjacency_matrix(&self) -> Vec<Vec<u8>> {
        let adjacency = Adjacency::from_network(self);
        let n = adjacency.node_count();
        let mut matrix = vec![vec![0u8; n]; n];
        for i in 0..n {
            for j in adjacency.neighbors(i) {
                matrix[i][j] = 1;
                matrix[j][i] = 1;
            }
        }
        matrix
    }

    pub(crate) fn key_of(&self, node: &N) -> Result<NodeKey, NetworkError> {
        self.index
            .get(node)
            .copied()
            .ok_or_else(|| NetworkError::UnknownNode(format!("{node:?}")))
    }

    pub(crate) fn order(&self) -> &[NodeKey] {
        &self.order
    }

    pub(crate) fn rank_of_key(&self, key: NodeKey) -> Option<usize> {
        self.ranks.get(key).copied()
    }

    pub(crate) fn record(&self, key: NodeKey) -> &NodeRecord<N> {
        &self.nodes[key]
    }
}

/// Check externally supplied names for a generated network: one per node,
/// no repeats.
pub(crate) fn validate_names<N: NodeLabel>(
    names: &[N],
    expected: usize,
) -> Result<(), NetworkError> {
    if names.len() != expected {
        return Err(NetworkError::NameCountMismatch {
            expected,
            found: names.len(),
        });
    }
    let mut seen = HashSet::with_capacity(names.len());
    match names.iter().find(|name| !seen.insert(*name)) {
        Some(duplicate) => Err(NetworkError::DuplicateNodeName(format!("{duplicate:?}"))),
        None => Ok(()),
    }
}

/// A detached walk over a network's nodes that fails fast if the node set
/// changes underneath it.
#[derive(Debug, Clone, Copy)]
pub struct NodeCursor {
    expected: u64,
    position: usize,
}

impl NodeCursor {
    /// Next node in rank order, `Ok(None)` once exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::ConcurrentModification`] if a node was added or
    /// removed since the cursor was created.
    pub fn next<'a, N: NodeLabel>(
        &mut self,
        network: &'a Network<N>,
    ) -> Result<Option<&'a N>, NetworkError> {
        if network.revision() != self.expected {
            return Err(NetworkError::ConcurrentModification {
                expected: self.expected,
                found: network.revision(),
            });
        }
        let node = network.node_at(self.position);
        if node.is_some() {
            self.position += 1;
        }
        Ok(node)
    }
}

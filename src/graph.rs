//! Hand-built graphs and the senate network.
//!
//! [`GraphBuilder`] has no implicit topology: the caller lists nodes and links
//! and the builder validates them all before producing a [`Network`], so a
//! bad link never leaves a half-built graph behind. [`Senate`] is a
//! fully-connected graph of named members with an ideology score each.

use tracing::debug;

use crate::error::NetworkError;
use crate::montecarlo::{VOTE_BETA, VOTE_PHI};
use crate::network::Network;
use crate::node::{FeatureValue, NodeLabel};

/// Feature name holding each senate member's ideology score.
pub const IDEOLOGY: &str = "ideology";

#[derive(Debug, Clone)]
enum Link<N> {
    Undirected(N, N),
    Directed(N, N),
}

/// Collects nodes and links for an arbitrary graph.
#[derive(Debug, Clone)]
pub struct GraphBuilder<N: NodeLabel = usize> {
    nodes: Vec<(N, Vec<(String, FeatureValue)>)>,
    links: Vec<Link<N>>,
    complete: bool,
}

impl<N: NodeLabel> Default for GraphBuilder<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            complete: false,
        }
    }
}

impl<N: NodeLabel> GraphBuilder<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn node(mut self, node: N) -> Self {
        self.nodes.push((node, Vec::new()));
        self
    }

    #[must_use]
    pub fn node_with<I, K, V>(mut self, node: N, features: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FeatureValue>,
    {
        let features = features
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.nodes.push((node, features));
        self
    }

    #[must_use]
    pub fn nodes<I: IntoIterator<Item = N>>(mut self, nodes: I) -> Self {
        self.nodes
            .extend(nodes.into_iter().map(|n| (n, Vec::new())));
        self
    }

    #[must_use]
    pub fn edge(mut self, a: N, b: N) -> Self {
        self.links.push(Link::Undirected(a, b));
        self
    }

    #[must_use]
    pub fn directed_edge(mut self, from: N, to: N) -> Self {
        self.links.push(Link::Directed(from, to));
        self
    }

    /// Link every pair of nodes once all nodes are in.
    #[must_use]
    pub fn complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownNode`] if a link names a node that was
    /// never added.
    pub fn build(self) -> Result<Network<N>, NetworkError> {
        let mut network = Network::new();
        for (node, features) in self.nodes {
            network.add_node_with(node, features);
        }
        for link in &self.links {
            match link {
                Link::Undirected(a, b) => network.add_edge(a, b)?,
                Link::Directed(a, b) => network.add_directed_edge(a, b)?,
            }
        }
        if self.complete {
            network.complete_graph();
        }
        debug!(
            nodes = network.len(),
            links = self.links.len(),
            complete = self.complete,
            "built graph"
        );
        Ok(network)
    }
}

/// A fully-connected network of members, each with an ideology score.
#[derive(Debug, Clone)]
pub struct Senate {
    network: Network<String>,
    center: f64,
}

impl Senate {
    /// Build from `(name, ideology)` rows. The median ideology becomes the
    /// senate's center; with an even count it is the mean of the middle two.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::EmptySenate`] when no members are given.
    pub fn build<I, S>(members: I) -> Result<Self, NetworkError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut network = Network::new();
        for (name, ideology) in members {
            network.add_node_with(name.into(), [(IDEOLOGY, ideology)]);
        }
        if network.is_empty() {
            return Err(NetworkError::EmptySenate);
        }
        network.complete_graph();

        let mut scores: Vec<f64> = network
            .get_feature(IDEOLOGY)
            .values()
            .filter_map(|v| v.as_f64())
            .collect();
        scores.sort_by(f64::total_cmp);
        let mid = scores.len() / 2;
        let center = if scores.len() % 2 == 0 {
            (scores[mid - 1] + scores[mid]) / 2.0
        } else {
            scores[mid]
        };

        debug!(members = network.len(), center, "built senate");
        Ok(Self { network, center })
    }

    /// Median ideology of the members.
    #[must_use]
    pub fn center(&self) -> f64 {
        self.center
    }

    #[must_use]
    pub fn network(&self) -> &Network<String> {
        &self.network
    }

    /// Give every member the `beta` and `phi` features the vote rule reads.
    pub fn assign_vote_rates(&mut self, beta: f64, phi: f64) {
        let members: Vec<String> = self.network.nodes().cloned().collect();
        for member in members {
            self.network
                .add_node_with(member, [(VOTE_BETA, beta), (VOTE_PHI, phi)]);
        }
    }

    /// Override the vote-rule rates of one member.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownNode`] if `member` is not seated.
    pub fn set_member_rates(&mut self, member: &str, beta: f64, phi: f64) -> Result<(), NetworkError> {
        let name = member.to_owned();
        self.network.set_feature(VOTE_BETA, [(name.clone(), beta)])?;
        self.network.set_feature(VOTE_PHI, [(name, phi)])
    }

    #[must_use]
    pub fn into_network(self) -> Network<String> {
        self.network
    }
}

//! Error types for network construction and Monte Carlo runs.

use thiserror::Error;

/// Errors raised while building or querying a [`Network`](crate::Network).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// A node referenced by an edge, lookup or bulk feature write is absent.
    #[error("node not in network: {0}")]
    UnknownNode(String),

    /// The node set changed while a [`NodeCursor`](crate::NodeCursor) was walking it.
    #[error("network modified during iteration (revision {expected} -> {found})")]
    ConcurrentModification { expected: u64, found: u64 },

    /// Lattice dimensions must all be positive.
    #[error("lattice cannot exist with dimensions {x}x{y}x{z}")]
    InvalidLattice { x: usize, y: usize, z: usize },

    /// The generation/branching combination cannot form a regular tree.
    #[error("no regular Cayley tree with {generations} generations and {links} links")]
    InvalidCayleyTree { generations: usize, links: usize },

    /// Externally supplied names do not match the number of generated nodes.
    #[error("expected {expected} node names, got {found}")]
    NameCountMismatch { expected: usize, found: usize },

    /// Two generated nodes were given the same external name.
    #[error("node name used more than once: {0}")]
    DuplicateNodeName(String),

    /// A senate needs at least one member to have a median ideology.
    #[error("senate has no members")]
    EmptySenate,
}

/// Errors raised by [`MonteCarlo`](crate::MonteCarlo) operations.
///
/// A failed call never appends to or alters the snapshot history.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// An initial-state operation was called on a run that already has history.
    #[error("must reset the run before setting an initial state")]
    AlreadyStarted,

    /// A simulate or analysis call needs an initial state first.
    #[error("must set up an initial state before simulating")]
    NotStarted,

    /// The operation only makes sense on a Cayley tree.
    #[error("operation requires a Cayley tree network")]
    NotACayleyTree,

    /// A per-node feature the rule depends on is absent or not numeric.
    #[error("node {node} has no numeric '{feature}' feature")]
    MissingFeature { feature: String, node: String },

    /// Degree-normalised rules cannot run on isolated nodes.
    #[error("node {node} has no neighbors")]
    ZeroDegree { node: String },

    /// The requested timestep has not been simulated.
    #[error("timestep {timestep} out of range (history has {len} snapshots)")]
    TimestepOutOfRange { timestep: usize, len: usize },

    /// A node named by an analysis query is not part of the network.
    #[error("node not in network: {0}")]
    UnknownNode(String),

    /// The previous snapshot holds a state outside the rule's domain, such as
    /// a spin fed to an occupancy rule.
    #[error("{rule} rule cannot read state {state} at node {node}")]
    StateOutOfDomain { rule: String, node: String, state: i8 },

    /// A parameter produced an undefined transition probability.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

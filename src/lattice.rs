//! Rectangular lattices in one, two or three dimensions.
//!
//! Rank `n` sits at `(n mod x, (n / x) mod y, n / (x * y))`: x varies fastest,
//! then y, then z. Each node links to its axis neighbors at `±1`, `±x` and
//! `±x*y` unless it sits on that axis's boundary. There is no wraparound
//! unless [`LatticeBuilder::looped`] asks for the single rank-0-to-last link.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NetworkError;
use crate::network::{validate_names, Network, NetworkKind};
use crate::node::NodeLabel;

/// Feature name holding each lattice node's `(x, y, z)` coordinates.
pub const COORDS: &str = "coords";

/// Dimensions of a lattice. Equal shapes mean equal lattices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LatticeShape {
    x: usize,
    y: usize,
    z: usize,
}

impl LatticeShape {
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidLattice`] if any dimension is zero or the
    /// node count overflows.
    pub fn new(x: usize, y: usize, z: usize) -> Result<Self, NetworkError> {
        let invalid = NetworkError::InvalidLattice { x, y, z };
        if x == 0 || y == 0 || z == 0 {
            return Err(invalid);
        }
        x.checked_mul(y)
            .and_then(|area| area.checked_mul(z))
            .ok_or(invalid)?;
        Ok(Self { x, y, z })
    }

    #[must_use]
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.x, self.y, self.z)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.x * self.y * self.z
    }

    /// Nodes in one z-plane.
    #[must_use]
    pub fn floor_area(&self) -> usize {
        self.x * self.y
    }

    /// Coordinates of `rank`.
    #[must_use]
    pub fn coords(&self, rank: usize) -> [usize; 3] {
        [
            rank % self.x,
            (rank / self.x) % self.y,
            rank / self.floor_area(),
        ]
    }

    /// Rank at `(x, y, z)`, if inside the lattice.
    #[must_use]
    pub fn rank_of(&self, coords: [usize; 3]) -> Option<usize> {
        let [cx, cy, cz] = coords;
        (cx < self.x && cy < self.y && cz < self.z)
            .then(|| cx + cy * self.x + cz * self.floor_area())
    }

    /// Ranks of the axis neighbors of `rank` that lie inside the lattice.
    #[must_use]
    pub fn axis_neighbors(&self, rank: usize) -> Vec<usize> {
        let [cx, cy, cz] = self.coords(rank);
        let mut out = Vec::with_capacity(6);
        if cx + 1 < self.x {
            out.push(rank + 1);
        }
        if cx > 0 {
            out.push(rank - 1);
        }
        if cy + 1 < self.y {
            out.push(rank + self.x);
        }
        if cy > 0 {
            out.push(rank - self.x);
        }
        if cz + 1 < self.z {
            out.push(rank + self.floor_area());
        }
        if cz > 0 {
            out.push(rank - self.floor_area());
        }
        out
    }
}

/// Builds lattice networks.
#[derive(Debug, Clone, Copy)]
pub struct LatticeBuilder {
    shape: LatticeShape,
    looped: bool,
}

impl LatticeBuilder {
    /// A lattice of `x * y * z` nodes; use `z = 1` for two dimensions.
    ///
    /// # Errors
    ///
    /// See [`LatticeShape::new`].
    pub fn new(x: usize, y: usize, z: usize) -> Result<Self, NetworkError> {
        Ok(Self {
            shape: LatticeShape::new(x, y, z)?,
            looped: false,
        })
    }

    /// Add one extra link between rank 0 and the last rank.
    #[must_use]
    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    #[must_use]
    pub fn shape(&self) -> LatticeShape {
        self.shape
    }

    /// Build a lattice whose nodes are their ranks.
    #[must_use]
    pub fn build(&self) -> Network<usize> {
        self.populate((0..self.shape.node_count()).collect())
    }

    /// Build a lattice whose nodes carry external names in rank order.
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
        for (rank, name) in names.iter().enumerate() {
            network.add_node_with(name.clone(), [(COORDS, shape.coords(rank))]);
        }

        for (rank, name) in names.iter().enumerate() {
            for other in shape.axis_neighbors(rank) {
                // Linking from both ends is harmless: neighbor sets dedupe.
                let _ = network.add_edge(name, &names[other]);
            }
        }

        let last = names.len() - 1;
        if self.looped && last > 0 {
            let _ = network.add_edge(&names[0], &names[last]);
        }

        network.set_kind(NetworkKind::Lattice(shape));
        debug!(
            x = shape.x,
            y = shape.y,
            z = shape.z,
            looped = self.looped,
            nodes = network.len(),
            "built lattice"
        );
        network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_dimensions() {
        assert_eq!(
            LatticeBuilder::new(3, 0, 1).unwrap_err(),
            NetworkError::InvalidLattice { x: 3, y: 0, z: 1 }
        );
        assert!(LatticeShape::new(0, 1, 1).is_err());
        assert!(LatticeShape::new(1, 1, 0).is_err());
    }

    #[test]
    fn test_coordinates_roundtrip() {
        let shape = LatticeShape::new(3, 4, 2).unwrap();
        assert_eq!(shape.coords(0), [0, 0, 0]);
        assert_eq!(shape.coords(5), [2, 1, 0]);
        assert_eq!(shape.coords(13), [1, 0, 1]);
        for rank in 0..shape.node_count() {
            assert_eq!(shape.rank_of(shape.coords(rank)), Some(rank));
        }
        assert_eq!(shape.rank_of([3, 0, 0]), None);
    }

    #[test]
    fn test_square_is_a_cycle() {
        let net = LatticeBuilder::new(2, 2, 1).unwrap().build();
        assert_eq!(net.len(), 4);
        let neighbors = |n: usize| net.neighbors(&n).unwrap().copied().collect::<Vec<_>>();
        assert_eq!(neighbors(0), vec![1, 2]);
        assert_eq!(neighbors(1), vec![0, 3]);
        assert_eq!(neighbors(2), vec![0, 3]);
        assert_eq!(neighbors(3), vec![1, 2]);
    }

    #[test]
    fn test_interior_degree_in_three_dimensions() {
        let net = LatticeBuilder::new(3, 3, 3).unwrap().build();
        let shape = net.lattice_shape().unwrap();
        let center = shape.rank_of([1, 1, 1]).unwrap();
        assert_eq!(net.degree(&center).unwrap(), 6);
        assert_eq!(net.degree(&0).unwrap(), 3);
        assert_eq!(
            net.feature(&center, COORDS).and_then(|f| f.as_coords()),
            Some([1, 1, 1])
        );
    }

    #[test]
    fn test_chain_and_loop() {
        let chain = LatticeBuilder::new(5, 1, 1).unwrap().build();
        assert_eq!(chain.degree(&0).unwrap(), 1);
        assert_eq!(chain.edge_list().len(), 4);

        let ring = LatticeBuilder::new(5, 1, 1).unwrap().looped(true).build();
        assert_eq!(ring.degree(&0).unwrap(), 2);
        assert_eq!(ring.degree(&4).unwrap(), 2);
        assert_eq!(ring.edge_list().len(), 5);
    }

    #[test]
    fn test_single_node_lattice() {
        let net = LatticeBuilder::new(1, 1, 1).unwrap().looped(true).build();
        assert_eq!(net.len(), 1);
        assert_eq!(net.degree(&0).unwrap(), 0);
    }

    #[test]
    fn test_named_lattice() {
        let names: Vec<String> = ["nw", "ne", "sw", "se"].iter().map(|s| s.to_string()).collect();
        let net = LatticeBuilder::new(2, 2, 1).unwrap().build_named(names).unwrap();
        assert_eq!(net.degree(&"se".to_string()).unwrap(), 2);
        assert_eq!(net.position(&"sw".to_string()), Some(2));
    }

    #[test]
    fn test_named_lattice_rejects_repeated_names() {
        let builder = LatticeBuilder::new(3, 1, 1).unwrap();
        let err = builder.build_named(vec![7, 8, 7]).unwrap_err();
        assert!(matches!(err, NetworkError::DuplicateNodeName(_)));
        assert!(builder.build_named(vec![7, 8, 9]).is_ok());
    }
}

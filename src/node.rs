//! Node identifiers and per-node feature storage.
//!
//! Nodes live in a `SlotMap` arena inside [`Network`](crate::Network). Callers
//! address them by an external label (any [`NodeLabel`]), while the arena key
//! [`NodeKey`] stays internal and gives every node a stable, ordered handle.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Arena handle for a node within one network.
    pub struct NodeKey;
}

/// Anything that can name a node: integers by default, or strings such as
/// a senator's name.
pub trait NodeLabel: Clone + Eq + Hash + Ord + Debug {}

impl<T: Clone + Eq + Hash + Ord + Debug> NodeLabel for T {}

/// A single feature value stored on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Text(String),
    /// Lattice coordinates `(x, y, z)`.
    Coords([usize; 3]),
}

impl FeatureValue {
    /// Numeric view of the value, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) | Self::Coords(_) => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_coords(&self) -> Option<[usize; 3]> {
        match self {
            Self::Coords(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for FeatureValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<usize> for FeatureValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<[usize; 3]> for FeatureValue {
    fn from(v: [usize; 3]) -> Self {
        Self::Coords(v)
    }
}

/// Arena record for one node.
///
/// `neighbors` is an ordered set so that neighbor walks and edge lists come
/// out in the same order on every run.
#[derive(Debug, Clone)]
pub(crate) struct NodeRecord<N> {
    pub(crate) label: N,
    pub(crate) features: BTreeMap<String, FeatureValue>,
    pub(crate) neighbors: BTreeSet<NodeKey>,
}

impl<N> NodeRecord<N> {
    pub(crate) fn new(label: N) -> Self {
        Self {
            label,
            features: BTreeMap::new(),
            neighbors: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_conversions() {
        assert_eq!(FeatureValue::from(3_i32), FeatureValue::Int(3));
        assert_eq!(FeatureValue::from(2_usize).as_f64(), Some(2.0));
        assert_eq!(FeatureValue::from(0.25).as_f64(), Some(0.25));
        assert_eq!(FeatureValue::from("dem").as_f64(), None);
        assert_eq!(
            FeatureValue::from([1, 2, 0]).as_coords(),
            Some([1, 2, 0])
        );
        assert_eq!(FeatureValue::Float(1.0).as_int(), None);
    }

    #[test]
    fn test_node_record_starts_isolated() {
        let record = NodeRecord::new("a");
        assert!(record.neighbors.is_empty());
        assert!(record.features.is_empty());
    }
}

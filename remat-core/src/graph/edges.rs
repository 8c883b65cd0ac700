//! Edge Maps
//!
//! This module implements the labeled edge maps that carry the dependency
//! relation of the labeled graph level. Every node owns two of them, `deps`
//! and `users`, and the pair must stay mutual inverses: `B ∈ deps[A]` with
//! label set `S` exactly when `A ∈ users[B]` with the same `S`.
//!
//! # Labels
//!
//! An edge's label set records which named values flow between producer and
//! consumer. Merging always unions label sets rather than overwriting them,
//! because independent rewrite passes may establish the same structural
//! dependency through different named values.
//!
//! # Mutation forms
//!
//! Each operation comes in an in-place form and a pure, copy-returning form
//! (`merge_from`/`merged`, `add`/`added`, `discard`/`discarded`). Pipeline
//! stages that share graph snapshots use the pure forms; stages that own
//! their graph exclusively use the in-place forms.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::node::{label_set, NodeId};

/// The set of named values realizing a dependency edge.
pub type LabelSet = BTreeSet<String>;

/// A mapping from nodes to the label set of the edge reaching them.
///
/// Entries keep insertion order, so iterating a map built by the same
/// sequence of operations always yields the same sequence of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeMap {
    entries: IndexMap<NodeId, LabelSet>,
}

impl EdgeMap {
    /// Create an empty edge map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of edges in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the map has no edges.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if an edge to `node` exists.
    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    /// The label set of the edge to `node`, if present.
    pub fn get(&self, node: NodeId) -> Option<&LabelSet> {
        self.entries.get(&node)
    }

    /// Iterate over `(node, labels)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &LabelSet)> {
        self.entries.iter().map(|(id, labels)| (*id, labels))
    }

    /// Iterate over the target nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.keys().copied()
    }

    /// Union `labels` into the edge to `node`, creating the entry if absent.
    pub fn add<I, S>(&mut self, node: NodeId, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry(node)
            .or_default()
            .extend(labels.into_iter().map(Into::into));
    }

    /// Copy-returning form of [`add`](Self::add).
    pub fn added<I, S>(&self, node: NodeId, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = self.clone();
        map.add(node, labels);
        map
    }

    /// Remove the edge to `node` entirely, regardless of its label set.
    pub fn discard(&mut self, node: NodeId) {
        self.entries.shift_remove(&node);
    }

    /// Copy-returning form of [`discard`](Self::discard).
    pub fn discarded(&self, node: NodeId) -> Self {
        let mut map = self.clone();
        map.discard(node);
        map
    }

    /// Union every entry of `other` into this map, creating absent entries.
    ///
    /// Never removes entries; commutative in the resulting label sets.
    pub fn merge_from(&mut self, other: &EdgeMap) {
        for (node, labels) in other.iter() {
            self.add(node, labels.iter().cloned());
        }
    }

    /// Copy-returning form of [`merge_from`](Self::merge_from).
    pub fn merged(&self, other: &EdgeMap) -> Self {
        let mut map = self.clone();
        map.merge_from(other);
        map
    }

    /// True if every edge of this map exists in `other` with a label set
    /// that is a superset.
    pub fn is_subset_of(&self, other: &EdgeMap) -> bool {
        self.iter().all(|(node, labels)| {
            other
                .get(node)
                .is_some_and(|other_labels| labels.is_subset(other_labels))
        })
    }

    pub(crate) fn insert_set(&mut self, node: NodeId, labels: LabelSet) {
        self.entries.entry(node).or_default().extend(labels);
    }
}

impl<I, S> FromIterator<(NodeId, I)> for EdgeMap
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (NodeId, I)>>(iter: T) -> Self {
        let mut map = EdgeMap::new();
        for (node, labels) in iter {
            map.insert_set(node, label_set(labels));
        }
        map
    }
}

/// First point of divergence between two edge maps, under canonical
/// ordering (ordering key, then name).
///
/// Produced by [`DepGraph::compare_edge_maps`](super::store::DepGraph::compare_edge_maps).
/// Diagnostic only; algorithms never branch on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeMismatch {
    /// The maps hold different numbers of edges.
    EntryCount { left: usize, right: usize },
    /// The `index`-th entries point at different nodes.
    Key {
        index: usize,
        left: String,
        right: String,
    },
    /// The `index`-th entries agree on the node but not on the labels.
    Labels {
        index: usize,
        node: String,
        left: LabelSet,
        right: LabelSet,
    },
}

impl fmt::Display for EdgeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeMismatch::EntryCount { left, right } => {
                write!(f, "entry counts differ: {left} != {right}")
            }
            EdgeMismatch::Key { index, left, right } => {
                write!(f, "{index}-th entry keys differ: '{left}' != '{right}'")
            }
            EdgeMismatch::Labels {
                index,
                node,
                left,
                right,
            } => {
                write!(
                    f,
                    "{index}-th entry label sets differ at '{node}': {left:?} != {right:?}"
                )
            }
        }
    }
}

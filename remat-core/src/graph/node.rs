//! Graph Nodes
//!
//! This module defines node identity and the ordering keys derived from
//! node names.
//!
//! # Identity
//!
//! Nodes are identified by a [`NodeId`] drawn from a process-wide monotonic
//! counter. Two nodes are the same node only if their ids are equal; names
//! are labels, not identity. Because the counter is monotonic, comparing ids
//! also compares creation order, which the ordering algorithms use as a
//! deterministic tie-break.
//!
//! # Ordering keys
//!
//! Node names encode the creation index of the value they stand for. The
//! canonical shape is `__{index}` or `__{index}_{suffix}`; names produced by
//! the schedulable graph level decorate that shape with a `fwd_`/`bwd_`
//! prefix or a ` data`/` grad`/` phantoms` suffix. [`ordering_key`] strips
//! the decoration and parses the index. Names that do not parse yield `-1`,
//! which sorts last among ties.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::edges::EdgeMap;

/// Unique identifier for a node in a dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Extract the numeric ordering key encoded in a node name.
///
/// The index is the third `_`-separated field of the undecorated name, so
/// `__12` and `__12_fv` both yield `12`. Decorations added by the
/// schedulable level (`fwd_`/`bwd_` prefixes, ` data`/` grad`/` phantoms`
/// suffixes) are stripped first. Unparsable names yield `-1`.
pub fn ordering_key(name: &str) -> i64 {
    let target = if let Some(rest) = name
        .strip_prefix("fwd_")
        .or_else(|| name.strip_prefix("bwd_"))
    {
        rest
    } else if let Some(rest) = name
        .strip_suffix("data")
        .or_else(|| name.strip_suffix("grad"))
        .or_else(|| name.strip_suffix("phantoms"))
    {
        rest
    } else {
        name
    };

    target
        .split('_')
        .nth(2)
        .and_then(|index| index.trim().parse().ok())
        .unwrap_or(-1)
}

/// A node of the labeled dependency graph.
///
/// The name and its cached ordering key are fixed at creation; only the two
/// edge maps mutate afterwards. `deps` holds the nodes this node requires,
/// `users` the inverse relation, and the two must stay mutual inverses (see
/// [`DepGraph::verify_bidirectional`](super::store::DepGraph::verify_bidirectional)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    name: String,
    key: i64,
    deps: EdgeMap,
    users: EdgeMap,
}

impl Node {
    /// Create a new node with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = ordering_key(&name);
        Self {
            id: NodeId::new(),
            name,
            key,
            deps: EdgeMap::new(),
            users: EdgeMap::new(),
        }
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the node's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the ordering key derived from the node's name.
    pub fn key(&self) -> i64 {
        self.key
    }

    /// The nodes this node requires, with the labels realizing each edge.
    pub fn deps(&self) -> &EdgeMap {
        &self.deps
    }

    /// The nodes that require this node (inverse of `deps`).
    pub fn users(&self) -> &EdgeMap {
        &self.users
    }

    pub(crate) fn deps_mut(&mut self) -> &mut EdgeMap {
        &mut self.deps
    }

    pub(crate) fn users_mut(&mut self) -> &mut EdgeMap {
        &mut self.users
    }
}

/// Collect labels into the set shape used by edge maps.
pub(crate) fn label_set<I, S>(labels: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    labels.into_iter().map(Into::into).collect()
}

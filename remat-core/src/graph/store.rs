//! Dependency Graph Store
//!
//! The store owns the nodes of the labeled graph level and coordinates every
//! mutation that must touch both endpoints of an edge. Rewrite passes (node
//! fusion, removal, relabeling) go through these operations so the
//! deps/users maps stay mutual inverses; the sorter and cutter then read the
//! finished graph.
//!
//! # Design Decisions
//!
//! 1. Nodes live in one central, insertion-ordered table indexed by id
//!    rather than behind shared pointers. This keeps mutation of both edge
//!    endpoints in one place and makes iteration order reproducible.
//!
//! 2. Single-direction map edits stay on [`EdgeMap`]; everything that has a
//!    mirror image on a neighbor lives here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::edges::{EdgeMap, EdgeMismatch, LabelSet};
use super::error::{GraphError, GraphResult};
use super::node::{label_set, Node, NodeId};
use super::sort::{DepList, DependencySource};

/// The labeled dependency graph: a node table plus one designated output.
///
/// The output node is the unique sink of the deps direction, i.e. the root
/// of the users direction; the sorter and the cutter both traverse from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepGraph {
    /// All nodes in the graph, indexed by ID.
    nodes: IndexMap<NodeId, Node>,
    /// The designated output node, once the graph has one.
    output: Option<NodeId>,
}

impl DepGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with the given name and add it to the graph.
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        let node = Node::new(name);
        let id = node.id();
        trace!(node = %id, name = node.name(), "node added");
        self.nodes.insert(id, node);
        id
    }

    /// Get a reference to a node.
    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// True if the node is part of this graph.
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Designate `node_id` as the graph's output node.
    pub fn set_output(&mut self, node_id: NodeId) -> GraphResult<()> {
        if !self.nodes.contains_key(&node_id) {
            return Err(GraphError::unknown(node_id));
        }
        self.output = Some(node_id);
        Ok(())
    }

    /// The designated output node, if one has been set.
    pub fn output(&self) -> Option<NodeId> {
        self.output
    }

    /// Add a dependency edge: `user` requires `req` through `labels`.
    ///
    /// Unions `labels` into `req.users[user]` and `user.deps[req]`, creating
    /// either entry if absent.
    pub fn add_edge<I, S>(&mut self, req: NodeId, user: NodeId, labels: I) -> GraphResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.nodes.contains_key(&req) {
            return Err(GraphError::unknown(req));
        }
        if !self.nodes.contains_key(&user) {
            return Err(GraphError::unknown(user));
        }

        let labels = label_set(labels);
        if let Some(node) = self.nodes.get_mut(&req) {
            node.users_mut().insert_set(user, labels.clone());
        }
        if let Some(node) = self.nodes.get_mut(&user) {
            node.deps_mut().insert_set(req, labels);
        }
        trace!(req = %req, user = %user, "edge added");
        Ok(())
    }

    /// Remove the edge between `req` and `user` from both directions.
    ///
    /// Removing an edge that does not exist is a no-op.
    pub fn discard_edge(&mut self, req: NodeId, user: NodeId) -> GraphResult<()> {
        if !self.nodes.contains_key(&req) {
            return Err(GraphError::unknown(req));
        }
        if !self.nodes.contains_key(&user) {
            return Err(GraphError::unknown(user));
        }

        if let Some(node) = self.nodes.get_mut(&req) {
            node.users_mut().discard(user);
        }
        if let Some(node) = self.nodes.get_mut(&user) {
            node.deps_mut().discard(req);
        }
        trace!(req = %req, user = %user, "edge discarded");
        Ok(())
    }

    /// Strip `node_id` from the deps map of every one of its users.
    ///
    /// Together with [`discard_from_users_of_deps`](Self::discard_from_users_of_deps)
    /// this keeps the bidirectional invariant when a node leaves the graph.
    pub fn discard_from_deps_of_users(&mut self, node_id: NodeId) -> GraphResult<()> {
        let users: Vec<NodeId> = self
            .get_node(node_id)
            .ok_or_else(|| GraphError::unknown(node_id))?
            .users()
            .nodes()
            .collect();
        for user_id in users {
            if let Some(user) = self.nodes.get_mut(&user_id) {
                user.deps_mut().discard(node_id);
            }
        }
        Ok(())
    }

    /// Strip `node_id` from the users map of every one of its deps.
    pub fn discard_from_users_of_deps(&mut self, node_id: NodeId) -> GraphResult<()> {
        let deps: Vec<NodeId> = self
            .get_node(node_id)
            .ok_or_else(|| GraphError::unknown(node_id))?
            .deps()
            .nodes()
            .collect();
        for req_id in deps {
            if let Some(req) = self.nodes.get_mut(&req_id) {
                req.users_mut().discard(node_id);
            }
        }
        Ok(())
    }

    /// Remove a node from the graph.
    ///
    /// Also removes its entries from every neighbor's opposite map, and
    /// clears the output designation if the node carried it.
    pub fn remove_node(&mut self, node_id: NodeId) {
        if let Some(node) = self.nodes.shift_remove(&node_id) {
            for dep_id in node.deps().nodes() {
                if let Some(dep) = self.nodes.get_mut(&dep_id) {
                    dep.users_mut().discard(node_id);
                }
            }
            for user_id in node.users().nodes() {
                if let Some(user) = self.nodes.get_mut(&user_id) {
                    user.deps_mut().discard(node_id);
                }
            }
            if self.output == Some(node_id) {
                self.output = None;
            }
            trace!(node = %node_id, "node removed");
        }
    }

    /// Rebuild the users entries of this node's deps from its deps map.
    ///
    /// Used when a node is spliced into the graph with only its upstream
    /// edges known.
    pub fn derive_users_from_deps(&mut self, node_id: NodeId) -> GraphResult<()> {
        let entries = self.one_sided_entries(node_id, |node| node.deps())?;
        for (req_id, labels) in entries {
            if let Some(req) = self.nodes.get_mut(&req_id) {
                req.users_mut().insert_set(node_id, labels);
            }
        }
        Ok(())
    }

    /// Rebuild the deps entries of this node's users from its users map.
    pub fn derive_deps_from_users(&mut self, node_id: NodeId) -> GraphResult<()> {
        let entries = self.one_sided_entries(node_id, |node| node.users())?;
        for (user_id, labels) in entries {
            if let Some(user) = self.nodes.get_mut(&user_id) {
                user.deps_mut().insert_set(node_id, labels);
            }
        }
        Ok(())
    }

    /// Collect one side of a node's edges, validating every target first so
    /// a bad id cannot leave the rebuild half-applied.
    fn one_sided_entries(
        &self,
        node_id: NodeId,
        side: impl Fn(&Node) -> &EdgeMap,
    ) -> GraphResult<Vec<(NodeId, LabelSet)>> {
        let node = self
            .get_node(node_id)
            .ok_or_else(|| GraphError::unknown(node_id))?;
        let entries: Vec<(NodeId, LabelSet)> = side(node)
            .iter()
            .map(|(id, labels)| (id, labels.clone()))
            .collect();
        for (id, _) in &entries {
            if !self.nodes.contains_key(id) {
                return Err(GraphError::unknown(*id));
            }
        }
        Ok(entries)
    }

    /// Audit the bidirectional invariant over the whole graph.
    ///
    /// Returns an [`GraphError::InvariantViolation`] at the first edge whose
    /// mirror entry is missing or carries a different label set.
    pub fn verify_bidirectional(&self) -> GraphResult<()> {
        for node in self.nodes.values() {
            for (req_id, labels) in node.deps().iter() {
                let req = self.nodes.get(&req_id).ok_or_else(|| {
                    GraphError::invariant(node.id(), format!("dep {req_id} points outside the graph"))
                })?;
                match req.users().get(node.id()) {
                    Some(back) if back == labels => {}
                    Some(back) => {
                        return Err(GraphError::invariant(
                            node.id(),
                            format!(
                                "labels for dep '{}' disagree: {labels:?} vs {back:?}",
                                req.name()
                            ),
                        ))
                    }
                    None => {
                        return Err(GraphError::invariant(
                            node.id(),
                            format!("dep '{}' has no matching users entry", req.name()),
                        ))
                    }
                }
            }
            for (user_id, labels) in node.users().iter() {
                let user = self.nodes.get(&user_id).ok_or_else(|| {
                    GraphError::invariant(
                        node.id(),
                        format!("user {user_id} points outside the graph"),
                    )
                })?;
                match user.deps().get(node.id()) {
                    Some(back) if back == labels => {}
                    Some(back) => {
                        return Err(GraphError::invariant(
                            node.id(),
                            format!(
                                "labels for user '{}' disagree: {labels:?} vs {back:?}",
                                user.name()
                            ),
                        ))
                    }
                    None => {
                        return Err(GraphError::invariant(
                            node.id(),
                            format!("user '{}' has no matching deps entry", user.name()),
                        ))
                    }
                }
            }
        }
        Ok(())
    }

    /// Structural comparison of two edge maps under canonical ordering.
    ///
    /// Entries are ordered by (ordering key, name); the result is either
    /// success or a [`GraphError::StructuralMismatch`] identifying the first
    /// index at which entry counts, keys, or label sets diverge. Intended
    /// for test harnesses and debug assertions, not for control flow.
    pub fn compare_edge_maps(&self, left: &EdgeMap, right: &EdgeMap) -> GraphResult<()> {
        let left_entries = self.canonical_entries(left);
        let right_entries = self.canonical_entries(right);

        if left_entries.len() != right_entries.len() {
            return Err(GraphError::StructuralMismatch(EdgeMismatch::EntryCount {
                left: left_entries.len(),
                right: right_entries.len(),
            }));
        }
        for (index, ((_, left_name, left_labels), (_, right_name, right_labels))) in
            left_entries.iter().zip(right_entries.iter()).enumerate()
        {
            if left_name != right_name {
                return Err(GraphError::StructuralMismatch(EdgeMismatch::Key {
                    index,
                    left: left_name.clone(),
                    right: right_name.clone(),
                }));
            }
            if left_labels != right_labels {
                return Err(GraphError::StructuralMismatch(EdgeMismatch::Labels {
                    index,
                    node: left_name.clone(),
                    left: (*left_labels).clone(),
                    right: (*right_labels).clone(),
                }));
            }
        }
        Ok(())
    }

    /// Entries of an edge map ordered by (ordering key, name). Ids that do
    /// not resolve in this graph keep their raw form as the name.
    fn canonical_entries<'a>(&self, map: &'a EdgeMap) -> Vec<(i64, String, &'a LabelSet)> {
        let mut entries: Vec<(i64, String, &'a LabelSet)> = map
            .iter()
            .map(|(id, labels)| match self.nodes.get(&id) {
                Some(node) => (node.key(), node.name().to_string(), labels),
                None => (-1, id.to_string(), labels),
            })
            .collect();
        entries.sort_by(|a, b| (a.0, a.1.as_str()).cmp(&(b.0, b.1.as_str())));
        entries
    }
}

/// The keyed-mapping shape: a node's dependencies are the keys of its deps
/// map.
impl DependencySource for DepGraph {
    fn dependencies(&self, node: NodeId) -> GraphResult<DepList> {
        Ok(self
            .get_node(node)
            .ok_or_else(|| GraphError::unknown(node))?
            .deps()
            .nodes()
            .collect())
    }

    fn ordering_key(&self, node: NodeId) -> i64 {
        self.get_node(node).map(|n| n.key()).unwrap_or(-1)
    }
}

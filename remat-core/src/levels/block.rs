//! Coarse Block Graph
//!
//! The first abstraction level the planner sees: one node per source block,
//! dependencies stored as a plain list of ids. No labels exist yet at this
//! level (the rewrite passes that split blocks into the labeled graph run
//! later), so the level only needs the ordering capability, not the edge
//! algebra.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::graph::{ordering_key, DepList, DependencySource, GraphError, GraphResult, NodeId};

/// A block node: dependencies as a direct collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockNode {
    id: NodeId,
    name: String,
    key: i64,
    deps: Vec<NodeId>,
}

impl BlockNode {
    fn new(name: String) -> Self {
        let key = ordering_key(&name);
        Self {
            id: NodeId::new(),
            name,
            key,
            deps: Vec::new(),
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

    /// The blocks this block requires.
    pub fn deps(&self) -> &[NodeId] {
        &self.deps
    }
}

/// The coarse block graph level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockGraph {
    nodes: IndexMap<NodeId, BlockNode>,
    output: Option<NodeId>,
}

impl BlockGraph {
    /// Create a new empty block graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a block with the given name and add it to the graph.
    pub fn add_block(&mut self, name: impl Into<String>) -> NodeId {
        let node = BlockNode::new(name.into());
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Record that `block` requires `req`. Duplicate edges are ignored.
    pub fn add_dependency(&mut self, block: NodeId, req: NodeId) -> GraphResult<()> {
        if !self.nodes.contains_key(&req) {
            return Err(GraphError::unknown(req));
        }
        let node = self
            .nodes
            .get_mut(&block)
            .ok_or_else(|| GraphError::unknown(block))?;
        if !node.deps.contains(&req) {
            node.deps.push(req);
        }
        Ok(())
    }

    /// Designate the graph's output block.
    pub fn set_output(&mut self, block: NodeId) -> GraphResult<()> {
        if !self.nodes.contains_key(&block) {
            return Err(GraphError::unknown(block));
        }
        self.output = Some(block);
        Ok(())
    }

    /// The designated output block, if one has been set.
    pub fn output(&self) -> Option<NodeId> {
        self.output
    }

    /// Get a reference to a block.
    pub fn get_block(&self, block: NodeId) -> Option<&BlockNode> {
        self.nodes.get(&block)
    }

    /// Get the total number of blocks.
    pub fn block_count(&self) -> usize {
        self.nodes.len()
    }
}

/// The direct-collection shape: dependencies are handed over as stored.
impl DependencySource for BlockGraph {
    fn dependencies(&self, node: NodeId) -> GraphResult<DepList> {
        Ok(self
            .nodes
            .get(&node)
            .ok_or_else(|| GraphError::unknown(node))?
            .deps
            .iter()
            .copied()
            .collect())
    }

    fn ordering_key(&self, node: NodeId) -> i64 {
        self.nodes.get(&node).map(|n| n.key()).unwrap_or(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::sort_from_root;

    #[test]
    fn block_chain_sorts_leaves_first() {
        let mut graph = BlockGraph::new();
        let b1 = graph.add_block("__1");
        let b2 = graph.add_block("__2");
        let b3 = graph.add_block("__3");
        graph.add_dependency(b2, b1).unwrap();
        graph.add_dependency(b3, b2).unwrap();
        graph.set_output(b3).unwrap();

        let order = sort_from_root(&graph, b3).unwrap();
        assert_eq!(order, vec![b1, b2, b3]);
    }

    #[test]
    fn duplicate_dependencies_collapse() {
        let mut graph = BlockGraph::new();
        let b1 = graph.add_block("__1");
        let b2 = graph.add_block("__2");
        graph.add_dependency(b2, b1).unwrap();
        graph.add_dependency(b2, b1).unwrap();

        assert_eq!(graph.get_block(b2).unwrap().deps(), &[b1]);
    }

    #[test]
    fn dependency_on_unknown_block_is_rejected() {
        let mut graph = BlockGraph::new();
        let b1 = graph.add_block("__1");
        let ghost = NodeId::new();

        assert!(matches!(
            graph.add_dependency(b1, ghost),
            Err(GraphError::UnknownNode { .. })
        ));
    }
}

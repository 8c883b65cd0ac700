//! Graph Cutter
//!
//! Finds the chain of articulation points that splits a graph into strictly
//! sequential segments. Each separator is a node every path from the output
//! back to the unresolved remainder must pass through, so the segments
//! between consecutive separators can be planned independently; they are
//! the natural checkpoint boundaries.
//!
//! # Algorithm
//!
//! Walk the users direction backward from the output with an explicit
//! stack, keeping a set of "open" nodes (seen but not yet processed) and a
//! per-node count of not-yet-visited users. A node is pushed only once all
//! of its users have been processed. When processing a node empties the
//! open set, nothing else is pending: the node is a separator.
//!
//! A straight chain yields every node; a diamond yields only the producer
//! and the join, never the parallel branches.

use std::cmp::Reverse;

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use super::error::{GraphError, GraphResult};
use super::node::NodeId;
use super::sort::DependencySource;
use super::store::DepGraph;

/// The separators of `graph`, ordered from its inputs toward its output.
pub fn separators(graph: &DepGraph) -> GraphResult<Vec<NodeId>> {
    let output = graph.output().ok_or(GraphError::MissingOutput)?;

    let mut pending_users: IndexMap<NodeId, usize> = graph
        .nodes()
        .map(|node| (node.id(), node.users().len()))
        .collect();
    let mut stack = vec![output];
    let mut open: IndexSet<NodeId> = IndexSet::new();
    open.insert(output);
    let mut found: Vec<NodeId> = Vec::new();

    while let Some(node_id) = stack.pop() {
        open.swap_remove(&node_id);
        if open.is_empty() {
            trace!(node = %node_id, "separator");
            found.push(node_id);
        }

        let node = graph
            .get_node(node_id)
            .ok_or_else(|| GraphError::unknown(node_id))?;

        // Walk deps in descending (key, creation) order so the recorded
        // sequence does not depend on edge-insertion history.
        let mut deps: Vec<NodeId> = node.deps().nodes().collect();
        deps.sort_unstable_by_key(|&req| Reverse((graph.ordering_key(req), req)));

        for req in deps {
            open.insert(req);
            let remaining = pending_users
                .get_mut(&req)
                .ok_or_else(|| GraphError::unknown(req))?;
            if *remaining == 0 {
                return Err(GraphError::invariant(req, "user counter underflow"));
            }
            *remaining -= 1;
            if *remaining == 0 {
                stack.push(req);
            }
        }
    }

    found.reverse();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_makes_every_node_a_separator() {
        let mut graph = DepGraph::new();
        let n1 = graph.add_node("__1");
        let n2 = graph.add_node("__2");
        let n3 = graph.add_node("__3");
        graph.add_edge(n1, n2, ["__1_fv"]).unwrap();
        graph.add_edge(n2, n3, ["__2_fv"]).unwrap();
        graph.set_output(n3).unwrap();

        assert_eq!(separators(&graph).unwrap(), vec![n1, n2, n3]);
    }

    #[test]
    fn diamond_cuts_at_producer_and_join() {
        let mut graph = DepGraph::new();
        let p = graph.add_node("__1");
        let b1 = graph.add_node("__2");
        let b2 = graph.add_node("__3");
        let j = graph.add_node("__4");
        graph.add_edge(p, b1, ["v"]).unwrap();
        graph.add_edge(p, b2, ["v"]).unwrap();
        graph.add_edge(b1, j, ["w"]).unwrap();
        graph.add_edge(b2, j, ["x"]).unwrap();
        graph.set_output(j).unwrap();

        assert_eq!(separators(&graph).unwrap(), vec![p, j]);
    }

    #[test]
    fn diamond_with_tail_keeps_the_tail_separators() {
        let mut graph = DepGraph::new();
        let src = graph.add_node("__1");
        let p = graph.add_node("__2");
        let b1 = graph.add_node("__3");
        let b2 = graph.add_node("__4");
        let j = graph.add_node("__5");
        graph.add_edge(src, p, ["v"]).unwrap();
        graph.add_edge(p, b1, ["v"]).unwrap();
        graph.add_edge(p, b2, ["v"]).unwrap();
        graph.add_edge(b1, j, ["w"]).unwrap();
        graph.add_edge(b2, j, ["x"]).unwrap();
        graph.set_output(j).unwrap();

        assert_eq!(separators(&graph).unwrap(), vec![src, p, j]);
    }

    #[test]
    fn missing_output_is_an_error() {
        let mut graph = DepGraph::new();
        graph.add_node("__1");

        assert!(matches!(
            separators(&graph),
            Err(GraphError::MissingOutput)
        ));
    }

    #[test]
    fn single_node_graph_is_its_own_separator() {
        let mut graph = DepGraph::new();
        let only = graph.add_node("__1");
        graph.set_output(only).unwrap();

        assert_eq!(separators(&graph).unwrap(), vec![only]);
    }
}

//! Integration Tests for the Dependency-Graph Engine
//!
//! These tests drive the engine the way the planning pipeline does: build a
//! labeled graph, rewrite it, and read orderings and cut points back.

use remat_core::graph::{
    separators, sort_from_root, DepGraph, DependencySource, GraphError, NodeId,
};
use remat_core::levels::{BlockGraph, ScheduleGraph};

/// Resolve sorted ids back to names for cross-graph comparison.
fn names(graph: &DepGraph, order: &[NodeId]) -> Vec<String> {
    order
        .iter()
        .map(|id| graph.get_node(*id).unwrap().name().to_string())
        .collect()
}

/// Sort and project every node onto its ordering key, through the
/// capability interface only.
fn key_order<S: DependencySource>(source: &S, root: NodeId) -> Vec<i64> {
    sort_from_root(source, root)
        .unwrap()
        .iter()
        .map(|&id| source.ordering_key(id))
        .collect()
}

/// A small mesh: two entry nodes, a shared middle, two branches, one sink.
/// `reverse_edges` flips the order edges are inserted in, which must not
/// change any result.
fn build_mesh(reverse_edges: bool) -> (DepGraph, Vec<NodeId>) {
    let mut graph = DepGraph::new();
    let n: Vec<NodeId> = (1..=6)
        .map(|i| graph.add_node(format!("__{i}")))
        .collect();

    let mut edges = vec![(0, 2), (1, 2), (2, 3), (2, 4), (1, 4), (3, 5), (4, 5)];
    if reverse_edges {
        edges.reverse();
    }
    for (req, user) in edges {
        graph.add_edge(n[req], n[user], ["v"]).unwrap();
    }
    graph.set_output(n[5]).unwrap();
    (graph, n)
}

/// Fuse `absorbed` into `kept`: the kept node inherits the absorbed node's
/// dependency edges, the way node-fusion rewrite passes splice graphs.
fn fuse(graph: &mut DepGraph, kept: NodeId, absorbed: NodeId) {
    let inherited = graph.get_node(absorbed).unwrap().deps().clone();
    graph.remove_node(absorbed);
    for (req, labels) in inherited.iter() {
        if req != kept && graph.contains_node(req) {
            graph.add_edge(req, kept, labels.iter().cloned()).unwrap();
        }
    }
}

#[test]
fn mesh_orders_and_cuts_deterministically() {
    let (forward, _) = build_mesh(false);
    let (backward, _) = build_mesh(true);

    let forward_root = forward.output().unwrap();
    let backward_root = backward.output().unwrap();

    let forward_sort = names(&forward, &sort_from_root(&forward, forward_root).unwrap());
    let backward_sort = names(&backward, &sort_from_root(&backward, backward_root).unwrap());
    assert_eq!(forward_sort, backward_sort);

    let forward_cut = names(&forward, &separators(&forward).unwrap());
    let backward_cut = names(&backward, &separators(&backward).unwrap());
    assert_eq!(forward_cut, backward_cut);

    // The parallel interior paths rule out interior cut points: only the
    // sink and the entry that closes the traversal remain.
    assert_eq!(forward_cut, vec!["__2", "__6"]);
}

#[test]
fn fusion_preserves_the_invariant_and_updates_the_cut() {
    let mut graph = DepGraph::new();
    let n1 = graph.add_node("__1");
    let n2 = graph.add_node("__2");
    let n3 = graph.add_node("__3");
    let n4 = graph.add_node("__4");
    graph.add_edge(n1, n2, ["__1_fv"]).unwrap();
    graph.add_edge(n2, n3, ["__2_fv"]).unwrap();
    graph.add_edge(n3, n4, ["__3_fv"]).unwrap();
    graph.set_output(n4).unwrap();

    fuse(&mut graph, n4, n3);

    graph.verify_bidirectional().unwrap();
    assert_eq!(
        names(&graph, &sort_from_root(&graph, n4).unwrap()),
        vec!["__1", "__2", "__4"]
    );
    assert_eq!(
        names(&graph, &separators(&graph).unwrap()),
        vec!["__1", "__2", "__4"]
    );
}

#[test]
fn every_level_orders_the_same_chain_alike() {
    let mut labeled = DepGraph::new();
    let l1 = labeled.add_node("__1");
    let l2 = labeled.add_node("__2");
    let l3 = labeled.add_node("__3");
    labeled.add_edge(l1, l2, ["__1_fv"]).unwrap();
    labeled.add_edge(l2, l3, ["__2_fv"]).unwrap();

    let mut blocks = BlockGraph::new();
    let b1 = blocks.add_block("__1");
    let b2 = blocks.add_block("__2");
    let b3 = blocks.add_block("__3");
    blocks.add_dependency(b2, b1).unwrap();
    blocks.add_dependency(b3, b2).unwrap();

    let mut schedule = ScheduleGraph::new();
    let f1 = schedule.add_compute("fwd___1", vec![], vec![]);
    let d1 = schedule.add_data("__1 data", vec![f1]);
    let f2 = schedule.add_compute("fwd___2", vec![d1], vec![]);
    let d2 = schedule.add_data("__2 data", vec![f2]);
    let f3 = schedule.add_compute("fwd___3", vec![d2], vec![]);

    let expected = vec![1, 2, 3];
    assert_eq!(key_order(&labeled, l3), expected);
    assert_eq!(key_order(&blocks, b3), expected);
    assert_eq!(key_order(&schedule, f3), expected);
}

#[test]
fn cycles_introduced_by_a_rewrite_are_fatal() {
    let (mut graph, n) = build_mesh(false);

    // A rewrite pass that accidentally closes a loop.
    graph.add_edge(n[5], n[0], ["bad"]).unwrap();

    let err = sort_from_root(&graph, n[5]).unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected { .. }));
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn mismatch_diagnostics_serialize_for_harnesses() {
    let mut graph = DepGraph::new();
    let n1 = graph.add_node("__1");
    let n2 = graph.add_node("__2");
    graph.add_edge(n1, n2, ["x"]).unwrap();

    let left = graph.get_node(n2).unwrap().deps().clone();
    let right = left.added(n1, ["y"]);

    let err = graph.compare_edge_maps(&left, &right).unwrap_err();
    let GraphError::StructuralMismatch(mismatch) = err else {
        panic!("expected a structural mismatch");
    };

    let value = serde_json::to_value(&mismatch).unwrap();
    assert_eq!(value["Labels"]["node"], "__1");
    assert_eq!(value["Labels"]["index"], 0);
}

#[test]
fn graphs_snapshot_to_json() {
    let mut graph = DepGraph::new();
    let n1 = graph.add_node("__1");
    let n2 = graph.add_node("__2");
    graph.add_edge(n1, n2, ["__1_fv"]).unwrap();

    let snapshot = serde_json::to_string(&graph).unwrap();
    assert!(snapshot.contains("__1_fv"));
    assert!(snapshot.contains("__2"));
}

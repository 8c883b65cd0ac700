//! Topological Sorter
//!
//! Produces a full leaves-first ordering of everything reachable from a root
//! node through its dependency relation, with the root last.
//!
//! # Algorithm
//!
//! 1. Degree pass: iterative depth-first discovery from the root. Each
//!    node's dependency list is fetched once from the accessor and cached;
//!    every discovered edge increments the dependency's pending-user
//!    counter.
//!
//! 2. Kahn pass: starting from `{root}`, repeatedly sequence the eligible
//!    node with the largest ordering key (ties broken toward the most
//!    recently created node). Sequencing a node decrements each of its
//!    dependencies' counters; a dependency whose users are all sequenced
//!    becomes eligible.
//!
//! 3. The accumulated sequence runs root-first; it is reversed before
//!    returning.
//!
//! Selecting the largest key first encodes a "process outputs before their
//! producers, most recently created first" bias that the downstream
//! scheduler relies on; do not weaken it to an arbitrary eligible pick.
//!
//! # Cycles
//!
//! A dependency of the node being sequenced that is already finalized in
//! the output means the deps relation has a cycle: the sort aborts with
//! [`GraphError::CycleDetected`] and returns no partial result. A traversal
//! that stalls before sequencing every discovered node (a cycle that never
//! touches the finalized prefix) is reported the same way.

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use tracing::trace;

use super::error::{GraphError, GraphResult};
use super::node::NodeId;

/// Dependency ids of a single node, in the accessor's native order.
pub type DepList = SmallVec<[NodeId; 8]>;

/// Capability interface for reading a graph level's dependency relation.
///
/// Each graph level stores dependencies in its own shape (a direct
/// collection, a keyed mapping, or a union computed across several backing
/// relations) and adapts that shape here, per node variant. Callers never
/// inspect concrete node types.
pub trait DependencySource {
    /// The dependency ids of `node`. Duplicates are tolerated; the sorter
    /// deduplicates.
    fn dependencies(&self, node: NodeId) -> GraphResult<DepList>;

    /// The ordering key of `node`, used for the deterministic tie-break.
    fn ordering_key(&self, node: NodeId) -> i64;
}

/// Order every node reachable from `root`, dependencies first, root last.
pub fn sort_from_root<S: DependencySource>(source: &S, root: NodeId) -> GraphResult<Vec<NodeId>> {
    // Degree pass: discover the reachable set and count each node's users.
    let mut deps_of: IndexMap<NodeId, DepList> = IndexMap::new();
    let mut pending_users: IndexMap<NodeId, usize> = IndexMap::new();
    let mut stack = vec![root];
    deps_of.insert(root, DepList::new());

    while let Some(node) = stack.pop() {
        let mut deps = source.dependencies(node)?;
        deps.sort_unstable();
        deps.dedup();
        for &req in &deps {
            *pending_users.entry(req).or_insert(0) += 1;
            if !deps_of.contains_key(&req) {
                deps_of.insert(req, DepList::new());
                stack.push(req);
            }
        }
        deps_of.insert(node, deps);
    }
    trace!(root = %root, reachable = deps_of.len(), "degree pass complete");

    // Kahn pass with the deterministic max-key tie-break.
    let mut ordered: Vec<NodeId> = Vec::with_capacity(deps_of.len());
    let mut finalized: IndexSet<NodeId> = IndexSet::with_capacity(deps_of.len());
    let mut eligible: Vec<NodeId> = vec![root];

    while let Some(node) = take_next(source, &mut eligible) {
        ordered.push(node);
        finalized.insert(node);
        for &req in &deps_of[&node] {
            if finalized.contains(&req) {
                return Err(GraphError::cycle(req, root));
            }
            let remaining = pending_users.get_mut(&req).ok_or_else(|| {
                GraphError::invariant(req, "dependency missing from degree bookkeeping")
            })?;
            if *remaining == 1 {
                eligible.push(req);
            } else {
                *remaining -= 1;
            }
        }
    }

    // A stalled traversal means a cycle that never crossed the finalized
    // prefix; find one of its nodes for the report.
    if ordered.len() != deps_of.len() {
        let stuck = deps_of
            .keys()
            .find(|id| !finalized.contains(*id))
            .copied()
            .unwrap_or(root);
        return Err(GraphError::cycle(stuck, root));
    }

    ordered.reverse();
    Ok(ordered)
}

/// Remove and return the eligible node with the largest (ordering key,
/// creation order) pair.
fn take_next<S: DependencySource>(source: &S, eligible: &mut Vec<NodeId>) -> Option<NodeId> {
    if eligible.is_empty() {
        return None;
    }
    let mut pick = 0;
    for i in 1..eligible.len() {
        let candidate = (source.ordering_key(eligible[i]), eligible[i]);
        let best = (source.ordering_key(eligible[pick]), eligible[pick]);
        if candidate > best {
            pick = i;
        }
    }
    Some(eligible.swap_remove(pick))
}

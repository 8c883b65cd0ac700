//! Dependency Graph Engine
//!
//! This module implements the graph core shared by every abstraction level
//! of the planner: edge bookkeeping, deterministic topological ordering,
//! and articulation-point partitioning.
//!
//! # Overview
//!
//! A graph is a set of nodes with two mirrored edge relations:
//!
//! - `deps`: the nodes a given node requires as predecessors
//! - `users`: the inverse, the nodes that require it
//!
//! Every dependency edge carries a label set naming the values that flow
//! across it. The rewrite passes that build and shrink graphs go through
//! [`DepGraph`]'s symmetric operations, which keep the two relations mutual
//! inverses; [`sort_from_root`] and [`separators`] then read the finished
//! graph to produce an execution order and the natural checkpoint
//! boundaries.
//!
//! # Design Decisions
//!
//! 1. Everything that must be reproducible is: node and edge tables keep
//!    insertion order, and the ordering algorithms break ties on
//!    (ordering key, creation order). Downstream planning decisions are
//!    order-sensitive, so two identically built graphs must produce
//!    identical output.
//!
//! 2. Dependency access is a capability ([`DependencySource`]) implemented
//!    per graph level, never dispatched on concrete node types at runtime.

mod cut;
mod edges;
mod error;
mod node;
mod sort;
mod store;

pub use cut::separators;
pub use edges::{EdgeMap, EdgeMismatch, LabelSet};
pub use error::{GraphError, GraphResult};
pub use node::{ordering_key, Node, NodeId};
pub use sort::{sort_from_root, DepList, DependencySource};
pub use store::DepGraph;

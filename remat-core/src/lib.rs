//! Remat Core
//!
//! This crate provides the dependency-graph engine for the remat
//! rematerialization planner. Given the computation graph of a model, the
//! planner decides which intermediate results to keep in memory and which
//! to recompute on demand; this crate supplies the graph machinery every
//! stage of that pipeline shares:
//!
//! - Symmetric producer/consumer edge bookkeeping with labeled edges
//! - Deterministic leaves-first topological ordering with cycle detection
//! - Articulation-point partitioning into sequential segments
//!
//! The crate performs no numeric computation and owns no policy: rewrite
//! passes build the graphs, and the checkpoint search consumes the
//! orderings and cut points this engine produces.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `graph`: the engine (nodes, edge maps, the graph store, the sorter,
//!   and the cutter)
//! - `levels`: the graph abstraction levels whose nodes expose their
//!   dependencies in different native shapes
//!
//! # Example
//!
//! ```rust
//! use remat_core::graph::{separators, sort_from_root, DepGraph};
//!
//! let mut graph = DepGraph::new();
//! let a = graph.add_node("__1");
//! let b = graph.add_node("__2");
//! let c = graph.add_node("__3");
//! graph.add_edge(a, b, ["__1_fv"]).unwrap();
//! graph.add_edge(b, c, ["__2_fv"]).unwrap();
//! graph.set_output(c).unwrap();
//!
//! // Dependencies first, output last.
//! assert_eq!(sort_from_root(&graph, c).unwrap(), vec![a, b, c]);
//!
//! // Every node of a chain is a cut point.
//! assert_eq!(separators(&graph).unwrap(), vec![a, b, c]);
//! ```

pub mod graph;
pub mod levels;

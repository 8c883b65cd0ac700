//! Error types for graph operations
//!
//! All failures are raised synchronously to the immediate caller and never
//! retried: the algorithms are deterministic, so retrying with the same
//! input cannot succeed. The calling pipeline decides whether an error
//! aborts the analysis or triggers a corrective rewrite pass.

use thiserror::Error;

use super::edges::EdgeMismatch;
use super::node::NodeId;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur during graph operations.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum GraphError {
    /// The sorter reached a dependency already finalized in the output
    /// sequence. Fatal for that sort call; no partial order is returned.
    #[error("dependency cycle through {node} while ordering from {root}")]
    CycleDetected {
        /// The node at which the cycle became visible.
        node: NodeId,
        /// The root the sort started from.
        root: NodeId,
    },

    /// The deps/users maps of a graph are not mutual inverses.
    #[error("deps/users maps out of sync at {node}: {detail}")]
    InvariantViolation {
        /// The node whose bookkeeping is inconsistent.
        node: NodeId,
        /// What was found to be inconsistent.
        detail: String,
    },

    /// A dependency accessor was handed a node variant it cannot adapt.
    #[error("node {node} of kind '{kind}' cannot be adapted by this dependency relation")]
    UnsupportedNodeKind {
        /// The offending node.
        node: NodeId,
        /// The variant that was found.
        kind: &'static str,
    },

    /// Diagnostic equality found the first point of divergence.
    #[error("edge maps differ: {0}")]
    StructuralMismatch(EdgeMismatch),

    /// An id that is not part of the graph it was used against.
    #[error("node {node} is not part of this graph")]
    UnknownNode {
        /// The id that failed to resolve.
        node: NodeId,
    },

    /// The cutter needs a designated output node and the graph has none.
    #[error("graph has no designated output node")]
    MissingOutput,
}

impl GraphError {
    /// Creates a cycle error for a sort rooted at `root`.
    pub fn cycle(node: NodeId, root: NodeId) -> Self {
        Self::CycleDetected { node, root }
    }

    /// Creates an invariant violation at `node`.
    pub fn invariant(node: NodeId, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            node,
            detail: detail.into(),
        }
    }

    /// Creates an unsupported node kind error.
    pub fn unsupported(node: NodeId, kind: &'static str) -> Self {
        Self::UnsupportedNodeKind { node, kind }
    }

    /// Creates an unknown node error.
    pub fn unknown(node: NodeId) -> Self {
        Self::UnknownNode { node }
    }
}

//! Schedulable Compute/Data Graph
//!
//! The last abstraction level before planning: computations and the values
//! they produce become separate nodes. A compute node reads data nodes
//! (`deps_real`) and may additionally depend on other compute nodes through
//! size artifacts; a data node records the compute nodes able to
//! materialize it (`producers`).
//!
//! # Dependency relations
//!
//! Neither variant stores its own-kind dependencies directly; they are
//! computed as a union over the backing relations:
//!
//! - compute → compute: the producers of each real data input, plus the
//!   artifact edges;
//! - data → data: the real inputs of each producer.
//!
//! The [`DependencySource`] impl dispatches on the variant; an edge that
//! resolves to the wrong variant is an [`GraphError::UnsupportedNodeKind`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::graph::{ordering_key, DepList, DependencySource, GraphError, GraphResult, NodeId};

/// A computation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeNode {
    id: NodeId,
    name: String,
    key: i64,
    /// Data nodes whose payload this computation reads.
    deps_real: Vec<NodeId>,
    /// Compute nodes reached through size artifacts rather than data.
    deps_artifacts: Vec<NodeId>,
}

impl ComputeNode {
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

    /// The data nodes this computation reads.
    pub fn deps_real(&self) -> &[NodeId] {
        &self.deps_real
    }

    /// The artifact edges toward other compute nodes.
    pub fn deps_artifacts(&self) -> &[NodeId] {
        &self.deps_artifacts
    }
}

/// A materializable value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataNode {
    id: NodeId,
    name: String,
    key: i64,
    /// Compute nodes able to materialize this value.
    producers: Vec<NodeId>,
}

impl DataNode {
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

    /// The compute nodes able to materialize this value.
    pub fn producers(&self) -> &[NodeId] {
        &self.producers
    }
}

/// A node of the schedulable level: a tagged union over the two variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScheduleNode {
    /// A computation step.
    Compute(ComputeNode),
    /// A materializable value.
    Data(DataNode),
}

impl ScheduleNode {
    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        match self {
            ScheduleNode::Compute(node) => node.id(),
            ScheduleNode::Data(node) => node.id(),
        }
    }

    /// Get the node's ordering key.
    pub fn key(&self) -> i64 {
        match self {
            ScheduleNode::Compute(node) => node.key(),
            ScheduleNode::Data(node) => node.key(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ScheduleNode::Compute(_) => "compute",
            ScheduleNode::Data(_) => "data",
        }
    }
}

/// The schedulable compute/data graph level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleGraph {
    nodes: IndexMap<NodeId, ScheduleNode>,
    output: Option<NodeId>,
}

impl ScheduleGraph {
    /// Create a new empty schedule graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a compute node reading `deps_real` with artifact edges
    /// `deps_artifacts`.
    pub fn add_compute(
        &mut self,
        name: impl Into<String>,
        deps_real: Vec<NodeId>,
        deps_artifacts: Vec<NodeId>,
    ) -> NodeId {
        let name = name.into();
        let key = ordering_key(&name);
        let id = NodeId::new();
        self.nodes.insert(
            id,
            ScheduleNode::Compute(ComputeNode {
                id,
                name,
                key,
                deps_real,
                deps_artifacts,
            }),
        );
        id
    }

    /// Add a data node materializable by `producers`.
    pub fn add_data(&mut self, name: impl Into<String>, producers: Vec<NodeId>) -> NodeId {
        let name = name.into();
        let key = ordering_key(&name);
        let id = NodeId::new();
        self.nodes.insert(
            id,
            ScheduleNode::Data(DataNode {
                id,
                name,
                key,
                producers,
            }),
        );
        id
    }

    /// Designate the graph's output node.
    pub fn set_output(&mut self, node: NodeId) -> GraphResult<()> {
        if !self.nodes.contains_key(&node) {
            return Err(GraphError::unknown(node));
        }
        self.output = Some(node);
        Ok(())
    }

    /// The designated output node, if one has been set.
    pub fn output(&self) -> Option<NodeId> {
        self.output
    }

    /// Get a reference to a node.
    pub fn get_node(&self, node: NodeId) -> Option<&ScheduleNode> {
        self.nodes.get(&node)
    }

    /// Get the total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolve an id that must be a compute node.
    fn compute(&self, node: NodeId) -> GraphResult<&ComputeNode> {
        match self.nodes.get(&node) {
            Some(ScheduleNode::Compute(compute)) => Ok(compute),
            Some(other) => Err(GraphError::unsupported(node, other.kind())),
            None => Err(GraphError::unknown(node)),
        }
    }

    /// Resolve an id that must be a data node.
    fn data(&self, node: NodeId) -> GraphResult<&DataNode> {
        match self.nodes.get(&node) {
            Some(ScheduleNode::Data(data)) => Ok(data),
            Some(other) => Err(GraphError::unsupported(node, other.kind())),
            None => Err(GraphError::unknown(node)),
        }
    }
}

/// The computed-union shape: each variant's dependencies are assembled from
/// the backing relations of its neighbors.
impl DependencySource for ScheduleGraph {
    fn dependencies(&self, node: NodeId) -> GraphResult<DepList> {
        let mut out = DepList::new();
        match self
            .nodes
            .get(&node)
            .ok_or_else(|| GraphError::unknown(node))?
        {
            ScheduleNode::Compute(compute) => {
                for &data_id in &compute.deps_real {
                    out.extend(self.data(data_id)?.producers.iter().copied());
                }
                out.extend(compute.deps_artifacts.iter().copied());
            }
            ScheduleNode::Data(data) => {
                for &producer_id in &data.producers {
                    out.extend(self.compute(producer_id)?.deps_real.iter().copied());
                }
            }
        }
        Ok(out)
    }

    fn ordering_key(&self, node: NodeId) -> i64 {
        self.nodes.get(&node).map(|n| n.key()).unwrap_or(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::sort_from_root;

    /// fwd(1) -> out1 -> fwd(2) -> out2, with fwd(2) also holding an
    /// artifact edge to fwd(1).
    fn two_step_graph() -> (ScheduleGraph, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = ScheduleGraph::new();
        let fwd1 = graph.add_compute("fwd___1", vec![], vec![]);
        let out1 = graph.add_data("__1 data", vec![fwd1]);
        let fwd2 = graph.add_compute("fwd___2", vec![out1], vec![fwd1]);
        let out2 = graph.add_data("__2 data", vec![fwd2]);
        (graph, fwd1, out1, fwd2, out2)
    }

    #[test]
    fn compute_relation_unions_producers_and_artifacts() {
        let (graph, fwd1, _, fwd2, _) = two_step_graph();

        let deps = graph.dependencies(fwd2).unwrap();
        // Producer of out1 once through data, once through the artifact.
        assert_eq!(deps.as_slice(), &[fwd1, fwd1]);

        let order = sort_from_root(&graph, fwd2).unwrap();
        assert_eq!(order, vec![fwd1, fwd2]);
    }

    #[test]
    fn data_relation_chains_through_producers() {
        let (graph, _, out1, _, out2) = two_step_graph();

        let deps = graph.dependencies(out2).unwrap();
        assert_eq!(deps.as_slice(), &[out1]);

        let order = sort_from_root(&graph, out2).unwrap();
        assert_eq!(order, vec![out1, out2]);
    }

    #[test]
    fn wrong_variant_in_a_backing_relation_is_unsupported() {
        let mut graph = ScheduleGraph::new();
        let fwd1 = graph.add_compute("fwd___1", vec![], vec![]);
        // deps_real must point at data nodes, not compute nodes.
        let broken = graph.add_compute("fwd___2", vec![fwd1], vec![]);

        let err = graph.dependencies(broken).unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnsupportedNodeKind { kind: "compute", .. }
        ));
    }

    #[test]
    fn unknown_id_in_a_backing_relation_is_reported() {
        let mut graph = ScheduleGraph::new();
        let ghost = NodeId::new();
        let data = graph.add_data("__1 data", vec![ghost]);

        assert!(matches!(
            graph.dependencies(data),
            Err(GraphError::UnknownNode { .. })
        ));
    }
}

// Process graph structure and basic queries

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use flowopt_error::{GraphError, GraphResult};

use crate::{Activity, Flow, FlowId, GatewayKind, Node, NodeId, NodeKind};

/// A process: nodes and flows keyed by identifier
///
/// Both maps are ordered so every query iterates deterministically by id.
/// Cloning a graph is a value copy; rewrites always work on a clone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessGraph {
    /// Process name
    name: String,

    /// Nodes by identifier
    nodes: BTreeMap<NodeId, Node>,

    /// Flows by identifier
    flows: BTreeMap<FlowId, Flow>,
}

impl ProcessGraph {
    /// Create an empty process
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: BTreeMap::new(),
            flows: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn flows(&self) -> impl Iterator<Item = &Flow> {
        self.flows.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn flow(&self, id: &str) -> Option<&Flow> {
        self.flows.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_flow(&self, id: &str) -> bool {
        self.flows.contains_key(id)
    }

    /// Activity payload of a node, if it is one
    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.node(id).and_then(Node::as_activity)
    }

    /// Flows leaving a node, ordered by flow id
    pub fn outgoing(&self, id: &str) -> Vec<&Flow> {
        self.flows.values().filter(|f| f.source == id).collect()
    }

    /// Flows entering a node, ordered by flow id
    pub fn incoming(&self, id: &str) -> Vec<&Flow> {
        self.flows.values().filter(|f| f.target == id).collect()
    }

    /// First incoming flow; the only one for activities and splits
    pub fn first_incoming(&self, id: &str) -> Option<&Flow> {
        self.flows.values().find(|f| f.target == id)
    }

    /// First outgoing flow; the only one for activities and joins
    pub fn first_outgoing(&self, id: &str) -> Option<&Flow> {
        self.flows.values().find(|f| f.source == id)
    }

    /// Targets of the outgoing flows
    pub fn successors(&self, id: &str) -> Vec<&Node> {
        self.outgoing(id)
            .into_iter()
            .filter_map(|f| self.nodes.get(&f.target))
            .collect()
    }

    /// Sources of the incoming flows
    pub fn predecessors(&self, id: &str) -> Vec<&Node> {
        self.incoming(id)
            .into_iter()
            .filter_map(|f| self.nodes.get(&f.source))
            .collect()
    }

    /// All activity nodes
    pub fn tasks(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.is_activity()).collect()
    }

    pub fn splits(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.is_split()).collect()
    }

    pub fn joins(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.is_join()).collect()
    }

    pub fn parallel_gateways(&self) -> Vec<&Node> {
        self.gateways_of(GatewayKind::Parallel)
    }

    pub fn exclusive_gateways(&self) -> Vec<&Node> {
        self.gateways_of(GatewayKind::Exclusive)
    }

    fn gateways_of(&self, kind: GatewayKind) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.gateway_kind() == Some(kind))
            .collect()
    }

    /// The unique Start node
    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.values().find(|n| n.is_start())
    }

    pub fn end_nodes(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.is_end()).collect()
    }

    /// Identifiers of all activities
    pub fn alphabet(&self) -> BTreeSet<NodeId> {
        self.tasks().into_iter().map(|n| n.id.clone()).collect()
    }

    /// First activity carrying the given display name
    pub fn activity_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes
            .values()
            .find(|n| matches!(&n.kind, NodeKind::Activity(a) if a.name == name))
    }

    /// Sum of all activity durations, the makespan of a fully sequential run
    pub fn total_task_duration(&self) -> u64 {
        self.tasks()
            .into_iter()
            .filter_map(Node::as_activity)
            .map(|a| u64::from(a.duration))
            .sum()
    }

    /// Add a node; its identifier must be fresh
    pub fn add_node(&mut self, node: Node) -> GraphResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateId(node.id));
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Add a flow between two existing nodes; its identifier must be fresh
    pub fn add_flow(&mut self, flow: Flow) -> GraphResult<()> {
        if self.flows.contains_key(&flow.id) {
            return Err(GraphError::DuplicateId(flow.id));
        }
        for endpoint in [&flow.source, &flow.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::dangling(flow.id.clone(), endpoint.clone()));
            }
        }
        self.flows.insert(flow.id.clone(), flow);
        Ok(())
    }

    /// Remove a node; absent ids are ignored
    ///
    /// Flows touching the node are left in place; callers remove them first.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        self.nodes.remove(id)
    }

    /// Remove a flow; absent ids are ignored
    pub fn remove_flow(&mut self, id: &str) -> Option<Flow> {
        self.flows.remove(id)
    }
}

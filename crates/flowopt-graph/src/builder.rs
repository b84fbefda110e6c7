// Builder module for process graphs
// Fluent API for constructing processes in tests and loaders.

use flowopt_error::{GraphError, GraphResult};

use crate::ids::check_task_ids;
use crate::{validate, Activity, Flow, FlowId, GatewayKind, Node, NodeId, ProcessGraph, ResourceName};

/// Builder for creating a ProcessGraph
///
/// Insertion errors are kept and reported by [`ProcessBuilder::build`], which
/// also validates the finished graph.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    graph: ProcessGraph,
    error: Option<GraphError>,
}

impl ProcessBuilder {
    /// Create a new builder for a named process
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            graph: ProcessGraph::new(name),
            error: None,
        }
    }

    /// Add an arbitrary node
    pub fn node(&mut self, node: Node) -> &mut Self {
        let result = self.graph.add_node(node);
        self.record(result)
    }

    pub fn start(&mut self, id: impl Into<NodeId>) -> &mut Self {
        self.node(Node::start(id))
    }

    pub fn end(&mut self, id: impl Into<NodeId>) -> &mut Self {
        self.node(Node::end(id))
    }

    /// Add an activity with its name, duration and required resources
    pub fn activity<I, R>(
        &mut self,
        id: impl Into<NodeId>,
        name: impl Into<String>,
        duration: u32,
        resources: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ResourceName>,
    {
        self.node(Node::activity(id, Activity::new(name, duration, resources)))
    }

    pub fn split(&mut self, id: impl Into<NodeId>, kind: GatewayKind) -> &mut Self {
        self.node(Node::split(id, kind))
    }

    pub fn join(&mut self, id: impl Into<NodeId>, kind: GatewayKind) -> &mut Self {
        self.node(Node::join(id, kind))
    }

    /// Add a weak flow
    pub fn flow(
        &mut self,
        id: impl Into<FlowId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> &mut Self {
        let result = self.graph.add_flow(Flow::new(id, source, target));
        self.record(result)
    }

    /// Add a strong flow
    pub fn strong_flow(
        &mut self,
        id: impl Into<FlowId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> &mut Self {
        let result = self.graph.add_flow(Flow::strong(id, source, target));
        self.record(result)
    }

    fn record(&mut self, result: GraphResult<()>) -> &mut Self {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
        self
    }

    /// Finish and validate the graph
    pub fn build(&self) -> GraphResult<ProcessGraph> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        validate(&self.graph)?;
        check_task_ids(&self.graph)?;
        Ok(self.graph.clone())
    }
}

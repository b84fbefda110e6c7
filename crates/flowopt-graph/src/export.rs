// Interchange view of a process graph
// Flat, renderer-friendly document exchanged with external tooling.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use flowopt_error::GraphResult;

use crate::{Activity, Flow, FlowStrength, GatewayKind, Node, NodeKind, ProcessGraph};

/// Process element of the interchange document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchangeDocument {
    pub id: String,
    pub start_events: Vec<String>,
    pub end_events: Vec<String>,
    pub tasks: Vec<TaskElement>,
    pub gateways: Vec<GatewayElement>,
    pub sequence_flows: Vec<FlowElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskElement {
    pub id: String,
    pub name: String,
    pub duration: u32,
    pub resources: BTreeSet<String>,
}

/// Direction of a gateway in the interchange format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayDirection {
    Diverging,
    Converging,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayElement {
    pub id: String,
    pub kind: GatewayKind,
    pub direction: GatewayDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowElement {
    pub id: String,
    pub source_ref: String,
    pub target_ref: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strong: bool,
}

impl ProcessGraph {
    /// Flat interchange document for this graph
    pub fn interchange(&self) -> InterchangeDocument {
        let mut document = InterchangeDocument {
            id: self.name().to_string(),
            start_events: Vec::new(),
            end_events: Vec::new(),
            tasks: Vec::new(),
            gateways: Vec::new(),
            sequence_flows: Vec::new(),
        };

        for node in self.nodes() {
            match &node.kind {
                NodeKind::Start => document.start_events.push(node.id.clone()),
                NodeKind::End => document.end_events.push(node.id.clone()),
                NodeKind::Activity(activity) => document.tasks.push(TaskElement {
                    id: node.id.clone(),
                    name: activity.name.clone(),
                    duration: activity.duration,
                    resources: activity.resources.clone(),
                }),
                NodeKind::Split(kind) => document.gateways.push(GatewayElement {
                    id: node.id.clone(),
                    kind: *kind,
                    direction: GatewayDirection::Diverging,
                }),
                NodeKind::Join(kind) => document.gateways.push(GatewayElement {
                    id: node.id.clone(),
                    kind: *kind,
                    direction: GatewayDirection::Converging,
                }),
            }
        }

        document.sequence_flows = self
            .flows()
            .map(|f| FlowElement {
                id: f.id.clone(),
                source_ref: f.source.clone(),
                target_ref: f.target.clone(),
                strong: f.is_strong(),
            })
            .collect();

        document
    }
}

impl InterchangeDocument {
    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Rebuild the process graph; the result is not validated
    pub fn to_graph(&self) -> GraphResult<ProcessGraph> {
        let mut graph = ProcessGraph::new(self.id.clone());
        for id in &self.start_events {
            graph.add_node(Node::start(id.clone()))?;
        }
        for id in &self.end_events {
            graph.add_node(Node::end(id.clone()))?;
        }
        for task in &self.tasks {
            let activity = Activity::new(task.name.clone(), task.duration, task.resources.iter().cloned());
            graph.add_node(Node::activity(task.id.clone(), activity))?;
        }
        for gateway in &self.gateways {
            let node = match gateway.direction {
                GatewayDirection::Diverging => Node::split(gateway.id.clone(), gateway.kind),
                GatewayDirection::Converging => Node::join(gateway.id.clone(), gateway.kind),
            };
            graph.add_node(node)?;
        }
        for element in &self.sequence_flows {
            let mut flow = Flow::new(element.id.clone(), element.source_ref.clone(), element.target_ref.clone());
            if element.strong {
                flow.strength = FlowStrength::Strong;
            }
            graph.add_flow(flow)?;
        }
        Ok(graph)
    }
}

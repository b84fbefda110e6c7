// Node types of a process graph

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{NodeId, ResourceName};

/// Routing behaviour of a gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// One outgoing branch is taken
    Exclusive,
    /// All outgoing branches are taken
    Parallel,
    /// Modelled only; the simulator rejects it
    Inclusive,
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayKind::Exclusive => write!(f, "exclusive"),
            GatewayKind::Parallel => write!(f, "parallel"),
            GatewayKind::Inclusive => write!(f, "inclusive"),
        }
    }
}

/// A unit of work holding its resources for its whole duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Display name, shared by a task and its copies
    pub name: String,

    /// Duration in logical time units
    pub duration: u32,

    /// Resource types required while running
    pub resources: BTreeSet<ResourceName>,
}

impl Activity {
    /// Create a new activity
    pub fn new<I, R>(name: impl Into<String>, duration: u32, resources: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ResourceName>,
    {
        Self {
            name: name.into(),
            duration,
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the two activities compete for at least one resource type
    pub fn shares_resources_with(&self, other: &Activity) -> bool {
        !self.resources.is_disjoint(&other.resources)
    }
}

/// Variant-specific payload of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    End,
    Activity(Activity),
    Split(GatewayKind),
    Join(GatewayKind),
}

/// A node of a process graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within the graph
    pub id: NodeId,

    /// What the node is
    pub kind: NodeKind,
}

impl Node {
    pub fn start(id: impl Into<NodeId>) -> Self {
        Self { id: id.into(), kind: NodeKind::Start }
    }

    pub fn end(id: impl Into<NodeId>) -> Self {
        Self { id: id.into(), kind: NodeKind::End }
    }

    pub fn activity(id: impl Into<NodeId>, activity: Activity) -> Self {
        Self { id: id.into(), kind: NodeKind::Activity(activity) }
    }

    pub fn split(id: impl Into<NodeId>, kind: GatewayKind) -> Self {
        Self { id: id.into(), kind: NodeKind::Split(kind) }
    }

    pub fn join(id: impl Into<NodeId>, kind: GatewayKind) -> Self {
        Self { id: id.into(), kind: NodeKind::Join(kind) }
    }

    /// Same node under another identifier
    pub fn renamed(&self, id: impl Into<NodeId>) -> Self {
        Self { id: id.into(), kind: self.kind.clone() }
    }

    pub fn is_start(&self) -> bool {
        matches!(self.kind, NodeKind::Start)
    }

    pub fn is_end(&self) -> bool {
        matches!(self.kind, NodeKind::End)
    }

    pub fn is_activity(&self) -> bool {
        matches!(self.kind, NodeKind::Activity(_))
    }

    pub fn is_split(&self) -> bool {
        matches!(self.kind, NodeKind::Split(_))
    }

    pub fn is_join(&self) -> bool {
        matches!(self.kind, NodeKind::Join(_))
    }

    /// Splits and joins are gateways
    pub fn is_gateway(&self) -> bool {
        self.gateway_kind().is_some()
    }

    pub fn gateway_kind(&self) -> Option<GatewayKind> {
        match self.kind {
            NodeKind::Split(kind) | NodeKind::Join(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_parallel_gateway(&self) -> bool {
        self.gateway_kind() == Some(GatewayKind::Parallel)
    }

    pub fn is_exclusive_gateway(&self) -> bool {
        self.gateway_kind() == Some(GatewayKind::Exclusive)
    }

    pub fn as_activity(&self) -> Option<&Activity> {
        match &self.kind {
            NodeKind::Activity(activity) => Some(activity),
            _ => None,
        }
    }

    /// Name of the node variant
    pub fn class_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Start => "Start",
            NodeKind::End => "End",
            NodeKind::Activity(_) => "Activity",
            NodeKind::Split(_) => "Split",
            NodeKind::Join(_) => "Join",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Activity(activity) => write!(
                f,
                "{} [{} {}t {:?}]",
                self.id, activity.name, activity.duration, activity.resources
            ),
            NodeKind::Split(kind) | NodeKind::Join(kind) => {
                write!(f, "{} [{} {}]", self.id, kind, self.class_name())
            }
            _ => write!(f, "{} [{}]", self.id, self.class_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_classification() {
        let split = Node::split("g1", GatewayKind::Parallel);
        assert!(split.is_gateway());
        assert!(split.is_parallel_gateway());
        assert!(!split.is_exclusive_gateway());
        assert!(!Node::start("s").is_gateway());

        let task = Node::activity("a1", Activity::new("A1", 5, ["r1"]));
        assert!(!task.is_gateway());
        assert_eq!(task.as_activity().map(|a| a.duration), Some(5));
    }

    #[test]
    fn test_shared_resources() {
        let a = Activity::new("A", 1, ["emp", "drone"]);
        let b = Activity::new("B", 1, ["drone"]);
        let c = Activity::new("C", 1, ["truck"]);
        assert!(a.shares_resources_with(&b));
        assert!(!a.shares_resources_with(&c));
    }

    #[test]
    fn test_renamed_keeps_payload() {
        let task = Node::activity("a1", Activity::new("A1", 5, ["r1"]));
        let copy = task.renamed("a1_4");
        assert_eq!(copy.id, "a1_4");
        assert_eq!(copy.kind, task.kind);
    }
}

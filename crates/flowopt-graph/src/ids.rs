// Fresh identifier minting for rewritten graphs

use serde::{Deserialize, Serialize};

use flowopt_error::{GraphError, GraphResult};

use crate::{FlowId, NodeId, ProcessGraph};

/// Monotonic counter shared by every rewrite of one search
///
/// Gateways are named `gref<n>`, flows `fref<n>` and task copies
/// `<task>_<n>`. Identifiers already present in the target graph are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    counter: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting after `counter`
    pub fn starting_at(counter: u64) -> Self {
        Self { counter }
    }

    /// Last value handed out
    pub fn current(&self) -> u64 {
        self.counter
    }

    fn next_free(&mut self, graph: &ProcessGraph, make: impl Fn(u64) -> String) -> String {
        loop {
            self.counter += 1;
            let candidate = make(self.counter);
            if !graph.contains_node(&candidate) && !graph.contains_flow(&candidate) {
                return candidate;
            }
        }
    }

    /// Fresh gateway identifier
    pub fn gateway(&mut self, graph: &ProcessGraph) -> NodeId {
        self.next_free(graph, |n| format!("gref{n}"))
    }

    /// Fresh flow identifier
    pub fn flow(&mut self, graph: &ProcessGraph) -> FlowId {
        self.next_free(graph, |n| format!("fref{n}"))
    }

    /// Fresh identifier for a copy of `task`
    pub fn task_copy(&mut self, graph: &ProcessGraph, task: &str) -> NodeId {
        self.next_free(graph, |n| format!("{task}_{n}"))
    }
}

/// Whether `id` names `task` itself or one of its copies (`task_<n>`, possibly
/// nested as `task_<n>_<m>`).
///
/// Purely lexical: task ids of the form `<other task>_<digits>` are reserved
/// for copies, which [`check_task_ids`] enforces on authored graphs.
pub fn is_instance_of(id: &str, task: &str) -> bool {
    let Some(rest) = id.strip_prefix(task) else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    rest.split('_')
        .skip(1)
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        && rest.starts_with('_')
}

/// Reject task ids that would be read as copies of another task of `graph`
pub fn check_task_ids(graph: &ProcessGraph) -> GraphResult<()> {
    let tasks = graph.alphabet();
    for id in &tasks {
        if let Some(task) = tasks.iter().find(|t| *t != id && is_instance_of(id, t)) {
            return Err(GraphError::AmbiguousTaskId {
                id: id.clone(),
                task: task.clone(),
            });
        }
    }
    Ok(())
}

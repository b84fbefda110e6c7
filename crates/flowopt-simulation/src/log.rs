//! Simulation log
//!
//! One snapshot of resource levels and task statuses per tick.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use flowopt_graph::{NodeId, ResourceName};

use crate::Tick;

/// Lifecycle of a task within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Waiting,
    Running,
    Completed,
}

/// State recorded at the start of a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub time: Tick,
    pub resources: BTreeMap<ResourceName, u32>,
    pub statuses: BTreeMap<NodeId, TaskStatus>,
}

impl Snapshot {
    /// Whether every listed resource has a replica left at this tick
    pub fn resources_available(&self, required: &BTreeSet<ResourceName>) -> bool {
        required
            .iter()
            .all(|name| self.resources.get(name).is_some_and(|level| *level > 0))
    }
}

/// Ordered snapshots of one run plus the statuses it ended with
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationLog {
    pub entries: Vec<Snapshot>,
    pub final_statuses: BTreeMap<NodeId, TaskStatus>,
}

impl SimulationLog {
    /// Time of the last snapshot, the run's execution time
    pub fn completion_time(&self) -> Tick {
        self.entries.last().map(|s| s.time).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tasks that never left the waiting status, e.g. untaken branches
    pub fn never_started(&self) -> BTreeSet<NodeId> {
        self.tasks_with(TaskStatus::Waiting)
    }

    pub fn completed(&self) -> BTreeSet<NodeId> {
        self.tasks_with(TaskStatus::Completed)
    }

    fn tasks_with(&self, status: TaskStatus) -> BTreeSet<NodeId> {
        self.final_statuses
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

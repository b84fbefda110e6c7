//! Simulation Analyzer
//!
//! Repeated simulation of one graph: average execution time and the tasks
//! that sat waiting while everything they needed was free.

use std::collections::{BTreeMap, BTreeSet};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use flowopt_error::SimulationResult;
use flowopt_graph::{NodeId, ProcessGraph, ResourceName};

use crate::config::SimulationConfig;
use crate::log::{SimulationLog, TaskStatus};
use crate::randomness::pick;
use crate::simulator::simulate;
use crate::Tick;

/// A task observed waiting at `time` although its resources were free
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Candidate {
    pub time: Tick,
    pub task: NodeId,
    pub resources: BTreeSet<ResourceName>,
}

/// Result of [`simulate_and_analyze`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Union over all runs, ordered by time then task
    pub candidates: Vec<Candidate>,
    pub average_execution_time: f64,
    /// Completion time of each run, in run order
    pub completion_times: Vec<Tick>,
}

impl Analysis {
    /// Distinct candidate tasks
    pub fn candidate_tasks(&self) -> BTreeSet<NodeId> {
        self.candidates.iter().map(|c| c.task.clone()).collect()
    }
}

/// Simulate `config.runs` times and aggregate the logs
pub fn simulate_and_analyze<R: RngCore>(
    graph: &ProcessGraph,
    config: &SimulationConfig,
    rng: &mut R,
) -> SimulationResult<Analysis> {
    config.validate()?;

    let mut union: BTreeMap<(Tick, NodeId), Candidate> = BTreeMap::new();
    let mut completion_times = Vec::with_capacity(config.runs as usize);

    for run in 0..config.runs {
        let log = simulate(graph, config, rng)?;
        completion_times.push(log.completion_time());
        for candidate in find_candidates(graph, &log) {
            union
                .entry((candidate.time, candidate.task.clone()))
                .or_insert(candidate);
        }
        debug!(run, completion_time = log.completion_time(), "run analyzed");
    }

    let total: Tick = completion_times.iter().sum();
    let average_execution_time = total as f64 / completion_times.len() as f64;

    Ok(Analysis {
        candidates: union.into_values().collect(),
        average_execution_time,
        completion_times,
    })
}

/// Waiting tasks whose resources were all available, per tick after the first.
///
/// Tasks that never started in this run (untaken branches) are ignored.
pub fn find_candidates(graph: &ProcessGraph, log: &SimulationLog) -> Vec<Candidate> {
    let skipped = log.never_started();
    let mut candidates = Vec::new();

    for snapshot in log.entries.iter().skip(1) {
        for (task, status) in &snapshot.statuses {
            if *status != TaskStatus::Waiting || skipped.contains(task) {
                continue;
            }
            let Some(activity) = graph.activity(task) else {
                continue;
            };
            if snapshot.resources_available(&activity.resources) {
                candidates.push(Candidate {
                    time: snapshot.time,
                    task: task.clone(),
                    resources: activity.resources.clone(),
                });
            }
        }
    }
    candidates
}

/// Tasks whose latest candidate time is the earliest across all tasks
pub fn compute_set_tasks(candidates: &[Candidate]) -> BTreeSet<NodeId> {
    let mut latest: BTreeMap<&str, Tick> = BTreeMap::new();
    for candidate in candidates {
        let time = latest.entry(candidate.task.as_str()).or_insert(candidate.time);
        *time = (*time).max(candidate.time);
    }

    let Some(earliest) = latest.values().min().copied() else {
        return BTreeSet::new();
    };
    latest
        .into_iter()
        .filter(|(_, time)| *time == earliest)
        .map(|(task, _)| task.to_string())
        .collect()
}

/// Random pick among the tasks nearest to Start
pub fn choose_left_first<R: RngCore>(
    graph: &ProcessGraph,
    tasks: &BTreeSet<NodeId>,
    rng: &mut R,
) -> Option<NodeId> {
    let distances = graph.distances_from_start();
    let nearest = tasks.iter().filter_map(|t| distances.get(t)).min().copied()?;
    let closest: Vec<&NodeId> = tasks
        .iter()
        .filter(|t| distances.get(*t) == Some(&nearest))
        .collect();
    pick(rng, &closest).map(|t| (*t).clone())
}

//! Token Simulator
//!
//! Discrete-event execution of a process graph in logical time. Every tick
//! records a snapshot, fires ready tokens until nothing else can move, then
//! advances the clock by one unit.

//-----------------------------------------------------------------------------
// Imports
//-----------------------------------------------------------------------------

use std::collections::{BTreeMap, VecDeque};

use rand::RngCore;
use tracing::{debug, info, trace};

use flowopt_error::{GraphError, SimulationError, SimulationResult};
use flowopt_graph::{validate, GatewayKind, NodeId, NodeKind, ProcessGraph};

use crate::config::SimulationConfig;
use crate::ledger::{compute_resources, ResourceLedger};
use crate::log::{SimulationLog, Snapshot, TaskStatus};
use crate::randomness::pick;
use crate::token::{Token, TokenLocation};
use crate::Tick;

//-----------------------------------------------------------------------------
// Entry point
//-----------------------------------------------------------------------------

/// Run one simulation of `graph` and return its log.
///
/// Exclusive splits draw their branch from `rng`.
pub fn simulate<R: RngCore>(
    graph: &ProcessGraph,
    config: &SimulationConfig,
    rng: &mut R,
) -> SimulationResult<SimulationLog> {
    TokenSimulator::new(graph, config, rng)?.run()
}

//-----------------------------------------------------------------------------
// Simulator state
//-----------------------------------------------------------------------------

/// State of a single run
#[derive(Debug)]
pub struct TokenSimulator<'a, R> {
    graph: &'a ProcessGraph,
    rng: &'a mut R,
    verbose: bool,
    max_ticks: Option<Tick>,
    time: Tick,
    tokens: Vec<Token>,
    next_serial: u64,
    ledger: ResourceLedger,
    statuses: BTreeMap<NodeId, TaskStatus>,
    entries: Vec<Snapshot>,
}

impl<'a, R: RngCore> TokenSimulator<'a, R> {
    /// Prepare a run; fails on malformed graphs and inclusive gateways
    pub fn new(
        graph: &'a ProcessGraph,
        config: &SimulationConfig,
        rng: &'a mut R,
    ) -> SimulationResult<Self> {
        config.validate()?;
        validate(graph)?;
        if let Some(node) = graph
            .nodes()
            .find(|n| n.gateway_kind() == Some(GatewayKind::Inclusive))
        {
            return Err(SimulationError::UnsupportedGateway {
                node: node.id.clone(),
                kind: GatewayKind::Inclusive.to_string(),
            });
        }

        let statuses = graph
            .tasks()
            .into_iter()
            .map(|n| (n.id.clone(), TaskStatus::Waiting))
            .collect();

        let mut simulator = Self {
            graph,
            rng,
            verbose: config.verbose,
            max_ticks: config.max_ticks,
            time: 0,
            tokens: Vec::new(),
            next_serial: 0,
            ledger: compute_resources(graph, config.replicas),
            statuses,
            entries: Vec::new(),
        };

        let start = graph.start_node().ok_or(GraphError::MissingStart)?;
        let first = graph
            .first_outgoing(&start.id)
            .ok_or_else(|| GraphError::arity(start.id.clone(), "has no outgoing flow"))?;
        simulator.spawn(TokenLocation::Flow(first.id.clone()), 0);
        Ok(simulator)
    }

    /// Step until no token is left
    pub fn run(mut self) -> SimulationResult<SimulationLog> {
        while !self.tokens.is_empty() {
            if let Some(limit) = self.max_ticks {
                if self.time >= limit {
                    return Err(SimulationError::TickLimitExceeded { limit });
                }
            }

            self.record_snapshot();
            self.fire_ready_tokens()?;

            // Nothing counting down means nothing can ever be released.
            if !self.tokens.is_empty() && self.tokens.iter().all(Token::is_ready) {
                return Err(SimulationError::Deadlock {
                    time: self.time,
                    pending: self.tokens.len(),
                });
            }

            self.advance_clock();
        }

        debug!(
            process = self.graph.name(),
            completion_time = self.entries.last().map(|s| s.time).unwrap_or(0),
            "simulation finished"
        );
        Ok(SimulationLog {
            entries: self.entries,
            final_statuses: self.statuses,
        })
    }

    fn record_snapshot(&mut self) {
        let snapshot = Snapshot {
            time: self.time,
            resources: self.ledger.levels().clone(),
            statuses: self.statuses.clone(),
        };
        if self.verbose {
            info!(time = snapshot.time, resources = ?snapshot.resources, statuses = ?snapshot.statuses, "tick");
        } else {
            trace!(time = snapshot.time, tokens = self.tokens.len(), "tick");
        }
        self.entries.push(snapshot);
    }

    fn advance_clock(&mut self) {
        self.time += 1;
        for token in self.tokens.iter_mut().filter(|t| t.remaining > 0) {
            token.remaining -= 1;
        }
    }

    //-------------------------------------------------------------------------
    // Firing
    //-------------------------------------------------------------------------

    /// Fire ready tokens until a fixed point. A token that cannot move is
    /// deferred and re-admitted whenever another token fires.
    fn fire_ready_tokens(&mut self) -> SimulationResult<()> {
        let mut ready: VecDeque<u64> = self
            .tokens
            .iter()
            .filter(|t| t.is_ready())
            .map(|t| t.serial)
            .collect();
        let mut deferred: Vec<u64> = Vec::new();

        while let Some(serial) = ready.pop_front() {
            // Joins may have consumed this token already.
            let Some(token) = self.tokens.iter().find(|t| t.serial == serial).cloned() else {
                continue;
            };
            match self.fire(&token)? {
                Some(spawned) => {
                    ready.extend(spawned);
                    ready.extend(deferred.drain(..));
                }
                None => deferred.push(serial),
            }
        }
        Ok(())
    }

    /// Fire one ready token; returns the ready tokens it produced, or `None`
    /// when it has to wait.
    fn fire(&mut self, token: &Token) -> SimulationResult<Option<Vec<u64>>> {
        let graph = self.graph;
        let mut spawned = Vec::new();

        match &token.location {
            TokenLocation::Activity(task) => {
                let activity = graph
                    .activity(task)
                    .ok_or_else(|| GraphError::UnknownNode(task.clone()))?;
                self.remove(token.serial);
                self.ledger.release(&activity.resources);
                self.statuses.insert(task.clone(), TaskStatus::Completed);
                trace!(time = self.time, task = %task, "task completed");
                spawned.push(self.spawn_after(task)?);
            }
            TokenLocation::Flow(flow_id) => {
                let flow = graph
                    .flow(flow_id)
                    .ok_or_else(|| GraphError::UnknownFlow(flow_id.clone()))?;
                let target = graph
                    .node(&flow.target)
                    .ok_or_else(|| GraphError::UnknownNode(flow.target.clone()))?;

                match &target.kind {
                    NodeKind::Activity(activity) => {
                        if !self.ledger.is_available(&activity.resources) {
                            return Ok(None);
                        }
                        self.ledger.acquire(&activity.resources);
                        self.remove(token.serial);
                        self.statuses.insert(target.id.clone(), TaskStatus::Running);
                        trace!(time = self.time, task = %target.id, "task started");
                        let remaining = Tick::from(activity.duration);
                        let serial = self.spawn(TokenLocation::Activity(target.id.clone()), remaining);
                        if remaining == 0 {
                            spawned.push(serial);
                        }
                    }
                    NodeKind::End => {
                        self.remove(token.serial);
                    }
                    NodeKind::Split(GatewayKind::Exclusive) => {
                        let branches = graph.outgoing(&target.id);
                        let Some(chosen) = pick(&mut *self.rng, &branches).map(|f| f.id.clone()) else {
                            return Err(GraphError::arity(target.id.clone(), "has no outgoing flow").into());
                        };
                        self.remove(token.serial);
                        spawned.push(self.spawn(TokenLocation::Flow(chosen), 0));
                    }
                    NodeKind::Split(GatewayKind::Parallel) => {
                        self.remove(token.serial);
                        let branches: Vec<_> = graph.outgoing(&target.id).into_iter().map(|f| f.id.clone()).collect();
                        for branch in branches {
                            spawned.push(self.spawn(TokenLocation::Flow(branch), 0));
                        }
                    }
                    NodeKind::Join(GatewayKind::Exclusive) => {
                        self.remove(token.serial);
                        spawned.push(self.spawn_after(&target.id)?);
                    }
                    NodeKind::Join(GatewayKind::Parallel) => {
                        let mut consumed = Vec::new();
                        for incoming in graph.incoming(&target.id) {
                            match self
                                .tokens
                                .iter()
                                .find(|t| t.is_ready() && t.is_on_flow(&incoming.id))
                            {
                                Some(waiting) => consumed.push(waiting.serial),
                                None => return Ok(None),
                            }
                        }
                        for serial in consumed {
                            self.remove(serial);
                        }
                        spawned.push(self.spawn_after(&target.id)?);
                    }
                    NodeKind::Split(GatewayKind::Inclusive) | NodeKind::Join(GatewayKind::Inclusive) => {
                        return Err(SimulationError::UnsupportedGateway {
                            node: target.id.clone(),
                            kind: GatewayKind::Inclusive.to_string(),
                        });
                    }
                    NodeKind::Start => {
                        return Err(GraphError::arity(target.id.clone(), "has incoming flows").into());
                    }
                }
            }
        }

        Ok(Some(spawned))
    }

    //-------------------------------------------------------------------------
    // Token bookkeeping
    //-------------------------------------------------------------------------

    fn spawn(&mut self, location: TokenLocation, remaining: Tick) -> u64 {
        self.next_serial += 1;
        let serial = self.next_serial;
        self.tokens.push(Token {
            serial,
            location,
            remaining,
        });
        serial
    }

    /// Ready token on the single outgoing flow of `node`
    fn spawn_after(&mut self, node: &str) -> SimulationResult<u64> {
        let next = self
            .graph
            .first_outgoing(node)
            .ok_or_else(|| GraphError::arity(node, "has no outgoing flow"))?;
        Ok(self.spawn(TokenLocation::Flow(next.id.clone()), 0))
    }

    fn remove(&mut self, serial: u64) {
        self.tokens.retain(|t| t.serial != serial);
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randomness::SeededRng;
    use flowopt_graph::testing::{
        drone_contention, exclusive_choice, retry_loop, sequential_pair, ParallelShape, ProcessShape,
    };
    use flowopt_graph::ProcessBuilder;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    fn run(graph: &ProcessGraph, replicas: u32, seed: u64) -> SimulationLog {
        let config = SimulationConfig::default().with_replicas(replicas);
        let mut rng = SeededRng::new(seed);
        simulate(graph, &config, &mut rng).unwrap()
    }

    #[test]
    fn test_sequential_pair_takes_sum_of_durations() {
        let log = run(&sequential_pair().unwrap(), 1, 0);
        assert_eq!(log.completion_time(), 20);
        assert_eq!(log.entries[0].time, 0);
        assert_eq!(log.entries[5].statuses["a1"], TaskStatus::Running);
        assert_eq!(log.entries[5].statuses["a2"], TaskStatus::Waiting);
        assert_eq!(log.entries[5].resources["r1"], 0);
        assert_eq!(log.completed().len(), 2);
    }

    #[test]
    fn test_contention_serializes_branches() {
        let graph = drone_contention().unwrap();
        assert_eq!(run(&graph, 1, 0).completion_time(), 30);
        assert_eq!(run(&graph, 2, 0).completion_time(), 20);
    }

    #[test]
    fn test_exclusive_choice_leaves_one_task_waiting() {
        let graph = exclusive_choice().unwrap();
        let log = run(&graph, 1, 3);
        assert_eq!(log.completion_time(), 10);
        assert_eq!(log.completed().len(), 1);
        assert_eq!(log.never_started().len(), 1);
    }

    #[test]
    fn test_same_seed_replays_identically() {
        let graph = retry_loop().unwrap();
        assert_eq!(run(&graph, 1, 11), run(&graph, 1, 11));
    }

    #[test]
    fn test_zero_duration_task_completes_in_same_tick() {
        let graph = ProcessBuilder::new("instant")
            .start("s")
            .activity("a1", "A1", 0, ["r1"])
            .end("e")
            .flow("f1", "s", "a1")
            .flow("f2", "a1", "e")
            .build()
            .unwrap();
        let log = run(&graph, 1, 0);
        assert_eq!(log.len(), 1);
        assert_eq!(log.completed().len(), 1);
    }

    #[test]
    fn test_unbalanced_parallel_join_deadlocks() {
        // An exclusive split feeding a parallel join can never fire the join.
        let graph = ProcessBuilder::new("unbalanced")
            .start("s")
            .split("x", GatewayKind::Exclusive)
            .activity("a1", "A1", 2, ["r1"])
            .activity("a2", "A2", 2, ["r2"])
            .join("p", GatewayKind::Parallel)
            .end("e")
            .flow("f1", "s", "x")
            .flow("f2", "x", "a1")
            .flow("f3", "x", "a2")
            .flow("f4", "a1", "p")
            .flow("f5", "a2", "p")
            .flow("f6", "p", "e")
            .build()
            .unwrap();
        let config = SimulationConfig::default();
        let err = simulate(&graph, &config, &mut SeededRng::new(1)).unwrap_err();
        assert!(matches!(err, SimulationError::Deadlock { time: 2, pending: 1 }));
    }

    #[test]
    fn test_tick_limit() {
        let graph = sequential_pair().unwrap();
        let config = SimulationConfig::default().with_max_ticks(5);
        let err = simulate(&graph, &config, &mut SeededRng::new(1)).unwrap_err();
        assert_eq!(err, SimulationError::TickLimitExceeded { limit: 5 });
    }

    #[test]
    fn test_inclusive_gateway_is_rejected() {
        let graph = ProcessBuilder::new("inclusive")
            .start("s")
            .split("g1", GatewayKind::Inclusive)
            .activity("a1", "A1", 1, ["r1"])
            .join("g2", GatewayKind::Inclusive)
            .end("e")
            .flow("f1", "s", "g1")
            .flow("f2", "g1", "a1")
            .flow("f3", "a1", "g2")
            .flow("f4", "g2", "e")
            .build()
            .unwrap();
        let err = simulate(&graph, &SimulationConfig::default(), &mut SeededRng::new(1)).unwrap_err();
        assert!(matches!(err, SimulationError::UnsupportedGateway { node, .. } if node == "g1"));
    }

    #[test]
    fn test_malformed_graph_fails_fast() {
        let mut graph = sequential_pair().unwrap();
        graph.remove_flow("f3");
        let err = simulate(&graph, &SimulationConfig::default(), &mut SeededRng::new(1)).unwrap_err();
        assert!(matches!(err, SimulationError::Graph(_)));
    }

    #[quickcheck]
    fn simulation_terminates_with_nothing_running(shape: ProcessShape, seed: u64) -> bool {
        let Ok(graph) = shape.to_graph("generated") else {
            return false;
        };
        let config = SimulationConfig::default().with_max_ticks(10_000);
        let Ok(log) = simulate(&graph, &config, &mut SeededRng::new(seed)) else {
            return false;
        };
        !log.final_statuses.values().any(|s| *s == TaskStatus::Running)
    }

    #[quickcheck]
    fn ledger_stays_within_capacity(shape: ProcessShape, seed: u64) -> bool {
        let Ok(graph) = shape.to_graph("generated") else {
            return false;
        };
        let config = SimulationConfig::default().with_replicas(2);
        let Ok(log) = simulate(&graph, &config, &mut SeededRng::new(seed)) else {
            return false;
        };
        log.entries
            .iter()
            .all(|s| s.resources.values().all(|level| *level <= 2))
            && log.entries.last().is_some()
    }

    #[quickcheck]
    fn parallel_processes_complete_every_task(shape: ParallelShape, seed: u64) -> bool {
        let Ok(graph) = shape.0.to_graph("generated") else {
            return false;
        };
        let Ok(log) = simulate(&graph, &SimulationConfig::default(), &mut SeededRng::new(seed)) else {
            return false;
        };
        log.completed() == graph.alphabet()
    }
}

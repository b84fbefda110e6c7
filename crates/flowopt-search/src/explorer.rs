//! Refactoring Search
//!
//! Breadth-first exploration of rewritten variants of a process. Every
//! explored variant is simulated; its candidate tasks are rewritten one at a
//! time and the results that are valid, keep the strong-flow ordering and
//! have not been seen before are queued.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use flowopt_error::{FlowoptError, RefactorError, SearchResult};
use flowopt_graph::{validate, IdGenerator, NodeId, ProcessGraph};
use flowopt_refactor::{simplify, PatternCatalog, PatternKind};
use flowopt_simulation::{choose_left_first, compute_set_tasks, simulate_and_analyze, Analysis};

use crate::config::{DedupMode, SearchConfig, Strategy};
use crate::dependencies::{compute_dependencies, preserves_dependencies, Dependency};
use crate::equivalence::{structural_equals, structural_hash};

//-----------------------------------------------------------------------------
// Outcome Types
//-----------------------------------------------------------------------------

/// Why a rewritten variant was not queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// No pattern applies to the task
    Unsupported,
    /// The rewrite produced a malformed graph
    Invalid,
    /// A strong-flow ordering was lost
    BrokenDependency,
    /// Structurally equal to a variant already seen
    Duplicate,
    /// The variant could not be simulated
    SimulationFailed,
}

/// Counters collected during one search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub explored: usize,
    /// Variants queued, the input excluded
    pub enqueued: usize,
    /// Distinct structural hashes among explored variants
    pub distinct_hashes: usize,
    pub rejected: BTreeMap<Rejection, usize>,
    /// Rewrites that produced a queued variant
    pub patterns: BTreeMap<PatternKind, usize>,
}

impl SearchStats {
    fn reject(&mut self, reason: Rejection) {
        *self.rejected.entry(reason).or_default() += 1;
    }

    /// Total number of rejected variants
    pub fn total_rejected(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Result of [`compute_optimal_refactoring`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    /// Variant with the lowest average execution time, first found on ties
    pub best: ProcessGraph,
    pub initial_aet: f64,
    pub best_aet: f64,
    /// Explored variants in exploration order, the input first
    pub explored: Vec<ProcessGraph>,
    /// Whether the bound stopped the search with variants still queued
    pub truncated: bool,
    pub stats: SearchStats,
}

impl SearchOutcome {
    /// Whether the best variant beats the input
    pub fn improved(&self) -> bool {
        self.best_aet < self.initial_aet
    }
}

//-----------------------------------------------------------------------------
// Seen Variants
//-----------------------------------------------------------------------------

/// Every variant ever queued; explored and still queued ones alike
struct SeenVariants {
    mode: DedupMode,
    graphs: Vec<ProcessGraph>,
    buckets: BTreeMap<u64, Vec<usize>>,
}

impl SeenVariants {
    fn new(mode: DedupMode) -> Self {
        Self {
            mode,
            graphs: Vec::new(),
            buckets: BTreeMap::new(),
        }
    }

    fn contains(&self, graph: &ProcessGraph, hash: u64) -> bool {
        match self.mode {
            DedupMode::LinearScan => self.graphs.iter().any(|seen| structural_equals(graph, seen)),
            DedupMode::HashBucketed => self
                .buckets
                .get(&hash)
                .is_some_and(|bucket| bucket.iter().any(|&i| structural_equals(graph, &self.graphs[i]))),
        }
    }

    fn insert(&mut self, graph: ProcessGraph, hash: u64) -> usize {
        let index = self.graphs.len();
        self.graphs.push(graph);
        self.buckets.entry(hash).or_default().push(index);
        index
    }

    fn get(&self, index: usize) -> &ProcessGraph {
        &self.graphs[index]
    }
}

//-----------------------------------------------------------------------------
// Search
//-----------------------------------------------------------------------------

/// Explore rewritten variants of `graph` breadth-first, at most
/// `config.exploration_bound` of them, and keep the fastest.
///
/// A failure on the input graph is returned; failures on derived variants
/// only reject that variant.
pub fn compute_optimal_refactoring(graph: &ProcessGraph, config: &SearchConfig) -> SearchResult<SearchOutcome> {
    config.validate()?;
    validate(graph)?;

    let mut rng = config.simulation.rng();
    let mut ids = IdGenerator::new();
    let catalog = PatternCatalog::default();
    let dependencies = compute_dependencies(graph);

    // The input is simulated once; its analysis also seeds the first expansion.
    let analysis = simulate_and_analyze(graph, &config.simulation, &mut rng)?;
    let initial_aet = analysis.average_execution_time;
    let mut input_analysis = Some(analysis);
    info!(
        graph = graph.name(),
        initial_aet,
        dependencies = dependencies.len(),
        strategy = %config.strategy,
        bound = config.exploration_bound,
        "search started"
    );

    let mut seen = SeenVariants::new(config.dedup);
    let mut queue = VecDeque::from([seen.insert(graph.clone(), structural_hash(graph))]);
    let mut explored = Vec::new();
    let mut hashes = BTreeSet::new();
    let mut stats = SearchStats::default();
    let mut best: Option<usize> = None;
    let mut best_aet = initial_aet;

    while explored.len() < config.exploration_bound {
        let Some(index) = queue.pop_front() else {
            break;
        };
        let current = seen.get(index).clone();
        hashes.insert(structural_hash(&current));

        let simulated = match input_analysis.take() {
            Some(analysis) => Ok(analysis),
            None => simulate_and_analyze(&current, &config.simulation, &mut rng),
        };
        let analysis = match simulated {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!(variant = explored.len(), error = %err, "variant failed to simulate");
                stats.reject(Rejection::SimulationFailed);
                explored.push(current);
                continue;
            }
        };

        let aet = analysis.average_execution_time;
        if aet < best_aet {
            best_aet = aet;
            best = Some(index);
        }
        info!(variant = explored.len(), aet, best_aet, queued = queue.len(), "variant explored");

        for task in select_tasks(&analysis, config.strategy) {
            let mut working = current.clone();
            let kind = match catalog.refactor(&current, &mut working, &task, &mut ids) {
                Ok(kind) => kind,
                Err(err) => {
                    log_declined(&task, &err);
                    stats.reject(if err.is_recoverable() {
                        Rejection::Unsupported
                    } else {
                        Rejection::Invalid
                    });
                    continue;
                }
            };

            let candidate = match simplify(&working) {
                Ok(simplified) => simplified,
                Err(err) => {
                    warn!(task = %task, error = %err, "simplification failed");
                    stats.reject(Rejection::Invalid);
                    continue;
                }
            };
            if let Some(reason) = screen(&candidate, &dependencies) {
                debug!(task = %task, ?reason, "variant rejected");
                stats.reject(reason);
                continue;
            }

            let hash = structural_hash(&candidate);
            if seen.contains(&candidate, hash) {
                stats.reject(Rejection::Duplicate);
                continue;
            }
            queue.push_back(seen.insert(candidate, hash));
            stats.enqueued += 1;
            *stats.patterns.entry(kind).or_default() += 1;
        }

        explored.push(current);
    }

    let truncated = !queue.is_empty();
    if truncated {
        warn!(
            bound = config.exploration_bound,
            queued = queue.len(),
            "exploration bound reached"
        );
    }

    stats.explored = explored.len();
    stats.distinct_hashes = hashes.len();
    let best = best.map_or_else(|| graph.clone(), |i| seen.get(i).clone());
    info!(
        initial_aet,
        best_aet,
        explored = stats.explored,
        rejected = stats.total_rejected(),
        truncated,
        "search finished"
    );

    Ok(SearchOutcome {
        best,
        initial_aet,
        best_aet,
        explored,
        truncated,
        stats,
    })
}

fn select_tasks(analysis: &Analysis, strategy: Strategy) -> BTreeSet<NodeId> {
    match strategy {
        Strategy::Exploration => analysis.candidate_tasks(),
        Strategy::Heuristic => compute_set_tasks(&analysis.candidates),
    }
}

fn screen(candidate: &ProcessGraph, dependencies: &BTreeSet<Dependency>) -> Option<Rejection> {
    if let Err(err) = validate(candidate) {
        warn!(error = %err, "rewrite produced a malformed graph");
        return Some(Rejection::Invalid);
    }
    if !preserves_dependencies(candidate, dependencies) {
        return Some(Rejection::BrokenDependency);
    }
    None
}

fn log_declined(task: &str, err: &RefactorError) {
    if err.is_recoverable() {
        debug!(task, error = %err, "rewrite declined");
    } else {
        warn!(task, error = %err, "rewrite failed");
    }
}

//-----------------------------------------------------------------------------
// Stepwise Refactoring
//-----------------------------------------------------------------------------

/// Apply one rewrite per step, up to `max_steps`, always to the candidate
/// nearest to Start. Tasks entered through a strong flow are left alone.
///
/// Returns the graph produced by every step; stops early once no candidate
/// is left or the chosen one cannot be rewritten.
pub fn refactor_stepwise(
    graph: &ProcessGraph,
    config: &SearchConfig,
    max_steps: usize,
) -> SearchResult<Vec<ProcessGraph>> {
    config.validate()?;
    validate(graph)?;

    let mut rng = config.simulation.rng();
    let mut ids = IdGenerator::new();
    let catalog = PatternCatalog::default();
    let mut current = graph.clone();
    let mut steps = Vec::new();

    while steps.len() < max_steps {
        let analysis = simulate_and_analyze(&current, &config.simulation, &mut rng)?;
        let movable: BTreeSet<NodeId> = select_tasks(&analysis, config.strategy)
            .into_iter()
            .filter(|task| !current.first_incoming(task).is_some_and(|f| f.is_strong()))
            .collect();

        let Some(task) = choose_left_first(&current, &movable, &mut rng) else {
            debug!(step = steps.len(), "no candidate left");
            return Ok(steps);
        };

        let mut working = current.clone();
        let kind = match catalog.refactor(&current, &mut working, &task, &mut ids) {
            Ok(kind) => kind,
            Err(err) if err.is_recoverable() => {
                debug!(step = steps.len(), task = %task, error = %err, "stopping at unsupported rewrite");
                return Ok(steps);
            }
            Err(err) => return Err(err.into()),
        };

        let next = simplify(&working)?;
        validate(&next).map_err(RefactorError::from)?;
        info!(
            step = steps.len() + 1,
            task = %task,
            pattern = %kind,
            aet = analysis.average_execution_time,
            "step applied"
        );
        steps.push(next.clone());
        current = next;
    }

    warn!(max_steps, "step limit reached");
    Ok(steps)
}

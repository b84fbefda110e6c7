// Integration tests for the refactoring search

use std::sync::Once;

use anyhow::Result;
use flowopt_graph::testing::{disjoint_chain, drone_contention};
use flowopt_graph::{ProcessBuilder, ProcessGraph};
use flowopt_search::{
    compute_dependencies, compute_optimal_refactoring, preserves_dependencies, refactor_stepwise,
    structural_equals, DedupMode, Rejection, SearchConfig, Strategy,
};
use flowopt_simulation::{simulate_and_analyze, SimulationConfig};
use pretty_assertions::assert_eq;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .try_init();
    });
}

fn config(bound: usize) -> SearchConfig {
    SearchConfig::default()
        .with_simulation(SimulationConfig::default().with_seed(3))
        .with_bound(bound)
}

fn aet(graph: &ProcessGraph) -> Result<f64> {
    let config = SimulationConfig::default().with_seed(3);
    Ok(simulate_and_analyze(graph, &config, &mut config.rng())?.average_execution_time)
}

/// s -> a1 => a2 -> a3 -> e, the a1 => a2 flow is strong
fn strong_chain() -> Result<ProcessGraph> {
    Ok(ProcessBuilder::new("strong-chain")
        .start("s")
        .activity("a1", "A1", 10, ["r1"])
        .activity("a2", "A2", 10, ["r2"])
        .activity("a3", "A3", 10, ["r3"])
        .end("e")
        .flow("f1", "s", "a1")
        .strong_flow("f2", "a1", "a2")
        .flow("f3", "a2", "a3")
        .flow("f4", "a3", "e")
        .build()?)
}

#[test]
fn test_scenario_disjoint_chain_reaches_longest_task() -> Result<()> {
    init_test_logging();
    let graph = disjoint_chain()?;
    let outcome = compute_optimal_refactoring(&graph, &config(10))?;

    assert_eq!(outcome.initial_aet, 30.0);
    assert_eq!(outcome.best_aet, 10.0);
    assert!(outcome.improved());
    assert!(outcome.explored.len() <= 10);
    assert_eq!(outcome.explored[0], graph);
    assert_eq!(aet(&outcome.best)?, 10.0);
    assert_eq!(outcome.best.tasks().len(), 3);
    Ok(())
}

#[test]
fn test_heuristic_strategy_finds_same_optimum() -> Result<()> {
    init_test_logging();
    let graph = disjoint_chain()?;
    let exploration = compute_optimal_refactoring(&graph, &config(10))?;
    let heuristic = compute_optimal_refactoring(&graph, &config(10).with_strategy(Strategy::Heuristic))?;

    assert_eq!(heuristic.best_aet, 10.0);
    assert!(heuristic.stats.enqueued <= exploration.stats.enqueued);
    Ok(())
}

#[test]
fn test_hash_bucketed_dedup() -> Result<()> {
    init_test_logging();
    let outcome = compute_optimal_refactoring(&disjoint_chain()?, &config(10).with_dedup(DedupMode::HashBucketed))?;
    assert_eq!(outcome.best_aet, 10.0);
    assert!(outcome.stats.distinct_hashes >= 1);
    Ok(())
}

#[test]
fn test_bound_truncates_search() -> Result<()> {
    init_test_logging();
    let graph = disjoint_chain()?;
    let outcome = compute_optimal_refactoring(&graph, &config(1))?;

    assert!(outcome.truncated);
    assert_eq!(outcome.explored.len(), 1);
    assert_eq!(outcome.best, graph);
    assert_eq!(outcome.best_aet, outcome.initial_aet);
    Ok(())
}

#[test]
fn test_strong_flows_are_respected() -> Result<()> {
    init_test_logging();
    let graph = strong_chain()?;
    let dependencies = compute_dependencies(&graph);
    let outcome = compute_optimal_refactoring(&graph, &config(20))?;

    assert_eq!(outcome.initial_aet, 30.0);
    assert_eq!(outcome.best_aet, 20.0);
    assert!(outcome.stats.rejected.get(&Rejection::BrokenDependency).is_some_and(|n| *n > 0));
    assert!(outcome
        .explored
        .iter()
        .all(|g| preserves_dependencies(g, &dependencies)));
    Ok(())
}

#[test]
fn test_explored_variants_are_distinct() -> Result<()> {
    init_test_logging();
    let outcome = compute_optimal_refactoring(&disjoint_chain()?, &config(10))?;
    for (later, graph) in outcome.explored.iter().enumerate() {
        for earlier in &outcome.explored[..later] {
            assert!(!structural_equals(graph, earlier));
            assert!(!structural_equals(earlier, graph));
        }
    }
    Ok(())
}

#[test]
fn test_contention_cannot_be_improved() -> Result<()> {
    init_test_logging();
    let outcome = compute_optimal_refactoring(&drone_contention()?, &config(10))?;
    assert_eq!(outcome.initial_aet, 30.0);
    assert_eq!(outcome.best_aet, 30.0);
    assert!(!outcome.improved());
    Ok(())
}

#[test]
fn test_stepwise_chain() -> Result<()> {
    init_test_logging();
    let steps = refactor_stepwise(&disjoint_chain()?, &config(10), 5)?;
    assert_eq!(steps.len(), 2);
    assert_eq!(aet(&steps[0])?, 20.0);
    assert_eq!(aet(&steps[1])?, 10.0);
    Ok(())
}

#[test]
fn test_stepwise_keeps_strong_successor_in_place() -> Result<()> {
    init_test_logging();
    let graph = strong_chain()?;
    let dependencies = compute_dependencies(&graph);
    // a2 is entered through the strong flow, so the first step moves a3
    let steps = refactor_stepwise(&graph, &config(10), 1)?;
    assert_eq!(steps.len(), 1);
    assert!(preserves_dependencies(&steps[0], &dependencies));
    assert_eq!(aet(&steps[0])?, 20.0);
    Ok(())
}

#[test]
fn test_outcome_serializes() -> Result<()> {
    let outcome = compute_optimal_refactoring(&disjoint_chain()?, &config(3))?;
    let stats = serde_json::to_value(&outcome.stats)?;
    assert_eq!(stats["explored"], 3);
    assert!(stats["patterns"].get("SEQ").is_some());

    let text = r#"
strategy = "heuristic"
exploration_bound = 3

[simulation]
seed = 3
"#;
    let from_toml = SearchConfig::from_toml_str(text)?;
    assert_eq!(from_toml.strategy, Strategy::Heuristic);
    assert!(compute_optimal_refactoring(&disjoint_chain()?, &from_toml)?.best_aet <= 30.0);
    Ok(())
}

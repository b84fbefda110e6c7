//! flowopt Search
//!
//! Breadth-first exploration of refactored variants of a process, keeping
//! the one with the lowest average execution time.
//!
//! ## Core Components
//!
//! - **Equivalence**: structural hash and approximate structural equality
//!   used to avoid exploring the same variant twice
//! - **Dependencies**: ordering obligations carried by strong flows
//! - **Explorer**: the bounded search loop and the greedy stepwise driver
//!
//! ```rust,no_run
//! use flowopt_search::{compute_optimal_refactoring, SearchConfig, Strategy};
//! # fn demo(graph: &flowopt_graph::ProcessGraph) -> flowopt_search::SearchResult<()> {
//! let config = SearchConfig::default().with_strategy(Strategy::Heuristic).with_bound(50);
//! let outcome = compute_optimal_refactoring(graph, &config)?;
//! println!("{} -> {}", outcome.initial_aet, outcome.best_aet);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dependencies;
pub mod equivalence;
pub mod explorer;

pub use config::{DedupMode, SearchConfig, Strategy};
pub use dependencies::{compute_dependencies, preserves_dependencies, Dependency};
pub use equivalence::{match_node, structural_equals, structural_hash};
pub use explorer::{compute_optimal_refactoring, refactor_stepwise, Rejection, SearchOutcome, SearchStats};

pub use flowopt_error::{SearchError, SearchResult};

//! flowopt Simulation
//!
//! Logical-time token simulation of process graphs under finite shared
//! resources, and the analysis that turns simulation logs into average
//! execution times and "could have started earlier" candidates.
//!
//! ## Core Components
//!
//! - **ResourceLedger**: replica counts per resource type
//! - **TokenSimulator**: single-threaded stepper producing a [`SimulationLog`]
//! - **Analyzer**: repeated runs, AET and candidate extraction
//!
//! ```rust,no_run
//! use flowopt_simulation::{simulate_and_analyze, SimulationConfig};
//! # fn demo(graph: &flowopt_graph::ProcessGraph) -> flowopt_error::SimulationResult<()> {
//! let config = SimulationConfig::default().with_replicas(2).with_seed(7);
//! let mut rng = config.rng();
//! let analysis = simulate_and_analyze(graph, &config, &mut rng)?;
//! println!("AET = {}", analysis.average_execution_time);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod ledger;
pub mod log;
pub mod randomness;
pub mod simulator;
pub mod token;

pub use analyzer::{
    choose_left_first, compute_set_tasks, find_candidates, simulate_and_analyze, Analysis, Candidate,
};
pub use config::SimulationConfig;
pub use ledger::{compute_resources, ResourceLedger};
pub use log::{SimulationLog, Snapshot, TaskStatus};
pub use randomness::{pick, SeededRng};
pub use simulator::{simulate, TokenSimulator};
pub use token::{Token, TokenLocation};

pub use flowopt_error::{SimulationError, SimulationResult};

/// Logical time unit
pub type Tick = u64;

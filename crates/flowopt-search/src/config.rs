//! Configuration for Search
//!
//! Exploration parameters on top of the simulation settings used to score
//! every explored variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use flowopt_error::{ensure, ConfigError, ConfigResult};
use flowopt_simulation::SimulationConfig;

//-----------------------------------------------------------------------------
// Strategy
//-----------------------------------------------------------------------------

/// Which candidate tasks are rewritten from an explored graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Every task seen waiting with free resources
    #[default]
    Exploration,
    /// Only the tasks whose last wait ends earliest
    Heuristic,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Exploration => write!(f, "exploration"),
            Strategy::Heuristic => write!(f, "heuristic"),
        }
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exploration" => Ok(Strategy::Exploration),
            "heuristic" => Ok(Strategy::Heuristic),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// How new variants are compared against the ones already seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    /// Compare with every seen variant
    #[default]
    LinearScan,
    /// Compare only with seen variants of the same structural hash
    HashBucketed,
}

//-----------------------------------------------------------------------------
// Configuration Structures
//-----------------------------------------------------------------------------

/// Search configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Settings for scoring each variant
    pub simulation: SimulationConfig,

    pub strategy: Strategy,

    /// Maximum number of explored variants
    pub exploration_bound: usize,

    pub dedup: DedupMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            strategy: Strategy::default(),
            exploration_bound: 1000,
            dedup: DedupMode::default(),
        }
    }
}

impl SearchConfig {
    pub fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = simulation;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_bound(mut self, exploration_bound: usize) -> Self {
        self.exploration_bound = exploration_bound;
        self
    }

    pub fn with_dedup(mut self, dedup: DedupMode) -> Self {
        self.dedup = dedup;
        self
    }

    /// Check value ranges, including the nested simulation settings
    pub fn validate(&self) -> ConfigResult<()> {
        self.simulation.validate()?;
        ensure!(
            self.exploration_bound > 0,
            ConfigError::invalid("exploration_bound", "must be at least 1")
        );
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

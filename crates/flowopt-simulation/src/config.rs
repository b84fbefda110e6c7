//! Configuration for Simulation
//!
//! Run parameters shared by the simulator and the analyzer.

use serde::{Deserialize, Serialize};

use flowopt_error::{ensure, ConfigError, ConfigResult};

use crate::randomness::SeededRng;

//-----------------------------------------------------------------------------
// Configuration Structures
//-----------------------------------------------------------------------------

/// Simulation run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Replicas available for every resource type
    pub replicas: u32,

    /// Runs averaged by one analysis
    pub runs: u32,

    /// Log every snapshot at info level
    pub verbose: bool,

    /// Seed for exclusive-gateway choices; drawn from entropy when absent
    pub seed: Option<u64>,

    /// Abort a run that is still going after this many ticks
    pub max_ticks: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            replicas: 1,
            runs: 1,
            verbose: false,
            seed: None,
            max_ticks: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn with_runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        ensure!(self.replicas > 0, ConfigError::invalid("replicas", "must be at least 1"));
        ensure!(self.runs > 0, ConfigError::invalid("runs", "must be at least 1"));
        ensure!(
            self.max_ticks != Some(0),
            ConfigError::invalid("max_ticks", "must be at least 1")
        );
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Random source for this configuration
    pub fn rng(&self) -> SeededRng {
        match self.seed {
            Some(seed) => SeededRng::new(seed),
            None => SeededRng::from_entropy(),
        }
    }
}

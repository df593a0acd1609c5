//! Run configuration loading.
//!
//! A run config describes one headless battle setup: seed, player
//! strategy, rules and an optional catalog file. It is read from RON and
//! individual fields can be overridden from the command line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arena_core::catalog::Catalog;
use arena_core::config::BattleConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strategies::PlayerStrategy;

/// Error type for run config operations.
#[derive(Error, Debug)]
pub enum RunConfigError {
    /// File not found.
    #[error("Run config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read run config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse run config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The catalog or rules are unusable.
    #[error("Invalid game data: {0}")]
    Game(#[from] arena_core::error::GameError),
}

/// A complete headless run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Run name, used in reports.
    pub name: String,
    /// Seed for the battle's random source.
    pub seed: u64,
    /// How the player side plays.
    pub strategy: PlayerStrategy,
    /// Battle-clock milliseconds between player decisions.
    pub decision_interval_ms: u64,
    /// Battle rules.
    pub battle: BattleConfig,
    /// Catalog file; the standard catalog when absent.
    pub catalog_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: "standard".to_string(),
            seed: 0,
            strategy: PlayerStrategy::Random,
            decision_interval_ms: 1_000,
            battle: BattleConfig::default(),
            catalog_path: None,
        }
    }
}

impl RunConfig {
    /// Load a run config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RunConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RunConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, RunConfigError> {
        let config: RunConfig = ron::from_str(ron)?;
        Ok(config)
    }

    /// Load the configured catalog and check the rules against it.
    pub fn catalog(&self) -> Result<Arc<Catalog>, RunConfigError> {
        let catalog = match &self.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::standard(),
        };
        self.battle.validate(&catalog)?;
        Ok(Arc::new(catalog))
    }

    /// Builder: set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: set the player strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: PlayerStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

//! Headless battle runner for strategy testing and CI verification.
//!
//! This crate runs `arena_core` battles without graphics. It provides:
//!
//! - **Single runs**: One seeded battle with a scripted player strategy
//! - **Batch runs**: Many seeded battles in parallel, summarized
//! - **Interactive control**: JSON commands on stdin, state on stdout
//! - **Catalog validation**: Check a catalog RON file before shipping it
//!
//! # Protocol
//!
//! Interactive mode uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (start, place, tick, ...)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See the [`protocol`] module for the full command/response format.

pub mod batch;
pub mod game_runner;
pub mod metrics;
pub mod protocol;
pub mod run_config;
pub mod runner;
pub mod strategies;
pub mod validate;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use game_runner::{run_game, GameResult, GameRunner};
pub use metrics::{BatchSummary, GameMetrics};
pub use protocol::{Command, Response, StateView};
pub use run_config::{RunConfig, RunConfigError};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use strategies::{PlannedPlay, PlayerStrategy};
pub use validate::{validate_catalog, CatalogReport};

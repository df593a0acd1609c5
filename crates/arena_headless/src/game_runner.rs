//! Real battle execution for headless testing.
//!
//! Runs a battle through `arena_core`'s public API, letting a scripted
//! [`PlayerStrategy`] drive the player's hand while the built-in opponent
//! policy plays the other side, and collects [`GameMetrics`].

use std::time::Instant;

use tracing::{debug, info, trace, warn};

use arena_core::battle::Battle;
use arena_core::rng::SeededRandom;

use crate::metrics::GameMetrics;
use crate::run_config::{RunConfig, RunConfigError};
use crate::strategies::PlayerStrategy;

/// Mixed into the battle seed so the player's decisions draw from their
/// own stream and never perturb the battle's.
const PLAYER_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Ticks beyond the configured duration before a run is abandoned.
const TICK_SLACK: u64 = 16;

/// Progress logging interval (ticks).
const PROGRESS_LOG_INTERVAL: u64 = 300;

/// Outcome of one headless battle.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// Wall-clock time spent simulating.
    pub wall_time_ms: u64,
}

/// High-level game runner for headless testing.
#[derive(Debug, Clone, Default)]
pub struct GameRunner {
    config: RunConfig,
}

impl GameRunner {
    /// Create a runner for the given configuration.
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Configuration used for every run.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run one battle with the configured seed.
    pub fn run(&self) -> Result<GameResult, RunConfigError> {
        run_game(&self.config)
    }

    /// Run one battle with a different seed.
    pub fn run_seed(&self, seed: u64) -> Result<GameResult, RunConfigError> {
        run_game(&self.config.clone().with_seed(seed))
    }
}

/// Run a complete battle and collect its metrics.
///
/// # Errors
///
/// Fails if the catalog cannot be loaded or the rules do not fit it.
pub fn run_game(config: &RunConfig) -> Result<GameResult, RunConfigError> {
    let started = Instant::now();
    let catalog = config.catalog()?;
    let game_id = format!("{}_{}", config.name, config.seed);

    info!(
        game_id = %game_id,
        seed = config.seed,
        strategy = %config.strategy,
        "Starting battle simulation"
    );

    let mut battle = Battle::new(
        catalog,
        config.battle.clone(),
        Box::new(SeededRandom::from_seed(config.seed)),
    )?;
    let mut player_rng = SeededRandom::from_seed(config.seed ^ PLAYER_SEED_SALT);
    let mut metrics = GameMetrics::new(game_id, config.seed, config.strategy.to_string());

    let max_ticks = config.battle.duration_ms / config.battle.tick_ms + TICK_SLACK;
    let interval = config.decision_interval_ms.max(config.battle.tick_ms);
    let mut next_decision_ms = 0;

    while battle.is_running() {
        if metrics.duration_ticks >= max_ticks {
            warn!(ticks = metrics.duration_ticks, "Battle exceeded tick limit, abandoning");
            break;
        }

        if battle.clock_ms() >= next_decision_ms {
            next_decision_ms = battle.clock_ms() + interval;
            play_turn(&mut battle, config.strategy, &mut player_rng);
        }

        let report = battle.tick();
        metrics.record_tick(&report);

        if metrics.duration_ticks % PROGRESS_LOG_INTERVAL == 0 {
            debug!(
                tick = metrics.duration_ticks,
                units = battle.units().len(),
                elixir = %battle.elixir(),
                "Battle progress"
            );
        }
    }

    if let Some(result) = battle.result() {
        metrics.finalize(result, battle.state_hash());
    }

    let wall_time_ms = started.elapsed().as_millis() as u64;
    info!(
        winner = %metrics.winner,
        reason = %metrics.win_condition,
        crowns = format!("{}-{}", metrics.player_crowns, metrics.opponent_crowns),
        wall_time_ms,
        "Battle complete"
    );

    Ok(GameResult {
        metrics,
        wall_time_ms,
    })
}

fn play_turn(battle: &mut Battle, strategy: PlayerStrategy, rng: &mut SeededRandom) {
    let Some(play) = strategy.decide(battle, rng) else {
        return;
    };
    match battle.place_card(play.card, play.position) {
        Ok(unit) => trace!(card = %play.card, %unit, "Player played card"),
        Err(e) => debug!(card = %play.card, error = %e, "Player play rejected"),
    }
}

//! Scripted opponent.
//!
//! The opponent keeps its own elixir pool, accrued from the battle clock,
//! and plays a random affordable card at a random spot in its half of the
//! arena every few seconds. State is owned by the battle and reset at the
//! start of each one, so two battles never share it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{CardId, Catalog};
use crate::config::BattleConfig;
use crate::math::{floor_u32, fixed_serde, Fixed, Point};
use crate::rng::RandomSource;

/// Minimum battle-clock gap between two elixir accruals.
pub const ACCRUAL_INTERVAL_MS: u64 = 100;

/// Lateral spread of opponent placements (`x` in `[-8, 8)`).
const PLACEMENT_WIDTH: f64 = 16.0;

/// Nearest placement row to the river.
const PLACEMENT_NEAR_Z: f64 = 1.0;

/// Depth of the placement area (`z` in `[1, 12)`).
const PLACEMENT_DEPTH: f64 = 11.0;

/// A card the opponent decided to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpponentPlay {
    /// Card to play.
    pub card: CardId,
    /// Where to spawn it.
    pub position: Point,
}

/// Elixir and pacing state of the scripted opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentPolicy {
    #[serde(with = "fixed_serde")]
    elixir: Fixed,
    last_accrual_ms: u64,
    last_play_ms: Option<u64>,
}

impl OpponentPolicy {
    /// Fresh policy for a battle starting at clock 0.
    #[must_use]
    pub fn new(config: &BattleConfig) -> Self {
        Self {
            elixir: config.opponent_starting_elixir,
            last_accrual_ms: 0,
            last_play_ms: None,
        }
    }

    /// Reinitialize for a new battle.
    pub fn reset(&mut self, config: &BattleConfig) {
        *self = Self::new(config);
    }

    /// Current elixir.
    #[must_use]
    pub fn elixir(&self) -> Fixed {
        self.elixir
    }

    /// Battle clock of the last play, if any.
    #[must_use]
    pub fn last_play_ms(&self) -> Option<u64> {
        self.last_play_ms
    }

    /// Accrue elixir for the time elapsed since the last accrual.
    ///
    /// The rate doubles once `remaining_ms` drops below the late phase.
    pub fn accrue(&mut self, now_ms: u64, remaining_ms: u64, config: &BattleConfig) {
        let elapsed = now_ms.saturating_sub(self.last_accrual_ms);
        if elapsed < ACCRUAL_INTERVAL_MS {
            return;
        }
        let rate = if remaining_ms < config.late_phase_ms {
            config.opponent_late_elixir_rate
        } else {
            config.opponent_elixir_rate
        };
        let gained = Fixed::saturating_from_num(elapsed) * rate / Fixed::from_num(1000);
        self.elixir = (self.elixir + gained).min(config.elixir_cap);
        self.last_accrual_ms = now_ms;
    }

    /// Decide whether to play a card now, deducting its cost if so.
    pub fn decide(
        &mut self,
        now_ms: u64,
        config: &BattleConfig,
        catalog: &Catalog,
        rng: &mut dyn RandomSource,
    ) -> Option<OpponentPlay> {
        let rested = self
            .last_play_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= config.opponent_play_interval_ms);
        let available = floor_u32(self.elixir);
        if !rested || available < config.opponent_min_elixir {
            return None;
        }

        let affordable: Vec<_> = catalog.affordable(available).collect();
        if affordable.is_empty() {
            return None;
        }
        let card = affordable[rng.gen_index(affordable.len())];

        let x = (rng.next_unit() - 0.5) * PLACEMENT_WIDTH;
        let z = PLACEMENT_NEAR_Z + rng.next_unit() * PLACEMENT_DEPTH;

        self.elixir -= Fixed::from_num(card.cost);
        self.last_play_ms = Some(now_ms);
        debug!(card = %card.id, x, z, elixir = %self.elixir, "opponent plays");

        Some(OpponentPlay {
            card: card.id,
            position: Point::from_f64(x, z),
        })
    }

    /// Accrue, then maybe play.
    pub fn update(
        &mut self,
        now_ms: u64,
        remaining_ms: u64,
        config: &BattleConfig,
        catalog: &Catalog,
        rng: &mut dyn RandomSource,
    ) -> Option<OpponentPlay> {
        self.accrue(now_ms, remaining_ms, config);
        self.decide(now_ms, config, catalog, rng)
    }
}

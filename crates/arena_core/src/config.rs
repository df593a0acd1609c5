//! Tunable battle parameters.
//!
//! Defaults reproduce the standard ruleset. Hosts can override any
//! subset from RON; missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::catalog::{CardId, Catalog};
use crate::error::{GameError, Result};
use crate::math::{decimal_serde, fixed_int, fixed_ratio, Fixed};

/// Number of cards in the player's hand.
pub const HAND_SIZE: usize = 4;

/// Battle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Total battle length in milliseconds.
    pub duration_ms: u64,
    /// Simulated time per tick in milliseconds.
    pub tick_ms: u64,
    /// Remaining time (ms) at which the late phase starts.
    pub late_phase_ms: u64,

    /// Player elixir at battle start.
    #[serde(with = "decimal_serde")]
    pub player_starting_elixir: Fixed,
    /// Opponent elixir at battle start.
    #[serde(with = "decimal_serde")]
    pub opponent_starting_elixir: Fixed,
    /// Elixir cap for both sides.
    #[serde(with = "decimal_serde")]
    pub elixir_cap: Fixed,
    /// Player elixir per second before the late phase.
    #[serde(with = "decimal_serde")]
    pub player_elixir_rate: Fixed,
    /// Player elixir per second during the late phase.
    #[serde(with = "decimal_serde")]
    pub player_late_elixir_rate: Fixed,
    /// Opponent elixir per second before the late phase.
    #[serde(with = "decimal_serde")]
    pub opponent_elixir_rate: Fixed,
    /// Opponent elixir per second during the late phase.
    #[serde(with = "decimal_serde")]
    pub opponent_late_elixir_rate: Fixed,

    /// Minimum milliseconds between opponent plays.
    pub opponent_play_interval_ms: u64,
    /// Minimum whole elixir before the opponent considers playing.
    pub opponent_min_elixir: u32,

    /// Health of each archer tower.
    pub side_tower_health: u32,
    /// Health of the king tower.
    pub king_tower_health: u32,
    /// Per-tick probability that archer towers fire a volley.
    pub tower_volley_chance: f64,
    /// Damage carried by each tower arrow.
    pub arrow_damage: u32,

    /// Crowns that end the battle.
    pub crowns_to_win: u32,
    /// Gold for winning by destroying the king tower.
    pub king_win_gold: u32,
    /// Gold for losing to a destroyed king tower.
    pub king_loss_gold: u32,
    /// Gold for winning on time or crowns.
    pub timeout_win_gold: u32,
    /// Gold for losing or drawing on time or crowns.
    pub timeout_loss_gold: u32,

    /// Player hand at battle start.
    pub starting_hand: [CardId; HAND_SIZE],
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            duration_ms: 180_000,
            tick_ms: 100,
            late_phase_ms: 90_000,
            player_starting_elixir: fixed_int(5),
            opponent_starting_elixir: fixed_int(5),
            elixir_cap: fixed_int(10),
            player_elixir_rate: fixed_ratio(3, 5),
            player_late_elixir_rate: fixed_ratio(3, 10),
            opponent_elixir_rate: fixed_ratio(3, 20),
            opponent_late_elixir_rate: fixed_ratio(3, 10),
            opponent_play_interval_ms: 4_000,
            opponent_min_elixir: 2,
            side_tower_health: 2_000,
            king_tower_health: 4_000,
            tower_volley_chance: 0.1,
            arrow_damage: 150,
            crowns_to_win: 3,
            king_win_gold: 200,
            king_loss_gold: 100,
            timeout_win_gold: 100,
            timeout_loss_gold: 50,
            starting_hand: [CardId(0), CardId(1), CardId(2), CardId(3)],
        }
    }
}

impl BattleConfig {
    /// Parse a configuration from RON. Missing fields take default values.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] for malformed RON.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::InvalidConfig(e.to_string()))
    }

    /// Check the configuration against a catalog.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if a value is unusable, or
    /// [`GameError::UnknownCard`] if a starting card is not in the catalog.
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(GameError::InvalidConfig("tick_ms must be positive".into()));
        }
        if self.side_tower_health == 0 || self.king_tower_health == 0 {
            return Err(GameError::InvalidConfig("tower health must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.tower_volley_chance) {
            return Err(GameError::InvalidConfig(
                "tower_volley_chance must be within [0, 1]".into(),
            ));
        }
        for (i, card) in self.starting_hand.iter().enumerate() {
            if catalog.card(*card).is_none() {
                return Err(GameError::UnknownCard(*card));
            }
            if self.starting_hand[..i].contains(card) {
                return Err(GameError::InvalidConfig(format!(
                    "card {card} appears twice in the starting hand"
                )));
            }
        }
        Ok(())
    }

    /// Tick length as a fraction of a second.
    #[must_use]
    pub fn tick_seconds(&self) -> Fixed {
        fixed_ratio(self.tick_ms.min(i32::MAX as u64) as i32, 1000)
    }
}

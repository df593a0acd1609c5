//! Battle metrics collection.
//!
//! Per-battle metrics are gathered from tick reports while a battle runs
//! and rolled up into a [`BatchSummary`] for batch runs.

use std::collections::BTreeMap;

use arena_core::battle::{BattleResult, TickReport};
use arena_core::components::Side;
use arena_core::events::BattleEvent;
use serde::{Deserialize, Serialize};

/// Complete metrics for a single battle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Random seed used.
    pub seed: u64,
    /// Player strategy name.
    pub strategy: String,
    /// Ticks simulated.
    pub duration_ticks: u64,
    /// Battle clock at the end.
    pub duration_ms: u64,
    /// `"player"` or `"opponent"`.
    pub winner: String,
    /// How the battle ended.
    pub win_condition: String,
    /// Crowns scored by the player.
    pub player_crowns: u32,
    /// Crowns scored by the opponent.
    pub opponent_crowns: u32,
    /// Gold the player earned.
    pub gold: u32,
    /// Cards the player played.
    pub player_cards: u32,
    /// Cards the opponent played.
    pub opponent_cards: u32,
    /// Units that died, per side.
    pub units_lost: BTreeMap<String, u32>,
    /// Tower damage dealt, per attacking side.
    pub tower_damage: BTreeMap<String, u32>,
    /// Final battle state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create a new metrics record.
    #[must_use]
    pub fn new(game_id: impl Into<String>, seed: u64, strategy: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            seed,
            strategy: strategy.into(),
            ..Default::default()
        }
    }

    /// Fold one tick report into the metrics.
    pub fn record_tick(&mut self, report: &TickReport) {
        self.duration_ticks += 1;
        self.duration_ms = report.clock_ms;
        for event in &report.events {
            match event {
                BattleEvent::UnitSpawned { side, .. } => match side {
                    Side::Player => self.player_cards += 1,
                    Side::Opponent => self.opponent_cards += 1,
                },
                BattleEvent::UnitDied { side, .. } => {
                    *self.units_lost.entry(side.to_string()).or_insert(0) += 1;
                }
                BattleEvent::TowerDamaged { side, damage, .. } => {
                    *self
                        .tower_damage
                        .entry(side.opposite().to_string())
                        .or_insert(0) += damage;
                }
                _ => {}
            }
        }
    }

    /// Finalize with the battle outcome.
    pub fn finalize(&mut self, result: &BattleResult, final_state_hash: u64) {
        self.winner = result.winner.to_string();
        self.win_condition = result.reason.to_string();
        self.player_crowns = result.player_crowns;
        self.opponent_crowns = result.opponent_crowns;
        self.gold = result.gold;
        self.duration_ms = result.clock_ms;
        self.final_state_hash = final_state_hash;
    }

    /// Whether the player won.
    #[must_use]
    pub fn player_won(&self) -> bool {
        self.winner == Side::Player.to_string()
    }
}

/// Summary statistics across a batch of battles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total battles.
    pub total_games: u32,
    /// Battles the player won.
    pub player_wins: u32,
    /// Player win rate (0.0 to 1.0).
    pub win_rate: f64,
    /// Average player crowns.
    pub avg_player_crowns: f64,
    /// Average opponent crowns.
    pub avg_opponent_crowns: f64,
    /// Average battle length in milliseconds.
    pub avg_duration_ms: f64,
    /// Average gold earned.
    pub avg_gold: f64,
    /// How many battles ended each way.
    pub end_reasons: BTreeMap<String, u32>,
}

impl BatchSummary {
    /// Build summary from game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let total = games.len() as f64;
        let mut summary = Self {
            total_games: games.len() as u32,
            ..Self::default()
        };

        let mut crowns = (0u64, 0u64);
        let mut duration = 0u64;
        let mut gold = 0u64;
        for game in games {
            if game.player_won() {
                summary.player_wins += 1;
            }
            crowns.0 += u64::from(game.player_crowns);
            crowns.1 += u64::from(game.opponent_crowns);
            duration += game.duration_ms;
            gold += u64::from(game.gold);
            *summary
                .end_reasons
                .entry(game.win_condition.clone())
                .or_insert(0) += 1;
        }

        summary.win_rate = f64::from(summary.player_wins) / total;
        summary.avg_player_crowns = crowns.0 as f64 / total;
        summary.avg_opponent_crowns = crowns.1 as f64 / total;
        summary.avg_duration_ms = duration as f64 / total;
        summary.avg_gold = gold as f64 / total;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::arena::TowerSlot;
    use arena_core::components::UnitId;

    fn game(winner: Side, crowns: (u32, u32), duration_ms: u64) -> GameMetrics {
        GameMetrics {
            winner: winner.to_string(),
            win_condition: "time expired".to_string(),
            player_crowns: crowns.0,
            opponent_crowns: crowns.1,
            duration_ms,
            gold: if winner == Side::Player { 100 } else { 50 },
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_empty() {
        let summary = BatchSummary::from_games(&[]);
        assert_eq!(summary.total_games, 0);
        assert_eq!(summary.win_rate, 0.0);
    }

    #[test]
    fn test_summary_averages() {
        let games = vec![
            game(Side::Player, (2, 1), 180_000),
            game(Side::Opponent, (0, 1), 120_000),
        ];
        let summary = BatchSummary::from_games(&games);
        assert_eq!(summary.total_games, 2);
        assert_eq!(summary.player_wins, 1);
        assert!((summary.win_rate - 0.5).abs() < 1e-9);
        assert!((summary.avg_player_crowns - 1.0).abs() < 1e-9);
        assert!((summary.avg_opponent_crowns - 1.0).abs() < 1e-9);
        assert!((summary.avg_duration_ms - 150_000.0).abs() < 1e-9);
        assert!((summary.avg_gold - 75.0).abs() < 1e-9);
        assert_eq!(summary.end_reasons["time expired"], 2);
    }

    #[test]
    fn test_record_tick_counts_events() {
        let mut metrics = GameMetrics::new("g", 1, "random");
        metrics.record_tick(&TickReport {
            clock_ms: 100,
            events: vec![
                BattleEvent::UnitDied {
                    unit: UnitId(3),
                    side: Side::Opponent,
                },
                BattleEvent::TowerDamaged {
                    attacker: UnitId(1),
                    side: Side::Opponent,
                    slot: TowerSlot::Left,
                    damage: 120,
                },
            ],
            outcome: None,
        });
        assert_eq!(metrics.duration_ticks, 1);
        assert_eq!(metrics.units_lost["opponent"], 1);
        assert_eq!(metrics.tower_damage["player"], 120);
    }
}

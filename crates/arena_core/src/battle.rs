//! Battle orchestrator.
//!
//! A [`Battle`] owns everything scoped to one match: the clock, both
//! elixir pools, crowns, towers, units, projectiles, the player's hand and
//! the scripted opponent. Hosts drive it with [`Battle::tick`] (one fixed
//! step) or [`Battle::advance`] (wall time in, whole ticks out), and issue
//! [`Battle::place_card`] between ticks.
//!
//! # Tick order
//!
//! 1. Clock: remaining time drops by one tick.
//! 2. Player elixir accrues.
//! 3. Movement (targeting and engagement from start-of-tick positions).
//! 4. Combat, applied in place.
//! 5. Tower volleys and projectile flight.
//! 6. Dead units are removed.
//! 7. Each tower that fell this tick awards one crown.
//! 8. A fallen king tower ends the battle at once.
//! 9. Opponent accrues and may play; its units join after the prune.
//! 10. Time out or enough crowns ends the battle.
//!
//! Once a battle has ended every further tick is a no-op.
//!
//! # Determinism
//!
//! All simulation math is fixed-point and every random draw goes through
//! the injected [`RandomSource`]. Two battles built with the same catalog,
//! config and seed produce identical [`Battle::state_hash`] sequences.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::arena::{clamp_to_arena, TowerSlot, Towers};
use crate::catalog::{CardId, Catalog};
use crate::combat::resolve_combat;
use crate::components::{Side, Unit, UnitId};
use crate::config::{BattleConfig, HAND_SIZE};
use crate::error::{GameError, Result};
use crate::events::BattleEvent;
use crate::math::{fixed_serde, floor_u32, Fixed, Point};
use crate::movement::plan_movement;
use crate::opponent::OpponentPolicy;
use crate::projectile::{advance_projectiles, fire_tower_volley, Projectile};
use crate::rng::{RandomSource, SeededRandom};

/// Why a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// A king tower fell.
    KingTowerDestroyed,
    /// A side reached the crown limit.
    CrownLimit,
    /// The clock ran out.
    TimeExpired,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KingTowerDestroyed => write!(f, "king tower destroyed"),
            Self::CrownLimit => write!(f, "crown limit reached"),
            Self::TimeExpired => write!(f, "time expired"),
        }
    }
}

/// Final outcome of a battle.
///
/// On time or crowns the player wins only with strictly more crowns; a
/// tie goes to the opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleResult {
    /// Winning side.
    pub winner: Side,
    /// What ended the battle.
    pub reason: EndReason,
    /// Crowns scored by the player.
    pub player_crowns: u32,
    /// Crowns scored by the opponent.
    pub opponent_crowns: u32,
    /// Gold awarded to the player.
    pub gold: u32,
    /// Battle clock at the end.
    pub clock_ms: u64,
}

impl BattleResult {
    /// Whether the player won.
    #[must_use]
    pub fn player_won(&self) -> bool {
        self.winner == Side::Player
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickReport {
    /// Battle clock after the tick.
    pub clock_ms: u64,
    /// Events in the order they happened. Card plays made since the
    /// previous tick come first.
    pub events: Vec<BattleEvent>,
    /// Set on the tick that ended the battle.
    pub outcome: Option<BattleResult>,
}

/// A unit as seen by presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitView {
    /// Spawn identifier.
    pub id: UnitId,
    /// Catalog key of the unit type.
    pub unit_type: String,
    /// Owning side.
    pub side: Side,
    /// Current position.
    pub position: Point,
    /// Current health.
    pub health: u32,
    /// Health at spawn.
    pub max_health: u32,
}

/// Read-only view of a battle, produced every tick for presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleSnapshot {
    /// Elapsed battle time.
    pub clock_ms: u64,
    /// Remaining battle time.
    pub remaining_ms: u64,
    /// Player elixir.
    #[serde(with = "fixed_serde")]
    pub elixir: Fixed,
    /// Crowns scored by the player.
    pub player_crowns: u32,
    /// Crowns scored by the opponent.
    pub opponent_crowns: u32,
    /// Both tower sets.
    pub towers: Towers,
    /// Living units.
    pub units: Vec<UnitView>,
    /// Projectiles in flight, with their interpolation inputs.
    pub projectiles: Vec<Projectile>,
    /// Player hand.
    pub hand: [CardId; HAND_SIZE],
    /// Outcome, once the battle has ended.
    pub result: Option<BattleResult>,
}

impl BattleSnapshot {
    /// Encode with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to encode snapshot: {e}")))
    }

    /// Decode from bincode.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if the bytes are not a snapshot.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::Serialization(format!("Failed to decode snapshot: {e}")))
    }

    /// Whether the battle is still being played.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.result.is_none()
    }

    /// Hash of everything visible in the snapshot.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// One battle between the player and the scripted opponent.
pub struct Battle {
    catalog: Arc<Catalog>,
    config: BattleConfig,
    rng: Box<dyn RandomSource + Send>,

    clock_ms: u64,
    remaining_ms: u64,
    elixir: Fixed,
    player_crowns: u32,
    opponent_crowns: u32,
    towers: Towers,
    units: Vec<Unit>,
    projectiles: Vec<Projectile>,
    hand: [CardId; HAND_SIZE],
    opponent: OpponentPolicy,

    next_unit_id: u64,
    next_projectile_id: u64,
    pending_ms: u64,
    pending_events: Vec<BattleEvent>,
    result: Option<BattleResult>,
}

impl fmt::Debug for Battle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Battle")
            .field("clock_ms", &self.clock_ms)
            .field("remaining_ms", &self.remaining_ms)
            .field("elixir", &self.elixir)
            .field("player_crowns", &self.player_crowns)
            .field("opponent_crowns", &self.opponent_crowns)
            .field("units", &self.units.len())
            .field("projectiles", &self.projectiles.len())
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl Battle {
    /// Start a battle.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is unusable with `catalog`.
    pub fn new(
        catalog: Arc<Catalog>,
        config: BattleConfig,
        rng: Box<dyn RandomSource + Send>,
    ) -> Result<Self> {
        config.validate(&catalog)?;
        Ok(Self::from_parts(catalog, config, rng))
    }

    /// Standard catalog and rules with a seeded random source.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_parts(
            Arc::new(Catalog::standard()),
            BattleConfig::default(),
            Box::new(SeededRandom::from_seed(seed)),
        )
    }

    // The standard catalog always satisfies the default config, so this
    // path skips validation.
    fn from_parts(
        catalog: Arc<Catalog>,
        config: BattleConfig,
        rng: Box<dyn RandomSource + Send>,
    ) -> Self {
        let mut battle = Self {
            opponent: OpponentPolicy::new(&config),
            towers: Towers::new(config.side_tower_health, config.king_tower_health),
            hand: config.starting_hand,
            remaining_ms: config.duration_ms,
            elixir: config.player_starting_elixir,
            catalog,
            config,
            rng,
            clock_ms: 0,
            player_crowns: 0,
            opponent_crowns: 0,
            units: Vec::new(),
            projectiles: Vec::new(),
            next_unit_id: 0,
            next_projectile_id: 0,
            pending_ms: 0,
            pending_events: Vec::new(),
            result: None,
        };
        battle.restart();
        battle
    }

    /// Reset every battle-scoped field, including the opponent.
    pub fn restart(&mut self) {
        self.clock_ms = 0;
        self.remaining_ms = self.config.duration_ms;
        self.elixir = self.config.player_starting_elixir;
        self.player_crowns = 0;
        self.opponent_crowns = 0;
        self.towers = Towers::new(self.config.side_tower_health, self.config.king_tower_health);
        self.units.clear();
        self.projectiles.clear();
        self.hand = self.config.starting_hand;
        self.opponent.reset(&self.config);
        self.next_unit_id = 0;
        self.next_projectile_id = 0;
        self.pending_ms = 0;
        self.pending_events.clear();
        self.result = None;
        info!(duration_ms = self.config.duration_ms, "battle started");
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Whether the battle is still being played.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.result.is_none()
    }

    /// Outcome, once the battle has ended.
    #[must_use]
    pub fn result(&self) -> Option<&BattleResult> {
        self.result.as_ref()
    }

    /// Elapsed battle time.
    #[must_use]
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Remaining battle time.
    #[must_use]
    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Player elixir.
    #[must_use]
    pub fn elixir(&self) -> Fixed {
        self.elixir
    }

    /// Crowns scored by `side`.
    #[must_use]
    pub fn crowns(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player_crowns,
            Side::Opponent => self.opponent_crowns,
        }
    }

    /// Both tower sets.
    #[must_use]
    pub fn towers(&self) -> &Towers {
        &self.towers
    }

    /// Mutable towers, for scripted setups.
    pub fn towers_mut(&mut self) -> &mut Towers {
        &mut self.towers
    }

    /// Living units.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Mutable units, for scripted setups.
    pub fn units_mut(&mut self) -> &mut [Unit] {
        &mut self.units
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Player hand.
    #[must_use]
    pub fn hand(&self) -> &[CardId; HAND_SIZE] {
        &self.hand
    }

    /// Catalog used by this battle.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Rules used by this battle.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Opponent state.
    #[must_use]
    pub fn opponent(&self) -> &OpponentPolicy {
        &self.opponent
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Play a card from the player's hand at `position`.
    ///
    /// The position is clamped to the arena. On success the card's cost is
    /// deducted and its hand slot is refilled with a card not already in
    /// hand.
    ///
    /// # Errors
    ///
    /// Rejections leave the battle untouched:
    /// [`GameError::BattleNotRunning`], [`GameError::UnknownCard`],
    /// [`GameError::CardNotInHand`] or [`GameError::InsufficientElixir`].
    pub fn place_card(&mut self, card_id: CardId, position: Point) -> Result<UnitId> {
        if !self.is_running() {
            return Err(GameError::BattleNotRunning);
        }
        let card = self
            .catalog
            .card(card_id)
            .ok_or(GameError::UnknownCard(card_id))?;
        let slot = self
            .hand
            .iter()
            .position(|&c| c == card_id)
            .ok_or(GameError::CardNotInHand(card_id))?;
        let available = floor_u32(self.elixir);
        if available < card.cost {
            return Err(GameError::InsufficientElixir {
                required: card.cost,
                available,
            });
        }

        let cost = card.cost;
        self.elixir -= Fixed::from_num(cost);
        let id = self.spawn_unit(Side::Player, card_id, position)?;
        self.hand[slot] = self.draw_replacement(card_id);
        debug!(card = %card_id, unit = %id, elixir = %self.elixir, hand = ?self.hand, "card placed");
        Ok(id)
    }

    /// Spawn the unit of `card_id` for `side` without touching elixir or hand.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownCard`] if the card is not in the catalog.
    pub fn spawn_unit(&mut self, side: Side, card_id: CardId, position: Point) -> Result<UnitId> {
        let card = self
            .catalog
            .card(card_id)
            .ok_or(GameError::UnknownCard(card_id))?;
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        let unit = Unit::spawn(
            id,
            card.unit_type,
            side,
            clamp_to_arena(position),
            card.spawn_health(),
        );
        self.pending_events.push(BattleEvent::UnitSpawned {
            unit: id,
            card: card_id,
            unit_type: card.unit_type,
            side,
        });
        self.units.push(unit);
        Ok(id)
    }

    fn draw_replacement(&mut self, played: CardId) -> CardId {
        let total = self.catalog.card_count();
        for _ in 0..total * 2 {
            let index = self.rng.gen_index(total);
            if let Some(card) = self.catalog.card_at(index) {
                if !self.hand.contains(&card.id) {
                    return card.id;
                }
            }
        }

        let mut candidate = self.catalog.next_card_after(played);
        for _ in 0..total {
            if !self.hand.contains(&candidate) {
                return candidate;
            }
            candidate = self.catalog.next_card_after(candidate);
        }
        // Every card is already held: the played card comes straight back.
        played
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Feed `delta_ms` of host time and run every whole tick it covers.
    ///
    /// Leftover time carries over to the next call. Stops early once the
    /// battle ends.
    pub fn advance(&mut self, delta_ms: u64) -> Vec<TickReport> {
        let mut reports = Vec::new();
        if !self.is_running() {
            return reports;
        }
        self.pending_ms = self.pending_ms.saturating_add(delta_ms);
        while self.pending_ms >= self.config.tick_ms && self.is_running() {
            self.pending_ms -= self.config.tick_ms;
            reports.push(self.tick());
        }
        reports
    }

    /// Run exactly one tick. A no-op once the battle has ended.
    pub fn tick(&mut self) -> TickReport {
        if !self.is_running() {
            return TickReport {
                clock_ms: self.clock_ms,
                ..TickReport::default()
            };
        }

        let mut events = std::mem::take(&mut self.pending_events);
        let towers_before = self.towers;
        let remaining_before = self.remaining_ms;
        let catalog = Arc::clone(&self.catalog);

        // 1. clock
        self.clock_ms += self.config.tick_ms;
        self.remaining_ms = self.remaining_ms.saturating_sub(self.config.tick_ms);

        // 2. player elixir
        let rate = if remaining_before > self.config.late_phase_ms {
            self.config.player_elixir_rate
        } else {
            self.config.player_late_elixir_rate
        };
        self.elixir = (self.elixir + rate * self.config.tick_seconds()).min(self.config.elixir_cap);

        // 3-4. movement, combat
        plan_movement(&mut self.units, &self.towers, &catalog);
        resolve_combat(&mut self.units, &mut self.towers, &catalog, self.clock_ms, &mut events);

        // 5. projectiles
        if self.rng.chance(self.config.tower_volley_chance) {
            // Towers standing at the start of the tick get their volley.
            let fired = fire_tower_volley(
                &self.units,
                &towers_before,
                self.config.arrow_damage,
                &mut self.next_projectile_id,
                &mut events,
            );
            self.projectiles.extend(fired);
        }
        advance_projectiles(&mut self.projectiles, &mut self.units, &mut events);

        // 6. prune
        for unit in self.units.iter().filter(|u| !u.is_alive()) {
            events.push(BattleEvent::UnitDied {
                unit: unit.id,
                side: unit.side,
            });
        }
        self.units.retain(Unit::is_alive);

        // 7. crowns
        let mut king_fell = [false; 2];
        for (owner, fallen_king) in [Side::Opponent, Side::Player].into_iter().zip(&mut king_fell) {
            let fallen: Vec<TowerSlot> = self
                .towers
                .of(owner)
                .fallen_since(towers_before.of(owner))
                .collect();
            for slot in fallen {
                *fallen_king |= slot.is_king();
                debug!(side = %owner, ?slot, "tower destroyed");
                events.push(BattleEvent::TowerDestroyed { side: owner, slot });
                self.award_crown(owner.opposite(), &mut events);
            }
        }

        // 8. king tower
        let [opponent_king_fell, player_king_fell] = king_fell;
        if opponent_king_fell || player_king_fell {
            let winner = if opponent_king_fell {
                Side::Player
            } else {
                Side::Opponent
            };
            return self.finish(winner, EndReason::KingTowerDestroyed, events);
        }

        // 9. opponent
        let play = self.opponent.update(
            self.clock_ms,
            remaining_before,
            &self.config,
            &catalog,
            self.rng.as_mut(),
        );
        if let Some(play) = play {
            if let Ok(id) = self.spawn_unit(Side::Opponent, play.card, play.position) {
                trace!(unit = %id, card = %play.card, "opponent spawn");
            }
            events.append(&mut self.pending_events);
        }

        // 10. time or crowns
        let crown_limit = self.config.crowns_to_win;
        if self.remaining_ms == 0
            || self.player_crowns >= crown_limit
            || self.opponent_crowns >= crown_limit
        {
            let reason = if self.player_crowns >= crown_limit || self.opponent_crowns >= crown_limit {
                EndReason::CrownLimit
            } else {
                EndReason::TimeExpired
            };
            let winner = if self.player_crowns > self.opponent_crowns {
                Side::Player
            } else {
                Side::Opponent
            };
            return self.finish(winner, reason, events);
        }

        trace!(clock_ms = self.clock_ms, hash = self.state_hash(), "tick");
        TickReport {
            clock_ms: self.clock_ms,
            events,
            outcome: None,
        }
    }

    fn award_crown(&mut self, side: Side, events: &mut Vec<BattleEvent>) {
        let cap = self.config.crowns_to_win;
        let crowns = match side {
            Side::Player => &mut self.player_crowns,
            Side::Opponent => &mut self.opponent_crowns,
        };
        if *crowns < cap {
            *crowns += 1;
            debug!(%side, crowns = *crowns, "crown awarded");
            events.push(BattleEvent::CrownAwarded {
                side,
                crowns: *crowns,
            });
        }
    }

    fn finish(&mut self, winner: Side, reason: EndReason, events: Vec<BattleEvent>) -> TickReport {
        let player_won = winner == Side::Player;
        let gold = match (reason, player_won) {
            (EndReason::KingTowerDestroyed, true) => self.config.king_win_gold,
            (EndReason::KingTowerDestroyed, false) => self.config.king_loss_gold,
            (_, true) => self.config.timeout_win_gold,
            (_, false) => self.config.timeout_loss_gold,
        };
        let result = BattleResult {
            winner,
            reason,
            player_crowns: self.player_crowns,
            opponent_crowns: self.opponent_crowns,
            gold,
            clock_ms: self.clock_ms,
        };
        info!(
            %winner,
            %reason,
            player_crowns = self.player_crowns,
            opponent_crowns = self.opponent_crowns,
            gold,
            clock_ms = self.clock_ms,
            "battle ended"
        );
        self.result = Some(result);
        self.pending_ms = 0;
        TickReport {
            clock_ms: self.clock_ms,
            events,
            outcome: Some(result),
        }
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Read-only view for presentation code.
    #[must_use]
    pub fn snapshot(&self) -> BattleSnapshot {
        let units = self
            .units
            .iter()
            .map(|unit| UnitView {
                id: unit.id,
                unit_type: self
                    .catalog
                    .unit(unit.unit_type)
                    .map(|def| def.key.clone())
                    .unwrap_or_default(),
                side: unit.side,
                position: unit.position,
                health: unit.health,
                max_health: unit.max_health,
            })
            .collect();

        BattleSnapshot {
            clock_ms: self.clock_ms,
            remaining_ms: self.remaining_ms,
            elixir: self.elixir,
            player_crowns: self.player_crowns,
            opponent_crowns: self.opponent_crowns,
            towers: self.towers,
            units,
            projectiles: self.projectiles.clone(),
            hand: self.hand,
            result: self.result,
        }
    }

    /// Hash of the full battle state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.clock_ms.hash(&mut hasher);
        self.remaining_ms.hash(&mut hasher);
        self.elixir.hash(&mut hasher);
        self.opponent.elixir().hash(&mut hasher);
        self.player_crowns.hash(&mut hasher);
        self.opponent_crowns.hash(&mut hasher);
        self.towers.hash(&mut hasher);
        self.hand.hash(&mut hasher);

        self.units.len().hash(&mut hasher);
        for unit in &self.units {
            unit.id.hash(&mut hasher);
            unit.unit_type.hash(&mut hasher);
            unit.side.hash(&mut hasher);
            unit.position.hash(&mut hasher);
            unit.health.hash(&mut hasher);
            unit.target.hash(&mut hasher);
            unit.last_attack_ms.hash(&mut hasher);
        }

        self.projectiles.len().hash(&mut hasher);
        for projectile in &self.projectiles {
            projectile.id.hash(&mut hasher);
            projectile.progress.hash(&mut hasher);
            projectile.target.hash(&mut hasher);
        }

        self.result.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Random source that never fires volleys and always draws index 0.
    struct Quiet;

    impl RandomSource for Quiet {
        fn next_unit(&mut self) -> f64 {
            0.999
        }
    }

    fn quiet_battle() -> Battle {
        Battle::new(
            Arc::new(Catalog::standard()),
            BattleConfig::default(),
            Box::new(Quiet),
        )
        .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let battle = Battle::with_seed(1);
        assert!(battle.is_running());
        assert_eq!(battle.remaining_ms(), 180_000);
        assert_eq!(battle.elixir(), Fixed::from_num(5));
        assert_eq!(battle.hand(), &[CardId(0), CardId(1), CardId(2), CardId(3)]);
        assert_eq!(battle.towers().player.king.health, 4000);
        assert_eq!(battle.towers().opponent.left.health, 2000);
        assert!(battle.units().is_empty());
    }

    #[test]
    fn test_place_knight() {
        let mut battle = Battle::with_seed(1);
        let id = battle.place_card(CardId(1), Point::from_ints(0, -6)).unwrap();

        let snapshot = battle.snapshot();
        assert_eq!(snapshot.units.len(), 1);
        assert_eq!(snapshot.units[0].id, id);
        assert_eq!(snapshot.units[0].unit_type, "knight");
        assert_eq!(snapshot.units[0].health, 600);
        assert_eq!(snapshot.units[0].side, Side::Player);
        assert_eq!(battle.elixir(), Fixed::from_num(2));
        assert!(!battle.hand().contains(&CardId(1)));
        assert_eq!(battle.hand().len(), 4);
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let mut battle = Battle::with_seed(1);
        let before = battle.state_hash();

        assert!(matches!(
            battle.place_card(CardId(42), Point::ZERO),
            Err(GameError::UnknownCard(CardId(42)))
        ));
        assert!(matches!(
            battle.place_card(CardId(8), Point::ZERO),
            Err(GameError::CardNotInHand(CardId(8)))
        ));
        assert_eq!(battle.state_hash(), before);

        // The wizard spends all 5 elixir, leaving nothing for the knight.
        battle.place_card(CardId(2), Point::from_ints(0, -6)).unwrap();
        let after_play = battle.state_hash();
        assert!(matches!(
            battle.place_card(CardId(1), Point::ZERO),
            Err(GameError::InsufficientElixir {
                required: 3,
                available: 0
            })
        ));
        assert_eq!(battle.state_hash(), after_play);
        assert_ne!(before, after_play);
    }

    #[test]
    fn test_placement_clamped() {
        let mut battle = Battle::with_seed(1);
        battle.place_card(CardId(0), Point::from_ints(50, -50)).unwrap();
        assert_eq!(battle.units()[0].position, Point::from_ints(9, -15));
    }

    #[test]
    fn test_elixir_accrues_and_caps() {
        let mut battle = quiet_battle();
        // Early phase: 0.6/s for 1 s.
        battle.advance(1_000);
        let epsilon = Fixed::ONE / Fixed::from_num(1_000);
        assert!((battle.elixir() - Fixed::from_num(5.6)).abs() < epsilon);

        battle.advance(60_000);
        assert_eq!(battle.elixir(), Fixed::from_num(10));
    }

    fn quiet_battle_with(config: BattleConfig) -> Battle {
        Battle::new(Arc::new(Catalog::standard()), config, Box::new(Quiet)).unwrap()
    }

    #[test]
    fn test_late_phase_elixir_rate() {
        let config = BattleConfig {
            duration_ms: 90_000,
            ..BattleConfig::default()
        };
        let mut battle = quiet_battle_with(config);
        // 90 s left is already the late phase: 0.3/s for 1 s.
        battle.advance(1_000);
        let epsilon = Fixed::ONE / Fixed::from_num(1_000);
        assert!((battle.elixir() - Fixed::from_num(5.3)).abs() < epsilon);
    }

    #[test]
    fn test_late_phase_starts_at_boundary_tick() {
        let config = BattleConfig {
            duration_ms: 90_100,
            ..BattleConfig::default()
        };
        let mut battle = quiet_battle_with(config);
        let epsilon = Fixed::ONE / Fixed::from_num(1_000);

        // 90.1 s left before this tick: early rate, 0.6 * 0.1.
        battle.tick();
        assert!((battle.elixir() - Fixed::from_num(5.06)).abs() < epsilon);

        // Exactly 90 s left before this tick: late rate, 0.3 * 0.1.
        assert_eq!(battle.remaining_ms(), 90_000);
        battle.tick();
        assert!((battle.elixir() - Fixed::from_num(5.09)).abs() < epsilon);
    }

    #[test]
    fn test_four_card_catalog_returns_played_card() {
        let standard = Catalog::standard();
        let units: Vec<_> = standard.units().map(|(_, u)| u.clone()).collect();
        let cards: Vec<_> = standard.cards().take(4).cloned().collect();
        let catalog = Catalog::new(units, cards).unwrap();
        let mut battle = Battle::new(
            Arc::new(catalog),
            BattleConfig::default(),
            Box::new(Quiet),
        )
        .unwrap();

        battle.place_card(CardId(0), Point::from_ints(0, -6)).unwrap();

        assert_eq!(battle.hand(), &[CardId(0), CardId(1), CardId(2), CardId(3)]);
    }

    #[test]
    fn test_advance_carries_remainder() {
        let mut battle = quiet_battle();
        assert_eq!(battle.advance(250).len(), 2);
        assert_eq!(battle.clock_ms(), 200);
        assert_eq!(battle.advance(50).len(), 1);
        assert_eq!(battle.clock_ms(), 300);
    }

    #[test]
    fn test_king_tower_ends_battle_immediately() {
        let mut battle = quiet_battle();
        battle.towers_mut().opponent.king.health = 100;
        battle
            .spawn_unit(Side::Player, CardId(1), Point::from_ints(0, 7))
            .unwrap();

        let report = battle.tick();
        let result = report.outcome.expect("battle should end");
        assert_eq!(result.winner, Side::Player);
        assert_eq!(result.reason, EndReason::KingTowerDestroyed);
        assert_eq!(result.gold, 200);
        assert_eq!(result.player_crowns, 1);
        assert!(battle.remaining_ms() > 0);
        assert!(!battle.is_running());
    }

    #[test]
    fn test_tower_destroyed_this_tick_still_fires() {
        /// Random source that fires a volley every tick.
        struct Volley;

        impl RandomSource for Volley {
            fn next_unit(&mut self) -> f64 {
                0.0
            }
        }

        let mut battle = Battle::new(
            Arc::new(Catalog::standard()),
            BattleConfig::default(),
            Box::new(Volley),
        )
        .unwrap();
        battle.towers_mut().opponent.left.health = 1;
        let knight = battle
            .spawn_unit(Side::Player, CardId(1), Point::from_ints(-6, 5))
            .unwrap();

        let report = battle.tick();

        assert!(report.events.contains(&BattleEvent::TowerDestroyed {
            side: Side::Opponent,
            slot: TowerSlot::Left,
        }));
        assert!(report.events.iter().any(|e| matches!(
            e,
            BattleEvent::ProjectileFired { side: Side::Opponent, slot: TowerSlot::Left, target, .. }
                if *target == knight
        )));
    }

    #[test]
    fn test_ticks_after_end_are_noops() {
        let mut battle = quiet_battle();
        battle.towers_mut().player.king.health = 1;
        battle
            .spawn_unit(Side::Opponent, CardId(1), Point::from_ints(0, -7))
            .unwrap();
        let result = battle.tick().outcome.unwrap();
        assert_eq!(result.winner, Side::Opponent);
        assert_eq!(result.gold, 100);

        let hash = battle.state_hash();
        let report = battle.tick();
        assert!(report.events.is_empty());
        assert!(report.outcome.is_none());
        assert!(battle.advance(10_000).is_empty());
        assert_eq!(battle.state_hash(), hash);
        assert!(matches!(
            battle.place_card(CardId(0), Point::ZERO),
            Err(GameError::BattleNotRunning)
        ));
    }

    #[test]
    fn test_timeout_with_no_crowns_is_a_loss() {
        let mut battle = Battle::new(
            Arc::new(Catalog::standard()),
            BattleConfig {
                duration_ms: 500,
                ..BattleConfig::default()
            },
            Box::new(Quiet),
        )
        .unwrap();

        let reports = battle.advance(10_000);
        assert_eq!(reports.len(), 5);
        let result = reports.last().and_then(|r| r.outcome).unwrap();
        assert_eq!(result.reason, EndReason::TimeExpired);
        assert_eq!(result.winner, Side::Opponent);
        assert_eq!(result.gold, 50);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut battle = Battle::with_seed(5);
        battle.place_card(CardId(1), Point::from_ints(0, -6)).unwrap();
        battle.advance(5_000);
        battle.restart();

        assert!(battle.is_running());
        assert_eq!(battle.clock_ms(), 0);
        assert_eq!(battle.elixir(), Fixed::from_num(5));
        assert!(battle.units().is_empty());
        assert!(battle.projectiles().is_empty());
        assert_eq!(battle.opponent().elixir(), Fixed::from_num(5));
        assert_eq!(battle.opponent().last_play_ms(), None);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut battle = Battle::with_seed(3);
        battle.place_card(CardId(1), Point::from_ints(-6, -6)).unwrap();
        battle.advance(3_000);

        let snapshot = battle.snapshot();
        let bytes = snapshot.to_bytes().unwrap();
        let restored = BattleSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(restored, snapshot);
        assert_eq!(restored.state_hash(), snapshot.state_hash());
        assert!(BattleSnapshot::from_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_same_seed_same_hash() {
        let mut a = Battle::with_seed(77);
        let mut b = Battle::with_seed(77);
        for _ in 0..300 {
            a.tick();
            b.tick();
            assert_eq!(a.state_hash(), b.state_hash());
        }
    }
}

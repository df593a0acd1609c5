//! Test fixtures and helpers.
//!
//! Pre-built battles and unit placements for consistent testing.

use std::sync::Arc;

use arena_core::battle::Battle;
use arena_core::catalog::{CardId, Catalog};
use arena_core::components::{Side, UnitId};
use arena_core::config::BattleConfig;
use arena_core::math::Point;
use arena_core::rng::SeededRandom;
use fixed::types::I32F32;

use crate::random::ScriptedRandom;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Arena point from float coordinates.
#[must_use]
pub fn point(x: f64, z: f64) -> Point {
    Point::from_f64(x, z)
}

/// The standard catalog, shared.
#[must_use]
pub fn standard_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::standard())
}

/// A standard battle whose random source is `rng`.
///
/// # Panics
///
/// Panics if `config` does not fit the standard catalog.
#[must_use]
pub fn battle_with(config: BattleConfig, rng: ScriptedRandom) -> Battle {
    Battle::new(standard_catalog(), config, Box::new(rng)).expect("fixture config is valid")
}

/// A standard battle where towers never fire and every draw is high.
#[must_use]
pub fn quiet_battle() -> Battle {
    battle_with(BattleConfig::default(), ScriptedRandom::quiet())
}

/// A standard battle driven by `seed`.
#[must_use]
pub fn seeded_battle(seed: u64) -> Battle {
    Battle::new(
        standard_catalog(),
        BattleConfig::default(),
        Box::new(SeededRandom::from_seed(seed)),
    )
    .expect("default config is valid")
}

/// Parse a battle config override, e.g. `(duration_ms: 1000)`.
///
/// # Panics
///
/// Panics on malformed RON.
#[must_use]
pub fn config_from_ron(text: &str) -> BattleConfig {
    BattleConfig::from_ron_str(text).expect("fixture RON is valid")
}

/// Card that spawns the unit type with catalog key `key`.
///
/// # Panics
///
/// Panics if no standard card spawns that unit.
#[must_use]
pub fn card_for(catalog: &Catalog, key: &str) -> CardId {
    let (unit_type, _) = catalog.unit_by_key(key).expect("known unit key");
    catalog
        .cards()
        .find(|c| c.unit_type == unit_type)
        .map(|c| c.id)
        .expect("a card spawns this unit")
}

/// Drop a unit of type `key` for `side` at `(x, z)`, bypassing elixir and
/// hand checks.
///
/// # Panics
///
/// Panics if the unit key is unknown.
pub fn spawn(battle: &mut Battle, side: Side, key: &str, x: f64, z: f64) -> UnitId {
    let card = card_for(battle.catalog(), key);
    battle
        .spawn_unit(side, card, point(x, z))
        .expect("card exists")
}

/// Proptest strategies for battle inputs.
pub mod strategies {
    use arena_core::catalog::CardId;
    use arena_core::math::Point;
    use proptest::prelude::*;

    /// A point anywhere in (or slightly outside) the arena.
    pub fn arb_point() -> impl Strategy<Value = Point> {
        (-1200i32..1200, -1800i32..1800)
            .prop_map(|(x, z)| Point::from_f64(f64::from(x) / 100.0, f64::from(z) / 100.0))
    }

    /// A point in the player's half.
    pub fn arb_player_point() -> impl Strategy<Value = Point> {
        (-900i32..=900, -1500i32..=-200)
            .prop_map(|(x, z)| Point::from_f64(f64::from(x) / 100.0, f64::from(z) / 100.0))
    }

    /// Any standard card id, plus a few unknown ones.
    pub fn arb_card() -> impl Strategy<Value = CardId> {
        (0u32..11).prop_map(CardId)
    }

    /// A scripted player turn: wait `wait_ms`, then try to play `card` at
    /// the point.
    pub fn arb_play() -> impl Strategy<Value = (u64, CardId, Point)> {
        (0u64..3_000, arb_card(), arb_player_point())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_for() {
        let catalog = Catalog::standard();
        assert_eq!(card_for(&catalog, "knight"), CardId(1));
        assert_eq!(card_for(&catalog, "hog_rider"), CardId(4));
    }

    #[test]
    fn test_spawn_helper() {
        let mut battle = quiet_battle();
        let id = spawn(&mut battle, Side::Opponent, "goblin", 2.0, 5.0);
        let unit = &battle.units()[0];
        assert_eq!(unit.id, id);
        assert_eq!(unit.side, Side::Opponent);
        assert_eq!(unit.health, 400);
    }
}

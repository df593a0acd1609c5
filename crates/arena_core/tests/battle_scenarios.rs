//! End-to-end battle scenarios.
//!
//! Each test drives a full battle through its public API with a scripted
//! random source so outcomes are exact.

use std::sync::Arc;

use arena_core::prelude::*;
use arena_test_utils::fixtures::{battle_with, point, quiet_battle, spawn, standard_catalog};
use arena_test_utils::random::ScriptedRandom;

/// Config with the opponent switched off.
fn passive_opponent() -> BattleConfig {
    BattleConfig {
        opponent_min_elixir: 100,
        tower_volley_chance: 0.0,
        ..BattleConfig::default()
    }
}

fn count<F: Fn(&BattleEvent) -> bool>(reports: &[TickReport], pred: F) -> usize {
    reports
        .iter()
        .flat_map(|r| r.events.iter())
        .filter(|e| pred(e))
        .count()
}

#[test]
fn knight_placement_spends_elixir_and_replaces_card() {
    // gen_index(9) over 0.5 draws card #4, which is not in hand.
    let mut battle = battle_with(BattleConfig::default(), ScriptedRandom::constant(0.5));
    battle.place_card(CardId(1), point(0.0, -5.0)).unwrap();

    assert_eq!(battle.elixir(), Fixed::from_num(2));
    assert_eq!(battle.hand(), &[CardId(0), CardId(4), CardId(2), CardId(3)]);

    let unit = &battle.units()[0];
    assert_eq!(unit.health, 600);
    assert_eq!(unit.max_health, 600);
    assert_eq!(unit.side, Side::Player);
    assert_eq!(unit.position, point(0.0, -5.0));

    let report = battle.tick();
    assert!(matches!(
        report.events.first(),
        Some(BattleEvent::UnitSpawned { card: CardId(1), side: Side::Player, .. })
    ));
}

#[test]
fn replacement_falls_back_when_draws_collide() {
    // 0.0 always draws card #0, which stays in hand.
    let mut battle = battle_with(BattleConfig::default(), ScriptedRandom::constant(0.0));
    battle.place_card(CardId(1), point(0.0, -5.0)).unwrap();

    let hand = battle.hand();
    assert!(!hand.contains(&CardId(1)));
    assert_eq!(hand[1], CardId(4));
    let mut sorted = hand.to_vec();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), HAND_SIZE);
}

#[test]
fn knight_attacks_tower_on_cooldown() {
    let mut battle = battle_with(passive_opponent(), ScriptedRandom::quiet());
    spawn(&mut battle, Side::Player, "knight", -6.0, 4.0);

    battle.tick();
    assert_eq!(battle.towers().opponent.left.health, 1880);

    // 833 ms cooldown: no second swing until the clock reaches 1000.
    for _ in 0..8 {
        battle.tick();
    }
    assert_eq!(battle.clock_ms(), 900);
    assert_eq!(battle.towers().opponent.left.health, 1880);

    battle.tick();
    assert_eq!(battle.towers().opponent.left.health, 1760);
}

#[test]
fn side_tower_awards_exactly_one_crown() {
    let mut battle = battle_with(passive_opponent(), ScriptedRandom::quiet());
    battle.towers_mut().opponent.left.health = 50;
    spawn(&mut battle, Side::Player, "knight", -6.0, 4.0);

    let reports = battle.advance(5_000);
    assert_eq!(battle.crowns(Side::Player), 1);
    assert_eq!(battle.crowns(Side::Opponent), 0);
    assert_eq!(count(&reports, |e| matches!(e, BattleEvent::CrownAwarded { .. })), 1);
    assert_eq!(
        count(&reports, |e| matches!(
            e,
            BattleEvent::TowerDestroyed { side: Side::Opponent, slot: TowerSlot::Left }
        )),
        1
    );
    assert!(battle.is_running());
    assert_eq!(battle.towers().opponent.left.health, 0);
}

#[test]
fn king_tower_destroyed_in_one_tick_ends_battle() {
    let standard = Catalog::standard();
    let mut units: Vec<UnitTypeDefinition> = standard.units().map(|(_, u)| u.clone()).collect();
    let (knight, _) = standard.unit_by_key("knight").unwrap();
    units[usize::from(knight.0)].damage = 5_000;
    let cards = standard.cards().cloned().collect();
    let catalog = Arc::new(Catalog::new(units, cards).unwrap());

    let mut battle = Battle::new(catalog, passive_opponent(), Box::new(ScriptedRandom::quiet())).unwrap();
    battle.spawn_unit(Side::Player, CardId(1), point(0.0, 7.0)).unwrap();
    assert_eq!(battle.towers().opponent.king.health, 4_000);

    let report = battle.tick();
    let result = report.outcome.unwrap();
    assert_eq!(battle.towers().opponent.king.health, 0);
    assert_eq!(result.winner, Side::Player);
    assert_eq!(result.reason, EndReason::KingTowerDestroyed);
    assert_eq!(result.gold, 200);
    assert!(battle.remaining_ms() > 0);
    assert!(!battle.is_running());
}

#[test]
fn both_kings_falling_goes_to_player() {
    let mut battle = battle_with(passive_opponent(), ScriptedRandom::quiet());
    battle.towers_mut().player.king.health = 10;
    battle.towers_mut().opponent.king.health = 10;
    spawn(&mut battle, Side::Player, "knight", 0.0, 7.0);
    spawn(&mut battle, Side::Opponent, "knight", 0.0, -7.0);

    let result = battle.tick().outcome.unwrap();
    assert_eq!(result.winner, Side::Player);
    assert_eq!(result.player_crowns, 1);
    assert_eq!(result.opponent_crowns, 1);
    assert_eq!(result.gold, 200);
}

#[test]
fn crown_limit_ends_battle() {
    let config = BattleConfig {
        crowns_to_win: 1,
        ..passive_opponent()
    };
    let mut battle = battle_with(config, ScriptedRandom::quiet());
    battle.towers_mut().opponent.right.health = 1;
    spawn(&mut battle, Side::Player, "knight", 6.0, 4.0);

    let result = battle.tick().outcome.unwrap();
    assert_eq!(result.reason, EndReason::CrownLimit);
    assert_eq!(result.winner, Side::Player);
    assert_eq!(result.gold, 100);
}

#[test]
fn timeout_draw_goes_to_opponent() {
    let config = BattleConfig {
        duration_ms: 2_000,
        ..passive_opponent()
    };
    let mut battle = battle_with(config, ScriptedRandom::quiet());
    let reports = battle.advance(60_000);

    assert_eq!(reports.len(), 20);
    let result = reports.last().and_then(|r| r.outcome).unwrap();
    assert_eq!(result.reason, EndReason::TimeExpired);
    assert_eq!(result.winner, Side::Opponent);
    assert_eq!(result.gold, 50);
    assert_eq!(battle.remaining_ms(), 0);
}

#[test]
fn opponent_below_two_elixir_never_plays() {
    let config = BattleConfig {
        opponent_starting_elixir: Fixed::from_num(1.9),
        opponent_elixir_rate: Fixed::ZERO,
        opponent_late_elixir_rate: Fixed::ZERO,
        tower_volley_chance: 0.0,
        ..BattleConfig::default()
    };
    let mut battle = battle_with(config, ScriptedRandom::new(vec![0.1, 0.4, 0.7]));
    let reports = battle.advance(120_000);

    assert_eq!(
        count(&reports, |e| matches!(e, BattleEvent::UnitSpawned { side: Side::Opponent, .. })),
        0
    );
    assert_eq!(battle.opponent().elixir(), Fixed::from_num(1.9));
}

#[test]
fn opponent_plays_in_its_own_half() {
    let mut battle = battle_with(
        BattleConfig {
            tower_volley_chance: 0.0,
            ..BattleConfig::default()
        },
        ScriptedRandom::new(vec![0.3, 0.9, 0.2]),
    );
    battle.tick();

    let opponent: Vec<_> = battle.units().iter().filter(|u| u.side == Side::Opponent).collect();
    assert_eq!(opponent.len(), 1);
    assert!(opponent[0].position.z >= Fixed::ONE);
    assert_eq!(battle.opponent().last_play_ms(), Some(100));
}

#[test]
fn tower_volley_lands_after_two_seconds() {
    let config = BattleConfig {
        tower_volley_chance: 1.0,
        opponent_min_elixir: 100,
        ..BattleConfig::default()
    };
    let mut battle = battle_with(config, ScriptedRandom::quiet());
    // Goblins card: 400 health. Walks towards the left tower, so stays in range.
    let id = spawn(&mut battle, Side::Player, "goblin", -6.0, 1.5);

    let mut reports = Vec::new();
    for _ in 0..19 {
        reports.push(battle.tick());
    }
    assert_eq!(count(&reports, |e| matches!(e, BattleEvent::ProjectileHit { .. })), 0);
    assert!(count(&reports, |e| matches!(e, BattleEvent::ProjectileFired { .. })) >= 19);

    let report = battle.tick();
    assert!(report
        .events
        .iter()
        .any(|e| matches!(e, BattleEvent::ProjectileHit { target, damage: 150, .. } if *target == id)));
}

#[test]
fn dead_units_are_pruned_with_event() {
    let mut battle = battle_with(passive_opponent(), ScriptedRandom::quiet());
    let knight = spawn(&mut battle, Side::Player, "knight", 0.0, 0.0);
    // Skeletons card: 200 health, two knight swings.
    let skeleton = spawn(&mut battle, Side::Opponent, "skeleton", 0.0, 0.5);

    let reports = battle.advance(3_000);
    assert!(battle.units().iter().all(|u| u.id != skeleton));
    assert!(battle.units().iter().any(|u| u.id == knight));
    assert_eq!(
        count(&reports, |e| matches!(e, BattleEvent::UnitDied { unit, .. } if *unit == skeleton)),
        1
    );
}

#[test]
fn placement_outside_arena_is_clamped() {
    let mut battle = quiet_battle();
    battle.place_card(CardId(0), point(30.0, -40.0)).unwrap();
    assert_eq!(battle.units()[0].position, point(9.0, -15.0));
}

#[test]
fn rejected_plays_change_nothing() {
    let mut battle = quiet_battle();
    let before = battle.snapshot();

    assert!(matches!(
        battle.place_card(CardId(77), point(0.0, -5.0)),
        Err(GameError::UnknownCard(_))
    ));
    assert!(matches!(
        battle.place_card(CardId(8), point(0.0, -5.0)),
        Err(GameError::CardNotInHand(_))
    ));
    assert_eq!(battle.snapshot(), before);
}

#[test]
fn snapshot_reports_unit_keys_and_projectiles() {
    let config = BattleConfig {
        tower_volley_chance: 1.0,
        opponent_min_elixir: 100,
        ..BattleConfig::default()
    };
    let mut battle = Battle::new(standard_catalog(), config, Box::new(ScriptedRandom::quiet())).unwrap();
    spawn(&mut battle, Side::Player, "dragon", 6.0, 2.0);
    battle.tick();

    let snapshot = battle.snapshot();
    assert_eq!(snapshot.units[0].unit_type, "dragon");
    assert!(!snapshot.projectiles.is_empty());
    let arrow = &snapshot.projectiles[0];
    assert!(arrow.progress > Fixed::ZERO && arrow.progress < Fixed::ONE);
}

//! Property tests for battle invariants.

use std::collections::BTreeSet;

use arena_core::arena::{crosses_river, nearest_bridge, BRIDGE_ALIGN_TOLERANCE};
use arena_core::movement::{step_towards, MOVEMENT_STEP};
use arena_core::prelude::*;
use arena_test_utils::fixtures::{seeded_battle, strategies::arb_play, strategies::arb_point};
use proptest::prelude::*;

fn check_state(battle: &Battle) {
    for unit in battle.units() {
        assert!(unit.health <= unit.max_health);
        assert!(unit.is_alive(), "dead units are pruned before the tick ends");
    }
    for side in [Side::Player, Side::Opponent] {
        for (_, tower) in battle.towers().of(side).iter() {
            assert!(tower.health <= tower.max_health);
        }
        assert!(battle.crowns(side) <= 3);
    }

    let hand: BTreeSet<_> = battle.hand().iter().copied().collect();
    assert_eq!(hand.len(), HAND_SIZE, "hand holds four distinct cards");
    assert!(hand.iter().all(|&c| battle.catalog().card(c).is_some()));
    assert!(battle.elixir() >= Fixed::ZERO);
    assert!(battle.elixir() <= battle.config().elixir_cap);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn battle_invariants_hold(seed in any::<u64>(), plays in prop::collection::vec(arb_play(), 0..25)) {
        let mut battle = seeded_battle(seed);
        let mut crowns = (0, 0);
        let mut outcomes = 0;

        for (wait_ms, card, at) in plays {
            let elixir = battle.elixir();
            let hand = *battle.hand();
            if battle.place_card(card, at).is_err() {
                prop_assert_eq!(battle.elixir(), elixir);
                prop_assert_eq!(battle.hand(), &hand);
            }

            for report in battle.advance(wait_ms) {
                outcomes += usize::from(report.outcome.is_some());
                check_state(&battle);
                let now = (battle.crowns(Side::Player), battle.crowns(Side::Opponent));
                prop_assert!(now.0 >= crowns.0 && now.1 >= crowns.1, "crowns never decrease");
                crowns = now;
            }
        }

        while battle.is_running() {
            outcomes += usize::from(battle.tick().outcome.is_some());
            check_state(&battle);
        }
        prop_assert_eq!(outcomes, 1, "a battle ends exactly once");

        let hash = battle.state_hash();
        battle.tick();
        battle.advance(1_000);
        prop_assert_eq!(battle.state_hash(), hash);
    }

    #[test]
    fn ground_units_wait_for_a_bridge(from in arb_point(), to in arb_point()) {
        prop_assume!(crosses_river(from, to));
        let step = Fixed::from_num(1.1) * MOVEMENT_STEP;
        let next = step_towards(from, to, step, false);

        if next.z != from.z {
            prop_assert!((from.x - nearest_bridge(from.x)).abs() <= BRIDGE_ALIGN_TOLERANCE);
        }
    }

    #[test]
    fn flying_units_ignore_the_river(from in arb_point(), to in arb_point()) {
        prop_assume!(crosses_river(from, to));
        let next = step_towards(from, to, MOVEMENT_STEP, true);
        prop_assert!(next.distance(to) < from.distance(to));
    }

    #[test]
    fn same_seed_same_battle(seed in any::<u64>()) {
        let mut a = seeded_battle(seed);
        let mut b = seeded_battle(seed);
        for _ in 0..300 {
            a.tick();
            b.tick();
        }
        prop_assert_eq!(a.state_hash(), b.state_hash());
        prop_assert_eq!(a.snapshot(), b.snapshot());
    }
}

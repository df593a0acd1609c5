//! Session command surface across a whole battle.

use arena_core::prelude::*;
use arena_core::session::EMOTICON_SHOP;
use arena_test_utils::fixtures::{point, standard_catalog};

#[test]
fn full_session_round_trip() {
    let config = BattleConfig {
        duration_ms: 10_000,
        ..BattleConfig::default()
    };
    let mut session = GameSession::new(standard_catalog(), config).with_seed(21);
    assert_eq!(session.phase(), Phase::Loading);
    session.set_phase(Phase::Menu);

    session.start_battle().unwrap();
    assert_eq!(session.phase(), Phase::Battle);
    session.place_card(CardId(0), point(-6.0, -5.0)).unwrap();

    let mut ticks = 0;
    while session.phase() == Phase::Battle {
        session.update_game();
        ticks += 1;
        assert!(ticks <= 100, "a ten second battle ends within 100 ticks");
    }

    assert_eq!(session.phase(), Phase::Menu);
    let result = *session.last_result().unwrap();
    assert_eq!(session.gold(), result.gold);
    assert!(session.snapshot().unwrap().result.is_some());
    assert!(matches!(
        session.place_card(CardId(1), point(0.0, -5.0)),
        Err(GameError::BattleNotRunning)
    ));

    // Spend the winnings in the shop.
    session.set_phase(Phase::Shop);
    let affordable: Vec<_> = EMOTICON_SHOP.iter().filter(|e| e.cost <= session.gold()).collect();
    for emoticon in &affordable {
        let before = session.gold();
        if session.purchase_emoticon(emoticon.id, emoticon.cost) {
            assert_eq!(session.gold(), before - emoticon.cost);
        } else {
            assert_eq!(session.gold(), before);
        }
    }
    assert!(session.emoticons().contains(&EmoticonId(1)));
}

#[test]
fn second_battle_starts_fresh() {
    let config = BattleConfig {
        duration_ms: 1_000,
        ..BattleConfig::default()
    };
    let mut session = GameSession::new(standard_catalog(), config).with_seed(4);
    session.start_battle().unwrap();
    while session.update_game().is_some() {}
    let gold = session.gold();
    assert!(gold > 0);

    session.start_battle().unwrap();
    let battle = session.battle().unwrap();
    assert!(battle.is_running());
    assert_eq!(battle.clock_ms(), 0);
    assert!(session.last_result().is_none());
    assert_eq!(session.gold(), gold);
}

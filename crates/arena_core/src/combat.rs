//! Melee and ranged combat between units and towers.
//!
//! # Engagement
//!
//! Movement and combat share a single notion of "engaged", computed by
//! [`engagement`]:
//!
//! | Check                         | Radius                       | Used by  |
//! |-------------------------------|------------------------------|----------|
//! | nearest enemy unit to hit     | `range`                      | combat   |
//! | any enemy unit close enough   | `max(range, ENGAGE_HOLD_MIN)`| movement |
//! | first standing enemy tower    | `range + TOWER_REACH_BONUS`  | both     |
//!
//! A unit holds position when either of the last two checks succeeds,
//! so two melee units stop a little before they can actually swing.
//!
//! # Resolution
//!
//! Each living unit takes at most one action per tick, gated by its attack
//! cooldown (`1000 / attack_speed` ms). An enemy unit in range always wins
//! over a tower. Damage is applied in place, so later attackers in the same
//! tick see the updated health.

use tracing::trace;

use crate::arena::{TowerSlot, Towers};
use crate::catalog::{Catalog, UnitTypeDefinition};
use crate::components::Unit;
use crate::events::BattleEvent;
use crate::math::{fixed_int, Fixed};
use crate::targeting::nearest_unit_of;

/// Minimum radius within which a nearby enemy unit stops movement.
pub const ENGAGE_HOLD_MIN: Fixed = fixed_int(2);

/// Extra reach granted against towers (towers have a footprint).
pub const TOWER_REACH_BONUS: Fixed = fixed_int(1);

/// What a unit could fight right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Engagement {
    /// Index of the nearest enemy unit within attack range.
    pub unit_in_range: Option<usize>,
    /// Whether any enemy unit is within hold range.
    pub unit_nearby: bool,
    /// First standing enemy tower within reach, in left, right, king order.
    pub tower_in_reach: Option<TowerSlot>,
}

impl Engagement {
    /// Whether the unit should stop moving to fight.
    #[must_use]
    pub const fn holds(&self) -> bool {
        self.unit_nearby || self.tower_in_reach.is_some()
    }
}

/// Compute the engagement state of `unit` against `units` and `towers`.
#[must_use]
pub fn engagement(
    unit: &Unit,
    unit_type: &UnitTypeDefinition,
    units: &[Unit],
    towers: &Towers,
) -> Engagement {
    let enemy = unit.side.opposite();
    let range = unit_type.range;
    let hold_range = range.max(ENGAGE_HOLD_MIN);
    let tower_reach = range + TOWER_REACH_BONUS;

    let unit_in_range = nearest_unit_of(units, enemy, unit.position, range);
    let unit_nearby =
        unit_in_range.is_some() || nearest_unit_of(units, enemy, unit.position, hold_range).is_some();

    let tower_in_reach = towers.of(enemy).iter().find_map(|(slot, tower)| {
        (tower.is_alive() && unit.position.within(slot.position(enemy), tower_reach)).then_some(slot)
    });

    Engagement {
        unit_in_range,
        unit_nearby,
        tower_in_reach,
    }
}

/// Resolve one tick of combat for every living unit.
///
/// `now_ms` is the battle clock used for cooldowns.
pub fn resolve_combat(
    units: &mut [Unit],
    towers: &mut Towers,
    catalog: &Catalog,
    now_ms: u64,
    events: &mut Vec<BattleEvent>,
) {
    for attacker_index in 0..units.len() {
        let attacker = &units[attacker_index];
        if !attacker.is_alive() {
            continue;
        }
        let Some(unit_type) = catalog.unit(attacker.unit_type) else {
            continue;
        };
        if !attacker.can_attack(now_ms, unit_type.attack_interval_ms()) {
            continue;
        }

        let engaged = engagement(attacker, unit_type, units, towers);
        let damage = unit_type.damage;
        let attacker_id = attacker.id;
        let enemy = attacker.side.opposite();

        if let Some(target_index) = engaged.unit_in_range {
            let target = &mut units[target_index];
            let dealt = target.apply_damage(damage);
            let target_id = target.id;
            units[attacker_index].last_attack_ms = Some(now_ms);
            trace!(attacker = %attacker_id, target = %target_id, dealt, "unit attack");
            events.push(BattleEvent::UnitAttacked {
                attacker: attacker_id,
                target: target_id,
                damage: dealt,
            });
        } else if let Some(slot) = engaged.tower_in_reach {
            let dealt = towers.of_mut(enemy).get_mut(slot).apply_damage(damage);
            units[attacker_index].last_attack_ms = Some(now_ms);
            trace!(attacker = %attacker_id, side = %enemy, ?slot, dealt, "tower attack");
            events.push(BattleEvent::TowerDamaged {
                attacker: attacker_id,
                side: enemy,
                slot,
                damage: dealt,
            });
        }
    }
}

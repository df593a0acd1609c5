//! Target selection.
//!
//! Decides where a unit wants to go. Nearby enemy units take precedence
//! over towers (except for tower-only raiders); towers are picked by lane
//! priority so units push down their own lane before switching.
//!
//! Distance ties are broken by iteration order: the first candidate found
//! wins. This is arbitrary but stable.

use crate::arena::{Lane, TowerSet, TowerSlot, Towers};
use crate::catalog::UnitTypeDefinition;
use crate::components::{Side, Unit};
use crate::math::{fixed_int, Fixed, Point};

/// Radius within which an enemy unit overrides tower targeting.
pub const PRIORITY_RADIUS: Fixed = fixed_int(3);

/// Index of the nearest living unit of side `side` within `radius` of `from`.
///
/// Ties keep the earliest unit in slice order.
#[must_use]
pub fn nearest_unit_of(units: &[Unit], side: Side, from: Point, radius: Fixed) -> Option<usize> {
    let radius_sq = radius.saturating_mul(radius);
    let mut best: Option<(usize, Fixed)> = None;

    for (index, other) in units.iter().enumerate() {
        if other.side != side || !other.is_alive() {
            continue;
        }
        let dist_sq = from.distance_squared(other.position);
        if dist_sq > radius_sq {
            continue;
        }
        match best {
            Some((_, best_sq)) if dist_sq >= best_sq => {}
            _ => best = Some((index, dist_sq)),
        }
    }

    best.map(|(index, _)| index)
}

/// Pick which tower of `defender`'s set a unit at `from` should attack.
///
/// Priority: the archer tower in the unit's own lane, then the king, then
/// the other archer tower(s), then anything still standing. The nearest
/// tower of the first non-empty group wins. `None` if every tower is down.
#[must_use]
pub fn tower_target(from: Point, defender: Side, towers: &TowerSet) -> Option<TowerSlot> {
    let lane = Lane::of(from.x);
    let alive: Vec<TowerSlot> = towers.alive_slots().collect();
    if alive.is_empty() {
        return None;
    }

    let same_lane: Vec<TowerSlot> = alive
        .iter()
        .copied()
        .filter(|slot| !slot.is_king() && slot.lane() == lane)
        .collect();
    let king: Vec<TowerSlot> = alive.iter().copied().filter(|slot| slot.is_king()).collect();
    let other_lane: Vec<TowerSlot> = alive
        .iter()
        .copied()
        .filter(|slot| !slot.is_king() && slot.lane() != lane)
        .collect();

    let candidates = [same_lane, king, other_lane]
        .into_iter()
        .find(|group| !group.is_empty())
        .unwrap_or(alive);

    let mut best: Option<(TowerSlot, Fixed)> = None;
    for slot in candidates {
        let dist_sq = from.distance_squared(slot.position(defender));
        match best {
            Some((_, best_sq)) if dist_sq >= best_sq => {}
            _ => best = Some((slot, dist_sq)),
        }
    }
    best.map(|(slot, _)| slot)
}

/// Resolve the point a unit should head towards.
///
/// Returns `None` only when every opposing tower is destroyed and no
/// enemy is close enough to chase.
#[must_use]
pub fn find_target(
    unit: &Unit,
    unit_type: &UnitTypeDefinition,
    units: &[Unit],
    towers: &Towers,
) -> Option<Point> {
    let enemy = unit.side.opposite();

    if !unit_type.tower_only {
        if let Some(index) = nearest_unit_of(units, enemy, unit.position, PRIORITY_RADIUS) {
            return Some(units[index].position);
        }
    }

    tower_target(unit.position, enemy, towers.of(enemy)).map(|slot| slot.position(enemy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, UnitTypeId};
    use crate::components::UnitId;

    fn catalog() -> Catalog {
        Catalog::standard()
    }

    fn unit_at(id: u64, key: &str, side: Side, x: i32, z: i32) -> Unit {
        let (unit_type, def) = catalog().unit_by_key(key).map(|(t, d)| (t, d.max_health)).unwrap();
        Unit::spawn(UnitId(id), unit_type, side, Point::from_ints(x, z), def)
    }

    fn def(key: &str) -> UnitTypeDefinition {
        catalog().unit_by_key(key).unwrap().1.clone()
    }

    #[test]
    fn test_nearest_enemy_in_priority_radius() {
        let me = unit_at(1, "knight", Side::Player, 0, 0);
        let units = vec![
            me.clone(),
            unit_at(2, "goblin", Side::Opponent, 0, 3),
            unit_at(3, "goblin", Side::Opponent, 0, 2),
            unit_at(4, "goblin", Side::Player, 0, 1),
        ];
        let target = find_target(&me, &def("knight"), &units, &Towers::new(2000, 4000));
        assert_eq!(target, Some(Point::from_ints(0, 2)));
    }

    #[test]
    fn test_enemy_outside_radius_is_ignored() {
        let me = unit_at(1, "knight", Side::Player, 0, -4);
        let units = vec![me.clone(), unit_at(2, "goblin", Side::Opponent, 0, 0)];
        let target = find_target(&me, &def("knight"), &units, &Towers::new(2000, 4000));
        // Center lane, no same-lane archer tower: king.
        assert_eq!(target, Some(Point::from_ints(0, 8)));
    }

    #[test]
    fn test_huge_radius_reaches_across_arena() {
        let units = vec![
            unit_at(1, "knight", Side::Player, 0, -14),
            unit_at(2, "goblin", Side::Opponent, 9, 14),
        ];
        let found = nearest_unit_of(&units, Side::Opponent, Point::from_ints(0, -14), fixed_int(60_000));
        assert_eq!(found, Some(1));
    }

    #[test]
    fn test_dead_enemies_are_ignored() {
        let me = unit_at(1, "knight", Side::Player, -6, 0);
        let mut corpse = unit_at(2, "goblin", Side::Opponent, -6, 1);
        corpse.health = 0;
        let units = vec![me.clone(), corpse];
        let target = find_target(&me, &def("knight"), &units, &Towers::new(2000, 4000));
        assert_eq!(target, Some(Point::from_ints(-6, 6)));
    }

    #[test]
    fn test_tower_only_ignores_units() {
        let me = unit_at(1, "hog_rider", Side::Player, 5, 0);
        let units = vec![me.clone(), unit_at(2, "goblin", Side::Opponent, 5, 1)];
        let target = find_target(&me, &def("hog_rider"), &units, &Towers::new(2000, 4000));
        assert_eq!(target, Some(Point::from_ints(6, 6)));
    }

    #[test]
    fn test_tie_goes_to_first_encountered() {
        let me = unit_at(1, "knight", Side::Player, 0, 0);
        let units = vec![
            me.clone(),
            unit_at(2, "goblin", Side::Opponent, 2, 0),
            unit_at(3, "goblin", Side::Opponent, -2, 0),
        ];
        let index = nearest_unit_of(&units, Side::Opponent, me.position, PRIORITY_RADIUS);
        assert_eq!(index, Some(1));
    }

    #[test]
    fn test_lane_priority() {
        let mut towers = Towers::new(2000, 4000);
        let left = Point::from_ints(-5, -2);

        assert_eq!(tower_target(left, Side::Opponent, &towers.opponent), Some(TowerSlot::Left));

        towers.opponent.left.health = 0;
        assert_eq!(tower_target(left, Side::Opponent, &towers.opponent), Some(TowerSlot::King));

        towers.opponent.king.health = 0;
        assert_eq!(tower_target(left, Side::Opponent, &towers.opponent), Some(TowerSlot::Right));

        towers.opponent.right.health = 0;
        assert_eq!(tower_target(left, Side::Opponent, &towers.opponent), None);
    }

    #[test]
    fn test_center_lane_picks_nearest_archer_after_king() {
        let mut towers = TowerSet::new(2000, 4000);
        towers.king.health = 0;
        let from = Point::from_ints(1, 0);
        assert_eq!(tower_target(from, Side::Opponent, &towers), Some(TowerSlot::Right));
    }

    #[test]
    fn test_opponent_units_target_player_towers() {
        let me = unit_at(1, "knight", Side::Opponent, 5, 4);
        let units = vec![me.clone()];
        let target = find_target(&me, &def("knight"), &units, &Towers::new(2000, 4000));
        assert_eq!(target, Some(Point::from_ints(6, -6)));
    }

    #[test]
    fn test_unit_type_lookup_matches_catalog() {
        let (id, _) = catalog().unit_by_key("knight").unwrap();
        assert_eq!(id, UnitTypeId(5));
    }
}

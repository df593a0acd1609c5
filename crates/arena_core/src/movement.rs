//! Unit movement with river and bridge restrictions.
//!
//! Every tick each unit that is not engaged takes one step towards its
//! target. Ground units whose start and target lie on opposite banks of
//! the river must first line up with the nearest bridge: while more than
//! [`BRIDGE_ALIGN_TOLERANCE`] away from the bridge X they slide sideways
//! only, keeping Z unchanged. Flying units go straight.
//!
//! Targeting and engagement read the positions from the start of the
//! tick, so the order of units in the list does not affect who moves.

use crate::arena::{clamp_to_arena, crosses_river, nearest_bridge, Towers, BRIDGE_ALIGN_TOLERANCE};
use crate::catalog::Catalog;
use crate::combat::engagement;
use crate::components::Unit;
use crate::math::{fixed_int, fixed_ratio, Fixed, Point};
use crate::targeting::find_target;

/// Per-tick scale applied to a unit's catalog speed.
pub const MOVEMENT_STEP: Fixed = fixed_ratio(1, 20);

/// Distance at which a unit counts as having reached its target.
pub const ARRIVAL_RADIUS: Fixed = fixed_int(1);

/// Compute one movement step from `position` towards `target`.
///
/// `step` is the distance covered this tick. Returns `position` unchanged
/// when already within [`ARRIVAL_RADIUS`]. The result is not clamped.
#[must_use]
pub fn step_towards(position: Point, target: Point, step: Fixed, flying: bool) -> Point {
    let delta = target - position;
    let distance = position.distance(target);
    if distance <= ARRIVAL_RADIUS {
        return position;
    }

    if !flying && crosses_river(position, target) {
        let bridge = nearest_bridge(position.x);
        if (position.x - bridge).abs() > BRIDGE_ALIGN_TOLERANCE {
            let dx = if position.x < bridge { step } else { -step };
            return Point::new(position.x + dx, position.z);
        }
    }

    Point::new(
        position.x + delta.x / distance * step,
        position.z + delta.z / distance * step,
    )
}

/// Advance every living unit by one tick.
///
/// Units without a target resolve one first. A unit that is engaged stays
/// put. A unit that has arrived without being engaged drops its target so
/// it re-targets on the next tick.
pub fn plan_movement(units: &mut [Unit], towers: &Towers, catalog: &Catalog) {
    let before: Vec<Unit> = units.to_vec();

    for (unit, start) in units.iter_mut().zip(&before) {
        if !start.is_alive() {
            continue;
        }
        let Some(unit_type) = catalog.unit(start.unit_type) else {
            continue;
        };

        if unit.target.is_none() {
            unit.target = find_target(start, unit_type, &before, towers);
        }

        if engagement(start, unit_type, &before, towers).holds() {
            continue;
        }
        let Some(target) = unit.target else {
            continue;
        };

        if start.position.distance(target) <= ARRIVAL_RADIUS {
            unit.target = None;
        } else {
            let step = unit_type.speed * MOVEMENT_STEP;
            unit.position = step_towards(start.position, target, step, unit_type.flying);
        }
        unit.position = clamp_to_arena(unit.position);
    }
}

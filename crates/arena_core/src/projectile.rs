//! Tower projectiles.
//!
//! Archer towers fire in volleys: on a volley tick every standing archer
//! tower shoots one arrow at each enemy unit within [`TOWER_VOLLEY_RADIUS`].
//! Arrows fly for a fixed number of ticks and land exactly once. An arrow
//! whose target is gone by the time it lands is wasted, never redirected.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::arena::{TowerSlot, Towers};
use crate::components::{Side, Unit, UnitId};
use crate::events::BattleEvent;
use crate::math::{fixed_int, fixed_ratio, fixed_serde, Fixed, Point3};

/// Radius within which archer towers shoot enemy units.
pub const TOWER_VOLLEY_RADIUS: Fixed = fixed_int(6);

/// Flight progress added each tick (20 ticks of flight).
pub const PROJECTILE_STEP: Fixed = fixed_ratio(1, 20);

/// Height at which arrows leave the tower.
pub const LAUNCH_HEIGHT: Fixed = fixed_int(2);

/// Height at which arrows meet their target.
pub const IMPACT_HEIGHT: Fixed = fixed_int(1);

/// Unique identifier for a projectile within a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectileId(pub u64);

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projectile-{}", self.0)
    }
}

/// Visual style of a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProjectileKind {
    /// Archer tower arrow.
    #[default]
    Arrow,
    /// Magic fireball.
    Fireball,
    /// Heavy cannonball.
    Cannonball,
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Projectile {
    /// Identifier.
    pub id: ProjectileId,
    /// Visual style.
    pub kind: ProjectileKind,
    /// Side that fired it.
    pub owner: Side,
    /// Launch point.
    pub start: Point3,
    /// Aim point (target position at launch).
    pub end: Point3,
    /// Flight progress in `[0, 1]`.
    #[serde(with = "fixed_serde")]
    pub progress: Fixed,
    /// Damage applied on landing.
    pub damage: u32,
    /// Unit this projectile is aimed at.
    pub target: Option<UnitId>,
}

impl Projectile {
    /// Current interpolated position.
    #[must_use]
    pub fn position(&self) -> Point3 {
        self.start.lerp(self.end, self.progress)
    }

    /// Whether the projectile has reached its aim point.
    #[must_use]
    pub fn has_landed(&self) -> bool {
        self.progress >= Fixed::ONE
    }
}

/// Fire one volley from every standing archer tower.
///
/// `next_id` is the battle's projectile id counter. Returns the new
/// projectiles; they are not yet advanced.
pub fn fire_tower_volley(
    units: &[Unit],
    towers: &Towers,
    damage: u32,
    next_id: &mut u64,
    events: &mut Vec<BattleEvent>,
) -> Vec<Projectile> {
    let mut fired = Vec::new();

    for owner in [Side::Opponent, Side::Player] {
        let set = towers.of(owner);
        for unit in units.iter().filter(|u| u.side != owner && u.is_alive()) {
            for slot in TowerSlot::SIDE {
                if !set.get(slot).is_alive() {
                    continue;
                }
                let origin = slot.position(owner);
                if !origin.within(unit.position, TOWER_VOLLEY_RADIUS) {
                    continue;
                }

                let id = ProjectileId(*next_id);
                *next_id += 1;
                trace!(projectile = %id, side = %owner, ?slot, target = %unit.id, "tower fired");
                events.push(BattleEvent::ProjectileFired {
                    projectile: id,
                    side: owner,
                    slot,
                    target: unit.id,
                });
                fired.push(Projectile {
                    id,
                    kind: ProjectileKind::Arrow,
                    owner,
                    start: Point3::from_plane(origin, LAUNCH_HEIGHT),
                    end: Point3::from_plane(unit.position, IMPACT_HEIGHT),
                    progress: Fixed::ZERO,
                    damage,
                    target: Some(unit.id),
                });
            }
        }
    }

    fired
}

/// Advance every projectile one tick, land the ones that arrive and drop
/// them from the list.
pub fn advance_projectiles(
    projectiles: &mut Vec<Projectile>,
    units: &mut [Unit],
    events: &mut Vec<BattleEvent>,
) {
    for projectile in projectiles.iter_mut() {
        projectile.progress = (projectile.progress + PROJECTILE_STEP).min(Fixed::ONE);
        if !projectile.has_landed() {
            continue;
        }

        let target = projectile
            .target
            .and_then(|id| units.iter_mut().find(|u| u.id == id && u.is_alive()));
        match target {
            Some(unit) => {
                let dealt = unit.apply_damage(projectile.damage);
                events.push(BattleEvent::ProjectileHit {
                    projectile: projectile.id,
                    target: unit.id,
                    damage: dealt,
                });
            }
            None => events.push(BattleEvent::ProjectileMissed {
                projectile: projectile.id,
            }),
        }
    }

    projectiles.retain(|p| !p.has_landed());
}

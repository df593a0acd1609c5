//! Events emitted during a tick.
//!
//! The simulation never talks to presentation code directly; instead each
//! tick reports what happened so hosts can play animations and sounds.

use serde::{Deserialize, Serialize};

use crate::arena::TowerSlot;
use crate::catalog::{CardId, UnitTypeId};
use crate::components::{Side, UnitId};
use crate::projectile::ProjectileId;

/// Something observable that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// A card was played and its unit entered the arena.
    UnitSpawned {
        /// New unit.
        unit: UnitId,
        /// Card that spawned it.
        card: CardId,
        /// Spawned unit type.
        unit_type: UnitTypeId,
        /// Owning side.
        side: Side,
    },
    /// A unit hit another unit.
    UnitAttacked {
        /// Attacking unit.
        attacker: UnitId,
        /// Unit that was hit.
        target: UnitId,
        /// Damage actually removed from the target.
        damage: u32,
    },
    /// A unit hit a tower.
    TowerDamaged {
        /// Attacking unit.
        attacker: UnitId,
        /// Side owning the tower.
        side: Side,
        /// Which tower.
        slot: TowerSlot,
        /// Damage actually removed from the tower.
        damage: u32,
    },
    /// A tower fired at a unit.
    ProjectileFired {
        /// New projectile.
        projectile: ProjectileId,
        /// Side owning the firing tower.
        side: Side,
        /// Firing tower.
        slot: TowerSlot,
        /// Unit the projectile was aimed at.
        target: UnitId,
    },
    /// A projectile reached a unit that was still on the arena.
    ProjectileHit {
        /// Projectile that landed.
        projectile: ProjectileId,
        /// Unit that was hit.
        target: UnitId,
        /// Damage actually removed from the target.
        damage: u32,
    },
    /// A projectile landed after its target was already gone.
    ProjectileMissed {
        /// Projectile that landed.
        projectile: ProjectileId,
    },
    /// A unit reached zero health and was removed.
    UnitDied {
        /// Removed unit.
        unit: UnitId,
        /// Its side.
        side: Side,
    },
    /// A tower's health reached zero.
    TowerDestroyed {
        /// Side owning the tower.
        side: Side,
        /// Which tower.
        slot: TowerSlot,
    },
    /// A side scored a crown.
    CrownAwarded {
        /// Side receiving the crown.
        side: Side,
        /// Crown total after the award.
        crowns: u32,
    },
}

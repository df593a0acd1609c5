//! Battle entity definitions.
//!
//! Plain data for the things that live on the arena: combatant units and
//! which side they fight for. Behavior lives in the system modules
//! (targeting, movement, combat, projectile).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::UnitTypeId;
use crate::math::{Fixed, Point};

/// Unique identifier for a spawned unit. Never reused within a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// Which player a unit or tower belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// The human player, defending the negative-Z half.
    Player,
    /// The scripted opponent, defending the positive-Z half.
    Opponent,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Player => Self::Opponent,
            Self::Opponent => Self::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Opponent => write!(f, "opponent"),
        }
    }
}

/// A combatant on the arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Spawn identifier.
    pub id: UnitId,
    /// Catalog unit type.
    pub unit_type: UnitTypeId,
    /// Current position on the arena plane.
    pub position: Point,
    /// Current health; 0 means dead and awaiting removal.
    pub health: u32,
    /// Health at spawn.
    pub max_health: u32,
    /// Owning side.
    pub side: Side,
    /// Point the unit is walking towards, if resolved.
    pub target: Option<Point>,
    /// Battle clock (ms) of the last attack, `None` if it never attacked.
    pub last_attack_ms: Option<u64>,
}

impl Unit {
    /// Create a freshly spawned unit at full health.
    #[must_use]
    pub fn spawn(id: UnitId, unit_type: UnitTypeId, side: Side, position: Point, health: u32) -> Self {
        Self {
            id,
            unit_type,
            position,
            health,
            max_health: health,
            side,
            target: None,
            last_attack_ms: None,
        }
    }

    /// Check if the unit is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Apply damage, clamping health at zero. Returns the damage actually dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.health);
        self.health -= dealt;
        dealt
    }

    /// Whether the attack cooldown has elapsed at `now_ms`.
    #[must_use]
    pub fn can_attack(&self, now_ms: u64, interval_ms: Fixed) -> bool {
        match self.last_attack_ms {
            None => true,
            Some(last) => {
                let elapsed = Fixed::saturating_from_num(now_ms.saturating_sub(last));
                elapsed >= interval_ms
            }
        }
    }
}

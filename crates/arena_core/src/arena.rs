//! Fixed arena geometry.
//!
//! The arena is a rectangle on the X/Z plane split by a river at `z = 0`.
//! Each side defends three towers; ground units may only cross the river
//! on one of two bridges.
//!
//! ```text
//!   z = +8          [K]            opponent king
//!   z = +6    [L]          [R]     opponent side towers
//!   z =  0  ==#============#==     river, bridges at x = -6 / +6
//!   z = -6    [L]          [R]     player side towers
//!   z = -8          [K]            player king
//! ```

use serde::{Deserialize, Serialize};

use crate::components::Side;
use crate::math::{fixed_int, fixed_ratio, Fixed, Point};

/// X coordinates of the two bridges.
pub const BRIDGE_XS: [Fixed; 2] = [fixed_int(-6), fixed_int(6)];

/// Half-width of the river band; `|z| > RIVER_HALF_WIDTH` is firmly on one side.
pub const RIVER_HALF_WIDTH: Fixed = fixed_ratio(3, 2);

/// Lateral tolerance within which a ground unit counts as lined up with a bridge.
pub const BRIDGE_ALIGN_TOLERANCE: Fixed = fixed_ratio(3, 2);

/// Lower-left corner of the playable area.
pub const ARENA_MIN: Point = Point::from_ints(-9, -15);

/// Upper-right corner of the playable area.
pub const ARENA_MAX: Point = Point::from_ints(9, 15);

/// `|x|` beyond which a position is in a side lane.
pub const LANE_SPLIT: Fixed = fixed_int(2);

/// Clamp a position into the playable area.
#[must_use]
pub fn clamp_to_arena(point: Point) -> Point {
    point.clamp(ARENA_MIN, ARENA_MAX)
}

/// Which bank of the river a Z coordinate is firmly on, if any.
#[must_use]
pub fn river_bank(z: Fixed) -> Option<Side> {
    if z < -RIVER_HALF_WIDTH {
        Some(Side::Player)
    } else if z > RIVER_HALF_WIDTH {
        Some(Side::Opponent)
    } else {
        None
    }
}

/// Whether walking from `from` to `to` crosses the river.
#[must_use]
pub fn crosses_river(from: Point, to: Point) -> bool {
    matches!(
        (river_bank(from.z), river_bank(to.z)),
        (Some(a), Some(b)) if a != b
    )
}

/// X coordinate of the bridge nearest to `x`. Ties go to the left bridge.
#[must_use]
pub fn nearest_bridge(x: Fixed) -> Fixed {
    let [left, right] = BRIDGE_XS;
    if (x - left).abs() <= (x - right).abs() {
        left
    } else {
        right
    }
}

/// Lateral corridor, used for tower priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    /// `x < -2`.
    Left,
    /// `-2 <= x <= 2`.
    Center,
    /// `x > 2`.
    Right,
}

impl Lane {
    /// Lane containing the given X coordinate.
    #[must_use]
    pub fn of(x: Fixed) -> Self {
        if x < -LANE_SPLIT {
            Self::Left
        } else if x > LANE_SPLIT {
            Self::Right
        } else {
            Self::Center
        }
    }
}

/// One of the three tower positions on a side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerSlot {
    /// Left archer tower.
    Left,
    /// Right archer tower.
    Right,
    /// King tower.
    King,
}

impl TowerSlot {
    /// All slots in combat iteration order.
    pub const ALL: [Self; 3] = [Self::Left, Self::Right, Self::King];

    /// Archer (side) towers only.
    pub const SIDE: [Self; 2] = [Self::Left, Self::Right];

    /// Lane guarded by this tower.
    #[must_use]
    pub const fn lane(self) -> Lane {
        match self {
            Self::Left => Lane::Left,
            Self::Right => Lane::Right,
            Self::King => Lane::Center,
        }
    }

    /// Whether this is the king tower.
    #[must_use]
    pub const fn is_king(self) -> bool {
        matches!(self, Self::King)
    }

    /// World position of this tower for the given side.
    #[must_use]
    pub const fn position(self, side: Side) -> Point {
        let depth = match self {
            Self::Left | Self::Right => 6,
            Self::King => 8,
        };
        let x = match self {
            Self::Left => -6,
            Self::Right => 6,
            Self::King => 0,
        };
        match side {
            Side::Player => Point::from_ints(x, -depth),
            Side::Opponent => Point::from_ints(x, depth),
        }
    }
}

/// Health record for a single tower. Towers are never removed; a destroyed
/// tower stays addressable with zero health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tower {
    /// Current health.
    pub health: u32,
    /// Starting health.
    pub max_health: u32,
}

impl Tower {
    /// A tower at full health.
    #[must_use]
    pub const fn new(max_health: u32) -> Self {
        Self {
            health: max_health,
            max_health,
        }
    }

    /// Check if the tower is still standing.
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
}

/// The three towers of one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TowerSet {
    /// Left archer tower.
    pub left: Tower,
    /// Right archer tower.
    pub right: Tower,
    /// King tower.
    pub king: Tower,
}

impl TowerSet {
    /// Fresh towers with the given health values.
    #[must_use]
    pub const fn new(side_health: u32, king_health: u32) -> Self {
        Self {
            left: Tower::new(side_health),
            right: Tower::new(side_health),
            king: Tower::new(king_health),
        }
    }

    /// Tower in a slot.
    #[must_use]
    pub const fn get(&self, slot: TowerSlot) -> &Tower {
        match slot {
            TowerSlot::Left => &self.left,
            TowerSlot::Right => &self.right,
            TowerSlot::King => &self.king,
        }
    }

    /// Mutable tower in a slot.
    pub fn get_mut(&mut self, slot: TowerSlot) -> &mut Tower {
        match slot {
            TowerSlot::Left => &mut self.left,
            TowerSlot::Right => &mut self.right,
            TowerSlot::King => &mut self.king,
        }
    }

    /// Towers in left, right, king order.
    pub fn iter(&self) -> impl Iterator<Item = (TowerSlot, &Tower)> {
        TowerSlot::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }

    /// Slots whose tower still stands.
    pub fn alive_slots(&self) -> impl Iterator<Item = TowerSlot> + '_ {
        self.iter().filter(|(_, t)| t.is_alive()).map(|(slot, _)| slot)
    }

    /// Whether every tower is destroyed.
    #[must_use]
    pub fn all_destroyed(&self) -> bool {
        self.alive_slots().next().is_none()
    }

    /// Slots that went from standing in `before` to destroyed in `self`.
    pub fn fallen_since<'a>(&'a self, before: &'a Self) -> impl Iterator<Item = TowerSlot> + 'a {
        TowerSlot::ALL
            .into_iter()
            .filter(move |&slot| before.get(slot).is_alive() && !self.get(slot).is_alive())
    }
}

/// Both sides' towers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Towers {
    /// Towers defended by the player.
    pub player: TowerSet,
    /// Towers defended by the opponent.
    pub opponent: TowerSet,
}

impl Towers {
    /// Fresh towers for both sides.
    #[must_use]
    pub const fn new(side_health: u32, king_health: u32) -> Self {
        Self {
            player: TowerSet::new(side_health, king_health),
            opponent: TowerSet::new(side_health, king_health),
        }
    }

    /// Towers owned by `side`.
    #[must_use]
    pub const fn of(&self, side: Side) -> &TowerSet {
        match side {
            Side::Player => &self.player,
            Side::Opponent => &self.opponent,
        }
    }

    /// Mutable towers owned by `side`.
    pub fn of_mut(&mut self, side: Side) -> &mut TowerSet {
        match side {
            Side::Player => &mut self.player,
            Side::Opponent => &mut self.opponent,
        }
    }
}

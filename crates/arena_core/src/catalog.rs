//! Unit and card catalog.
//!
//! Static game data: what each unit type can do and which unit each card
//! spawns. A catalog is loaded once and never mutated during a battle.
//!
//! Unit types are addressed at runtime by a numeric [`UnitTypeId`]
//! (their index in load order); the string key (e.g. `"knight"`) is kept
//! for data files and snapshots.
//!
//! # Example RON
//!
//! ```ron
//! (
//!     units: [
//!         (
//!             key: "knight",
//!             name: "Knight",
//!             max_health: 600,
//!             damage: 120,
//!             speed: 1.0,
//!             range: 1.0,
//!             attack_speed: 1.2,
//!             targets: Ground,
//!             flying: false,
//!             cost: 3,
//!         ),
//!     ],
//!     cards: [
//!         (id: 0, name: "Knight", cost: 3, unit: "knight"),
//!     ],
//! )
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{decimal_serde, fixed_ratio, Fixed};

/// Identifier of a card, as shown in the hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Numeric identifier of a unit type (index into the catalog).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitTypeId(pub u16);

/// Which kinds of units a unit type prefers to hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TargetAffinity {
    /// Ground units only.
    #[default]
    Ground,
    /// Air units only.
    Air,
    /// Ground and air units.
    Both,
}

impl TargetAffinity {
    /// Whether flying units are valid targets.
    #[must_use]
    pub const fn hits_air(self) -> bool {
        matches!(self, Self::Air | Self::Both)
    }
}

/// Immutable stats for one unit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTypeDefinition {
    /// Stable string key, referenced by cards.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Baseline maximum health.
    pub max_health: u32,
    /// Damage per attack.
    pub damage: u32,
    /// Movement speed in world units per second (scaled per tick by the planner).
    #[serde(with = "decimal_serde")]
    pub speed: Fixed,
    /// Attack range in world units.
    #[serde(with = "decimal_serde")]
    pub range: Fixed,
    /// Attacks per second.
    #[serde(with = "decimal_serde")]
    pub attack_speed: Fixed,
    /// Target affinity.
    #[serde(default)]
    pub targets: TargetAffinity,
    /// Flying units ignore the river.
    #[serde(default)]
    pub flying: bool,
    /// Units that ignore other units and always head for towers.
    #[serde(default)]
    pub tower_only: bool,
    /// Elixir cost.
    pub cost: u32,
}

impl UnitTypeDefinition {
    /// Minimum milliseconds between two attacks (`1000 / attack_speed`).
    #[must_use]
    pub fn attack_interval_ms(&self) -> Fixed {
        if self.attack_speed <= Fixed::ZERO {
            return Fixed::MAX;
        }
        Fixed::from_num(1000) / self.attack_speed
    }
}

/// Immutable card data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Card identifier.
    pub id: CardId,
    /// Display name.
    pub name: String,
    /// Elixir cost to play.
    pub cost: u32,
    /// Key of the unit type this card spawns.
    pub unit: String,
    /// Presentation-only icon.
    #[serde(default)]
    pub icon: String,
    /// Presentation-only description.
    #[serde(default)]
    pub description: String,
    /// Resolved unit type, filled in when the catalog is built.
    #[serde(skip)]
    pub unit_type: UnitTypeId,
}

impl Default for UnitTypeId {
    fn default() -> Self {
        Self(0)
    }
}

/// Minimum health of a unit spawned from a card.
pub const MIN_SPAWN_HEALTH: u32 = 100;

/// Spawned health per point of card cost.
pub const SPAWN_HEALTH_PER_COST: u32 = 200;

/// Largest speed or range a unit type may declare. Well past the arena
/// diagonal, and small enough that squared distances stay in range.
pub const MAX_UNIT_REACH: Fixed = fixed_ratio(64, 1);

impl CardDefinition {
    /// Health of a unit spawned by this card: `max(100, cost * 200)`.
    #[must_use]
    pub fn spawn_health(&self) -> u32 {
        self.cost
            .saturating_mul(SPAWN_HEALTH_PER_COST)
            .max(MIN_SPAWN_HEALTH)
    }
}

/// Raw catalog document as stored in RON.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogData {
    units: Vec<UnitTypeDefinition>,
    cards: Vec<CardDefinition>,
}

/// The validated unit/card catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    units: Vec<UnitTypeDefinition>,
    /// Sorted by card id.
    cards: Vec<CardDefinition>,
}

impl Catalog {
    /// Build a catalog from parts, resolving card→unit references.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidCatalog`] if the data is inconsistent.
    pub fn new(units: Vec<UnitTypeDefinition>, mut cards: Vec<CardDefinition>) -> Result<Self> {
        if units.len() > usize::from(u16::MAX) {
            return Err(GameError::InvalidCatalog("too many unit types".into()));
        }
        for card in &mut cards {
            let index = units
                .iter()
                .position(|u| u.key == card.unit)
                .ok_or_else(|| {
                    GameError::InvalidCatalog(format!(
                        "card {} spawns unknown unit '{}'",
                        card.id, card.unit
                    ))
                })?;
            card.unit_type = UnitTypeId(index as u16);
        }
        cards.sort_by_key(|c| c.id);

        let catalog = Self { units, cards };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check catalog consistency.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidCatalog`] for empty catalogs, duplicate
    /// keys or ids, dangling card→unit references and unusable stats.
    pub fn validate(&self) -> Result<()> {
        if self.units.is_empty() {
            return Err(GameError::InvalidCatalog("no unit types".into()));
        }
        if self.cards.is_empty() {
            return Err(GameError::InvalidCatalog("no cards".into()));
        }

        let mut keys = HashSet::new();
        for unit in &self.units {
            if !keys.insert(unit.key.as_str()) {
                return Err(GameError::InvalidCatalog(format!(
                    "duplicate unit key '{}'",
                    unit.key
                )));
            }
            if unit.attack_speed <= Fixed::ZERO {
                return Err(GameError::InvalidCatalog(format!(
                    "unit '{}' has non-positive attack speed",
                    unit.key
                )));
            }
            if unit.speed < Fixed::ZERO || unit.range < Fixed::ZERO {
                return Err(GameError::InvalidCatalog(format!(
                    "unit '{}' has negative speed or range",
                    unit.key
                )));
            }
            if unit.speed > MAX_UNIT_REACH || unit.range > MAX_UNIT_REACH {
                return Err(GameError::InvalidCatalog(format!(
                    "unit '{}' has speed or range above {}",
                    unit.key, MAX_UNIT_REACH
                )));
            }
        }

        let mut ids = HashSet::new();
        for card in &self.cards {
            if !ids.insert(card.id) {
                return Err(GameError::InvalidCatalog(format!(
                    "duplicate card id {}",
                    card.id
                )));
            }
            match self.unit(card.unit_type) {
                Some(unit) if unit.key == card.unit => {}
                _ => {
                    return Err(GameError::InvalidCatalog(format!(
                        "card {} spawns unknown unit '{}'",
                        card.id, card.unit
                    )))
                }
            }
        }

        Ok(())
    }

    /// Read, parse and validate a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataRead`] if the file cannot be read, otherwise
    /// the errors of [`Catalog::from_ron_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| GameError::DataRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&text)
    }

    /// Parse and validate a catalog from a RON string.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CatalogParse`] on malformed RON, or
    /// [`GameError::InvalidCatalog`] if validation fails.
    pub fn from_ron_str(ron_text: &str) -> Result<Self> {
        let data: CatalogData =
            ron::from_str(ron_text).map_err(|e| GameError::CatalogParse(e.to_string()))?;
        Self::new(data.units, data.cards)
    }

    /// Render the catalog as a RON document.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Serialization`] if encoding fails.
    pub fn to_ron_string(&self) -> Result<String> {
        let data = CatalogData {
            units: self.units.clone(),
            cards: self.cards.clone(),
        };
        ron::ser::to_string_pretty(&data, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// The standard nine-card catalog.
    #[must_use]
    pub fn standard() -> Self {
        let units = vec![
            unit("skeleton", "Skeleton", 67, 67, (1, 1), (1, 1), (1, 1), TargetAffinity::Ground, 1),
            unit("wizard", "Wizard", 340, 130, (7, 10), (11, 2), (7, 5), TargetAffinity::Both, 5),
            unit("robot", "Robot", 500, 150, (4, 5), (6, 5), (6, 5), TargetAffinity::Ground, 4),
            UnitTypeDefinition {
                flying: true,
                ..unit("dragon", "Baby Dragon", 800, 100, (1, 1), (7, 2), (8, 5), TargetAffinity::Both, 4)
            },
            UnitTypeDefinition {
                tower_only: true,
                ..unit("hog_rider", "Hog Rider", 415, 105, (3, 2), (1, 1), (8, 5), TargetAffinity::Ground, 4)
            },
            unit("knight", "Knight", 600, 120, (1, 1), (1, 1), (6, 5), TargetAffinity::Ground, 3),
            unit("archer", "Archer", 125, 40, (1, 1), (5, 1), (6, 5), TargetAffinity::Both, 3),
            unit("goblin", "Goblin", 100, 80, (13, 10), (1, 1), (11, 10), TargetAffinity::Ground, 2),
            unit("mega_knight", "Mega Knight", 1200, 240, (7, 10), (1, 1), (9, 5), TargetAffinity::Ground, 7),
        ];

        let cards = vec![
            card(0, "Skeletons", 1, 0, "skeleton", "💀", "Cheap melee units"),
            card(1, "Knight", 3, 5, "knight", "🛡️", "Tanky melee fighter"),
            card(2, "Wizard", 5, 1, "wizard", "🧙", "Ranged magic damage"),
            card(3, "Dragon", 4, 3, "dragon", "🐲", "Flying fire breather"),
            card(4, "Hog Rider", 4, 4, "hog_rider", "🐗", "Fast tower destroyer"),
            card(5, "Archers", 3, 6, "archer", "🏹", "Ranged ground support"),
            card(6, "Goblins", 2, 7, "goblin", "👹", "Fast cheap attackers"),
            card(7, "Robot", 4, 2, "robot", "🤖", "Mechanical warrior"),
            card(8, "Mega Knight", 7, 8, "mega_knight", "⚔️", "Massive ground smasher"),
        ];

        Self { units, cards }
    }

    /// Look up a unit type.
    #[must_use]
    pub fn unit(&self, id: UnitTypeId) -> Option<&UnitTypeDefinition> {
        self.units.get(usize::from(id.0))
    }

    /// Find a unit type by its string key.
    #[must_use]
    pub fn unit_by_key(&self, key: &str) -> Option<(UnitTypeId, &UnitTypeDefinition)> {
        self.units
            .iter()
            .enumerate()
            .find(|(_, u)| u.key == key)
            .map(|(i, u)| (UnitTypeId(i as u16), u))
    }

    /// Look up a card.
    #[must_use]
    pub fn card(&self, id: CardId) -> Option<&CardDefinition> {
        self.cards
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|index| &self.cards[index])
    }

    /// All cards in id order.
    pub fn cards(&self) -> impl Iterator<Item = &CardDefinition> {
        self.cards.iter()
    }

    /// All unit types in id order.
    pub fn units(&self) -> impl Iterator<Item = (UnitTypeId, &UnitTypeDefinition)> {
        self.units
            .iter()
            .enumerate()
            .map(|(i, u)| (UnitTypeId(i as u16), u))
    }

    /// Card at a position in id order (used for random draws).
    #[must_use]
    pub fn card_at(&self, index: usize) -> Option<&CardDefinition> {
        self.cards.get(index)
    }

    /// Number of cards.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Cards whose cost fits in the given whole elixir.
    pub fn affordable(&self, elixir: u32) -> impl Iterator<Item = &CardDefinition> {
        self.cards.iter().filter(move |c| c.cost <= elixir)
    }

    /// The card following `id` in id order, wrapping around.
    #[must_use]
    pub fn next_card_after(&self, id: CardId) -> CardId {
        let index = self
            .cards
            .iter()
            .position(|c| c.id == id)
            .map_or(0, |i| (i + 1) % self.cards.len());
        self.cards[index].id
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[allow(clippy::too_many_arguments)]
fn unit(
    key: &str,
    name: &str,
    max_health: u32,
    damage: u32,
    speed: (i32, i32),
    range: (i32, i32),
    attack_speed: (i32, i32),
    targets: TargetAffinity,
    cost: u32,
) -> UnitTypeDefinition {
    UnitTypeDefinition {
        key: key.to_string(),
        name: name.to_string(),
        max_health,
        damage,
        speed: fixed_ratio(speed.0, speed.1),
        range: fixed_ratio(range.0, range.1),
        attack_speed: fixed_ratio(attack_speed.0, attack_speed.1),
        targets,
        flying: false,
        tower_only: false,
        cost,
    }
}

fn card(
    id: u32,
    name: &str,
    cost: u32,
    unit_index: u16,
    unit_key: &str,
    icon: &str,
    description: &str,
) -> CardDefinition {
    CardDefinition {
        id: CardId(id),
        name: name.to_string(),
        cost,
        unit: unit_key.to_string(),
        icon: icon.to_string(),
        description: description.to_string(),
        unit_type: UnitTypeId(unit_index),
    }
}

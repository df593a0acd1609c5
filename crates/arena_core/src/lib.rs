//! # Arena Core
//!
//! Deterministic simulation core for a 1v1 lane-battle arena.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO beyond loading catalog files
//! - No wall clock (hosts feed elapsed time in)
//! - No hidden randomness (every draw goes through an injected source)
//!
//! Fractional quantities use fixed-point math, so the same seed replays the
//! same battle on every platform.
//!
//! ## Crate Structure
//!
//! - [`catalog`] - Unit types and cards
//! - [`arena`] - Towers, river, bridges and bounds
//! - [`targeting`] - Where a unit wants to go
//! - [`movement`] - Stepping towards targets, bridge rule
//! - [`combat`] - Engagement and damage
//! - [`projectile`] - Tower volleys
//! - [`opponent`] - Scripted opponent
//! - [`battle`] - Per-tick orchestration
//! - [`session`] - Phases, gold and cosmetics
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod arena;
pub mod battle;
pub mod catalog;
pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod math;
pub mod movement;
pub mod opponent;
pub mod projectile;
pub mod rng;
pub mod session;
pub mod targeting;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::arena::{Tower, TowerSet, TowerSlot, Towers};
    pub use crate::battle::{Battle, BattleResult, BattleSnapshot, EndReason, TickReport, UnitView};
    pub use crate::catalog::{CardDefinition, CardId, Catalog, TargetAffinity, UnitTypeDefinition, UnitTypeId};
    pub use crate::components::{Side, Unit, UnitId};
    pub use crate::config::{BattleConfig, HAND_SIZE};
    pub use crate::error::{GameError, Result};
    pub use crate::events::BattleEvent;
    pub use crate::math::{Fixed, Point, Point3};
    pub use crate::projectile::{Projectile, ProjectileId};
    pub use crate::rng::{RandomSource, SeededRandom};
    pub use crate::session::{EmoticonId, GameSession, Phase};
}

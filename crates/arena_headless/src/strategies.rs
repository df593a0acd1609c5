//! Scripted player strategies for headless playtesting.
//!
//! The opponent is always the built-in policy; these strategies drive the
//! player's hand.

use std::fmt;
use std::str::FromStr;

use arena_core::battle::Battle;
use arena_core::catalog::CardId;
use arena_core::math::{floor_u32, Point};
use arena_core::rng::RandomSource;
use serde::{Deserialize, Serialize};

/// Where the cheapest strategy drops its units: just in front of the king.
const KING_FRONT: (f64, f64) = (0.0, -6.0);

/// Player placement area for the random strategy (`x` in `[-8, 8)`).
const PLACEMENT_WIDTH: f64 = 16.0;

/// Nearest placement row to the river, on the player's side.
const PLACEMENT_NEAR_Z: f64 = -1.0;

/// Depth of the player's placement area (`z` in `(-12, -1]`).
const PLACEMENT_DEPTH: f64 = 11.0;

/// A card play chosen by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedPlay {
    /// Card to play.
    pub card: CardId,
    /// Where to play it.
    pub position: Point,
}

/// How the player side plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStrategy {
    /// Never plays a card.
    Idle,
    /// Random affordable hand card at a random spot in the player's half.
    #[default]
    Random,
    /// Cheapest affordable hand card, in front of the king tower.
    Cheapest,
}

impl PlayerStrategy {
    /// All strategies.
    pub const ALL: [Self; 3] = [Self::Idle, Self::Random, Self::Cheapest];

    /// Pick a play for the current battle state, if any.
    pub fn decide(self, battle: &Battle, rng: &mut dyn RandomSource) -> Option<PlannedPlay> {
        if !battle.is_running() {
            return None;
        }
        let elixir = floor_u32(battle.elixir());
        let catalog = battle.catalog();
        let affordable: Vec<_> = battle
            .hand()
            .iter()
            .filter_map(|&id| catalog.card(id))
            .filter(|card| card.cost <= elixir)
            .collect();

        match self {
            Self::Idle => None,
            Self::Random => {
                if affordable.is_empty() {
                    return None;
                }
                let card = affordable[rng.gen_index(affordable.len())];
                let x = (rng.next_unit() - 0.5) * PLACEMENT_WIDTH;
                let z = PLACEMENT_NEAR_Z - rng.next_unit() * PLACEMENT_DEPTH;
                Some(PlannedPlay {
                    card: card.id,
                    position: Point::from_f64(x, z),
                })
            }
            Self::Cheapest => affordable.iter().min_by_key(|card| card.cost).map(|card| PlannedPlay {
                card: card.id,
                position: Point::from_f64(KING_FRONT.0, KING_FRONT.1),
            }),
        }
    }
}

impl fmt::Display for PlayerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Random => "random",
            Self::Cheapest => "cheapest",
        };
        f.write_str(name)
    }
}

impl FromStr for PlayerStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "random" => Ok(Self::Random),
            "cheapest" => Ok(Self::Cheapest),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

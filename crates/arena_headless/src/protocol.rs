//! JSON protocol for headless battle control.
//!
//! The interactive runner communicates via JSON lines (one JSON object per
//! line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Battle state updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0"}`
//! 2. Controller sends `start`, then `place` / `tick` / `advance` / `query`
//! 3. Runner outputs state after each tick batch (or on `query`)
//! 4. When the battle ends, outputs `{"type":"game_over",...}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0"}
//! -> {"cmd":"start","seed":42}
//! <- {"type":"started","seed":42,"hand":[0,1,2,3],"elixir":5.0}
//! -> {"cmd":"place","card":1,"x":-6.0,"z":-4.0}
//! <- {"type":"placed","unit":0,"card":1,"elixir":2.0,"hand":[0,4,2,3]}
//! -> {"cmd":"tick","count":10}
//! <- {"type":"state","state":{...},"events":[...]}
//! -> {"cmd":"quit"}
//! <- {"type":"bye"}
//! ```
//!
//! Positions and elixir are reported as decimals here; the simulation
//! itself stays in fixed point.

use serde::{Deserialize, Serialize};

use arena_core::arena::TowerSlot;
use arena_core::battle::{BattleResult, BattleSnapshot};
use arena_core::components::Side;
use arena_core::events::BattleEvent;
use arena_core::math::Fixed;

/// Protocol version reported in the `ready` line.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the interactive runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Start (or restart) a battle.
    Start {
        /// Seed for the battle; the runner's default seed when absent.
        #[serde(default)]
        seed: Option<u64>,
    },

    /// Play a card from the player's hand.
    Place { card: u32, x: f64, z: f64 },

    /// Advance the battle by N ticks (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Advance the battle by wall-clock milliseconds.
    Advance { ms: u64 },

    /// Query current battle state without advancing time.
    Query,

    /// Report the current state hash (for determinism verification).
    Hash,

    /// Quit the runner.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the interactive runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String },

    /// A battle has started.
    Started {
        seed: u64,
        hand: Vec<u32>,
        elixir: f64,
    },

    /// A card was played.
    Placed {
        unit: u64,
        card: u32,
        elixir: f64,
        hand: Vec<u32>,
    },

    /// Current battle state, with the events of the ticks just run.
    State {
        state: StateView,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        events: Vec<BattleEvent>,
    },

    /// State hash for determinism verification.
    StateHash { clock_ms: u64, hash: u64 },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// The battle has ended.
    GameOver { result: BattleResult },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// Decimal view of a battle snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateView {
    pub clock_ms: u64,
    pub remaining_ms: u64,
    pub elixir: f64,
    pub player_crowns: u32,
    pub opponent_crowns: u32,
    pub hand: Vec<u32>,
    pub towers: Vec<TowerState>,
    pub units: Vec<UnitState>,
    pub projectiles: Vec<ProjectileState>,
    pub running: bool,
    pub hash: u64,
}

/// One tower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerState {
    pub side: Side,
    pub slot: TowerSlot,
    pub health: u32,
    pub max_health: u32,
}

/// One unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitState {
    pub id: u64,
    pub unit_type: String,
    pub side: Side,
    pub x: f64,
    pub z: f64,
    pub health: u32,
    pub max_health: u32,
}

/// One projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    pub id: u64,
    pub owner: Side,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub progress: f64,
    pub target: Option<u64>,
}

fn decimal(value: Fixed) -> f64 {
    value.to_num()
}

impl StateView {
    /// Build a decimal view from a snapshot.
    pub fn from_snapshot(snapshot: &BattleSnapshot) -> Self {
        let towers = [Side::Player, Side::Opponent]
            .into_iter()
            .flat_map(|side| {
                snapshot
                    .towers
                    .of(side)
                    .iter()
                    .map(move |(slot, tower)| TowerState {
                        side,
                        slot,
                        health: tower.health,
                        max_health: tower.max_health,
                    })
            })
            .collect();

        let units = snapshot
            .units
            .iter()
            .map(|unit| UnitState {
                id: unit.id.0,
                unit_type: unit.unit_type.clone(),
                side: unit.side,
                x: decimal(unit.position.x),
                z: decimal(unit.position.z),
                health: unit.health,
                max_health: unit.max_health,
            })
            .collect();

        let projectiles = snapshot
            .projectiles
            .iter()
            .map(|p| {
                let at = p.position();
                ProjectileState {
                    id: p.id.0,
                    owner: p.owner,
                    x: decimal(at.x),
                    y: decimal(at.y),
                    z: decimal(at.z),
                    progress: decimal(p.progress),
                    target: p.target.map(|t| t.0),
                }
            })
            .collect();

        Self {
            clock_ms: snapshot.clock_ms,
            remaining_ms: snapshot.remaining_ms,
            elixir: decimal(snapshot.elixir),
            player_crowns: snapshot.player_crowns,
            opponent_crowns: snapshot.opponent_crowns,
            hand: snapshot.hand.iter().map(|c| c.0).collect(),
            towers,
            units,
            projectiles,
            running: snapshot.is_running(),
            hash: snapshot.state_hash(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready() -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    /// Create a state response.
    pub fn state(snapshot: &BattleSnapshot, events: Vec<BattleEvent>) -> Self {
        Self::State {
            state: StateView::from_snapshot(snapshot),
            events,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for error reporting.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Place { .. } => "place",
            Self::Tick { .. } => "tick",
            Self::Advance { .. } => "advance",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

//! Player session: phase, gold, cosmetics and the current battle.
//!
//! The session is the command surface a host drives. It owns at most one
//! [`Battle`] at a time, pays out gold when a battle ends and keeps the
//! emoticon shop. Emote display is purely cosmetic and keyed off the host
//! clock passed in, so it never interacts with battle ticks.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battle::{Battle, BattleResult, BattleSnapshot, TickReport};
use crate::catalog::{CardId, Catalog};
use crate::components::UnitId;
use crate::config::BattleConfig;
use crate::error::{GameError, Result};
use crate::math::Point;
use crate::rng::SeededRandom;

/// How long a displayed emoticon stays visible.
pub const EMOTE_DISPLAY_MS: u64 = 3_000;

/// Top-level screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Assets loading.
    #[default]
    Loading,
    /// Main menu.
    Menu,
    /// Battle in progress.
    Battle,
    /// Emoticon shop.
    Shop,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loading => "loading",
            Self::Menu => "menu",
            Self::Battle => "battle",
            Self::Shop => "shop",
        };
        f.write_str(name)
    }
}

/// Identifier of a purchasable emoticon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmoticonId(pub u32);

/// An emoticon offered in the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emoticon {
    /// Identifier.
    pub id: EmoticonId,
    /// Glyph shown in the arena.
    pub emoji: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Price in gold.
    pub cost: u32,
}

/// Emoticons sold in the shop.
pub const EMOTICON_SHOP: [Emoticon; 6] = [
    Emoticon { id: EmoticonId(1), emoji: "✝️", name: "Cross", cost: 0 },
    Emoticon { id: EmoticonId(2), emoji: "😢", name: "Crying", cost: 100 },
    Emoticon { id: EmoticonId(3), emoji: "😤", name: "Angry", cost: 150 },
    Emoticon { id: EmoticonId(4), emoji: "😎", name: "Cool", cost: 150 },
    Emoticon { id: EmoticonId(5), emoji: "🤔", name: "Thinking", cost: 200 },
    Emoticon { id: EmoticonId(6), emoji: "🎉", name: "Party", cost: 250 },
];

/// Look up a shop emoticon.
#[must_use]
pub fn emoticon(id: EmoticonId) -> Option<&'static Emoticon> {
    EMOTICON_SHOP.iter().find(|e| e.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EmoteDisplay {
    id: EmoticonId,
    shown_at_ms: u64,
}

/// A player's session across battles.
#[derive(Debug)]
pub struct GameSession {
    catalog: Arc<Catalog>,
    config: BattleConfig,
    seed: Option<u64>,
    battles_started: u64,

    phase: Phase,
    gold: u32,
    emoticons: BTreeSet<EmoticonId>,
    emote: Option<EmoteDisplay>,

    battle: Option<Battle>,
    last_result: Option<BattleResult>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(Arc::new(Catalog::standard()), BattleConfig::default())
    }
}

impl GameSession {
    /// New session in the loading phase with no gold.
    ///
    /// Battles draw their randomness from system entropy unless a seed is
    /// set with [`GameSession::with_seed`].
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: BattleConfig) -> Self {
        Self {
            catalog,
            config,
            seed: None,
            battles_started: 0,
            phase: Phase::Loading,
            gold: 0,
            emoticons: BTreeSet::new(),
            emote: None,
            battle: None,
            last_result: None,
        }
    }

    /// Make every battle reproducible. Battle `n` uses `seed + n`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    // ========================================================================
    // Phase and battle commands
    // ========================================================================

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Switch screens. Battle data is left untouched.
    pub fn set_phase(&mut self, phase: Phase) {
        debug!(from = %self.phase, to = %phase, "phase change");
        self.phase = phase;
    }

    /// Start a fresh battle and enter the battle phase.
    ///
    /// # Errors
    ///
    /// Returns an error if the session's battle config does not fit its
    /// catalog.
    pub fn start_battle(&mut self) -> Result<()> {
        let rng = match self.seed {
            Some(seed) => SeededRandom::from_seed(seed.wrapping_add(self.battles_started)),
            None => SeededRandom::from_entropy(),
        };
        let battle = Battle::new(Arc::clone(&self.catalog), self.config.clone(), Box::new(rng))?;
        self.battles_started += 1;
        self.battle = Some(battle);
        self.last_result = None;
        self.phase = Phase::Battle;
        info!(battle = self.battles_started, "session battle started");
        Ok(())
    }

    /// Run one battle tick.
    ///
    /// Does nothing outside the battle phase. When the battle ends, its
    /// gold is credited and the session returns to the menu.
    pub fn update_game(&mut self) -> Option<TickReport> {
        if self.phase != Phase::Battle {
            return None;
        }
        let battle = self.battle.as_mut()?;
        if !battle.is_running() {
            return None;
        }

        let report = battle.tick();
        if let Some(result) = report.outcome {
            self.gold = self.gold.saturating_add(result.gold);
            self.last_result = Some(result);
            self.phase = Phase::Menu;
            info!(gold = result.gold, total = self.gold, "battle rewards credited");
        }
        Some(report)
    }

    /// Play a card in the current battle.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::BattleNotRunning`] outside the battle phase,
    /// otherwise whatever [`Battle::place_card`] rejects.
    pub fn place_card(&mut self, card: CardId, position: Point) -> Result<UnitId> {
        if self.phase != Phase::Battle {
            return Err(GameError::BattleNotRunning);
        }
        self.battle
            .as_mut()
            .ok_or(GameError::BattleNotRunning)?
            .place_card(card, position)
    }

    /// The current or most recent battle.
    #[must_use]
    pub fn battle(&self) -> Option<&Battle> {
        self.battle.as_ref()
    }

    /// Snapshot of the current or most recent battle.
    #[must_use]
    pub fn snapshot(&self) -> Option<BattleSnapshot> {
        self.battle.as_ref().map(Battle::snapshot)
    }

    /// Outcome of the most recent finished battle.
    #[must_use]
    pub fn last_result(&self) -> Option<&BattleResult> {
        self.last_result.as_ref()
    }

    // ========================================================================
    // Gold and cosmetics
    // ========================================================================

    /// Gold balance.
    #[must_use]
    pub fn gold(&self) -> u32 {
        self.gold
    }

    /// Owned emoticons.
    #[must_use]
    pub fn emoticons(&self) -> &BTreeSet<EmoticonId> {
        &self.emoticons
    }

    /// Buy an emoticon.
    ///
    /// Returns `false` and changes nothing if it is already owned or
    /// unaffordable.
    pub fn purchase_emoticon(&mut self, id: EmoticonId, cost: u32) -> bool {
        if self.emoticons.contains(&id) || self.gold < cost {
            return false;
        }
        self.gold -= cost;
        self.emoticons.insert(id);
        debug!(emoticon = id.0, cost, gold = self.gold, "emoticon purchased");
        true
    }

    /// Show an owned emoticon from `now_ms` (host clock) for
    /// [`EMOTE_DISPLAY_MS`]. Returns `false` if it is not owned.
    pub fn display_emoticon(&mut self, id: EmoticonId, now_ms: u64) -> bool {
        if !self.emoticons.contains(&id) {
            return false;
        }
        self.emote = Some(EmoteDisplay {
            id,
            shown_at_ms: now_ms,
        });
        true
    }

    /// Emoticon visible at `now_ms`, if any.
    #[must_use]
    pub fn visible_emoticon(&self, now_ms: u64) -> Option<EmoticonId> {
        self.emote
            .filter(|e| now_ms.saturating_sub(e.shown_at_ms) < EMOTE_DISPLAY_MS)
            .map(|e| e.id)
    }

    /// Drop an emote whose display time has passed.
    pub fn clear_expired_emote(&mut self, now_ms: u64) {
        if self.visible_emoticon(now_ms).is_none() {
            self.emote = None;
        }
    }
}

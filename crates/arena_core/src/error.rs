//! Error types for the arena simulation.
//!
//! Simulation steps never fail. Errors only come out of the command
//! surface (a rejected card placement leaves state untouched) and out of
//! data loading and snapshot encoding.

use thiserror::Error;

use crate::catalog::CardId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all arena errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Card id is not in the catalog.
    #[error("Unknown card: {0}")]
    UnknownCard(CardId),

    /// Card exists but is not in the player's current hand.
    #[error("Card {0} is not in hand")]
    CardNotInHand(CardId),

    /// Not enough elixir to play a card.
    #[error("Insufficient elixir: need {required}, have {available}")]
    InsufficientElixir {
        /// Card cost.
        required: u32,
        /// Whole elixir currently available.
        available: u32,
    },

    /// A battle command arrived while no battle is running.
    #[error("No battle in progress")]
    BattleNotRunning,

    /// Catalog failed to parse.
    #[error("Failed to parse catalog: {0}")]
    CatalogParse(String),

    /// Catalog parsed but is inconsistent.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Battle configuration is malformed or unusable.
    #[error("Invalid battle config: {0}")]
    InvalidConfig(String),

    /// Data file could not be read.
    #[error("Failed to read data file '{path}': {message}")]
    DataRead {
        /// Path to the file that failed to load.
        path: String,
        /// Error message.
        message: String,
    },

    /// Snapshot encoding or decoding failed.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),
}

//! Catalog validation for the `validate` subcommand.
//!
//! Loads a catalog RON file, runs the same checks a battle runs at
//! startup, and summarizes what the file defines.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use arena_core::catalog::Catalog;
use arena_core::config::BattleConfig;

use crate::run_config::RunConfigError;

/// One card as listed in a validation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    /// Card id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Elixir cost.
    pub cost: u32,
    /// Unit type key it spawns.
    pub unit: String,
    /// Health of the spawned unit.
    pub spawn_health: u32,
}

/// Result of validating a catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogReport {
    /// File that was checked.
    pub path: String,
    /// Number of unit types.
    pub unit_types: usize,
    /// Cards in id order.
    pub cards: Vec<CardSummary>,
}

/// Load and validate a catalog file against the given rules.
///
/// # Errors
///
/// Fails if the file is missing or unreadable, is not a valid catalog, or
/// the rules' starting hand does not fit it.
pub fn validate_catalog(path: &Path, rules: &BattleConfig) -> Result<CatalogReport, RunConfigError> {
    if !path.exists() {
        return Err(RunConfigError::FileNotFound(path.display().to_string()));
    }
    let catalog = Catalog::load(path)?;
    rules.validate(&catalog)?;

    let cards = catalog
        .cards()
        .map(|card| CardSummary {
            id: card.id.0,
            name: card.name.clone(),
            cost: card.cost,
            unit: card.unit.clone(),
            spawn_health: card.spawn_health(),
        })
        .collect::<Vec<_>>();

    info!(
        path = %path.display(),
        units = catalog.units().count(),
        cards = cards.len(),
        "Catalog is valid"
    );

    Ok(CatalogReport {
        path: path.display().to_string(),
        unit_types: catalog.units().count(),
        cards,
    })
}

//! Scripted random sources.
//!
//! Tests that need exact control over card draws, opponent choices or
//! tower volleys inject a [`ScriptedRandom`] instead of a seeded generator.

use arena_core::rng::RandomSource;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A random source that replays a fixed list of values, cycling when it
/// runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    #[serde(default)]
    cursor: usize,
}

impl ScriptedRandom {
    /// Replay `values` in order. An empty list behaves like `[0.0]`.
    #[must_use]
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let mut values = values.into();
        if values.is_empty() {
            values.push(0.0);
        }
        Self { values, cursor: 0 }
    }

    /// Always return `value`.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// A source under which [`RandomSource::chance`] never succeeds for
    /// probabilities below 1, so towers never fire.
    #[must_use]
    pub fn quiet() -> Self {
        Self::constant(0.999_999)
    }

    /// Parse a script such as `(values: [0.1, 0.5])`.
    ///
    /// # Errors
    ///
    /// Returns the RON error for malformed input.
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        let script: Self = ron::from_str(text)?;
        Ok(Self::new(script.values))
    }

    /// Number of values drawn so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        trace!(draw = self.cursor, value, "scripted draw");
        value
    }
}

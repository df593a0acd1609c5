//! Determinism testing utilities.
//!
//! Provides a harness for verifying that battles produce identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! A battle must replay exactly from its seed and the list of card plays.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   Simulation math uses [`arena_core::math::Fixed`] throughout.
//!
//! - **Hidden randomness**: Every draw goes through the battle's injected
//!   random source; nothing reads thread-local or system randomness.
//!
//! - **List order**: Movement reads a start-of-tick snapshot, so the order
//!   units were spawned in does not change who moves.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual modules (movement, combat, projectiles)
//! 2. **Property tests**: Random card plays must still replay exactly
//! 3. **Integration tests**: Full battles are reproducible
//! 4. **Parallel tests**: Running N battles on separate threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use arena_core::battle::{Battle, BattleSnapshot};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```ignore
/// use arena_test_utils::determinism::verify_determinism;
/// use arena_test_utils::fixtures::seeded_battle;
///
/// let result = verify_determinism(
///     5,   // Run 5 times
///     300, // 300 ticks each
///     || seeded_battle(42),
///     |battle| { battle.tick(); },
///     |battle| battle.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a battle twice with identical setup and compare final hashes.
pub fn verify_battle_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Battle,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |battle| {
            battle.tick();
        },
        Battle::state_hash,
    )
    .is_deterministic
}

/// Run N battles on scoped threads and collect their final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a battle thread panics.
pub fn run_parallel_battles<F>(setup_fn: F, num_battles: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> Battle + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| {
                s.spawn(|| {
                    let mut battle = setup_fn();
                    for _ in 0..num_ticks {
                        battle.tick();
                    }
                    battle.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("battle thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two battle runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the battles stay identical, `Some(tick)` if they diverge at
/// that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Battle,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        first.tick();
        second.tick();

        if first.state_hash() != second.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a snapshot survives a bincode round-trip unchanged.
pub fn verify_snapshot_roundtrip(snapshot: &BattleSnapshot) -> bool {
    let Ok(bytes) = snapshot.to_bytes() else {
        return false;
    };
    match BattleSnapshot::from_bytes(&bytes) {
        Ok(restored) => restored.state_hash() == snapshot.state_hash() && restored == *snapshot,
        Err(_) => false,
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{quiet_battle, seeded_battle, spawn};
    use arena_core::components::Side;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 10, || 0u64, |n| *n += 1, |n| *n);
        result.assert_deterministic();
        assert_eq!(result.hashes, vec![10, 10, 10]);
    }

    #[test]
    fn test_detects_divergence() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_empty_battle_determinism() {
        assert!(verify_battle_determinism(|| seeded_battle(7), 600));
    }

    #[test]
    fn test_skirmish_determinism() {
        let setup = || {
            let mut battle = seeded_battle(99);
            spawn(&mut battle, Side::Player, "knight", -6.0, -4.0);
            spawn(&mut battle, Side::Player, "archer", -5.0, -6.0);
            spawn(&mut battle, Side::Opponent, "mega_knight", -6.0, 4.0);
            spawn(&mut battle, Side::Opponent, "dragon", 6.0, 6.0);
            battle
        };
        assert_eq!(find_first_divergence(setup, 900), None);
    }

    #[test]
    fn test_parallel_battles_match() {
        run_parallel_battles(|| seeded_battle(1234), 4, 600).assert_deterministic();
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = seeded_battle(1);
        let mut b = seeded_battle(2);
        for _ in 0..900 {
            a.tick();
            b.tick();
        }
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_snapshot_roundtrip_mid_battle() {
        let mut battle = quiet_battle();
        spawn(&mut battle, Side::Player, "wizard", 0.0, -6.0);
        spawn(&mut battle, Side::Opponent, "knight", -6.0, 3.0);
        battle.advance(5_000);
        assert!(verify_snapshot_roundtrip(&battle.snapshot()));
    }
}

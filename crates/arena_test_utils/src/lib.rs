//! # Arena Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Battle fixtures and unit placement helpers
//! - Scripted random sources
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod random;

/// Re-export proptest for convenience.
pub use proptest;

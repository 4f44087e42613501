//! Shared random source and candidate selection
//!
//! One process-wide source, injectable so tests can script or count draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Source of uniform random indices, safe to share across tasks.
pub trait RandomSource: Send + Sync {
    /// Draws one index uniformly from `0..bound`. `bound` is at least 1.
    fn next_index(&self, bound: usize) -> usize;
}

/// OS-seeded random source used in production.
pub struct StdRandom {
    rng: Mutex<StdRng>,
}

impl StdRandom {
    /// Creates a source seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Creates a deterministic source from a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for StdRandom {
    fn next_index(&self, bound: usize) -> usize {
        // A poisoned lock still holds a usable RNG
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random_range(0..bound)
    }
}

/// Picks one element from `items`.
///
/// Empty input yields `None`. A single element is returned as-is without
/// drawing from `source`, so one-item lists stay deterministic. Longer
/// inputs draw one uniform index from the shared source.
pub fn pick<'a, T>(source: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    match items {
        [] => None,
        [only] => Some(only),
        _ => items.get(source.next_index(items.len())),
    }
}

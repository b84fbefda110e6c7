//! Deterministic Randomness
//!
//! Seeded random number generation for exclusive-gateway choices, so that a
//! simulation replays identically from the same seed.

//-----------------------------------------------------------------------------
// Imports
//-----------------------------------------------------------------------------

use rand::prelude::{RngCore, SeedableRng, StdRng};
use rand::Error as RandError;
use rand::Rng;

/// A wrapper around a seeded PRNG that remembers its seed.
#[derive(Debug, Clone)]
pub struct SeededRng {
    rng: StdRng,
    seed: u64,
}

impl SeededRng {
    /// Creates a new RNG instance seeded with the given 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Creates a new RNG instance from entropy.
    /// The drawn seed is kept so the run can be replayed.
    pub fn from_entropy() -> Self {
        let mut entropy_rng = StdRng::from_entropy();
        let seed = entropy_rng.next_u64();
        Self::new(seed)
    }

    /// Returns the seed used to initialize this RNG.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Uniform pick among `items`; `None` when empty.
///
/// Draws exactly one `gen_range(0..len)`, so a seeded run replays the same
/// exclusive choices and left-first picks.
pub fn pick<'a, T, R: RngCore + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.gen_range(0..items.len()))
}

// Implement RngCore so that SeededRng can be used wherever RngCore is expected.
impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        self.rng.try_fill_bytes(dest)
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------

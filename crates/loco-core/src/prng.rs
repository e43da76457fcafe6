//! Two-word rotate/add pseudo-random generator.
//!
//! Saved games and replays depend on every draw landing in the same place,
//! so the stream is fixed bit for bit. Do not tune it.

use rand::{Error, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

const MIX_CONSTANT: u32 = 0x1234_567F;

/// A 64-bit state generator advanced with a rotate/add step.
///
/// Independent instances (the global world stream, one stream per industry)
/// never share draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prng {
    srand0: u32,
    srand1: u32,
}

impl Prng {
    /// Create a generator from its two state words.
    pub const fn new(srand0: u32, srand1: u32) -> Self {
        Self { srand0, srand1 }
    }

    /// First state word.
    pub fn srand_0(&self) -> u32 {
        self.srand0
    }

    /// Second state word.
    pub fn srand_1(&self) -> u32 {
        self.srand1
    }

    /// Advance the state and return the new second word.
    pub fn rand_next(&mut self) -> u32 {
        let s0 = self.srand0;
        self.srand0 = s0.wrapping_add((self.srand1 ^ MIX_CONSTANT).rotate_right(7));
        self.srand1 = s0.rotate_right(3);
        self.srand1
    }

    /// Draw in `[0, high]` (inclusive).
    pub fn rand_next_to(&mut self, high: i32) -> i32 {
        self.rand_next_range(0, high)
    }

    /// Draw in `[low, high]` (inclusive) using a modulo reduction.
    ///
    /// The result is biased towards the low end of the range whenever the
    /// span does not divide 2^31. That bias is part of the replay contract.
    pub fn rand_next_range(&mut self, low: i32, high: i32) -> i32 {
        let positive = (self.rand_next() & 0x7FFF_FFFF) as i32;
        let span = high.wrapping_add(1).wrapping_sub(low);
        debug_assert!(span > 0, "empty range {low}..={high}");
        if span == 0 {
            return low;
        }
        low.wrapping_add(positive % span)
    }

    /// Coin flip on the lowest bit of the next draw.
    pub fn rand_bool(&mut self) -> bool {
        (self.rand_next() & 1) != 0
    }
}

impl RngCore for Prng {
    fn next_u32(&mut self) -> u32 {
        self.rand_next()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(self.rand_next());
        let hi = u64::from(self.rand_next());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.rand_next().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Prng {
    type Seed = [u8; 8];

    /// Seed layout: `srand0` then `srand1`, both little endian.
    fn from_seed(seed: Self::Seed) -> Self {
        let s0 = u32::from_le_bytes([seed[0], seed[1], seed[2], seed[3]]);
        let s1 = u32::from_le_bytes([seed[4], seed[5], seed[6], seed[7]]);
        Self::new(s0, s1)
    }
}

use rand::{RngCore, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

// Substituted for a zero seed, which is a fixed point of the recurrence.
const ZERO_SEED_STATE: u64 = 0x9e37_79b9_7f4a_7c15;

/// A small, fast xorshift random source over 64 bits of state.
///
/// This is the random source [`GeneratorArgs`](crate::GeneratorArgs) falls
/// back to when none is supplied. Being an [`RngCore`], it can feed any of
/// `rand`'s range sampling, and [`int63()`](XorShift64::int63) exposes the raw
/// non-negative draw directly.
///
/// # Examples
///
/// ```
/// use rand::Rng;
///
/// let mut rng = regen::XorShift64::new(42);
/// assert!(rng.int63() >= 0);
/// assert!((0..10).contains(&rng.random_range(0..10)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a source from a seed. Equal seeds yield equal streams.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { ZERO_SEED_STATE } else { seed },
        }
    }

    /// Creates a source seeded from the wall clock.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64);
        Self::new(nanos)
    }

    /// Returns a uniformly distributed integer in `0..=i64::MAX`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn int63(&mut self) -> i64 {
        (self.step() & (u64::MAX >> 1)) as i64
    }

    fn step(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl RngCore for XorShift64 {
    #[allow(clippy::cast_possible_truncation)]
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for XorShift64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

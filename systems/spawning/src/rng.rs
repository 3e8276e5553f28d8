//! Portable random streams reproducing the contest's reference generator.
//!
//! The reference tool draws from a 64-bit Mersenne Twister through the GNU
//! C++ library's uniform integer, canonical real, and normal distributions.
//! Every algorithm below matches those bit for bit so that a seed yields the
//! same test case in either implementation.

use rand_core::{impls, Error, RngCore, SeedableRng};

const STATE_WORDS: usize = 312;
const SHIFT_WORDS: usize = 156;
const MATRIX_A: u64 = 0xb502_6f5a_a966_19e9;
const UPPER_MASK: u64 = 0xffff_ffff_8000_0000;
const LOWER_MASK: u64 = 0x7fff_ffff;
const INIT_MULTIPLIER: u64 = 6_364_136_223_846_793_005;

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;
const LARGEST_BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// 64-bit Mersenne Twister (MT19937-64).
#[derive(Clone)]
pub struct Mt64 {
    state: [u64; STATE_WORDS],
    index: usize,
}

impl Mt64 {
    /// Seeds the generator directly with `seed`, without any seed expansion.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut state = [0_u64; STATE_WORDS];
        state[0] = seed;
        for i in 1..STATE_WORDS {
            let previous = state[i - 1];
            state[i] = INIT_MULTIPLIER
                .wrapping_mul(previous ^ (previous >> 62))
                .wrapping_add(i as u64);
        }
        Self {
            state,
            index: STATE_WORDS,
        }
    }

    fn twist(&mut self) {
        for k in 0..STATE_WORDS {
            let bits =
                (self.state[k] & UPPER_MASK) | (self.state[(k + 1) % STATE_WORDS] & LOWER_MASK);
            let mut mixed = bits >> 1;
            if bits & 1 != 0 {
                mixed ^= MATRIX_A;
            }
            self.state[k] = self.state[(k + SHIFT_WORDS) % STATE_WORDS] ^ mixed;
        }
        self.index = 0;
    }
}

impl std::fmt::Debug for Mt64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mt64").field("index", &self.index).finish()
    }
}

impl RngCore for Mt64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        if self.index >= STATE_WORDS {
            self.twist();
        }
        let mut value = self.state[self.index];
        self.index += 1;

        value ^= (value >> 29) & 0x5555_5555_5555_5555;
        value ^= (value << 17) & 0x71d6_7fff_eda6_0000;
        value ^= (value << 37) & 0xfff7_eee0_0000_0000;
        value ^= value >> 43;
        value
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mt64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

/// Draws a uniform integer in `[low, high]` using a 128-bit multiply-and-reject
/// reduction of one full 64-bit output.
pub fn uniform_int<R: RngCore + ?Sized>(rng: &mut R, low: u32, high: u32) -> u32 {
    debug_assert!(low <= high, "uniform_int requires low <= high");
    let range = u64::from(high.saturating_sub(low)) + 1;
    let mut product = u128::from(rng.next_u64()) * u128::from(range);
    let mut low_bits = product as u64;
    if low_bits < range {
        let threshold = range.wrapping_neg() % range;
        while low_bits < threshold {
            product = u128::from(rng.next_u64()) * u128::from(range);
            low_bits = product as u64;
        }
    }
    low + (product >> 64) as u32
}

/// Draws a real in `[0, 1)` from one 64-bit output.
pub fn canonical<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    let value = rng.next_u64() as f64 / TWO_POW_64;
    if value >= 1.0 {
        LARGEST_BELOW_ONE
    } else {
        value
    }
}

/// Normal distribution sampled with the Marsaglia polar method.
///
/// Each accepted pair of canonical reals yields two deviates; the second is
/// cached and returned by the next call on the same instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarNormal {
    mean: f64,
    deviation: f64,
    saved: Option<f64>,
}

impl PolarNormal {
    /// Creates a distribution with the provided mean and standard deviation.
    #[must_use]
    pub const fn new(mean: f64, deviation: f64) -> Self {
        Self {
            mean,
            deviation,
            saved: None,
        }
    }

    /// Draws the next value, reusing the cached deviate when available.
    pub fn sample<R: RngCore + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let deviate = match self.saved.take() {
            Some(saved) => saved,
            None => loop {
                let x = 2.0 * canonical(rng) - 1.0;
                let y = 2.0 * canonical(rng) - 1.0;
                let radius = x * x + y * y;
                if radius > 1.0 || radius == 0.0 {
                    continue;
                }
                let multiplier = (-2.0 * radius.ln() / radius).sqrt();
                self.saved = Some(x * multiplier);
                break y * multiplier;
            },
        };
        deviate * self.deviation + self.mean
    }
}

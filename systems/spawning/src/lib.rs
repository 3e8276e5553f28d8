#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawn-schedule generator for Tool-Assisted Shooting test cases.
//!
//! A schedule is drawn lane by lane and turn by turn from a seeded stream.
//! The draw order is fixed: one spawn percentage per lane, then for every turn
//! and lane one percentage roll followed, on success, by one hit-point and one
//! power draw. Changing that order changes every test case downstream.

pub mod rng;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tas_core::{Rules, SpawnRecord, SpawnSchedule};

use crate::rng::{uniform_int, Mt64, PolarNormal};

/// Aggregated tuning knobs controlling the difficulty ramp of generated cases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnTuning {
    /// Lowest per-lane spawn percentage.
    pub min_percent: u32,
    /// Highest per-lane spawn percentage.
    pub max_percent: u32,
    /// Sides of the per-turn percentage roll; a lane spawns when the roll is at most its percentage.
    pub roll_sides: u32,
    /// Hit-point mean at turn zero.
    pub hp_mean_base: f64,
    /// Hit-point mean growth per turn.
    pub hp_mean_slope: f64,
    /// Hit-point standard deviation at turn zero.
    pub hp_deviation_base: f64,
    /// Hit-point standard deviation growth per turn.
    pub hp_deviation_slope: f64,
    /// Power mean as a ratio of the drawn hit points.
    pub power_mean_ratio: f64,
    /// Power standard deviation as a ratio of the drawn hit points.
    pub power_deviation_ratio: f64,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            min_percent: 1,
            max_percent: 8,
            roll_sides: 100,
            hp_mean_base: 7.5,
            hp_mean_slope: 0.15,
            hp_deviation_base: 1.5,
            hp_deviation_slope: 0.03,
            power_mean_ratio: 0.8,
            power_deviation_ratio: 0.1,
        }
    }
}

/// Random stream used to draw a schedule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RngEngine {
    /// MT19937-64 with the reference tool's distributions; portable across implementations.
    #[default]
    Mt64,
    /// ChaCha8 with `rand_distr` normals; reproducible only within this implementation.
    ChaCha8,
}

/// Source of the draws consumed by [`ScheduleGenerator`].
pub trait SpawnSampler {
    /// Draws a uniform integer in `[low, high]`.
    fn uniform(&mut self, low: u32, high: u32) -> u32;

    /// Starts a turn whose hit-point draws follow `Normal(mean, deviation)`.
    fn begin_turn(&mut self, mean: f64, deviation: f64);

    /// Draws hit points from the distribution of the current turn.
    fn hit_points(&mut self) -> f64;

    /// Draws power from a distribution that lives for this draw only.
    fn power(&mut self, mean: f64, deviation: f64) -> f64;
}

/// Sampler reproducing the reference tool bit for bit.
///
/// The hit-point distribution is recreated at every turn boundary, so its
/// cached polar deviate carries over between spawns of the same turn only.
#[derive(Clone, Debug)]
pub struct PortableSampler {
    rng: Mt64,
    hit_points: PolarNormal,
}

impl PortableSampler {
    /// Creates a sampler seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mt64::new(seed),
            hit_points: PolarNormal::new(0.0, 1.0),
        }
    }
}

impl SpawnSampler for PortableSampler {
    fn uniform(&mut self, low: u32, high: u32) -> u32 {
        uniform_int(&mut self.rng, low, high)
    }

    fn begin_turn(&mut self, mean: f64, deviation: f64) {
        self.hit_points = PolarNormal::new(mean, deviation);
    }

    fn hit_points(&mut self) -> f64 {
        self.hit_points.sample(&mut self.rng)
    }

    fn power(&mut self, mean: f64, deviation: f64) -> f64 {
        PolarNormal::new(mean, deviation).sample(&mut self.rng)
    }
}

/// Sampler backed by ChaCha8; faster to reason about, not portable.
#[derive(Clone, Debug)]
pub struct ChaChaSampler {
    rng: ChaCha8Rng,
    hp_mean: f64,
    hp_deviation: f64,
}

impl ChaChaSampler {
    /// Creates a sampler seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            hp_mean: 0.0,
            hp_deviation: 1.0,
        }
    }

    fn normal(&mut self, mean: f64, deviation: f64) -> f64 {
        let deviate: f64 = StandardNormal.sample(&mut self.rng);
        deviate * deviation + mean
    }
}

impl SpawnSampler for ChaChaSampler {
    fn uniform(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }

    fn begin_turn(&mut self, mean: f64, deviation: f64) {
        self.hp_mean = mean;
        self.hp_deviation = deviation;
    }

    fn hit_points(&mut self) -> f64 {
        self.normal(self.hp_mean, self.hp_deviation)
    }

    fn power(&mut self, mean: f64, deviation: f64) -> f64 {
        self.normal(mean, deviation)
    }
}

/// Pure system that turns a seed into a complete [`SpawnSchedule`].
#[derive(Clone, Debug, Default)]
pub struct ScheduleGenerator {
    rules: Rules,
    tuning: SpawnTuning,
}

impl ScheduleGenerator {
    /// Creates a generator for the provided field and difficulty ramp.
    #[must_use]
    pub fn new(rules: Rules, tuning: SpawnTuning) -> Self {
        Self { rules, tuning }
    }

    /// Generates the schedule for `seed` on the requested random stream.
    #[must_use]
    pub fn generate(&self, engine: RngEngine, seed: u64) -> SpawnSchedule {
        match engine {
            RngEngine::Mt64 => self.generate_with(&mut PortableSampler::new(seed)),
            RngEngine::ChaCha8 => self.generate_with(&mut ChaChaSampler::new(seed)),
        }
    }

    /// Generates a schedule from an arbitrary sampler.
    pub fn generate_with<S: SpawnSampler + ?Sized>(&self, sampler: &mut S) -> SpawnSchedule {
        let tuning = &self.tuning;
        let percentages: Vec<u32> = (0..self.rules.width)
            .map(|_| sampler.uniform(tuning.min_percent, tuning.max_percent))
            .collect();

        let mut turns = Vec::with_capacity(self.rules.max_turn as usize);
        for turn in 1..=self.rules.max_turn {
            let elapsed = f64::from(turn);
            sampler.begin_turn(
                tuning.hp_mean_base + tuning.hp_mean_slope * elapsed,
                tuning.hp_deviation_base + tuning.hp_deviation_slope * elapsed,
            );

            let mut spawns = Vec::new();
            for (lane, percentage) in (0_u32..).zip(&percentages) {
                let roll = sampler.uniform(1, tuning.roll_sides);
                if roll > *percentage {
                    continue;
                }

                let hp = sampler.hit_points();
                let power = sampler.power(
                    hp * tuning.power_mean_ratio,
                    hp * tuning.power_deviation_ratio,
                );
                spawns.push(SpawnRecord::new(
                    truncate_at_least(hp, 1),
                    truncate_at_least(power, 0),
                    lane,
                ));
            }
            turns.push(spawns);
        }

        SpawnSchedule::new(percentages, turns)
    }
}

/// Truncates toward zero and raises the result to `floor`.
fn truncate_at_least(value: f64, floor: u32) -> u32 {
    let truncated = value as i64;
    u32::try_from(truncated.max(i64::from(floor))).unwrap_or(u32::MAX)
}

/// SHA-256 digest of the schedule's canonical text encoding.
#[must_use]
pub fn fingerprint(schedule: &SpawnSchedule) -> [u8; 32] {
    Sha256::digest(schedule.encode().as_bytes()).into()
}

/// Lowercase hexadecimal rendering of [`fingerprint`].
#[must_use]
pub fn fingerprint_hex(schedule: &SpawnSchedule) -> String {
    fingerprint(schedule)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

//! Sampled performance telemetry.
//!
//! One tick in a hundred emits a [`PerformanceSample`] to the
//! `holocard::perf` tracing target. The sampler owns a seeded RNG so tests
//! can pin the exact ticks that report.

use holocard_shared::Rarity;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Tracing target for performance samples.
pub const PERF_TARGET: &str = "holocard::perf";

/// Default sampling probability per tick.
pub const SAMPLE_PROBABILITY: f64 = 0.01;

/// A single performance report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSample {
    /// Instantaneous frame rate (1 / dt).
    pub fps: f32,
    /// Frame time in milliseconds.
    pub render_time_ms: f32,
    /// Rarity whose program was drawn.
    pub shader_type: Rarity,
}

/// Bernoulli sampler over ticks.
#[derive(Debug, Clone)]
pub struct PerfSampler {
    rng: ChaCha8Rng,
    probability: f64,
}

impl PerfSampler {
    /// Sampler with the default 1 % probability.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_probability(seed, SAMPLE_PROBABILITY)
    }

    /// Sampler with a custom probability (clamped to `0..=1`).
    #[must_use]
    pub fn with_probability(seed: u64, probability: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            probability: if probability.is_finite() {
                probability.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    /// Sampling probability.
    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Rolls once. On a hit, logs and returns the sample.
    pub fn sample(&mut self, dt: f32, rarity: Rarity) -> Option<PerformanceSample> {
        if !self.rng.gen_bool(self.probability) {
            return None;
        }

        let sample = PerformanceSample {
            fps: if dt > 0.0 { 1.0 / dt } else { 0.0 },
            render_time_ms: dt * 1000.0,
            shader_type: rarity,
        };
        tracing::info!(
            target: PERF_TARGET,
            fps = sample.fps,
            render_time_ms = sample.render_time_ms,
            shader_type = %rarity,
            "performance sample"
        );
        Some(sample)
    }
}

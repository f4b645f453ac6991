//! Frame animation pipeline.
//!
//! Runs once per tick while a card is mounted:
//!
//! ```text
//! FrameState ──► FrameAnimator::tick
//!                   ├── 1. elapsed += dt ──► material `time` uniform
//!                   ├── 2. ambient bob/sway (Rare+)
//!                   ├── 3. 1 % PerformanceSample ──► tracing `holocard::perf`
//!                   └── 4. ParticleField::tick
//! ```
//!
//! With animations disabled the animator does nothing at all: time freezes,
//! the material is untouched and particles hold still.

mod frame;
mod sampler;
mod stats;

pub use frame::{FrameState, SceneFrame};
pub use sampler::{PerfSampler, PerformanceSample, PERF_TARGET, SAMPLE_PROBABILITY};
pub use stats::ViewerStats;

use crate::effects::ParticleField;
use crate::material::MaterialDescriptor;
use holocard_shared::{Rarity, Vec3};
use holocard_ui::PoseState;

/// Vertical bob amplitude.
pub const BOB_AMPLITUDE: f32 = 0.05;
/// Bob angular frequency (rad/s).
pub const BOB_FREQUENCY: f32 = 2.0;
/// Z-sway amplitude (radians).
pub const SWAY_AMPLITUDE: f32 = 0.02;

/// Idle motion layered on top of the interactive pose.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmbientMotion {
    /// Added to position.y.
    pub bob: f32,
    /// Added to rotation.z.
    pub sway: f32,
}

impl AmbientMotion {
    /// Motion at animator time `t`. Zero below Rare.
    #[must_use]
    pub fn at(rarity: Rarity, t: f32) -> Self {
        if !rarity.is_premium() {
            return Self::default();
        }
        Self {
            bob: (t * BOB_FREQUENCY).sin() * BOB_AMPLITUDE,
            sway: t.sin() * SWAY_AMPLITUDE,
        }
    }

    /// Composes the motion onto `pose`.
    #[must_use]
    pub fn apply(&self, mut pose: PoseState) -> PoseState {
        pose.position = pose.position + Vec3::new(0.0, self.bob, 0.0);
        pose.rotation = pose.rotation + Vec3::new(0.0, 0.0, self.sway);
        pose
    }
}

/// Output of one animated tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Animator time after this tick.
    pub elapsed: f32,
    /// Ambient motion for this tick.
    pub ambient: AmbientMotion,
    /// Present on the ~1 % of ticks that report.
    pub sample: Option<PerformanceSample>,
}

/// Per-card animator.
#[derive(Debug, Clone)]
pub struct FrameAnimator {
    rarity: Rarity,
    enabled: bool,
    elapsed: f32,
    sampler: PerfSampler,
}

impl FrameAnimator {
    /// Creates an animator at time zero.
    #[must_use]
    pub fn new(rarity: Rarity, enabled: bool, sampler: PerfSampler) -> Self {
        Self {
            rarity,
            enabled,
            elapsed: 0.0,
            sampler,
        }
    }

    /// True while ticks animate.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Pauses or resumes. Time resumes from where it froze.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Animator time.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Ambient motion at the current (possibly frozen) time.
    #[must_use]
    pub fn ambient(&self) -> AmbientMotion {
        AmbientMotion::at(self.rarity, self.elapsed)
    }

    /// Runs one tick. Returns `None`, touching nothing, when disabled.
    pub fn tick(
        &mut self,
        frame: &FrameState,
        material: &mut MaterialDescriptor,
        particles: Option<&mut ParticleField>,
    ) -> Option<FrameTick> {
        if !self.enabled {
            return None;
        }

        let dt = frame.delta_time.max(0.0);
        self.elapsed += dt;
        material.set_time(self.elapsed);

        let sample = self.sampler.sample(dt, self.rarity);

        if let Some(field) = particles {
            field.tick(dt, self.elapsed);
        }

        Some(FrameTick {
            elapsed: self.elapsed,
            ambient: self.ambient(),
            sample,
        })
    }
}

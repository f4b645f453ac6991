//! Per-frame data.
//!
//! Hosts hand a [`FrameState`] to the viewer every tick. Nothing in the
//! renderer reads a clock of its own.

use crate::material::ShaderProgram;
use holocard_shared::{QualityTier, Vec3};
use holocard_ui::PoseState;

use super::AmbientMotion;

/// Clock and camera for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Seconds since the host loop started.
    pub time: f32,
    /// Seconds since the previous tick.
    pub delta_time: f32,
    /// Eye position.
    pub camera_position: Vec3,
    /// Monotonic frame counter.
    pub frame_number: u64,
}

impl FrameState {
    /// Default camera distance along +z.
    pub const CAMERA_DISTANCE: f32 = 5.0;

    /// First frame at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            time: 0.0,
            delta_time: 0.0,
            camera_position: Vec3::new(0.0, 0.0, Self::CAMERA_DISTANCE),
            frame_number: 0,
        }
    }

    /// The next frame, `dt` seconds later.
    #[must_use]
    pub fn advance(&self, dt: f32) -> Self {
        let dt = dt.max(0.0);
        Self {
            time: self.time + dt,
            delta_time: dt,
            camera_position: self.camera_position,
            frame_number: self.frame_number + 1,
        }
    }
}

impl Default for FrameState {
    fn default() -> Self {
        Self::new()
    }
}

/// What the 3D path produced for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    /// Frame counter.
    pub frame_number: u64,
    /// Program bound to the card.
    pub program: ShaderProgram,
    /// Concrete quality in use.
    pub quality: QualityTier,
    /// Pose after spring integration and ambient motion.
    pub pose: PoseState,
    /// Ambient bob/sway applied this frame.
    pub ambient: AmbientMotion,
    /// Animator time written into the material.
    pub material_time: f32,
    /// False until the artwork resolves.
    pub mesh_visible: bool,
    /// Live particles.
    pub particles: usize,
    /// Draw calls issued.
    pub draw_calls: u32,
}

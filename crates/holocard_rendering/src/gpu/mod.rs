//! # GPU Backend Seam
//!
//! The viewer never touches wgpu directly. It talks to a [`RenderBackend`]
//! through opaque handles:
//!
//! ```text
//! CardViewer ──create_material──► MaterialHandle ─┐
//!            ──create_particle_buffer──► ParticleHandle
//!            ──draw(DrawFrame)──► DrawReport      │
//!            ──release_*──────────────────────────┘  (rebuild, fallback, unmount)
//! ```
//!
//! - [`WgpuBackend`] renders into an offscreen target on a real adapter.
//! - [`RecordingBackend`] records every call; used by tests and `--no-gpu`.

mod mesh;
mod recording;
mod wgpu_backend;

pub use mesh::{card_mesh, CardVertex};
pub use recording::{BackendCall, RecordingBackend, RecordingLog};
pub use wgpu_backend::WgpuBackend;

use crate::effects::ParticleVertex;
use crate::error::RenderResult;
use crate::material::{MaterialDescriptor, MaterialUniforms, TextureImage};
use bytemuck::{Pod, Zeroable};

/// Opaque material (pipeline + bind group + texture) handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(pub u64);

/// Opaque particle instance buffer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleHandle(pub u64);

/// Scene-wide uniforms, bound at group 0 binding 0 by every pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    /// Camera view-projection
    pub view_proj: [[f32; 4]; 4],
    /// Card model matrix (pose)
    pub model: [[f32; 4]; 4],
    /// Shadow light view-projection
    pub light_view_proj: [[f32; 4]; 4],
    /// Eye (xyz) + environment intensity (w)
    pub camera_pos: [f32; 4],
    /// Billboard right axis
    pub camera_right: [f32; 4],
    /// Billboard up axis
    pub camera_up: [f32; 4],
    /// Direction towards the key light (xyz) + intensity (w)
    pub light_dir: [f32; 4],
    /// Ambient colour (rgb) + intensity (w)
    pub ambient: [f32; 4],
    /// Accent light position (xyz) + intensity (w, 0 = off)
    pub accent_pos: [f32; 4],
    /// Accent light colour
    pub accent_color: [f32; 4],
    /// Shadow enabled (x, 0 or 1) + depth bias (y)
    pub shadow: [f32; 4],
}

impl SceneUniforms {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

impl Default for SceneUniforms {
    fn default() -> Self {
        let identity = holocard_shared::Mat4::IDENTITY.cols;
        Self {
            view_proj: identity,
            model: identity,
            light_view_proj: identity,
            camera_pos: [0.0, 0.0, 5.0, 0.0],
            camera_right: [1.0, 0.0, 0.0, 0.0],
            camera_up: [0.0, 1.0, 0.0, 0.0],
            light_dir: [0.0, 0.0, 1.0, 1.0],
            ambient: [1.0, 1.0, 1.0, 0.4],
            accent_pos: [0.0; 4],
            accent_color: [0.0; 4],
            shadow: [0.0; 4],
        }
    }
}

/// The card mesh for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardDraw {
    /// Material to bind.
    pub material: MaterialHandle,
    /// Uniforms for this frame (time changes every tick).
    pub uniforms: MaterialUniforms,
    /// Render into the shadow map first.
    pub casts_shadow: bool,
}

/// The particle pass for one frame.
#[derive(Debug, Clone, Copy)]
pub struct ParticleDraw<'a> {
    /// Instance buffer.
    pub buffer: ParticleHandle,
    /// Instances to upload and draw.
    pub instances: &'a [ParticleVertex],
}

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct DrawFrame<'a> {
    /// Frame counter.
    pub frame_number: u64,
    /// Scene uniforms.
    pub scene: SceneUniforms,
    /// Shadow map size; `None` disables the shadow pass.
    pub shadow_map_size: Option<u32>,
    /// Card mesh, absent while the artwork is loading.
    pub card: Option<CardDraw>,
    /// Particle pass, if a field is attached.
    pub particles: Option<ParticleDraw<'a>>,
}

/// What a backend did for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawReport {
    /// Draw calls issued, shadow pass included.
    pub draw_calls: u32,
}

/// A GPU (or stand-in) the viewer can render through.
pub trait RenderBackend {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Builds the pipeline, texture and bind group for a material.
    ///
    /// # Errors
    ///
    /// Shader validation, allocation or device failures.
    fn create_material(
        &mut self,
        desc: &MaterialDescriptor,
        image: &TextureImage,
    ) -> RenderResult<MaterialHandle>;

    /// Frees a material.
    ///
    /// # Errors
    ///
    /// [`crate::RenderError::UnknownHandle`] for a handle this backend does
    /// not own.
    fn release_material(&mut self, handle: MaterialHandle) -> RenderResult<()>;

    /// Allocates an instance buffer for `capacity` particles.
    ///
    /// # Errors
    ///
    /// Allocation or device failures.
    fn create_particle_buffer(&mut self, capacity: usize) -> RenderResult<ParticleHandle>;

    /// Frees a particle buffer.
    ///
    /// # Errors
    ///
    /// [`crate::RenderError::UnknownHandle`] for a handle this backend does
    /// not own.
    fn release_particle_buffer(&mut self, handle: ParticleHandle) -> RenderResult<()>;

    /// Resizes the render target.
    ///
    /// # Errors
    ///
    /// Device failures.
    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()>;

    /// Draws one frame.
    ///
    /// # Errors
    ///
    /// Device loss, unknown handles, validation failures.
    fn draw(&mut self, frame: &DrawFrame<'_>) -> RenderResult<DrawReport>;

    /// Materials plus particle buffers currently alive.
    fn live_resources(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_uniform_alignment() {
        assert_eq!(SceneUniforms::SIZE, 320);
        assert_eq!(SceneUniforms::SIZE % 16, 0);
    }
}

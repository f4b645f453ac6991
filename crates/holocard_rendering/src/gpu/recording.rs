//! Recording backend.
//!
//! Performs no GPU work. Every call lands in a shared [`RecordingLog`] that
//! outlives the backend, so tests can inspect what a viewer did after the
//! viewer (and its backend) are gone. Failures can be injected per frame.

use super::{DrawFrame, DrawReport, MaterialHandle, ParticleHandle, RenderBackend};
use crate::error::{RenderError, RenderResult};
use crate::material::{MaterialDescriptor, ShaderProgram, TextureImage};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// Material built.
    CreateMaterial {
        /// Issued handle.
        handle: MaterialHandle,
        /// Program compiled.
        program: ShaderProgram,
        /// Uploaded texture size.
        texture_size: (u32, u32),
        /// Mip levels allocated.
        mip_levels: u32,
    },
    /// Material freed.
    ReleaseMaterial(MaterialHandle),
    /// Particle buffer allocated.
    CreateParticles {
        /// Issued handle.
        handle: ParticleHandle,
        /// Instance capacity.
        capacity: usize,
    },
    /// Particle buffer freed.
    ReleaseParticles(ParticleHandle),
    /// Target resized.
    Resize {
        /// New width.
        width: u32,
        /// New height.
        height: u32,
    },
    /// Frame drawn.
    Draw {
        /// Frame counter.
        frame_number: u64,
        /// Bound material, if the mesh was drawn.
        material: Option<MaterialHandle>,
        /// Material time uniform.
        time: f32,
        /// Particle instances drawn.
        particles: usize,
        /// Shadow map size, if the shadow pass ran.
        shadow_map_size: Option<u32>,
    },
}

#[derive(Debug, Default)]
struct LogInner {
    calls: Vec<BackendCall>,
    live_materials: BTreeSet<MaterialHandle>,
    live_particles: BTreeSet<ParticleHandle>,
}

/// Shared view of everything a [`RecordingBackend`] did.
#[derive(Debug, Clone, Default)]
pub struct RecordingLog {
    inner: Arc<Mutex<LogInner>>,
}

impl RecordingLog {
    /// All calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().calls.clone()
    }

    /// Draw calls only.
    #[must_use]
    pub fn draws(&self) -> Vec<BackendCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Draw { .. }))
            .cloned()
            .collect()
    }

    /// Programs compiled, in order.
    #[must_use]
    pub fn programs_created(&self) -> Vec<ShaderProgram> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::CreateMaterial { program, .. } => Some(*program),
                _ => None,
            })
            .collect()
    }

    /// Materials still alive.
    #[must_use]
    pub fn live_materials(&self) -> usize {
        self.inner.lock().live_materials.len()
    }

    /// Particle buffers still alive.
    #[must_use]
    pub fn live_particle_buffers(&self) -> usize {
        self.inner.lock().live_particles.len()
    }

    /// Materials plus particle buffers still alive.
    #[must_use]
    pub fn live_resources(&self) -> usize {
        let inner = self.inner.lock();
        inner.live_materials.len() + inner.live_particles.len()
    }
}

/// Backend stand-in that records instead of rendering.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    log: RecordingLog,
    next_handle: u64,
    fail_draw_at: Option<u64>,
    panic_draw_at: Option<u64>,
    fail_materials: Option<RenderError>,
}

impl RecordingBackend {
    /// Creates a backend with a fresh log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the shared log.
    #[must_use]
    pub fn log(&self) -> RecordingLog {
        self.log.clone()
    }

    /// Fails the draw of `frame_number` (and every later one).
    #[must_use]
    pub fn fail_draw_at(mut self, frame_number: u64) -> Self {
        self.fail_draw_at = Some(frame_number);
        self
    }

    /// Panics inside the draw of `frame_number`.
    #[must_use]
    pub fn panic_draw_at(mut self, frame_number: u64) -> Self {
        self.panic_draw_at = Some(frame_number);
        self
    }

    /// Fails every material creation with `error`.
    #[must_use]
    pub fn fail_materials(mut self, error: RenderError) -> Self {
        self.fail_materials = Some(error);
        self
    }

    fn issue(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn create_material(
        &mut self,
        desc: &MaterialDescriptor,
        image: &TextureImage,
    ) -> RenderResult<MaterialHandle> {
        if let Some(error) = &self.fail_materials {
            return Err(error.clone());
        }

        let handle = MaterialHandle(self.issue());
        let mut inner = self.log.inner.lock();
        inner.live_materials.insert(handle);
        inner.calls.push(BackendCall::CreateMaterial {
            handle,
            program: desc.program,
            texture_size: (image.width(), image.height()),
            mip_levels: desc.filtering.mip_level_count(image.width(), image.height()),
        });
        Ok(handle)
    }

    fn release_material(&mut self, handle: MaterialHandle) -> RenderResult<()> {
        let mut inner = self.log.inner.lock();
        if !inner.live_materials.remove(&handle) {
            return Err(RenderError::UnknownHandle(handle.0));
        }
        inner.calls.push(BackendCall::ReleaseMaterial(handle));
        Ok(())
    }

    fn create_particle_buffer(&mut self, capacity: usize) -> RenderResult<ParticleHandle> {
        let handle = ParticleHandle(self.issue());
        let mut inner = self.log.inner.lock();
        inner.live_particles.insert(handle);
        inner.calls.push(BackendCall::CreateParticles { handle, capacity });
        Ok(handle)
    }

    fn release_particle_buffer(&mut self, handle: ParticleHandle) -> RenderResult<()> {
        let mut inner = self.log.inner.lock();
        if !inner.live_particles.remove(&handle) {
            return Err(RenderError::UnknownHandle(handle.0));
        }
        inner.calls.push(BackendCall::ReleaseParticles(handle));
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.log.inner.lock().calls.push(BackendCall::Resize { width, height });
        Ok(())
    }

    fn draw(&mut self, frame: &DrawFrame<'_>) -> RenderResult<DrawReport> {
        if self.panic_draw_at.is_some_and(|n| frame.frame_number >= n) {
            panic!("injected draw panic at frame {}", frame.frame_number);
        }
        if self.fail_draw_at.is_some_and(|n| frame.frame_number >= n) {
            return Err(RenderError::Backend(format!(
                "injected draw failure at frame {}",
                frame.frame_number
            )));
        }

        let mut inner = self.log.inner.lock();
        let mut report = DrawReport::default();
        let mut shadow_map_size = None;

        if let Some(card) = &frame.card {
            if !inner.live_materials.contains(&card.material) {
                return Err(RenderError::UnknownHandle(card.material.0));
            }
            if card.casts_shadow {
                if let Some(size) = frame.shadow_map_size {
                    shadow_map_size = Some(size);
                    report.draw_calls += 1;
                }
            }
            report.draw_calls += 1;
        }

        let mut particles = 0;
        if let Some(pass) = &frame.particles {
            if !inner.live_particles.contains(&pass.buffer) {
                return Err(RenderError::UnknownHandle(pass.buffer.0));
            }
            if !pass.instances.is_empty() {
                particles = pass.instances.len();
                report.draw_calls += 1;
            }
        }

        inner.calls.push(BackendCall::Draw {
            frame_number: frame.frame_number,
            material: frame.card.map(|card| card.material),
            time: frame.card.map_or(0.0, |card| card.uniforms.params[0]),
            particles,
            shadow_map_size,
        });
        Ok(report)
    }

    fn live_resources(&self) -> usize {
        self.log.live_resources()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{CardDraw, SceneUniforms};
    use crate::material;
    use holocard_shared::{QualityTier, Rarity};

    fn frame(frame_number: u64, card: Option<CardDraw>) -> DrawFrame<'static> {
        DrawFrame {
            frame_number,
            scene: SceneUniforms::default(),
            shadow_map_size: Some(2048),
            card,
            particles: None,
        }
    }

    #[test]
    fn test_handles_are_tracked() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let desc = material::resolve(Rarity::Rare, QualityTier::High, true, None);

        let handle = backend.create_material(&desc, &TextureImage::placeholder()).unwrap();
        let particles = backend.create_particle_buffer(75).unwrap();
        assert_eq!(backend.live_resources(), 2);

        backend.release_material(handle).unwrap();
        backend.release_particle_buffer(particles).unwrap();
        assert_eq!(log.live_resources(), 0);
        assert_eq!(
            backend.release_material(handle),
            Err(RenderError::UnknownHandle(handle.0))
        );
    }

    #[test]
    fn test_shadow_pass_counts_as_draw() {
        let mut backend = RecordingBackend::new();
        let desc = material::resolve(Rarity::Mythic, QualityTier::Ultra, true, None);
        let handle = backend.create_material(&desc, &TextureImage::placeholder()).unwrap();

        let card = CardDraw {
            material: handle,
            uniforms: desc.pack(),
            casts_shadow: desc.casts_shadow,
        };
        let report = backend.draw(&frame(1, Some(card))).unwrap();
        assert_eq!(report.draw_calls, 2);
    }

    #[test]
    fn test_injected_failure() {
        let mut backend = RecordingBackend::new().fail_draw_at(3);
        assert!(backend.draw(&frame(1, None)).is_ok());
        assert!(matches!(backend.draw(&frame(3, None)), Err(RenderError::Backend(_))));
    }

    #[test]
    fn test_log_survives_backend() {
        let log = {
            let mut backend = RecordingBackend::new();
            backend.draw(&frame(1, None)).unwrap();
            backend.log()
        };
        assert_eq!(log.draws().len(), 1);
    }
}

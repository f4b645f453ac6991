//! # Card Viewer
//!
//! Orchestrates one card: picks the render path every frame, mounts and
//! tears down the 3D scene, and owns the static fallback.
//!
//! ## Render Path
//!
//! ```text
//!                 ┌─────────────────────────────────────────────┐
//!  profile ──────►│ unsupported?          → Static (permanent)  │
//!  preferences ──►│ loading / failed?     → Static (until ready)│
//!                 │ accessibility mode?   → Static              │
//!                 │ otherwise             → Mounted 3D          │
//!                 └──────────────┬──────────────────────────────┘
//!                                │ error or panic
//!                                ▼
//!                      Static (permanent, resources released)
//! ```
//!
//! ## Lifecycle
//!
//! Preferences are re-read whenever the store's generation changes. A
//! mounted scene diffs old against new preferences instead of remounting.
//! The first frame that draws the card mesh arms a 100 ms `on_load`;
//! a settled static presentation reports `on_load` immediately. The pending
//! placeholder shown while preferences load never does. Either way it fires
//! at most once per viewer.
//!
//! Once mounted, a scene survives a preference reload: `Loading` and
//! `Failed` keep the last applied preferences.

mod callbacks;
mod fallback;
mod options;
mod scene;

pub use callbacks::{DeferredSignal, ViewerCallbacks, ON_LOAD_DELAY};
pub use fallback::{FallbackReason, StaticImage, ViewerOutput};
pub use options::{ViewerOptions, Viewport};
pub use scene::{
    AccentLight, CameraRig, LightingRig, OrbitLimits, SceneSetup, AMBIENT_INTENSITY,
    DIRECTIONAL_INTENSITY, SHADOW_MAP_SIZE,
};

use crate::capability::DeviceCapabilityProfile;
use crate::effects::{particle_count, ParticleBounds, ParticleField, ParticleVertex};
use crate::error::{panic_message, RenderError, RenderResult};
use crate::gpu::{CardDraw, DrawFrame, MaterialHandle, ParticleDraw, ParticleHandle, RenderBackend};
use crate::material::{self, MaterialDescriptor, TextureImage, TextureRef, TextureRequest, TextureSource};
use crate::pipeline::{FrameAnimator, FrameState, PerfSampler, SceneFrame, ViewerStats};
use holocard_shared::{Card, PreferenceStatus, PreferenceStore, QualityTier, RenderPreferences};
use holocard_ui::{HapticFeedback, PointerEvent, PoseController, PoseEvent, ViewportRect};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Default RNG seed for particle layout and perf sampling.
pub const DEFAULT_SEED: u64 = 0x484F_4C4F;

enum TextureState {
    Loading(TextureRequest),
    Ready(TextureImage),
}

struct MountedScene {
    preferences: RenderPreferences,
    quality: QualityTier,
    setup: SceneSetup,
    material: MaterialDescriptor,
    material_handle: Option<MaterialHandle>,
    texture: TextureState,
    particles: Option<(ParticleField, ParticleHandle)>,
    animator: FrameAnimator,
    rng: ChaCha8Rng,
}

enum ViewerMode {
    /// Nothing decided yet.
    Pending,
    /// Static, may still mount.
    Static(FallbackReason),
    /// 3D path running.
    Mounted(Box<MountedScene>),
    /// Static for good.
    Permanent(FallbackReason),
}

/// Renders one card, in 3D when it can and as a static image otherwise.
pub struct CardViewer {
    card: Card,
    store: PreferenceStore,
    options: ViewerOptions,
    profile: DeviceCapabilityProfile,
    backend: Box<dyn RenderBackend>,
    textures: Arc<dyn TextureSource>,
    callbacks: ViewerCallbacks,
    pose: PoseController,
    seed: u64,
    sample_probability: f64,
    mode: ViewerMode,
    seen_generation: Option<u64>,
    load_reported: bool,
    on_load: DeferredSignal,
    stats: ViewerStats,
    instances: Vec<ParticleVertex>,
}

impl std::fmt::Debug for CardViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardViewer")
            .field("card", &self.card.id)
            .field("backend", &self.backend.name())
            .field("profile", &self.profile)
            .field("quality", &self.quality())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl CardViewer {
    /// Creates a viewer. Nothing is mounted until the first [`frame`](Self::frame).
    #[must_use]
    pub fn new(
        card: Card,
        store: PreferenceStore,
        options: ViewerOptions,
        profile: DeviceCapabilityProfile,
        backend: Box<dyn RenderBackend>,
        textures: Arc<dyn TextureSource>,
    ) -> Self {
        let preferences = store.snapshot();
        let mut pose = PoseController::new(
            options.interactive,
            preferences.enable_animations,
            preferences.enable_haptics,
        );
        set_pose_viewport(&mut pose, options.viewport);

        let mode = if profile.graphics_api_supported {
            ViewerMode::Pending
        } else {
            tracing::debug!(card_id = %card.id, "graphics API unsupported, static image only");
            ViewerMode::Permanent(FallbackReason::Unsupported)
        };

        Self {
            card,
            store,
            options,
            profile,
            backend,
            textures,
            callbacks: ViewerCallbacks::default(),
            pose,
            seed: DEFAULT_SEED,
            sample_probability: crate::pipeline::SAMPLE_PROBABILITY,
            mode,
            seen_generation: None,
            load_reported: false,
            on_load: DeferredSignal::default(),
            stats: ViewerStats::default(),
            instances: Vec::new(),
        }
    }

    /// Installs host callbacks.
    #[must_use]
    pub fn with_callbacks(mut self, callbacks: ViewerCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Attaches a haptic device to the pose controller.
    #[must_use]
    pub fn with_haptics(mut self, device: Box<dyn HapticFeedback>) -> Self {
        let preferences = self.store.snapshot();
        let mut pose = PoseController::new(
            self.options.interactive,
            preferences.enable_animations,
            preferences.enable_haptics,
        )
        .with_haptics_device(device);
        set_pose_viewport(&mut pose, self.options.viewport);
        self.pose = pose;
        self
    }

    /// Seeds particle layout and performance sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Overrides the 1 % performance sampling probability.
    #[must_use]
    pub fn with_sample_probability(mut self, probability: f64) -> Self {
        self.sample_probability = probability;
        self
    }

    /// The card.
    #[must_use]
    pub fn card(&self) -> &Card {
        &self.card
    }

    /// Capability profile computed at mount.
    #[must_use]
    pub fn profile(&self) -> DeviceCapabilityProfile {
        self.profile
    }

    /// Concrete quality of the mounted scene.
    #[must_use]
    pub fn quality(&self) -> Option<QualityTier> {
        match &self.mode {
            ViewerMode::Mounted(scene) => Some(scene.quality),
            _ => None,
        }
    }

    /// Material of the mounted scene.
    #[must_use]
    pub fn material(&self) -> Option<&MaterialDescriptor> {
        match &self.mode {
            ViewerMode::Mounted(scene) => Some(&scene.material),
            _ => None,
        }
    }

    /// Scene setup of the mounted scene.
    #[must_use]
    pub fn scene_setup(&self) -> Option<&SceneSetup> {
        match &self.mode {
            ViewerMode::Mounted(scene) => Some(&scene.setup),
            _ => None,
        }
    }

    /// Particle field of the mounted scene.
    #[must_use]
    pub fn particles(&self) -> Option<&ParticleField> {
        match &self.mode {
            ViewerMode::Mounted(scene) => scene.particles.as_ref().map(|(field, _)| field),
            _ => None,
        }
    }

    /// True while the 3D path is mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        matches!(self.mode, ViewerMode::Mounted(_))
    }

    /// Why the static image is showing, if it is.
    #[must_use]
    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self.mode {
            ViewerMode::Static(reason) | ViewerMode::Permanent(reason) => Some(reason),
            ViewerMode::Pending | ViewerMode::Mounted(_) => None,
        }
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> ViewerStats {
        self.stats
    }

    /// The pose controller.
    #[must_use]
    pub fn pose(&self) -> &PoseController {
        &self.pose
    }

    /// Produces this frame. Never fails: any error becomes the static image.
    pub fn frame(&mut self, frame: &FrameState) -> ViewerOutput {
        self.sync_preferences();

        match self.mode {
            ViewerMode::Mounted(_) => {}
            ViewerMode::Static(reason) | ViewerMode::Permanent(reason) => {
                return self.present_static(reason);
            }
            ViewerMode::Pending => return self.present_static(FallbackReason::PreferencesPending),
        }

        let result = catch_unwind(AssertUnwindSafe(|| self.render_mounted(frame)));
        match result {
            Ok(Ok(scene)) => ViewerOutput::Scene(scene),
            Ok(Err(error)) => {
                self.fail(&error);
                self.present_static(FallbackReason::RenderFailure)
            }
            Err(payload) => {
                self.fail(&RenderError::Panicked(panic_message(payload.as_ref())));
                self.present_static(FallbackReason::RenderFailure)
            }
        }
    }

    /// Feeds a pointer event. Ignored unless the 3D path is mounted.
    pub fn pointer(&mut self, event: PointerEvent) -> Option<PoseEvent> {
        if !self.is_mounted() {
            return None;
        }
        let event = self.pose.handle(event)?;
        match event {
            PoseEvent::Flipped { .. } => self.callbacks.flipped(),
            PoseEvent::Clicked => self.callbacks.clicked(),
        }
        Some(event)
    }

    /// Resizes the surface.
    pub fn resize(&mut self, viewport: Viewport) {
        self.options.viewport = viewport;
        set_pose_viewport(&mut self.pose, viewport);
        if self.is_mounted() {
            if let Err(error) = self.backend.resize(viewport.width, viewport.height) {
                self.fail(&error);
            }
        }
    }

    /// Releases every GPU resource and cancels a pending `on_load`.
    /// Later frames show the static image without callbacks.
    pub fn unmount(&mut self) {
        if matches!(self.mode, ViewerMode::Permanent(FallbackReason::Unmounted)) {
            return;
        }
        self.teardown();
        self.on_load.cancel();
        self.mode = ViewerMode::Permanent(FallbackReason::Unmounted);
        tracing::debug!(card_id = %self.card.id, "viewer unmounted");
    }

    // === Path decision ===

    fn sync_preferences(&mut self) {
        let generation = self.store.generation();
        if self.seen_generation == Some(generation) {
            return;
        }
        self.seen_generation = Some(generation);

        if matches!(self.mode, ViewerMode::Permanent(_)) {
            return;
        }

        let preferences = self.store.snapshot();
        let outcome = match self.store.status() {
            PreferenceStatus::Loading if self.is_mounted() => {
                tracing::debug!(card_id = %self.card.id, "preferences reloading, keeping scene");
                Ok(())
            }
            PreferenceStatus::Failed(reason) if self.is_mounted() => {
                tracing::warn!(card_id = %self.card.id, %reason, "preference reload failed, keeping scene");
                Ok(())
            }
            PreferenceStatus::Loading => {
                self.enter_static(FallbackReason::PreferencesPending);
                Ok(())
            }
            PreferenceStatus::Failed(reason) => {
                tracing::warn!(card_id = %self.card.id, %reason, "preferences failed to load");
                self.enter_static(FallbackReason::PreferencesFailed);
                Ok(())
            }
            PreferenceStatus::Ready if preferences.accessibility_mode => {
                self.enter_static(FallbackReason::Accessibility);
                Ok(())
            }
            PreferenceStatus::Ready if self.is_mounted() => self.apply_preferences(preferences),
            PreferenceStatus::Ready => self.mount(preferences),
        };

        if let Err(error) = outcome {
            self.fail(&error);
        }
    }

    fn enter_static(&mut self, reason: FallbackReason) {
        self.teardown();
        self.on_load.cancel();
        self.mode = ViewerMode::Static(reason);
    }

    fn mount(&mut self, preferences: RenderPreferences) -> RenderResult<()> {
        let rarity = self.card.rarity;
        let quality = self.profile.resolve_quality(preferences.quality_preset);
        let setup = SceneSetup::for_quality(quality, rarity, self.options.show_controls);
        let material = material::resolve(
            rarity,
            quality,
            preferences.enable_shaders,
            self.card.image_url.as_deref(),
        );
        let texture = self.request_texture(&material);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let particles = if preferences.enable_particles {
            self.allocate_particles(quality, &mut rng)?
        } else {
            None
        };

        self.pose.set_animations_enabled(preferences.enable_animations);
        self.pose.set_haptics_enabled(preferences.enable_haptics);
        self.backend
            .resize(self.options.viewport.width, self.options.viewport.height)?;

        tracing::info!(
            card_id = %self.card.id,
            program = %material.program,
            ?quality,
            particles = particles.as_ref().map_or(0, |(field, _)| field.len()),
            backend = self.backend.name(),
            "3D path mounted"
        );

        self.stats.live_particles = particles.as_ref().map_or(0, |(field, _)| field.len());
        self.mode = ViewerMode::Mounted(Box::new(MountedScene {
            preferences,
            quality,
            setup,
            material,
            material_handle: None,
            texture,
            particles,
            animator: FrameAnimator::new(
                rarity,
                preferences.enable_animations,
                PerfSampler::with_probability(self.seed ^ 0x9E37_79B9, self.sample_probability),
            ),
            rng,
        }));
        Ok(())
    }

    /// Diffs `new` against the mounted preferences and updates in place.
    fn apply_preferences(&mut self, new: RenderPreferences) -> RenderResult<()> {
        let rarity = self.card.rarity;
        let profile = self.profile;
        let show_controls = self.options.show_controls;
        let ViewerMode::Mounted(scene) = &mut self.mode else {
            return Ok(());
        };
        let old = scene.preferences;
        if old == new {
            return Ok(());
        }

        let quality = profile.resolve_quality(new.quality_preset);
        if quality != scene.quality {
            scene.quality = quality;
            scene.setup = SceneSetup::for_quality(quality, rarity, show_controls);
        }

        // Material: rebuild only when the program, uniforms or filtering change.
        let mut material =
            material::resolve(rarity, quality, new.enable_shaders, self.card.image_url.as_deref());
        if *scene.material.texture() == TextureRef::Placeholder {
            material.use_placeholder();
        }
        if !material.same_material(&scene.material) {
            if let Some(handle) = scene.material_handle.take() {
                self.backend.release_material(handle)?;
            }
            material.set_time(scene.animator.elapsed());
            tracing::debug!(
                card_id = %self.card.id,
                from = %scene.material.program,
                to = %material.program,
                "material rebuilt"
            );
            scene.material = material;
            self.stats.material_rebuilds += 1;
        }

        // Particles: allocate, drop, or resize for the new quality.
        let wanted = new.enable_particles && rarity.is_premium();
        let stale = match &scene.particles {
            Some((field, _)) => !wanted || field.len() != particle_count(quality),
            None => false,
        };
        if stale {
            if let Some((_, handle)) = scene.particles.take() {
                self.backend.release_particle_buffer(handle)?;
            }
        }
        if wanted && scene.particles.is_none() {
            if let Some(field) =
                ParticleField::allocate(rarity, quality, ParticleBounds::default(), &mut scene.rng)
            {
                let handle = self.backend.create_particle_buffer(field.len())?;
                scene.particles = Some((field, handle));
            }
        }
        self.stats.live_particles = scene.particles.as_ref().map_or(0, |(field, _)| field.len());

        if old.enable_animations != new.enable_animations {
            scene.animator.set_enabled(new.enable_animations);
            self.pose.set_animations_enabled(new.enable_animations);
        }
        if old.enable_haptics != new.enable_haptics {
            self.pose.set_haptics_enabled(new.enable_haptics);
        }

        scene.preferences = new;
        Ok(())
    }

    fn request_texture(&self, material: &MaterialDescriptor) -> TextureState {
        match material.texture() {
            TextureRef::Image(url) => TextureState::Loading(self.textures.request(url)),
            TextureRef::Placeholder => TextureState::Ready(TextureImage::placeholder()),
        }
    }

    fn allocate_particles(
        &mut self,
        quality: QualityTier,
        rng: &mut ChaCha8Rng,
    ) -> RenderResult<Option<(ParticleField, ParticleHandle)>> {
        let Some(field) = ParticleField::allocate(self.card.rarity, quality, ParticleBounds::default(), rng)
        else {
            return Ok(None);
        };
        let handle = self.backend.create_particle_buffer(field.len())?;
        Ok(Some((field, handle)))
    }

    // === Frame ===

    fn render_mounted(&mut self, frame: &FrameState) -> RenderResult<SceneFrame> {
        let ViewerMode::Mounted(scene) = &mut self.mode else {
            return Err(RenderError::Backend("render called without a mounted scene".to_string()));
        };

        // Artwork: keep the mesh hidden until it resolves; failures use the placeholder.
        if let TextureState::Loading(request) = &mut scene.texture {
            match request.poll() {
                None => {}
                Some(Ok(image)) => scene.texture = TextureState::Ready(image),
                Some(Err(error)) => {
                    tracing::warn!(card_id = %self.card.id, %error, "artwork unavailable, using placeholder");
                    scene.material.use_placeholder();
                    scene.texture = TextureState::Ready(TextureImage::placeholder());
                }
            }
        }
        if scene.material_handle.is_none() {
            if let TextureState::Ready(image) = &scene.texture {
                scene.material_handle = Some(self.backend.create_material(&scene.material, image)?);
            }
        }

        let tick = scene.animator.tick(
            frame,
            &mut scene.material,
            scene.particles.as_mut().map(|(field, _)| field),
        );
        if tick.and_then(|t| t.sample).is_some() {
            self.stats.samples_emitted += 1;
        }

        let ambient = scene.animator.ambient();
        let pose = ambient.apply(self.pose.update(frame.delta_time));
        let uniforms = scene
            .setup
            .uniforms(&pose, frame.camera_position, self.options.viewport.aspect());

        let card = scene.material_handle.map(|material| CardDraw {
            material,
            uniforms: scene.material.pack(),
            casts_shadow: scene.material.casts_shadow,
        });

        let particles = match &scene.particles {
            Some((field, buffer)) => {
                field.fill_instances(&mut self.instances);
                Some(ParticleDraw {
                    buffer: *buffer,
                    instances: &self.instances,
                })
            }
            None => None,
        };

        let report = self.backend.draw(&DrawFrame {
            frame_number: frame.frame_number,
            scene: uniforms,
            shadow_map_size: scene.setup.lighting.shadow_map_size,
            card,
            particles,
        })?;

        self.stats.frames_rendered += 1;
        self.stats.draw_calls = report.draw_calls;
        self.stats.frame_time_ms = frame.delta_time * 1000.0;
        self.stats.live_particles = scene.particles.as_ref().map_or(0, |(field, _)| field.len());

        if card.is_some() && !self.load_reported {
            self.on_load.arm(frame.time);
        }
        if self.on_load.poll(frame.time) {
            self.load_reported = true;
            self.callbacks.loaded();
        }

        Ok(SceneFrame {
            frame_number: frame.frame_number,
            program: scene.material.program,
            quality: scene.quality,
            pose,
            ambient,
            material_time: scene.animator.elapsed(),
            mesh_visible: card.is_some(),
            particles: scene.particles.as_ref().map_or(0, |(field, _)| field.len()),
            draw_calls: report.draw_calls,
        })
    }

    fn present_static(&mut self, reason: FallbackReason) -> ViewerOutput {
        if reason != FallbackReason::Unmounted {
            self.stats.static_frames += 1;
            // Pending preferences still resolve to a mount, which reports load itself.
            if reason != FallbackReason::PreferencesPending && !self.load_reported {
                self.load_reported = true;
                self.callbacks.loaded();
            }
        }
        ViewerOutput::Static(StaticImage::for_card(&self.card, self.options.viewport, reason))
    }

    // === Failure ===

    fn fail(&mut self, error: &RenderError) {
        tracing::error!(
            card_id = %self.card.id,
            %error,
            backend = self.backend.name(),
            "3D path failed, falling back to static image"
        );
        self.teardown();
        self.on_load.cancel();
        self.mode = ViewerMode::Permanent(FallbackReason::RenderFailure);
    }

    /// Releases the mounted scene's GPU resources. Leaves `mode` as
    /// `Pending` if something was mounted; callers set the next mode.
    fn teardown(&mut self) {
        if !self.is_mounted() {
            return;
        }
        let ViewerMode::Mounted(scene) = std::mem::replace(&mut self.mode, ViewerMode::Pending) else {
            return;
        };
        let scene = *scene;

        let released = catch_unwind(AssertUnwindSafe(|| {
            let mut errors = Vec::new();
            if let Some(handle) = scene.material_handle {
                if let Err(error) = self.backend.release_material(handle) {
                    errors.push(error);
                }
            }
            if let Some((_, handle)) = scene.particles {
                if let Err(error) = self.backend.release_particle_buffer(handle) {
                    errors.push(error);
                }
            }
            errors
        }));

        match released {
            Ok(errors) => {
                for error in errors {
                    tracing::warn!(card_id = %self.card.id, %error, "failed to release GPU resource");
                }
            }
            Err(payload) => {
                tracing::warn!(
                    card_id = %self.card.id,
                    panic = %panic_message(payload.as_ref()),
                    "backend panicked while releasing resources"
                );
            }
        }
        self.stats.live_particles = 0;
    }
}

impl Drop for CardViewer {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Pixel rect for pointer normalization and the visible world extent for
/// the base scale.
fn set_pose_viewport(pose: &mut PoseController, viewport: Viewport) {
    let camera = CameraRig::default();
    let (view_width, view_height) = camera.visible_extent(FrameState::CAMERA_DISTANCE, viewport.aspect());
    pose.set_viewport(
        ViewportRect::sized(viewport.width as f32, viewport.height as f32),
        view_width,
        view_height,
    );
}

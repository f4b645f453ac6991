//! Viewer render-path decisions, lifecycle and error containment.

use holocard_rendering::capability::{detect, DeviceCapabilityProfile, StaticProbe};
use holocard_rendering::error::RenderError;
use holocard_rendering::gpu::{BackendCall, RecordingBackend, RecordingLog};
use holocard_rendering::material::{
    MemoryTextureSource, PendingTextureSource, ShaderProgram, TextureImage, TextureRef,
};
use holocard_rendering::material::descriptor::U_TIME;
use holocard_rendering::pipeline::FrameState;
use holocard_rendering::viewer::{
    CardViewer, FallbackReason, ViewerCallbacks, ViewerOptions, ViewerOutput, ON_LOAD_DELAY,
};
use holocard_shared::{
    Card, PreferenceStore, PreferenceUpdate, QualityPreset, Rarity, RenderPreferences,
    PLACEHOLDER_IMAGE_URL,
};
use holocard_ui::PointerEvent;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

const ART: &str = "https://cards.test/art/0042.png";
const FRAME: f32 = 1.0 / 60.0;

fn art() -> TextureImage {
    TextureImage::new(ART, 4, 4, vec![200; 64]).expect("4x4 RGBA art")
}

fn card(rarity: Rarity) -> Card {
    Card::new("card-0042", "Starfall Drake", Some(ART.to_string()), rarity)
}

fn prefs(preset: QualityPreset) -> RenderPreferences {
    RenderPreferences {
        quality_preset: preset,
        ..RenderPreferences::default()
    }
}

fn discrete() -> DeviceCapabilityProfile {
    detect(&StaticProbe::discrete())
}

fn viewer_with(
    rarity: Rarity,
    store: PreferenceStore,
    backend: RecordingBackend,
) -> (CardViewer, RecordingLog) {
    let log = backend.log();
    let textures = Arc::new(MemoryTextureSource::new().with_image(ART, art()));
    let viewer = CardViewer::new(
        card(rarity),
        store,
        ViewerOptions::default(),
        discrete(),
        Box::new(backend),
        textures,
    );
    (viewer, log)
}

fn counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
    let count = Rc::new(Cell::new(0));
    let hook = Rc::clone(&count);
    (count, move || hook.set(hook.get() + 1))
}

fn run(viewer: &mut CardViewer, frames: usize) -> (FrameState, ViewerOutput) {
    let mut frame = FrameState::new();
    let mut output = viewer.frame(&frame);
    for _ in 1..frames {
        frame = frame.advance(FRAME);
        output = viewer.frame(&frame);
    }
    (frame, output)
}

#[test]
fn test_ready_preferences_mount_the_scene() {
    let store = PreferenceStore::with_preferences(prefs(QualityPreset::High));
    let (mut viewer, log) = viewer_with(Rarity::Epic, store, RecordingBackend::new());

    let output = viewer.frame(&FrameState::new());
    let scene = output.scene().expect("3D path");

    assert!(scene.mesh_visible);
    assert_eq!(scene.program, ShaderProgram::Holographic);
    assert_eq!(scene.particles, 75);
    assert!(viewer.is_mounted());
    assert_eq!(log.programs_created(), vec![ShaderProgram::Holographic]);
    assert_eq!(log.live_resources(), 2);
}

#[test]
fn test_loading_preferences_show_static_then_mount() {
    let store = PreferenceStore::loading();
    let (mut viewer, log) = viewer_with(Rarity::Rare, store.clone(), RecordingBackend::new());

    let output = viewer.frame(&FrameState::new());
    assert_eq!(
        output.static_image().map(|image| image.reason),
        Some(FallbackReason::PreferencesPending)
    );
    assert!(log.calls().is_empty());

    store.finish_loading(Ok(prefs(QualityPreset::Medium)));
    let output = viewer.frame(&FrameState::new().advance(FRAME));
    assert!(!output.is_static());
    assert_eq!(viewer.quality(), Some(holocard_shared::QualityTier::Medium));
}

#[test]
fn test_failed_preferences_stay_static_until_a_load_succeeds() {
    let store = PreferenceStore::loading();
    let (mut viewer, log) = viewer_with(Rarity::Rare, store.clone(), RecordingBackend::new());

    store.finish_loading(RenderPreferences::from_toml_str("quality_preset = 7"));
    let (_, output) = run(&mut viewer, 3);
    assert_eq!(
        output.static_image().map(|image| image.reason),
        Some(FallbackReason::PreferencesFailed)
    );
    assert!(log.calls().is_empty());

    store.begin_loading();
    store.finish_loading(Ok(RenderPreferences::default()));
    let (_, output) = run(&mut viewer, 1);
    assert!(output.scene().is_some());
}

#[test]
fn test_reload_keeps_mounted_scene() {
    let store = PreferenceStore::new();
    let (mut viewer, log) = viewer_with(Rarity::Epic, store.clone(), RecordingBackend::new());

    let mut frame = FrameState::new();
    viewer.frame(&frame);
    let resources = log.live_resources();

    store.begin_loading();
    frame = frame.advance(FRAME);
    let output = viewer.frame(&frame);
    assert!(output.scene().is_some());
    assert!(viewer.is_mounted());

    store.finish_loading(RenderPreferences::from_toml_str("quality_preset = 7"));
    frame = frame.advance(FRAME);
    let output = viewer.frame(&frame);
    let scene = output.scene().expect("scene survives a failed reload");

    assert!(scene.material_time > 0.0);
    assert_eq!(log.programs_created().len(), 1);
    assert_eq!(log.live_resources(), resources);
    assert_eq!(viewer.fallback_reason(), None);
}

#[test]
fn test_accessibility_mode_renders_static_and_tears_down() {
    let store = PreferenceStore::with_preferences(prefs(QualityPreset::Ultra));
    let (mut viewer, log) = viewer_with(Rarity::Legendary, store.clone(), RecordingBackend::new());

    let (_, output) = run(&mut viewer, 2);
    assert!(output.scene().is_some());
    assert_eq!(log.live_resources(), 2);

    store.update(PreferenceUpdate {
        accessibility_mode: Some(true),
        ..PreferenceUpdate::default()
    });
    let (_, output) = run(&mut viewer, 1);

    let image = output.static_image().expect("static path");
    assert_eq!(image.reason, FallbackReason::Accessibility);
    assert_eq!(image.url, ART);
    assert_eq!((image.width, image.height), (400, 560));
    assert_eq!(log.live_resources(), 0);
}

#[test]
fn test_card_without_art_uses_placeholder_on_both_paths() {
    let backend = RecordingBackend::new();
    let log = backend.log();
    let mut viewer = CardViewer::new(
        Card::new("card-0007", "Blank Slate", None, Rarity::Common),
        PreferenceStore::new(),
        ViewerOptions::default(),
        discrete(),
        Box::new(backend),
        Arc::new(MemoryTextureSource::new()),
    );

    assert!(viewer.frame(&FrameState::new()).scene().is_some());
    assert!(matches!(
        log.calls().as_slice(),
        [BackendCall::Resize { .. }, BackendCall::CreateMaterial { texture_size: (2, 2), .. }, ..]
    ));

    viewer.unmount();
    let output = viewer.frame(&FrameState::new());
    assert_eq!(output.static_image().map(|image| image.url.as_str()), Some(PLACEHOLDER_IMAGE_URL));
}

#[test]
fn test_missing_artwork_falls_back_to_placeholder_texture() {
    let backend = RecordingBackend::new();
    let log = backend.log();
    let mut viewer = CardViewer::new(
        card(Rarity::Mythic),
        PreferenceStore::with_preferences(prefs(QualityPreset::Ultra)),
        ViewerOptions::default(),
        discrete(),
        Box::new(backend),
        Arc::new(MemoryTextureSource::new()),
    );

    let (_, output) = run(&mut viewer, 5);
    let scene = output.scene().expect("scene still renders");

    assert!(scene.mesh_visible);
    assert_eq!(scene.program, ShaderProgram::EnergyGlow);
    assert_eq!(viewer.material().map(|m| m.texture().clone()), Some(TextureRef::Placeholder));
    assert!(log.calls().iter().any(|call| matches!(
        call,
        BackendCall::CreateMaterial { texture_size: (2, 2), .. }
    )));
}

#[test]
fn test_pending_artwork_hides_mesh_until_resolved() {
    let source = Arc::new(PendingTextureSource::new());
    let backend = RecordingBackend::new();
    let log = backend.log();
    let mut viewer = CardViewer::new(
        card(Rarity::Rare),
        PreferenceStore::new(),
        ViewerOptions::default(),
        discrete(),
        Box::new(backend),
        source.clone(),
    );

    let mut frame = FrameState::new();
    for _ in 0..3 {
        let output = viewer.frame(&frame);
        assert!(!output.scene().expect("scene").mesh_visible);
        frame = frame.advance(FRAME);
    }
    assert!(log.programs_created().is_empty());

    assert_eq!(source.complete(ART, &Ok(art())), 1);
    let output = viewer.frame(&frame);
    assert!(output.scene().expect("scene").mesh_visible);
    assert_eq!(log.programs_created(), vec![ShaderProgram::Holographic]);
}

#[test]
fn test_abandoned_artwork_request_uses_placeholder() {
    let source = Arc::new(PendingTextureSource::new());
    let mut viewer = CardViewer::new(
        card(Rarity::Epic),
        PreferenceStore::new(),
        ViewerOptions::default(),
        discrete(),
        Box::new(RecordingBackend::new()),
        source.clone(),
    );

    assert!(viewer.frame(&FrameState::new()).scene().is_some());
    source.abandon_all();
    let output = viewer.frame(&FrameState::new().advance(FRAME));

    assert!(output.scene().expect("scene").mesh_visible);
    assert_eq!(viewer.material().map(|m| m.texture().clone()), Some(TextureRef::Placeholder));
}

#[test]
fn test_draw_failure_is_permanent_and_releases_resources() {
    let store = PreferenceStore::with_preferences(prefs(QualityPreset::Ultra));
    let backend = RecordingBackend::new().fail_draw_at(3);
    let (mut viewer, log) = viewer_with(Rarity::Mythic, store.clone(), backend);

    let mut frame = FrameState::new();
    for _ in 0..3 {
        assert!(viewer.frame(&frame).scene().is_some());
        frame = frame.advance(FRAME);
    }

    let output = viewer.frame(&frame);
    assert_eq!(
        output.static_image().map(|image| image.reason),
        Some(FallbackReason::RenderFailure)
    );
    assert_eq!(log.live_resources(), 0);
    assert_eq!(viewer.fallback_reason(), Some(FallbackReason::RenderFailure));

    // A preference change does not revive a failed viewer.
    store.update(PreferenceUpdate {
        quality_preset: Some(QualityPreset::Low),
        ..PreferenceUpdate::default()
    });
    assert!(viewer.frame(&frame.advance(FRAME)).is_static());
    assert_eq!(log.draws().len(), 3);
}

#[test]
fn test_draw_panic_is_contained() {
    let backend = RecordingBackend::new().panic_draw_at(2);
    let (mut viewer, log) = viewer_with(Rarity::Legendary, PreferenceStore::new(), backend);

    let (_, output) = run(&mut viewer, 4);

    assert_eq!(
        output.static_image().map(|image| image.reason),
        Some(FallbackReason::RenderFailure)
    );
    assert_eq!(log.live_resources(), 0);
}

#[test]
fn test_material_failure_falls_back() {
    let backend = RecordingBackend::new()
        .fail_materials(RenderError::ResourceExhausted("texture memory".to_string()));
    let (mut viewer, log) = viewer_with(Rarity::Epic, PreferenceStore::new(), backend);

    let output = viewer.frame(&FrameState::new());

    assert!(output.is_static());
    assert_eq!(log.live_resources(), 0);
    assert!(log.draws().is_empty());
}

#[test]
fn test_on_load_fires_once_after_first_drawn_frame() {
    let (loads, hook) = counter();
    let (viewer, _log) = viewer_with(Rarity::Rare, PreferenceStore::new(), RecordingBackend::new());
    let mut viewer = viewer.with_callbacks(ViewerCallbacks::new().on_load(hook));

    viewer.frame(&FrameState::new());
    assert_eq!(loads.get(), 0);

    run(&mut viewer, 30);
    assert_eq!(loads.get(), 1);

    run(&mut viewer, 30);
    assert_eq!(loads.get(), 1);
}

#[test]
fn test_pending_preferences_defer_on_load_to_first_mesh_frame() {
    let (loads, hook) = counter();
    let store = PreferenceStore::loading();
    let (viewer, _log) = viewer_with(Rarity::Rare, store.clone(), RecordingBackend::new());
    let mut viewer = viewer.with_callbacks(ViewerCallbacks::new().on_load(hook));

    let mut frame = FrameState::new();
    assert!(viewer.frame(&frame).is_static());
    assert_eq!(loads.get(), 0);

    store.finish_loading(Ok(RenderPreferences::default()));

    let mut first_mesh = None;
    for _ in 0..30 {
        frame = frame.advance(FRAME);
        let output = viewer.frame(&frame);
        if first_mesh.is_none() && output.scene().is_some_and(|scene| scene.mesh_visible) {
            first_mesh = Some(frame.time);
        }
        let shown_at = first_mesh.expect("mesh visible once preferences resolve");
        if frame.time - shown_at < ON_LOAD_DELAY - 1e-3 {
            assert_eq!(loads.get(), 0, "on_load before delay at t={}", frame.time);
        }
    }

    assert_eq!(loads.get(), 1);
}

#[test]
fn test_unmount_before_delay_cancels_on_load() {
    let (loads, hook) = counter();
    let (viewer, log) = viewer_with(Rarity::Epic, PreferenceStore::new(), RecordingBackend::new());
    let mut viewer = viewer.with_callbacks(ViewerCallbacks::new().on_load(hook));

    run(&mut viewer, 2);
    viewer.unmount();
    assert_eq!(log.live_resources(), 0);

    let (_, output) = run(&mut viewer, 30);
    assert_eq!(
        output.static_image().map(|image| image.reason),
        Some(FallbackReason::Unmounted)
    );
    assert_eq!(loads.get(), 0);
}

#[test]
fn test_static_presentation_reports_load_immediately() {
    let (loads, hook) = counter();
    let mut viewer = CardViewer::new(
        card(Rarity::Mythic),
        PreferenceStore::new(),
        ViewerOptions::default(),
        DeviceCapabilityProfile::unsupported(),
        Box::new(RecordingBackend::new()),
        Arc::new(MemoryTextureSource::new()),
    )
    .with_callbacks(ViewerCallbacks::new().on_load(hook));

    run(&mut viewer, 10);
    assert_eq!(loads.get(), 1);
    assert_eq!(viewer.stats().static_frames, 10);
}

#[test]
fn test_dropping_viewer_releases_everything() {
    let store = PreferenceStore::with_preferences(prefs(QualityPreset::Ultra));
    let (mut viewer, log) = viewer_with(Rarity::Mythic, store, RecordingBackend::new());
    run(&mut viewer, 3);
    assert_eq!(log.live_resources(), 2);

    drop(viewer);
    assert_eq!(log.live_resources(), 0);
}

#[test]
fn test_shader_toggle_rebuilds_material_in_place() {
    let store = PreferenceStore::with_preferences(prefs(QualityPreset::Ultra));
    let (mut viewer, log) = viewer_with(Rarity::Legendary, store.clone(), RecordingBackend::new());
    let (frame, _) = run(&mut viewer, 10);
    let time_before = viewer.material().and_then(|m| m.float(U_TIME));

    store.update(PreferenceUpdate {
        enable_shaders: Some(false),
        ..PreferenceUpdate::default()
    });
    let output = viewer.frame(&frame.advance(FRAME));
    let scene = output.scene().expect("still mounted");

    assert_eq!(scene.program, ShaderProgram::StandardPbr);
    assert!(scene.material_time > time_before.unwrap_or(0.0));
    assert_eq!(
        log.programs_created(),
        vec![ShaderProgram::DynamicMetallic, ShaderProgram::StandardPbr]
    );
    assert_eq!(log.live_materials(), 1);
    assert_eq!(viewer.stats().material_rebuilds, 1);
    // Particles survive a material rebuild.
    assert_eq!(log.live_particle_buffers(), 1);
}

#[test]
fn test_unrelated_preference_change_keeps_material() {
    let store = PreferenceStore::with_preferences(prefs(QualityPreset::High));
    let (mut viewer, log) = viewer_with(Rarity::Epic, store.clone(), RecordingBackend::new());
    let (frame, _) = run(&mut viewer, 3);

    store.update(PreferenceUpdate {
        enable_haptics: Some(false),
        ..PreferenceUpdate::default()
    });
    viewer.frame(&frame.advance(FRAME));

    assert_eq!(log.programs_created().len(), 1);
    assert_eq!(viewer.stats().material_rebuilds, 0);
}

#[test]
fn test_particle_toggle_and_quality_change_reconcile_buffers() {
    let store = PreferenceStore::with_preferences(prefs(QualityPreset::Ultra));
    let (mut viewer, log) = viewer_with(Rarity::Mythic, store.clone(), RecordingBackend::new());
    let (frame, output) = run(&mut viewer, 2);
    assert_eq!(output.scene().map(|s| s.particles), Some(150));

    store.update(PreferenceUpdate {
        quality_preset: Some(QualityPreset::High),
        ..PreferenceUpdate::default()
    });
    let frame = frame.advance(FRAME);
    assert_eq!(viewer.frame(&frame).scene().map(|s| s.particles), Some(75));
    assert_eq!(log.live_particle_buffers(), 1);

    store.update(PreferenceUpdate {
        enable_particles: Some(false),
        ..PreferenceUpdate::default()
    });
    let frame = frame.advance(FRAME);
    assert_eq!(viewer.frame(&frame).scene().map(|s| s.particles), Some(0));
    assert_eq!(log.live_particle_buffers(), 0);
    assert!(viewer.particles().is_none());

    store.update(PreferenceUpdate {
        enable_particles: Some(true),
        ..PreferenceUpdate::default()
    });
    assert_eq!(viewer.frame(&frame.advance(FRAME)).scene().map(|s| s.particles), Some(75));
    assert_eq!(log.live_particle_buffers(), 1);
}

#[test]
fn test_disabled_animations_freeze_material_time() {
    let store = PreferenceStore::with_preferences(RenderPreferences {
        enable_animations: false,
        ..RenderPreferences::default()
    });
    let (mut viewer, _log) = viewer_with(Rarity::Mythic, store.clone(), RecordingBackend::new());

    let (frame, output) = run(&mut viewer, 20);
    let scene = output.scene().expect("scene");
    assert_eq!(scene.material_time, 0.0);
    assert_eq!(scene.pose.position, holocard_shared::Vec3::ZERO);

    store.update(PreferenceUpdate {
        enable_animations: Some(true),
        ..PreferenceUpdate::default()
    });
    let output = viewer.frame(&frame.advance(FRAME));
    assert!(output.scene().expect("scene").material_time > 0.0);
}

#[test]
fn test_pointer_input_ignored_on_static_path() {
    let (flips, hook) = counter();
    let mut viewer = CardViewer::new(
        card(Rarity::Rare),
        PreferenceStore::new(),
        ViewerOptions::default(),
        DeviceCapabilityProfile::unsupported(),
        Box::new(RecordingBackend::new()),
        Arc::new(MemoryTextureSource::new()),
    )
    .with_callbacks(ViewerCallbacks::new().on_flip(hook));

    viewer.frame(&FrameState::new());
    for time in [1.0, 1.1] {
        assert!(viewer.pointer(PointerEvent::Down { x: 200.0, y: 280.0, time }).is_none());
        assert!(viewer.pointer(PointerEvent::Up { x: 200.0, y: 280.0 }).is_none());
    }
    assert_eq!(flips.get(), 0);
}

//! Preview command
//!
//! Drives one [`CardViewer`] headless: loads preferences, picks a backend,
//! renders `frames` ticks at 60 Hz with a double-click halfway through and
//! prints what happened.

use holocard_rendering::capability::{detect, DeviceCapabilityProfile, StaticProbe, WgpuProbe};
use holocard_rendering::gpu::{RecordingBackend, RenderBackend, WgpuBackend};
use holocard_rendering::material::{MemoryTextureSource, TextureImage};
use holocard_rendering::pipeline::{FrameState, SceneFrame};
use holocard_rendering::viewer::{CardViewer, ViewerCallbacks, ViewerOptions, ViewerOutput, Viewport};
use holocard_shared::{Card, PreferenceStore, PreferenceUpdate, QualityPreset, Rarity};
use holocard_ui::{HapticLog, PointerEvent};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

const FRAME_DT: f32 = 1.0 / 60.0;
const ARTWORK_URL: &str = "holocard://preview/artwork";
const ARTWORK_SIZE: (u32, u32) = (128, 176);

/// Parsed `preview` arguments.
pub struct PreviewArgs {
    pub rarity: Rarity,
    pub quality: Option<QualityPreset>,
    pub prefs: Option<PathBuf>,
    pub frames: u32,
    pub width: u32,
    pub height: u32,
    pub no_gpu: bool,
    pub unsupported: bool,
    pub seed: u64,
}

pub fn run(args: &PreviewArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_store(args)?;
    let profile = profile_for(args);
    let backend = backend_for(args, profile);
    let backend_name = backend.name().to_string();

    let haptics = HapticLog::new();
    let loaded = Rc::new(Cell::new(false));
    let flips = Rc::new(Cell::new(0u32));
    let callbacks = {
        let loaded = Rc::clone(&loaded);
        let flips = Rc::clone(&flips);
        ViewerCallbacks::new()
            .on_load(move || loaded.set(true))
            .on_flip(move || flips.set(flips.get() + 1))
    };

    let textures = MemoryTextureSource::new().with_image(ARTWORK_URL, artwork()?);
    let card = Card::new(
        format!("preview-{}", args.rarity),
        format!("{} Preview", args.rarity),
        Some(ARTWORK_URL.to_string()),
        args.rarity,
    );
    let options = ViewerOptions {
        viewport: Viewport::new(args.width, args.height),
        ..ViewerOptions::default()
    };

    let mut viewer = CardViewer::new(card, store, options, profile, backend, Arc::new(textures))
        .with_callbacks(callbacks)
        .with_haptics(Box::new(haptics.clone()))
        .with_seed(args.seed);

    let center = (args.width as f32 * 0.5, args.height as f32 * 0.5);
    let flip_at = u64::from(args.frames / 2);
    let mut frame = FrameState::new();
    let mut last_output = viewer.frame(&frame);

    for _ in 1..args.frames {
        frame = frame.advance(FRAME_DT);
        if frame.frame_number == flip_at {
            double_click(&mut viewer, center, frame.time);
        }
        last_output = viewer.frame(&frame);
    }

    println!("HOLOCARD Preview");
    println!("================\n");
    println!("Card:        {}", args.rarity);
    println!("Backend:     {backend_name}");
    println!(
        "Profile:     api {} / {:?}{}",
        profile.api_version,
        profile.performance_tier,
        if profile.graphics_api_supported { "" } else { " (unsupported)" }
    );
    println!();

    match &last_output {
        ViewerOutput::Scene(scene) => print_scene(scene),
        ViewerOutput::Static(image) => {
            println!("Path:        static image");
            println!("Reason:      {:?}", image.reason);
            println!("Image:       {} ({}x{})", image.url, image.width, image.height);
        }
    }

    let stats = viewer.stats();
    println!();
    println!("Frames:      {} rendered, {} static", stats.frames_rendered, stats.static_frames);
    println!("Draw calls:  {} (last frame)", stats.draw_calls);
    println!("Frame time:  {:.2} ms ({:.0} fps)", stats.frame_time_ms, stats.fps());
    println!("Samples:     {}", stats.samples_emitted);
    println!("on_load:     {}", if loaded.get() { "fired" } else { "pending" });
    println!("Flips:       {} (haptic pulses: {})", flips.get(), haptics.pulses().len());

    viewer.unmount();
    Ok(())
}

fn print_scene(scene: &SceneFrame) {
    println!("Path:        3D");
    println!("Quality:     {:?}", scene.quality);
    println!("Program:     {}", scene.program);
    println!("Particles:   {}", scene.particles);
    println!("Time:        {:.3} s", scene.material_time);
    println!(
        "Pose:        rot ({:.3}, {:.3}, {:.3}) scale {:.3}{}",
        scene.pose.rotation.x,
        scene.pose.rotation.y,
        scene.pose.rotation.z,
        scene.pose.scale,
        if scene.pose.is_flipped { " [flipped]" } else { "" }
    );
}

fn load_store(args: &PreviewArgs) -> Result<PreferenceStore, Box<dyn std::error::Error>> {
    let store = PreferenceStore::new();

    if let Some(path) = &args.prefs {
        let runtime = tokio::runtime::Builder::new_current_thread().build()?;
        runtime.block_on(store.load_from(path));
    }

    if let Some(preset) = args.quality {
        store.update(PreferenceUpdate {
            quality_preset: Some(preset),
            ..PreferenceUpdate::default()
        });
    }

    Ok(store)
}

fn profile_for(args: &PreviewArgs) -> DeviceCapabilityProfile {
    if args.unsupported {
        DeviceCapabilityProfile::unsupported()
    } else if args.no_gpu {
        detect(&StaticProbe::discrete())
    } else {
        detect(&WgpuProbe::default())
    }
}

fn backend_for(args: &PreviewArgs, profile: DeviceCapabilityProfile) -> Box<dyn RenderBackend> {
    if args.no_gpu || !profile.graphics_api_supported {
        return Box::new(RecordingBackend::new());
    }
    match WgpuBackend::new_headless(args.width, args.height) {
        Ok(backend) => {
            tracing::info!(adapter = backend.adapter_name(), "rendering offscreen");
            Box::new(backend)
        }
        Err(err) => {
            tracing::warn!(error = %err, "GPU backend unavailable, recording instead");
            Box::new(RecordingBackend::new())
        }
    }
}

fn double_click(viewer: &mut CardViewer, (x, y): (f32, f32), time: f32) {
    let events = [
        PointerEvent::Enter,
        PointerEvent::Down { x, y, time },
        PointerEvent::Up { x, y },
        PointerEvent::Down { x, y, time: time + 0.1 },
        PointerEvent::Up { x, y },
        PointerEvent::Leave,
    ];
    for event in events {
        if let Some(event) = viewer.pointer(event) {
            tracing::debug!(?event, "pointer gesture");
        }
    }
}

/// Diagonal gradient standing in for card art.
fn artwork() -> Result<TextureImage, Box<dyn std::error::Error>> {
    let (width, height) = ARTWORK_SIZE;
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let u = x as f32 / (width - 1) as f32;
            let v = y as f32 / (height - 1) as f32;
            pixels.extend_from_slice(&[
                (u * 255.0) as u8,
                ((1.0 - v) * 200.0) as u8,
                ((u + v) * 0.5 * 255.0) as u8,
                255,
            ]);
        }
    }
    Ok(TextureImage::new(ARTWORK_URL, width, height, pixels)?)
}

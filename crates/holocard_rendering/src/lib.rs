//! # HOLOCARD Rendering Engine
//!
//! Adaptive renderer for premium trading cards:
//! - One 3D card per viewer, scaled to the device it runs on
//! - Rarity-driven materials and ambient particle fields
//! - A static image whenever 3D cannot, should not, or failed to run
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       CARD VIEWER                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Capability Profile ─┐                                        │
//! │  Preference Store ───┼─► path decision ─► Static Image        │
//! │                      │                                        │
//! │                      └─► Material Resolver ─► RenderBackend   │
//! │                          Particle Field ──────►  (wgpu /      │
//! │                          Pose Controller ─────►   recording)  │
//! │                          Frame Animator ──────►               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## RULES
//!
//! - A card always renders. Worst case is the static image, never a blank.
//! - No error or panic from the 3D path escapes [`CardViewer::frame`].
//! - Every GPU resource a viewer creates is released when it unmounts.
//! - No allocations in the frame loop once a card is mounted

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod capability;
pub mod effects;
pub mod error;
pub mod gpu;
pub mod material;
pub mod palette;
pub mod pipeline;
pub mod viewer;

pub use capability::{detect, DeviceCapabilityProfile, GraphicsProbe, PerformanceTier, StaticProbe, WgpuProbe};
pub use effects::{ParticleBounds, ParticleField, ParticleShaders, ParticleVertex};
pub use error::{ProbeError, RenderError, RenderResult, TextureError};
pub use gpu::{RecordingBackend, RecordingLog, RenderBackend, WgpuBackend};
pub use material::{
    MaterialDescriptor, MaterialShaders, MemoryTextureSource, PendingTextureSource, ShaderProgram,
    TextureImage, TextureSource,
};
pub use pipeline::{FrameAnimator, FrameState, PerfSampler, SceneFrame, ViewerStats};
pub use viewer::{
    CardViewer, FallbackReason, StaticImage, ViewerCallbacks, ViewerOptions, ViewerOutput, Viewport,
};

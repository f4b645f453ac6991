//! # HOLOCARD Shared
//!
//! Common types used by the UI layer, the renderer and the host application.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `wgpu`
//! - Any GPU or window-related crate
//!
//! If you need graphics types, put them in `holocard_rendering`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod card;
pub mod constants;
pub mod error;
pub mod math;
pub mod preferences;

pub use card::{Card, CardId, Rarity};
pub use constants::{CARD_DEPTH, CARD_HEIGHT, CARD_WIDTH, PLACEHOLDER_IMAGE_URL};
pub use error::{PreferenceError, PreferenceResult};
pub use math::{Mat4, Vec2, Vec3};
pub use preferences::{
    load_preferences, PreferenceStatus, PreferenceStore, PreferenceUpdate, QualityPreset,
    QualityTier, RenderPreferences,
};

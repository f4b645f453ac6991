//! # Render Preferences
//!
//! Session-scoped configuration read by every frame and every material
//! resolution.
//!
//! ## Consistency Model
//!
//! - One `PreferenceStore` per session, cloned as a cheap shared handle
//! - Writes swap or merge the whole value under a single write lock
//! - Every write bumps a generation counter so viewers notice changes on the
//!   next frame without diffing every field
//! - While loading (or after a failed load) the store reports "not ready" and
//!   viewers stay on the static image
//!
//! ## File Format
//!
//! ```toml
//! quality_preset = "auto"      # low | medium | high | ultra | auto
//! enable_shaders = true
//! enable_particles = true
//! enable_animations = true
//! enable_haptics = true
//! accessibility_mode = false
//! ```
//!
//! Missing keys fall back to their defaults.

use crate::error::{PreferenceError, PreferenceResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// User- or device-selected rendering fidelity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    /// Static-friendly: no custom shaders, fewest particles.
    Low,
    /// Custom shaders, environment reflections.
    Medium,
    /// Adds rarity accent lighting.
    High,
    /// Adds shadows and the dense particle field.
    Ultra,
    /// Picked from the device's performance tier at mount.
    #[default]
    Auto,
}

impl QualityPreset {
    /// The concrete tier, or `None` for `Auto`.
    #[must_use]
    pub const fn concrete(self) -> Option<QualityTier> {
        match self {
            Self::Low => Some(QualityTier::Low),
            Self::Medium => Some(QualityTier::Medium),
            Self::High => Some(QualityTier::High),
            Self::Ultra => Some(QualityTier::Ultra),
            Self::Auto => None,
        }
    }
}

impl std::str::FromStr for QualityPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "ultra" => Ok(Self::Ultra),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown quality preset: {other}")),
        }
    }
}

/// A concrete quality level. Materials and particle fields only accept this
/// type, so `Auto` can never be bound to a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Lowest fidelity
    Low,
    /// Default fidelity on integrated GPUs
    Medium,
    /// Default fidelity on discrete GPUs
    High,
    /// Only when explicitly selected
    Ultra,
}

impl QualityTier {
    /// All tiers, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Ultra];
}

/// The full preference set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPreferences {
    /// Requested quality.
    pub quality_preset: QualityPreset,
    /// Custom shader programs for premium rarities.
    pub enable_shaders: bool,
    /// Particle fields for premium rarities.
    pub enable_particles: bool,
    /// Time uniforms, ambient motion and springy pose transitions.
    pub enable_animations: bool,
    /// Haptic pulse on flip.
    pub enable_haptics: bool,
    /// Always render the static image.
    pub accessibility_mode: bool,
}

impl Default for RenderPreferences {
    fn default() -> Self {
        Self {
            quality_preset: QualityPreset::Auto,
            enable_shaders: true,
            enable_particles: true,
            enable_animations: true,
            enable_haptics: true,
            accessibility_mode: false,
        }
    }
}

impl RenderPreferences {
    /// Parses a TOML preference document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `PreferenceError::Parse` for malformed TOML or unknown values.
    pub fn from_toml_str(source: &str) -> PreferenceResult<Self> {
        Ok(toml::from_str(source)?)
    }
}

/// A partial preference change, merged atomically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceUpdate {
    /// New quality preset
    pub quality_preset: Option<QualityPreset>,
    /// New shader toggle
    pub enable_shaders: Option<bool>,
    /// New particle toggle
    pub enable_particles: Option<bool>,
    /// New animation toggle
    pub enable_animations: Option<bool>,
    /// New haptics toggle
    pub enable_haptics: Option<bool>,
    /// New accessibility toggle
    pub accessibility_mode: Option<bool>,
}

impl PreferenceUpdate {
    /// Returns `base` with every present field overridden.
    #[must_use]
    pub fn apply(self, base: RenderPreferences) -> RenderPreferences {
        RenderPreferences {
            quality_preset: self.quality_preset.unwrap_or(base.quality_preset),
            enable_shaders: self.enable_shaders.unwrap_or(base.enable_shaders),
            enable_particles: self.enable_particles.unwrap_or(base.enable_particles),
            enable_animations: self.enable_animations.unwrap_or(base.enable_animations),
            enable_haptics: self.enable_haptics.unwrap_or(base.enable_haptics),
            accessibility_mode: self.accessibility_mode.unwrap_or(base.accessibility_mode),
        }
    }
}

/// Load state of the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreferenceStatus {
    /// A load is in flight.
    Loading,
    /// Preferences are usable.
    Ready,
    /// The last load failed; values are defaults until a load succeeds.
    Failed(String),
}

#[derive(Debug)]
struct StoreState {
    preferences: RenderPreferences,
    status: PreferenceStatus,
}

#[derive(Debug)]
struct StoreInner {
    state: RwLock<StoreState>,
    generation: AtomicU64,
}

/// Process-wide preference store. Clones share the same state.
#[derive(Clone, Debug)]
pub struct PreferenceStore {
    inner: Arc<StoreInner>,
}

impl PreferenceStore {
    /// Creates a ready store holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(RenderPreferences::default(), PreferenceStatus::Ready)
    }

    /// Creates a ready store holding `preferences`.
    #[must_use]
    pub fn with_preferences(preferences: RenderPreferences) -> Self {
        Self::with_state(preferences, PreferenceStatus::Ready)
    }

    /// Creates a store that is waiting for a load to finish.
    #[must_use]
    pub fn loading() -> Self {
        Self::with_state(RenderPreferences::default(), PreferenceStatus::Loading)
    }

    fn with_state(preferences: RenderPreferences, status: PreferenceStatus) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(StoreState { preferences, status }),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Copy of the current preferences.
    #[must_use]
    pub fn snapshot(&self) -> RenderPreferences {
        self.inner.state.read().preferences
    }

    /// Current load status.
    #[must_use]
    pub fn status(&self) -> PreferenceStatus {
        self.inner.state.read().status.clone()
    }

    /// True once a load (or construction) produced usable preferences.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.state.read().status == PreferenceStatus::Ready
    }

    /// Snapshot plus readiness under one read lock.
    #[must_use]
    pub fn read(&self) -> (RenderPreferences, bool) {
        let state = self.inner.state.read();
        (state.preferences, state.status == PreferenceStatus::Ready)
    }

    /// Monotonic change counter. Bumped by every write.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Replaces the whole preference set.
    pub fn replace(&self, preferences: RenderPreferences) {
        let mut state = self.inner.state.write();
        state.preferences = preferences;
        self.bump();
    }

    /// Merges `update` into the current preferences and returns the result.
    pub fn update(&self, update: PreferenceUpdate) -> RenderPreferences {
        let mut state = self.inner.state.write();
        state.preferences = update.apply(state.preferences);
        self.bump();
        state.preferences
    }

    /// Marks a load as started.
    pub fn begin_loading(&self) {
        let mut state = self.inner.state.write();
        state.status = PreferenceStatus::Loading;
        self.bump();
    }

    /// Publishes the outcome of a load.
    pub fn finish_loading(&self, result: PreferenceResult<RenderPreferences>) {
        let mut state = self.inner.state.write();
        match result {
            Ok(preferences) => {
                state.preferences = preferences;
                state.status = PreferenceStatus::Ready;
                tracing::debug!(?preferences, "preferences loaded");
            }
            Err(err) => {
                tracing::warn!(error = %err, "preference load failed, staying on static cards");
                state.status = PreferenceStatus::Failed(err.to_string());
            }
        }
        self.bump();
    }

    /// Loads `path` into the store: `Loading` while the read is in flight,
    /// then `Ready` or `Failed`.
    pub async fn load_from(&self, path: impl AsRef<Path>) {
        self.begin_loading();
        let result = load_preferences(path).await;
        self.finish_loading(result);
    }

    fn bump(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads and parses a preference file.
///
/// # Errors
///
/// `PreferenceError::Io` when the file cannot be read, `PreferenceError::Parse`
/// when its contents are not a valid preference document.
pub async fn load_preferences(path: impl AsRef<Path>) -> PreferenceResult<RenderPreferences> {
    let path = path.as_ref();
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PreferenceError::Io {
            path: path.display().to_string(),
            source,
        })?;
    RenderPreferences::from_toml_str(&source)
}

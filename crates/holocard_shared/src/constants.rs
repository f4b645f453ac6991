//! # Card Geometry & Presentation Constants
//!
//! Shared by the pose controller (viewport fitting) and the renderer (mesh
//! size, particle bounds).

// =============================================================================
// CARD GEOMETRY (world units)
// =============================================================================

/// Card width (standard 63 x 88 mm trading card, scaled)
pub const CARD_WIDTH: f32 = 2.5;

/// Card height
pub const CARD_HEIGHT: f32 = 3.5;

/// Card thickness
pub const CARD_DEPTH: f32 = 0.02;

// =============================================================================
// FALLBACK
// =============================================================================

/// Image shown by the static fallback when a card has no artwork.
pub const PLACEHOLDER_IMAGE_URL: &str = "/images/card-placeholder.png";

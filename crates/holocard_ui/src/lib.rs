//! # HOLOCARD UI
//!
//! Everything between the host's pointer events and the card's transform.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    INTERACTION PIPELINE                    │
//! ├──────────────────────────────────────────────────────────┤
//! │  PointerEvent → PointerTracker → PoseController → Springs │
//! │                      ↓                ↓            ↓      │
//! │               click / dbl-click   PoseEvent    PoseState  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Philosophy
//!
//! - Springs, never tweens: retargeting mid-motion keeps momentum
//! - Disabling animations makes the spring stiff, it does not remove it
//! - The rest pose is reached exactly, not approximately

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod animation;
pub mod haptics;
pub mod input;
pub mod pose;

pub use animation::{Spring, Spring3, SpringConfig};
pub use haptics::{HapticFeedback, HapticLog, NoHaptics, FLIP_PULSE_MS};
pub use input::PointerTracker;
pub use pose::{
    fit_scale, InteractionState, PointerEvent, PoseController, PoseEvent, PoseState, ViewportRect,
};

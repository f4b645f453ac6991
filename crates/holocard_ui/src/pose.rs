//! # Pose Controller
//!
//! Interaction state machine for one card, driving a spring-damped pose.
//!
//! ```text
//!            enter                down
//!   ┌──────┐ ─────▶ ┌─────────┐ ─────▶ ┌──────────┐
//!   │ Rest │        │ Hovered │        │ Dragging │
//!   └──────┘ ◀───── └─────────┘ ◀───── └──────────┘
//!            leave                 up
//!
//!   double-click (any state): flipped = !flipped
//! ```
//!
//! Pointer coordinates are pixels in the host's space. They are normalized
//! against the card's viewport rect to `[-0.5, 0.5]` on both axes, with y
//! growing upwards.

use crate::animation::{Spring, Spring3, SpringConfig};
use crate::haptics::{HapticFeedback, NoHaptics, FLIP_PULSE_MS};
use crate::input::PointerTracker;
use holocard_shared::{Vec2, Vec3, CARD_HEIGHT, CARD_WIDTH};
use std::f32::consts::PI;

/// Fraction of the viewport the resting card may fill.
pub const VIEWPORT_FILL: f32 = 0.9;
/// Extra zoom while hovered.
pub const HOVER_ZOOM: f32 = 1.05;
/// Tilt per unit of normalized pointer offset (radians).
pub const PARALLAX_TILT: f32 = 0.5;
/// Shift per unit of normalized pointer offset (world units).
pub const PARALLAX_SHIFT: f32 = 0.1;
/// Lift towards the camera while hovered (world units).
pub const HOVER_LIFT: f32 = 0.1;

/// Scale that fits the card into a visible area of `view_width` x
/// `view_height` world units, capped at 1.0 so the hovered zoom never
/// overflows the container.
#[must_use]
pub fn fit_scale(view_width: f32, view_height: f32) -> f32 {
    let fit = (view_width / CARD_WIDTH).min(view_height / CARD_HEIGHT) * VIEWPORT_FILL;
    if fit.is_finite() && fit > 0.0 {
        fit.min(1.0)
    } else {
        1.0
    }
}

/// Card rectangle on the host surface (pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl ViewportRect {
    /// Rect anchored at the origin.
    #[must_use]
    pub const fn sized(width: f32, height: f32) -> Self {
        Self { x: 0.0, y: 0.0, width, height }
    }

    /// Normalized offset of `p` from the rect centre, clamped to ±0.5.
    #[must_use]
    pub fn normalize(&self, p: Vec2) -> Vec2 {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            ((p.x - self.x) / self.width - 0.5).clamp(-0.5, 0.5),
            (0.5 - (p.y - self.y) / self.height).clamp(-0.5, 0.5),
        )
    }
}

/// Raw pointer events delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer entered the card surface.
    Enter,
    /// Pointer left the card surface.
    Leave,
    /// Pointer moved.
    Move {
        /// X (pixels)
        x: f32,
        /// Y (pixels)
        y: f32,
    },
    /// Button or touch pressed.
    Down {
        /// X (pixels)
        x: f32,
        /// Y (pixels)
        y: f32,
        /// Host clock (seconds), used for double-click detection.
        time: f32,
    },
    /// Button or touch released.
    Up {
        /// X (pixels)
        x: f32,
        /// Y (pixels)
        y: f32,
    },
}

/// Gestures reported back to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseEvent {
    /// The card was flipped by a double-click.
    Flipped {
        /// New flip state.
        flipped: bool,
    },
    /// Press and release without a drag.
    Clicked,
}

/// Interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    /// Pointer is elsewhere.
    #[default]
    Rest,
    /// Pointer is over the card.
    Hovered,
    /// Pointer is pressed on the card.
    Dragging,
}

/// Interpolated card pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseState {
    /// Euler XYZ rotation (radians).
    pub rotation: Vec3,
    /// Position (world units).
    pub position: Vec3,
    /// Uniform scale.
    pub scale: f32,
    /// Pointer is over the card.
    pub is_hovered: bool,
    /// Back face is showing.
    pub is_flipped: bool,
}

/// Drives one card's pose from pointer input.
pub struct PoseController {
    interactive: bool,
    haptics_enabled: bool,
    haptics: Box<dyn HapticFeedback>,
    input: PointerTracker,
    rect: ViewportRect,
    state: InteractionState,
    flipped: bool,
    /// Normalized parallax offset, zero at rest.
    pointer: Vec2,
    /// Accumulated normalized drag.
    drag: Vec2,
    base_scale: f32,
    rotation: Spring3,
    position: Spring3,
    scale: Spring,
}

impl std::fmt::Debug for PoseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoseController")
            .field("interactive", &self.interactive)
            .field("state", &self.state)
            .field("flipped", &self.flipped)
            .field("base_scale", &self.base_scale)
            .finish_non_exhaustive()
    }
}

impl PoseController {
    /// Creates a controller resting at base scale 1.0 with no haptic device.
    #[must_use]
    pub fn new(interactive: bool, animations_enabled: bool, haptics_enabled: bool) -> Self {
        let config = SpringConfig::for_animations(animations_enabled);
        Self {
            interactive,
            haptics_enabled,
            haptics: Box::new(NoHaptics),
            input: PointerTracker::new(),
            rect: ViewportRect::sized(0.0, 0.0),
            state: InteractionState::Rest,
            flipped: false,
            pointer: Vec2::ZERO,
            drag: Vec2::ZERO,
            base_scale: 1.0,
            rotation: Spring3::new(Vec3::ZERO, config),
            position: Spring3::new(Vec3::ZERO, config),
            scale: Spring::new(1.0, config),
        }
    }

    /// Attaches a haptic device.
    #[must_use]
    pub fn with_haptics_device(mut self, device: Box<dyn HapticFeedback>) -> Self {
        self.haptics = device;
        self
    }

    /// Sets the card's pixel rect (pointer normalization) and the visible
    /// world-space extent (base scale). The resting scale jumps immediately;
    /// a resize is not an animation.
    pub fn set_viewport(&mut self, rect: ViewportRect, view_width: f32, view_height: f32) {
        self.rect = rect;
        self.base_scale = fit_scale(view_width, view_height);
        if self.state == InteractionState::Rest {
            self.scale.set_immediate(self.base_scale);
        }
        self.retarget();
    }

    /// Switches between the animated and the stiff spring in place.
    pub fn set_animations_enabled(&mut self, enabled: bool) {
        let config = SpringConfig::for_animations(enabled);
        self.rotation.set_config(config);
        self.position.set_config(config);
        self.scale.set_config(config);
    }

    /// Toggles haptic pulses.
    pub fn set_haptics_enabled(&mut self, enabled: bool) {
        self.haptics_enabled = enabled;
    }

    /// Current interaction state.
    #[must_use]
    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Resting scale for the current viewport.
    #[must_use]
    pub fn base_scale(&self) -> f32 {
        self.base_scale
    }

    /// True when every spring has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.rotation.is_at_rest() && self.position.is_at_rest() && self.scale.is_at_rest()
    }

    /// Feeds one pointer event. Non-interactive controllers ignore input.
    pub fn handle(&mut self, event: PointerEvent) -> Option<PoseEvent> {
        if !self.interactive {
            return None;
        }

        let outcome = match event {
            PointerEvent::Enter => {
                if self.state == InteractionState::Rest {
                    self.state = InteractionState::Hovered;
                }
                None
            }
            PointerEvent::Leave => {
                self.state = InteractionState::Rest;
                self.pointer = Vec2::ZERO;
                self.drag = Vec2::ZERO;
                self.input.cancel();
                None
            }
            PointerEvent::Move { x, y } => {
                let delta = self.input.move_to(x, y);
                let sized = self.rect.width > 0.0 && self.rect.height > 0.0;
                if self.state == InteractionState::Dragging && sized {
                    self.drag.x += delta.x / self.rect.width;
                    self.drag.y -= delta.y / self.rect.height;
                }
                if self.state != InteractionState::Rest {
                    self.pointer = self.rect.normalize(self.input.position());
                }
                None
            }
            PointerEvent::Down { x, y, time } => {
                let _ = self.input.move_to(x, y);
                // Only a hovered card picks up a drag; a press from rest still counts clicks.
                if self.state != InteractionState::Rest {
                    self.pointer = self.rect.normalize(self.input.position());
                    self.state = InteractionState::Dragging;
                }
                if self.input.press(time) {
                    Some(self.flip())
                } else {
                    None
                }
            }
            PointerEvent::Up { x, y } => {
                let _ = self.input.move_to(x, y);
                let clicked = self.input.release();
                if self.state == InteractionState::Dragging {
                    self.state = InteractionState::Hovered;
                    self.drag = Vec2::ZERO;
                }
                clicked.then_some(PoseEvent::Clicked)
            }
        };

        self.retarget();
        outcome
    }

    fn flip(&mut self) -> PoseEvent {
        self.flipped = !self.flipped;
        if self.haptics_enabled && self.haptics.is_available() {
            self.haptics.pulse(FLIP_PULSE_MS);
        }
        tracing::debug!(flipped = self.flipped, "card flipped");
        PoseEvent::Flipped { flipped: self.flipped }
    }

    fn retarget(&mut self) {
        let hovered = self.state != InteractionState::Rest;
        let flip = if self.flipped { PI } else { 0.0 };
        let p = self.pointer;

        self.rotation.set_target(Vec3::new(
            -p.y * PARALLAX_TILT - self.drag.y * PI,
            p.x * PARALLAX_TILT + self.drag.x * PI + flip,
            0.0,
        ));
        self.position.set_target(if hovered {
            Vec3::new(p.x * PARALLAX_SHIFT, p.y * PARALLAX_SHIFT, HOVER_LIFT)
        } else {
            Vec3::ZERO
        });
        self.scale.set_target(if hovered {
            self.base_scale * HOVER_ZOOM
        } else {
            self.base_scale
        });
    }

    /// Advances the springs by `dt` seconds and returns the new pose.
    pub fn update(&mut self, dt: f32) -> PoseState {
        self.rotation.update(dt);
        self.position.update(dt);
        self.scale.update(dt);
        self.pose()
    }

    /// Current pose without advancing time.
    #[must_use]
    pub fn pose(&self) -> PoseState {
        PoseState {
            rotation: self.rotation.value(),
            position: self.position.value(),
            scale: self.scale.value(),
            is_hovered: self.state != InteractionState::Rest,
            is_flipped: self.flipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> PoseController {
        let mut pose = PoseController::new(true, true, true);
        pose.set_viewport(ViewportRect::sized(200.0, 280.0), 4.0, 4.0);
        pose
    }

    #[test]
    fn test_fit_scale_caps_at_one() {
        assert_eq!(fit_scale(100.0, 100.0), 1.0);
        let narrow = fit_scale(2.0, 4.0);
        assert!((narrow - 0.72).abs() < 1e-6);
        assert_eq!(fit_scale(0.0, 0.0), 1.0);
    }

    #[test]
    fn test_normalize_range() {
        let rect = ViewportRect::sized(200.0, 100.0);
        assert_eq!(rect.normalize(Vec2::new(100.0, 50.0)), Vec2::ZERO);
        assert_eq!(rect.normalize(Vec2::new(0.0, 0.0)), Vec2::new(-0.5, 0.5));
        assert_eq!(rect.normalize(Vec2::new(900.0, 900.0)), Vec2::new(0.5, -0.5));
    }

    #[test]
    fn test_hover_targets() {
        let mut pose = controller();
        pose.handle(PointerEvent::Enter);
        pose.handle(PointerEvent::Move { x: 200.0, y: 140.0 });
        for _ in 0..600 {
            pose.update(1.0 / 60.0);
        }
        let state = pose.pose();
        assert!(state.is_hovered);
        assert!((state.rotation.y - 0.25).abs() < 1e-6);
        assert!((state.position.z - HOVER_LIFT).abs() < 1e-6);
        assert!((state.scale - pose.base_scale() * HOVER_ZOOM).abs() < 1e-6);
    }

    #[test]
    fn test_non_interactive_ignores_input() {
        let mut pose = PoseController::new(false, true, true);
        assert_eq!(pose.handle(PointerEvent::Enter), None);
        assert_eq!(pose.handle(PointerEvent::Down { x: 0.0, y: 0.0, time: 0.0 }), None);
        assert_eq!(pose.handle(PointerEvent::Down { x: 0.0, y: 0.0, time: 0.1 }), None);
        assert_eq!(pose.state(), InteractionState::Rest);
        assert!(!pose.pose().is_flipped);
    }

    #[test]
    fn test_drag_and_click() {
        let mut pose = controller();
        pose.handle(PointerEvent::Enter);
        assert_eq!(pose.handle(PointerEvent::Down { x: 100.0, y: 140.0, time: 0.0 }), None);
        assert_eq!(pose.state(), InteractionState::Dragging);
        assert_eq!(pose.handle(PointerEvent::Up { x: 101.0, y: 140.0 }), Some(PoseEvent::Clicked));
        assert_eq!(pose.state(), InteractionState::Hovered);

        pose.handle(PointerEvent::Down { x: 100.0, y: 140.0, time: 1.0 });
        pose.handle(PointerEvent::Move { x: 150.0, y: 140.0 });
        assert_eq!(pose.handle(PointerEvent::Up { x: 150.0, y: 140.0 }), None);
    }
}

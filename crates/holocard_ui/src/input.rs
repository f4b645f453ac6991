//! Pointer input tracking.
//!
//! Turns raw press/move/release events into the two gestures the card cares
//! about: click (press + release without travel) and double-click (two
//! presses close in time and space).

use holocard_shared::Vec2;

/// Pointer state for one card surface.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    /// Current pointer position (pixels).
    position: Vec2,
    /// Position at the start of the current press.
    press_origin: Option<Vec2>,
    /// Furthest distance travelled during the current press.
    travel: f32,
    /// Time and position of the previous press.
    last_press: Option<(f32, Vec2)>,
    /// The current press completed a double-click.
    completes_double: bool,
}

impl PointerTracker {
    /// Double-click time threshold (seconds).
    pub const DOUBLE_CLICK_TIME: f32 = 0.3;
    /// Double-click position threshold (pixels).
    pub const DOUBLE_CLICK_DISTANCE: f32 = 5.0;
    /// A press that travels further than this is a drag, not a click.
    pub const CLICK_SLOP: f32 = 4.0;

    /// Creates an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pointer position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// True while a press is held.
    #[must_use]
    pub fn is_down(&self) -> bool {
        self.press_origin.is_some()
    }

    /// Records a move and returns the delta from the previous position.
    pub fn move_to(&mut self, x: f32, y: f32) -> Vec2 {
        let delta = Vec2::new(x - self.position.x, y - self.position.y);
        self.position = Vec2::new(x, y);
        if let Some(origin) = self.press_origin {
            self.travel = self.travel.max(distance(origin, self.position));
        }
        delta
    }

    /// Records a press at the current position. Returns true if it completes a
    /// double-click.
    pub fn press(&mut self, current_time: f32) -> bool {
        self.press_origin = Some(self.position);
        self.travel = 0.0;

        let double = match self.last_press {
            Some((time, pos)) => {
                current_time - time < Self::DOUBLE_CLICK_TIME
                    && distance(pos, self.position) < Self::DOUBLE_CLICK_DISTANCE
            }
            None => false,
        };

        self.completes_double = double;
        // A completed double-click does not chain into a triple.
        self.last_press = if double {
            None
        } else {
            Some((current_time, self.position))
        };
        double
    }

    /// Records a release. Returns true if the press qualifies as a click.
    /// The release that ends a double-click is not a click.
    pub fn release(&mut self) -> bool {
        let completes_double = std::mem::take(&mut self.completes_double);
        match self.press_origin.take() {
            Some(_) => !completes_double && self.travel < Self::CLICK_SLOP,
            None => false,
        }
    }

    /// Drops any press in progress (pointer left the surface).
    pub fn cancel(&mut self) {
        self.press_origin = None;
        self.travel = 0.0;
        self.completes_double = false;
    }
}

fn distance(a: Vec2, b: Vec2) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click() {
        let mut input = PointerTracker::new();
        input.move_to(10.0, 10.0);
        assert!(!input.press(0.0));
        assert!(input.is_down());
        input.move_to(12.0, 11.0);
        assert!(input.release());
        assert!(!input.is_down());
    }

    #[test]
    fn test_drag_is_not_click() {
        let mut input = PointerTracker::new();
        assert!(!input.press(0.0));
        input.move_to(40.0, 0.0);
        input.move_to(0.0, 0.0);
        assert!(!input.release());
    }

    #[test]
    fn test_double_click() {
        let mut input = PointerTracker::new();

        assert!(!input.press(0.0));
        input.release();
        assert!(input.press(0.1));
    }

    #[test]
    fn test_release_ending_double_click_is_not_a_click() {
        let mut input = PointerTracker::new();

        assert!(!input.press(0.0));
        assert!(input.release());
        assert!(input.press(0.1));
        assert!(!input.release());

        assert!(!input.press(1.0));
        assert!(input.release());
    }

    #[test]
    fn test_first_press_is_never_double() {
        let mut input = PointerTracker::new();
        assert!(!input.press(0.0));
    }

    #[test]
    fn test_slow_or_distant_presses_are_not_double() {
        let mut input = PointerTracker::new();
        assert!(!input.press(0.0));
        input.release();
        assert!(!input.press(0.5));
        input.release();

        input.move_to(20.0, 0.0);
        assert!(!input.press(0.6));
    }

    #[test]
    fn test_no_triple_click() {
        let mut input = PointerTracker::new();
        assert!(!input.press(0.0));
        assert!(input.press(0.1));
        assert!(!input.press(0.2));
    }
}

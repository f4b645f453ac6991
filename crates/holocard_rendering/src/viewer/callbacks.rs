//! Host callbacks and the deferred load signal.

use std::fmt;

type Callback = Box<dyn FnMut()>;

/// Delay between the first drawn frame and `on_load` (seconds).
pub const ON_LOAD_DELAY: f32 = 0.1;

/// Optional host hooks. Each fires on the host's thread from inside
/// `CardViewer::frame` or `CardViewer::pointer`.
#[derive(Default)]
pub struct ViewerCallbacks {
    on_load: Option<Callback>,
    on_flip: Option<Callback>,
    on_click: Option<Callback>,
}

impl fmt::Debug for ViewerCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerCallbacks")
            .field("on_load", &self.on_load.is_some())
            .field("on_flip", &self.on_flip.is_some())
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

impl ViewerCallbacks {
    /// No hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once the card is showing (3D or static).
    #[must_use]
    pub fn on_load(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_load = Some(Box::new(f));
        self
    }

    /// Called on every flip.
    #[must_use]
    pub fn on_flip(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_flip = Some(Box::new(f));
        self
    }

    /// Called on every click.
    #[must_use]
    pub fn on_click(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_click = Some(Box::new(f));
        self
    }

    pub(crate) fn loaded(&mut self) {
        if let Some(f) = self.on_load.as_mut() {
            f();
        }
    }

    pub(crate) fn flipped(&mut self) {
        if let Some(f) = self.on_flip.as_mut() {
            f();
        }
    }

    pub(crate) fn clicked(&mut self) {
        if let Some(f) = self.on_click.as_mut() {
            f();
        }
    }
}

/// One-shot timer driven by the frame clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredSignal {
    delay: f32,
    armed_at: Option<f32>,
    fired: bool,
}

impl DeferredSignal {
    /// A disarmed signal.
    #[must_use]
    pub const fn new(delay: f32) -> Self {
        Self {
            delay,
            armed_at: None,
            fired: false,
        }
    }

    /// Starts the timer at `now`. No-op if armed or already fired.
    pub fn arm(&mut self, now: f32) {
        if !self.fired && self.armed_at.is_none() {
            self.armed_at = Some(now);
        }
    }

    /// True exactly once, on the first poll at or after `armed_at + delay`.
    pub fn poll(&mut self, now: f32) -> bool {
        match self.armed_at {
            Some(at) if now - at >= self.delay => {
                self.armed_at = None;
                self.fired = true;
                true
            }
            _ => false,
        }
    }

    /// Disarms without firing.
    pub fn cancel(&mut self) {
        self.armed_at = None;
    }

    /// True while counting down.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    /// True once fired.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl Default for DeferredSignal {
    fn default() -> Self {
        Self::new(ON_LOAD_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_signal_fires_once_after_delay() {
        let mut signal = DeferredSignal::default();
        signal.arm(1.0);
        assert!(!signal.poll(1.05));
        assert!(signal.poll(1.1));
        assert!(!signal.poll(2.0));
        assert!(signal.has_fired());

        signal.arm(3.0);
        assert!(!signal.is_armed());
    }

    #[test]
    fn test_cancelled_signal_never_fires() {
        let mut signal = DeferredSignal::default();
        signal.arm(0.0);
        signal.cancel();
        assert!(!signal.poll(10.0));
        assert!(!signal.has_fired());
    }

    #[test]
    fn test_rearm_keeps_first_time() {
        let mut signal = DeferredSignal::default();
        signal.arm(0.0);
        signal.arm(0.5);
        assert!(signal.poll(0.1));
    }

    #[test]
    fn test_callbacks_invoke() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let mut callbacks = ViewerCallbacks::new().on_flip(move || c.set(c.get() + 1));
        callbacks.flipped();
        callbacks.flipped();
        callbacks.clicked();
        assert_eq!(count.get(), 2);
    }
}

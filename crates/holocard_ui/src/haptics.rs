//! Haptic feedback seam.
//!
//! Platforms without a vibration motor use [`NoHaptics`]. Hosts plug in their
//! own implementation; tests and the CLI use [`HapticLog`].

use parking_lot::Mutex;
use std::sync::Arc;

/// Pulse length for a card flip (milliseconds).
pub const FLIP_PULSE_MS: u32 = 50;

/// A device that can vibrate.
pub trait HapticFeedback: Send {
    /// True if the device can actually pulse.
    fn is_available(&self) -> bool;

    /// Issues a single pulse.
    fn pulse(&mut self, duration_ms: u32);
}

/// No haptic hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl HapticFeedback for NoHaptics {
    fn is_available(&self) -> bool {
        false
    }

    fn pulse(&mut self, _duration_ms: u32) {}
}

/// Records every pulse into a shared log.
#[derive(Debug, Clone, Default)]
pub struct HapticLog {
    pulses: Arc<Mutex<Vec<u32>>>,
}

impl HapticLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations of every pulse issued so far.
    #[must_use]
    pub fn pulses(&self) -> Vec<u32> {
        self.pulses.lock().clone()
    }
}

impl HapticFeedback for HapticLog {
    fn is_available(&self) -> bool {
        true
    }

    fn pulse(&mut self, duration_ms: u32) {
        tracing::trace!(duration_ms, "haptic pulse");
        self.pulses.lock().push(duration_ms);
    }
}

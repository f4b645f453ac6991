//! Viewer statistics.

/// Counters for one viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewerStats {
    /// 3D frames rendered.
    pub frames_rendered: u64,
    /// Static frames presented.
    pub static_frames: u64,
    /// Draw calls issued in the last frame.
    pub draw_calls: u32,
    /// Performance samples emitted.
    pub samples_emitted: u64,
    /// Live particles.
    pub live_particles: usize,
    /// Materials rebuilt after a preference change.
    pub material_rebuilds: u32,
    /// Last frame time in milliseconds.
    pub frame_time_ms: f32,
}

impl ViewerStats {
    /// Returns FPS calculated from frame time.
    #[must_use]
    pub fn fps(&self) -> f32 {
        if self.frame_time_ms > 0.0 {
            1000.0 / self.frame_time_ms
        } else {
            0.0
        }
    }
}

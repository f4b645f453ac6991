//! Viewer options.

/// Size of the card surface in pixels. The static fallback uses the same size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; 1.0 for a degenerate viewport.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl Default for Viewport {
    /// Card-shaped 5:7 surface.
    fn default() -> Self {
        Self::new(400, 560)
    }
}

/// Host-supplied viewer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerOptions {
    /// Respond to pointer input.
    pub interactive: bool,
    /// Show orbit controls (adds orbit limits to the scene).
    pub show_controls: bool,
    /// Surface size.
    pub viewport: Viewport,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            interactive: true,
            show_controls: false,
            viewport: Viewport::default(),
        }
    }
}

//! Static fallback.
//!
//! The 2D image shown whenever the 3D path is not running. Same size as
//! the 3D surface so the host layout never shifts.

use super::options::Viewport;
use crate::pipeline::SceneFrame;
use holocard_shared::{Card, PLACEHOLDER_IMAGE_URL};

/// Why the static image is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackReason {
    /// No usable graphics API. Permanent.
    Unsupported,
    /// Accessibility mode is on.
    Accessibility,
    /// Preferences are still loading.
    PreferencesPending,
    /// Preferences failed to load.
    PreferencesFailed,
    /// The 3D path failed. Permanent.
    RenderFailure,
    /// The viewer was unmounted.
    Unmounted,
}

impl FallbackReason {
    /// True if the viewer never leaves the static path.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self, Self::Unsupported | Self::RenderFailure | Self::Unmounted)
    }
}

/// The static image to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticImage {
    /// Card image, or the placeholder.
    pub url: String,
    /// Alt text (card title).
    pub alt: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Why this is showing.
    pub reason: FallbackReason,
}

impl StaticImage {
    /// Static image for `card` at `viewport` size.
    #[must_use]
    pub fn for_card(card: &Card, viewport: Viewport, reason: FallbackReason) -> Self {
        let url = match card.image_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => PLACEHOLDER_IMAGE_URL.to_string(),
        };
        Self {
            url,
            alt: card.title.clone(),
            width: viewport.width,
            height: viewport.height,
            reason,
        }
    }
}

/// What the viewer shows this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerOutput {
    /// 2D fallback.
    Static(StaticImage),
    /// 3D frame.
    Scene(SceneFrame),
}

impl ViewerOutput {
    /// True for the fallback.
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }

    /// The fallback image, if any.
    #[must_use]
    pub fn static_image(&self) -> Option<&StaticImage> {
        match self {
            Self::Static(image) => Some(image),
            Self::Scene(_) => None,
        }
    }

    /// The 3D frame, if any.
    #[must_use]
    pub fn scene(&self) -> Option<&SceneFrame> {
        match self {
            Self::Scene(frame) => Some(frame),
            Self::Static(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holocard_shared::Rarity;

    #[test]
    fn test_placeholder_url() {
        let card = Card::new("c1", "Nameless", None, Rarity::Rare);
        let image = StaticImage::for_card(&card, Viewport::default(), FallbackReason::Accessibility);
        assert_eq!(image.url, PLACEHOLDER_IMAGE_URL);
        assert_eq!((image.width, image.height), (400, 560));
        assert_eq!(image.alt, "Nameless");
    }

    #[test]
    fn test_card_url() {
        let card = Card::new("c1", "Dragon", Some("dragon.png".into()), Rarity::Mythic);
        let image = StaticImage::for_card(&card, Viewport::new(200, 280), FallbackReason::Unsupported);
        assert_eq!(image.url, "dragon.png");
        assert!(image.reason.is_permanent());
    }
}

//! Card artwork loading.
//!
//! Loads are asynchronous. A [`TextureSource`] hands back a [`TextureRequest`]
//! immediately; the viewer polls it once per frame and keeps the card mesh
//! hidden until it resolves. A failed or cancelled load never fails the
//! viewer: the material is rebound to [`TextureImage::placeholder`].

use crate::error::TextureError;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureImage {
    /// Grey level of the placeholder.
    pub const PLACEHOLDER_GREY: u8 = 128;

    /// Wraps tightly packed RGBA8 pixels.
    ///
    /// # Errors
    ///
    /// Returns [`TextureError::InvalidData`] if the size is zero or the
    /// buffer length does not equal `width * height * 4`.
    pub fn new(url: &str, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(TextureError::InvalidData {
                url: url.to_string(),
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Neutral 2x2 grey image bound when the artwork is missing.
    #[must_use]
    pub fn placeholder() -> Self {
        let g = Self::PLACEHOLDER_GREY;
        Self {
            width: 2,
            height: 2,
            pixels: [g, g, g, 255].repeat(4),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixel data, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Result delivered by a loader.
pub type TextureLoad = Result<TextureImage, TextureError>;

/// An in-flight texture load.
#[derive(Debug)]
pub struct TextureRequest {
    url: String,
    receiver: Option<oneshot::Receiver<TextureLoad>>,
}

/// The loader's end of a [`TextureRequest`].
#[derive(Debug)]
pub struct TextureResponder {
    sender: oneshot::Sender<TextureLoad>,
}

impl TextureResponder {
    /// Delivers the result. A viewer that already went away is ignored.
    pub fn send(self, result: TextureLoad) {
        let _ = self.sender.send(result);
    }
}

impl TextureRequest {
    /// A request that is already resolved.
    #[must_use]
    pub fn ready(url: impl Into<String>, result: TextureLoad) -> Self {
        let (request, responder) = Self::pending(url);
        responder.send(result);
        request
    }

    /// A request answered later through the returned responder.
    #[must_use]
    pub fn pending(url: impl Into<String>) -> (Self, TextureResponder) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                url: url.into(),
                receiver: Some(receiver),
            },
            TextureResponder { sender },
        )
    }

    /// Requested URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Non-blocking check. Returns `Some` exactly once.
    pub fn poll(&mut self) -> Option<TextureLoad> {
        let receiver = self.receiver.as_mut()?;
        match receiver.try_recv() {
            Ok(result) => {
                self.receiver = None;
                Some(result)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.receiver = None;
                Some(Err(TextureError::Cancelled(self.url.clone())))
            }
        }
    }
}

/// Something that can load card artwork.
pub trait TextureSource: Send + Sync {
    /// Starts loading `url`.
    fn request(&self, url: &str) -> TextureRequest;
}

/// Serves images from memory. Unknown URLs fail with `NotFound`.
#[derive(Debug, Default)]
pub struct MemoryTextureSource {
    images: HashMap<String, TextureImage>,
}

impl MemoryTextureSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an image.
    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>, image: TextureImage) -> Self {
        self.images.insert(url.into(), image);
        self
    }
}

impl TextureSource for MemoryTextureSource {
    fn request(&self, url: &str) -> TextureRequest {
        let result = self
            .images
            .get(url)
            .cloned()
            .ok_or_else(|| TextureError::NotFound(url.to_string()));
        TextureRequest::ready(url, result)
    }
}

/// Holds every request open until the host completes it.
#[derive(Debug, Default)]
pub struct PendingTextureSource {
    responders: Mutex<Vec<(String, TextureResponder)>>,
}

impl PendingTextureSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests still waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.responders.lock().len()
    }

    /// Answers every open request for `url`. Returns how many were answered.
    pub fn complete(&self, url: &str, result: &TextureLoad) -> usize {
        let mut responders = self.responders.lock();
        let mut answered = 0;
        let mut index = 0;
        while index < responders.len() {
            if responders[index].0 == url {
                let (_, responder) = responders.swap_remove(index);
                responder.send(result.clone());
                answered += 1;
            } else {
                index += 1;
            }
        }
        answered
    }

    /// Drops every open request, which the viewers observe as `Cancelled`.
    pub fn abandon_all(&self) {
        self.responders.lock().clear();
    }
}

impl TextureSource for PendingTextureSource {
    fn request(&self, url: &str) -> TextureRequest {
        let (request, responder) = TextureRequest::pending(url);
        self.responders.lock().push((url.to_string(), responder));
        request
    }
}

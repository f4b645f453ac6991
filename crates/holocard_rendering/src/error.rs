//! # Rendering Error Types
//!
//! Every fallible operation in the renderer returns one of these. The viewer
//! is the only place that turns an error into a fallback.

use std::any::Any;
use thiserror::Error;

/// Errors raised while probing the graphics stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// No adapter could be created for any enabled backend.
    #[error("no graphics adapter available")]
    NoAdapter,

    /// The adapter reports a backend the renderer cannot drive.
    #[error("unsupported graphics backend: {0}")]
    UnsupportedBackend(String),

    /// The probe itself panicked.
    #[error("graphics probe panicked: {0}")]
    Panicked(String),
}

/// Errors raised while loading a card texture.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    /// The source has no image for this URL.
    #[error("texture not found: {0}")]
    NotFound(String),

    /// Pixel data does not match the declared size.
    #[error("texture {url} is {width}x{height} but has {len} bytes of RGBA8 data")]
    InvalidData {
        /// Requested URL.
        url: String,
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Actual byte length.
        len: usize,
    },

    /// The loader went away without answering.
    #[error("texture load for {0} was cancelled")]
    Cancelled(String),

    /// Any other loader failure.
    #[error("failed to load texture {url}: {reason}")]
    Load {
        /// Requested URL.
        url: String,
        /// Loader-provided reason.
        reason: String,
    },
}

/// Errors raised by the 3D path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Device, queue or surface failure.
    #[error("graphics backend error: {0}")]
    Backend(String),

    /// A material program failed validation.
    #[error("shader compilation failed for {program}: {message}")]
    ShaderCompilation {
        /// Program id.
        program: &'static str,
        /// Validation output.
        message: String,
    },

    /// Buffer or texture allocation failed.
    #[error("GPU resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A handle that the backend never issued or already released.
    #[error("unknown GPU resource handle {0}")]
    UnknownHandle(u64),

    /// A panic escaped the 3D path.
    #[error("render path panicked: {0}")]
    Panicked(String),

    /// Texture failure that could not be absorbed by the placeholder.
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Extracts a readable message from a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

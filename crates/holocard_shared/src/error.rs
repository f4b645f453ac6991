//! # Preference Error Types

use thiserror::Error;

/// Errors that can occur while loading preferences.
#[derive(Error, Debug)]
pub enum PreferenceError {
    /// The preference file could not be read.
    #[error("failed to read preferences from {path}: {source}")]
    Io {
        /// File that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The preference file is not valid TOML for `RenderPreferences`.
    #[error("invalid preference file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for preference operations.
pub type PreferenceResult<T> = Result<T, PreferenceError>;

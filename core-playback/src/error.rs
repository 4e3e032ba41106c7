//! # Playback Error Types

use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Failed to construct a transport for the selected set.
    #[error("Failed to create transport: {0}")]
    TransportCreation(String),

    /// A transport command (load, play, seek, ...) failed.
    #[error("Transport operation failed: {0}")]
    TransportFailed(String),

    /// Audio source is unavailable (network error, 4xx/5xx through the proxy).
    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if this error is transient and the operation can be
    /// retried by the UI.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlaybackError::SourceUnavailable(_))
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

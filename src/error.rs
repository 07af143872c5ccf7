//! Error handling for Resona
//!
//! Every failure surfaced to a user goes through `ResonaError`; the test
//! orchestrator converts errors into visible messages on the results pane
//! rather than letting them escape.

use thiserror::Error;

/// Result type alias for Resona operations
pub type Result<T> = std::result::Result<T, ResonaError>;

/// Main error type for Resona operations
#[derive(Error, Debug)]
pub enum ResonaError {
    // Audio Errors
    #[error("Audio output unavailable: {reason}")]
    AudioInit { reason: String },

    #[error("Audio capture failed: {reason}")]
    Capture { reason: String },

    // Network Errors
    #[error("Server responded with status {status}")]
    Network { status: u16 },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {reason}")]
    Decode { reason: String },

    // Client-side Validation
    #[error("{reason}")]
    Validation { reason: String },

    #[error("A {target} test is already running")]
    TestBusy { target: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ResonaError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ResonaError::AudioInit { .. } => "AUDIO_INIT",
            ResonaError::Capture { .. } => "CAPTURE_FAILED",
            ResonaError::Network { .. } => "NETWORK_ERROR",
            ResonaError::Transport(_) => "TRANSPORT_ERROR",
            ResonaError::Decode { .. } => "DECODE_ERROR",
            ResonaError::Validation { .. } => "VALIDATION_ERROR",
            ResonaError::TestBusy { .. } => "TEST_BUSY",
            ResonaError::Io(_) => "IO_ERROR",
            ResonaError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the test flow able to continue: a failed
    /// audio probe falls back to silent mode, a rejected rating or busy
    /// target can simply be retried by the user.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ResonaError::AudioInit { .. }
                | ResonaError::Validation { .. }
                | ResonaError::TestBusy { .. }
        )
    }
}

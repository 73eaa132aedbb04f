//! Error types for OttoCook

use thiserror::Error;

/// Result type alias for OttoCook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur across the assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Recipe, session, or timer not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation requires an active session
    #[error("session is not active")]
    SessionNotActive,

    /// Operation requires a paused session
    #[error("session is not paused")]
    SessionPaused,

    /// The session has run past its last step
    #[error("no more steps in recipe")]
    NoMoreSteps,

    /// Resource already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Capability not supported by the configured implementation
    #[error("not implemented")]
    NotImplemented,

    /// Backend failure (network, 5xx, unparseable response)
    #[error("backend error: {0}")]
    Backend(String),

    /// Invalid user-supplied value (out-of-range index, zero duration)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

//! Error types for the Ember agent

use thiserror::Error;

/// Result type alias for Ember operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Ember agent
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// No style guide has been set; the conversation cannot start
    #[error("persona style guide has not been set")]
    PersonaNotReady,

    /// Style-guide analysis failed; the guide remains unset
    #[error("style guide could not be derived: {0}")]
    StyleNotSet(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Chat completion service unreachable or erroring
    #[error("completion error: {0}")]
    Completion(String),

    /// Text-to-speech error, with the remote status and body
    #[error("TTS error {status}: {body}")]
    Tts {
        /// HTTP status returned by the synthesis service
        status: u16,
        /// Error body returned by the synthesis service
        body: String,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

//! Error types for character voice synthesis

use thiserror::Error;

/// Result type alias for character voice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while producing persona speech
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Synthesis service rejected the request for a non-markup reason
    #[error("TTS error: {0}")]
    Tts(String),

    /// Synthesis service rejected the SSML markup itself
    #[error("markup rejected: {0}")]
    MarkupRejected(String),

    /// Synthesis failed with no remaining fallback
    #[error("failed to generate speech for {locale}: {cause}")]
    Synthesis {
        /// Locale the caller asked for
        locale: String,
        /// Underlying failure description
        cause: String,
    },

    /// Translation service error
    #[error("translation error: {0}")]
    Translation(String),

    /// Audio decode/encode error
    #[error("audio error: {0}")]
    Audio(String),

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

    /// Base64 payload error
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    /// Whether this failure is attributable to the markup directives
    #[must_use]
    pub const fn is_markup_rejection(&self) -> bool {
        matches!(self, Self::MarkupRejected(_))
    }
}

//! Error types for component recognition operations

use thiserror::Error;

/// Result type alias for recognition operations
pub type Result<T> = std::result::Result<T, RecognitionError>;

/// Error types crossing the recognition core boundary
///
/// Only [`RecognitionError::Configuration`] and [`RecognitionError::Upstream`]
/// are raised by providers. The remaining variants belong to upload
/// validation and configuration building.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// Provider credential absent at call time
    #[error("AI service not configured: {0}")]
    Configuration(String),

    /// Network, quota or unexpected failure from the upstream model API
    #[error("AI service error: {0}")]
    Upstream(String),

    /// Uploaded content type is not an accepted image type
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Uploaded payload is empty
    #[error("Uploaded file is empty")]
    EmptyFile,

    /// Uploaded payload exceeds the configured limit
    #[error("File of {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: usize, limit: usize },

    /// Image header could not be decoded
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RecognitionError {
    /// Create a new configuration (missing credential) error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new upstream failure
    pub fn upstream<S: Into<String>>(msg: S) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a new unsupported media type error
    pub fn unsupported_media_type<S: Into<String>>(content_type: S) -> Self {
        Self::UnsupportedMediaType(content_type.into())
    }

    /// Create a new invalid image error
    pub fn invalid_image<S: Into<String>>(msg: S) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an upstream error with provider and operation context
    pub fn upstream_with_provider(provider: &str, operation: &str, error: &str) -> Self {
        Self::Upstream(format!("{} failed using '{}' provider: {}", operation, provider, error))
    }

    /// Machine-readable code used in HTTP error bodies
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ai_not_configured",
            Self::Upstream(_) => "ai_service_error",
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::EmptyFile => "empty_file",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::InvalidImage(_) => "invalid_image",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

impl From<reqwest::Error> for RecognitionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Upstream(format!("request timed out: {}", e))
        } else {
            Self::Upstream(e.to_string())
        }
    }
}

//! Error types for Innsikt.

use thiserror::Error;

/// Library-level error type for Innsikt operations.
#[derive(Error, Debug)]
pub enum InnsiktError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service failed: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript unavailable: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API error: {0}")]
    OpenAI(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

/// Why a transcript could not be produced.
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Subtitles are disabled for video {0}")]
    CaptionsDisabled(String),

    #[error("yt-dlp failed for video {video_id}: {message}")]
    Fetch { video_id: String, message: String },

    #[error("Malformed caption data: {0}")]
    Malformed(String),
}

/// Coarse classification used when reporting failures to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed URL, empty query, unsupported file.
    InvalidInput,
    /// Any downstream failure: model API, tools, transcripts.
    ExternalService,
    /// Broken or missing configuration.
    Config,
    /// Local I/O and serialization problems.
    Internal,
}

impl InnsiktError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InnsiktError::InvalidInput(_) => ErrorKind::InvalidInput,
            InnsiktError::ExternalService(_)
            | InnsiktError::Transcript(_)
            | InnsiktError::Http(_)
            | InnsiktError::OpenAI(_)
            | InnsiktError::Tool(_)
            | InnsiktError::ToolNotFound(_)
            | InnsiktError::Agent(_) => ErrorKind::ExternalService,
            InnsiktError::Config(_) | InnsiktError::TomlParse(_) => ErrorKind::Config,
            InnsiktError::Io(_) | InnsiktError::Json(_) => ErrorKind::Internal,
        }
    }

    /// Wrap any downstream failure as an external service error.
    pub fn external(err: impl std::fmt::Display) -> Self {
        InnsiktError::ExternalService(err.to_string())
    }

    /// Reclassify as an external service failure, leaving errors that
    /// already are one untouched so their messages are not double-prefixed.
    pub fn into_external(self) -> Self {
        match self.kind() {
            ErrorKind::ExternalService => self,
            _ => Self::external(self),
        }
    }
}

/// Result type alias for Innsikt operations.
pub type Result<T> = std::result::Result<T, InnsiktError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            InnsiktError::InvalidInput("empty".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            InnsiktError::from(TranscriptError::CaptionsDisabled("abc".into())).kind(),
            ErrorKind::ExternalService
        );
        assert_eq!(InnsiktError::Config("x".into()).kind(), ErrorKind::Config);
    }

    #[test]
    fn test_into_external_keeps_single_prefix() {
        let err = InnsiktError::OpenAI("quota exhausted".into()).into_external();
        assert_eq!(err.to_string(), "Model API error: quota exhausted");

        let err = InnsiktError::Config("missing key".into()).into_external();
        assert_eq!(err.kind(), ErrorKind::ExternalService);
        assert_eq!(
            err.to_string(),
            "External service failed: Configuration error: missing key"
        );
    }

    #[test]
    fn test_captions_disabled_message() {
        let err = InnsiktError::from(TranscriptError::CaptionsDisabled("dQw4w9WgXcQ".into()));
        assert_eq!(
            err.to_string(),
            "Transcript unavailable: Subtitles are disabled for video dQw4w9WgXcQ"
        );
    }
}

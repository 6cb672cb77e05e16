use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Main error type for Codeprompt
#[derive(Error, Debug)]
pub enum CodepromptError {
    /// Chat-history database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive errors (corrupt upload, repack failure)
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (missing field, malformed name)
    #[error("{0}")]
    InvalidInput(String),

    /// Archive or entry not found
    #[error("{0}")]
    NotFound(String),

    /// Upload over the configured size cap
    #[error("File too large ({size_mb}MB). Maximum: {max_mb}MB")]
    TooLarge { size_mb: u64, max_mb: u64 },

    /// Protected resource accessed without a valid session
    #[error("{0}")]
    Unauthorized(String),

    /// AI endpoints called without an API key configured
    #[error("AI not configured. Set OPENROUTER_API_KEY in Settings > API.")]
    AiDisabled,

    /// Upstream service failures (remote fetch, git clone, AI API, OAuth)
    #[error("{0}")]
    Upstream(String),
}

/// Convenient Result type using CodepromptError
pub type Result<T> = std::result::Result<T, CodepromptError>;

impl IntoResponse for CodepromptError {
    fn into_response(self) -> Response {
        let status = match &self {
            CodepromptError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CodepromptError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CodepromptError::NotFound(_) => StatusCode::NOT_FOUND,
            CodepromptError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CodepromptError::AiDisabled => StatusCode::SERVICE_UNAVAILABLE,
            CodepromptError::Database(_)
            | CodepromptError::Io(_)
            | CodepromptError::Archive(_)
            | CodepromptError::Config(_)
            | CodepromptError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("Request failed: {}", self);
        }

        let body = serde_json::json!({
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodepromptError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CodepromptError = io_err.into();
        assert!(matches!(err, CodepromptError::Io(_)));
    }

    #[test]
    fn test_too_large_message() {
        let err = CodepromptError::TooLarge { size_mb: 75, max_mb: 50 };
        assert_eq!(err.to_string(), "File too large (75MB). Maximum: 50MB");
    }

    #[test]
    fn test_status_mapping() {
        let resp = CodepromptError::NotFound("File not found".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = CodepromptError::TooLarge { size_mb: 60, max_mb: 50 }.into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let resp = CodepromptError::AiDisabled.into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

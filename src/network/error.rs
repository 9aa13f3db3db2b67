use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the chat backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no bearer token in the current session")]
    MissingToken,
    #[error("unauthorized (HTTP 401)")]
    Unauthorized,
    #[error("forbidden (HTTP 403)")]
    Forbidden,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Maps a non-success status to an error; `None` for 2xx.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_success() {
            return None;
        }
        Some(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            other => ApiError::Status(other.as_u16()),
        })
    }
}

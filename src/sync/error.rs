use thiserror::Error;

use crate::network::ApiError;

/// User-initiated operations whose failures reach the error banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Load,
    Send,
    Clear,
}

/// Errors shown to the user. The display strings are the banner text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserFacingError {
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("Authentication failed. Please log in again.")]
    AuthenticationFailed,
    #[error("You do not have permission to clear messages")]
    PermissionDenied,
    #[error("Failed to load messages")]
    LoadFailed,
    #[error("Failed to send message")]
    SendFailed,
    #[error("Failed to clear messages")]
    ClearFailed,
}

impl UserFacingError {
    pub fn from_api(action: UserAction, err: &ApiError) -> Self {
        match (action, err) {
            (_, ApiError::MissingToken) => UserFacingError::AuthenticationRequired,
            (_, ApiError::Unauthorized) => UserFacingError::AuthenticationFailed,
            (UserAction::Clear, ApiError::Forbidden) => UserFacingError::PermissionDenied,
            (UserAction::Load, _) => UserFacingError::LoadFailed,
            (UserAction::Send, _) => UserFacingError::SendFailed,
            (UserAction::Clear, _) => UserFacingError::ClearFailed,
        }
    }
}

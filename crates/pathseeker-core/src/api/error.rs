use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The identity service refused the email/password pair
    #[error("Sign-in rejected: {0}")]
    InvalidCredentials(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Rejected by server: {0}")]
    Validation(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Session expired - token refresh failed: {0}")]
    RefreshFailed(#[source] Box<ApiError>),

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Not logged in")]
    NotAuthenticated,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Shown when a rejected sign-in carries no detail
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Error payload shape used by the backend (`{"detail": "..."}`)
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: String,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)",
                    &body[..end],
                    body.len())
        }
    }

    /// Prefer the backend's `detail` message over the raw body
    fn describe_body(body: &str) -> String {
        match serde_json::from_str::<ErrorDetail>(body) {
            Ok(err) => err.detail,
            Err(_) => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let described = Self::describe_body(body);
        match status.as_u16() {
            400 => ApiError::Validation(described),
            401 if described.is_empty() => {
                ApiError::Unauthorized("token may be expired".to_string())
            }
            401 => ApiError::Unauthorized(described),
            403 => ApiError::AccessDenied(described),
            404 => ApiError::NotFound(described),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(described),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, described)),
        }
    }

    /// Rejected sign-in: the backend's `detail` when present
    pub fn invalid_credentials(body: &str) -> Self {
        match serde_json::from_str::<ErrorDetail>(body) {
            Ok(err) if !err.detail.is_empty() => ApiError::InvalidCredentials(err.detail),
            _ => ApiError::InvalidCredentials(INVALID_CREDENTIALS.to_string()),
        }
    }

    pub fn storage(err: anyhow::Error) -> Self {
        ApiError::Storage(format!("{:#}", err))
    }

    /// True for errors that mean the session is not usable
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized(_) | ApiError::RefreshFailed(_) | ApiError::NotAuthenticated
        )
    }
}

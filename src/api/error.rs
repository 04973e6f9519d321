//! API error types for the JIRA client.

use thiserror::Error;

/// Errors that can occur when interacting with the JIRA API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed - invalid user name, password or API token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Permission denied - user lacks access to the resource.
    #[error("Permission denied: you don't have access to this resource")]
    Forbidden,

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limited by the JIRA API.
    #[error("Rate limited: please wait before retrying")]
    RateLimited,

    /// The request was rejected (invalid JQL, unknown field, ...).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// JIRA server error.
    #[error("JIRA server error: {0}")]
    ServerError(String),

    /// Network or HTTP error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Transport failure that is not tied to an HTTP status.
    #[error("JIRA request failed: {0}")]
    Transport(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Keyring error when retrieving tokens.
    #[error("Keyring error: {0}")]
    Keyring(String),

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The server answered with an empty body where data was expected.
    #[error("JIRA Rest server returns unexpected result.")]
    UnexpectedResponse,

    /// A caller-supplied argument cannot be sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Conflict error - resource was modified by another user.
    #[error("Conflict: resource was modified by another user. Please refresh and try again")]
    Conflict,
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// How a failed request should be treated by callers that can absorb errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Authentication or authorization failure. Never swallowed.
    Fatal,
    /// Anything else. May be converted into "no more results".
    Recoverable,
}

impl ApiError {
    /// Create an error from an HTTP status code.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(context.to_string()),
            409 => ApiError::Conflict,
            429 => ApiError::RateLimited,
            400..=499 => ApiError::BadRequest(format!("HTTP {}: {}", status, context)),
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, context)),
            _ => ApiError::ServerError(format!("Unexpected HTTP {}: {}", status, context)),
        }
    }

    /// Classify this error for the paging walker.
    pub fn severity(&self) -> Severity {
        match self {
            ApiError::Unauthorized | ApiError::Forbidden => Severity::Fatal,
            _ => Severity::Recoverable,
        }
    }

    /// Shorthand for `severity() == Severity::Fatal`.
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Check if the request that produced this error may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited | ApiError::ServerError(_) | ApiError::Network(_)
        )
    }
}

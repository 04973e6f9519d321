//! Crate-wide error type.
//!
//! [`Error`] gathers the errors of the individual modules so callers that
//! mix configuration, requests and walking can use a single `?`.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::issues::WalkError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Walk(#[from] WalkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The underlying API error, also when it was raised while walking.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) | Error::Walk(WalkError::Api(e)) => Some(e),
            _ => None,
        }
    }

    /// A message suitable for end users.
    pub fn user_message(&self) -> String {
        if let Some(e) = self.api_error() {
            return match e {
                ApiError::Unauthorized => {
                    "Authentication failed. Please check your user name and API token.".to_string()
                }
                ApiError::Forbidden => {
                    "Access denied. You don't have permission to access this resource.".to_string()
                }
                ApiError::NotFound(resource) => format!("'{}' was not found.", resource),
                ApiError::RateLimited => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::ServerError(_) => "JIRA server error. Please try again later.".to_string(),
                ApiError::Network(_) | ApiError::Transport(_) => {
                    "Could not connect to JIRA. Please check your URL and network.".to_string()
                }
                ApiError::InvalidUrl(_) => "Invalid JIRA URL in configuration.".to_string(),
                ApiError::Keyring(_) => {
                    "Could not access secure storage. Please store the API token again.".to_string()
                }
                ApiError::InvalidResponse(_) | ApiError::UnexpectedResponse => {
                    "Unexpected response from JIRA. Please try again.".to_string()
                }
                ApiError::Conflict => {
                    "The resource was modified by someone else. Please reload and try again."
                        .to_string()
                }
                ApiError::BadRequest(msg) | ApiError::InvalidArgument(msg) => msg.clone(),
            };
        }

        match self {
            Error::Config(ConfigError::NoConfigDir) => {
                "Could not find configuration directory. Please check your system settings."
                    .to_string()
            }
            Error::Config(ConfigError::ParseError(_)) => {
                "Configuration file is invalid. Please check the file format.".to_string()
            }
            Error::Config(ConfigError::ProfileNotFound(name)) => {
                format!("Profile '{}' not found.", name)
            }
            Error::Config(e) => format!("Configuration error: {}", e),
            Error::Walk(e) => e.to_string(),
            Error::Io(_) => "A file operation failed. Please check file permissions.".to_string(),
            Error::Api(e) => e.to_string(),
        }
    }

    /// Errors that stop all further work: bad configuration or rejected credentials.
    pub fn is_critical(&self) -> bool {
        matches!(self, Error::Config(_)) || self.api_error().is_some_and(ApiError::is_fatal)
    }

    /// Errors worth retrying later.
    pub fn is_recoverable(&self) -> bool {
        self.api_error().is_some_and(|e| {
            e.is_retryable() || matches!(e, ApiError::NotFound(_) | ApiError::Conflict)
        })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_error() {
        let err: Error = ConfigError::NoConfigDir.into();
        assert!(matches!(err, Error::Config(ConfigError::NoConfigDir)));
        assert!(err.is_critical());
    }

    #[test]
    fn test_user_message_unauthorized() {
        let err = Error::Api(ApiError::Unauthorized);
        let msg = err.user_message();
        assert!(msg.contains("Authentication failed"));
        assert!(msg.contains("API token"));
    }

    #[test]
    fn test_walk_error_unwraps_api_error() {
        let err = Error::Walk(WalkError::Api(ApiError::Forbidden));
        assert!(matches!(err.api_error(), Some(ApiError::Forbidden)));
        assert!(err.user_message().contains("Access denied"));
        assert!(err.is_critical());
    }

    #[test]
    fn test_user_message_not_found() {
        let err = Error::Api(ApiError::NotFound("PROJ-123".to_string()));
        let msg = err.user_message();
        assert!(msg.contains("PROJ-123"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_user_message_query_not_configured() {
        let err = Error::Walk(WalkError::QueryNotConfigured);
        assert!(err.user_message().contains("Walker::push"));
        assert!(!err.is_critical());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_user_message_config_validation() {
        let err = Error::Config(ConfigError::ValidationError("duplicate profile".to_string()));
        assert!(err.user_message().contains("duplicate profile"));
    }

    #[test]
    fn test_is_recoverable_rate_limited() {
        let err = Error::Api(ApiError::RateLimited);
        assert!(err.is_recoverable());
        assert!(!err.is_critical());
    }

    #[test]
    fn test_is_not_recoverable_unauthorized() {
        let err = Error::Api(ApiError::Unauthorized);
        assert!(!err.is_recoverable());
        assert!(err.is_critical());
    }
}

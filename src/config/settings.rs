//! Client settings.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::api::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_SECS};
use crate::issues::DEFAULT_PAGE_SIZE;

/// Settings shared by all profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The name of the profile used when none is given.
    pub default_profile: Option<String>,
    /// Issues fetched per search request when walking results.
    pub page_size: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Attempts per request for rate-limited, server and network failures.
    pub max_retries: u32,
    /// Base delay between retries, doubled on every attempt.
    pub retry_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "page_size must be at least 1".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.max_retries, 3);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let settings = Settings {
            page_size: 0,
            ..Settings::default()
        };
        assert!(settings
            .validate()
            .unwrap_err()
            .to_string()
            .contains("page_size"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = Settings {
            timeout_secs: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}

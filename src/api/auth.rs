//! Credentials for the JIRA API.
//!
//! Requests are either sent anonymously or with Basic Auth
//! (user name or email + password or API token). Tokens can be
//! looked up in the OS keyring.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::error::{ApiError, Result};

/// The keyring service name under which API tokens are stored.
pub const KEYRING_SERVICE: &str = "jira-rest-client";

/// Credentials attached to every request.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Basic Auth with a user id and password/token.
    Basic(BasicAuth),
    /// No `Authorization` header at all.
    Anonymous,
}

impl Credential {
    /// Basic Auth credentials.
    pub fn basic(user_id: &str, password: &str) -> Self {
        Credential::Basic(BasicAuth::new(user_id, password))
    }

    /// Basic Auth credentials with the token taken from the OS keyring.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be retrieved from the keyring.
    pub fn from_keyring(profile_name: &str, user_id: &str) -> Result<Self> {
        let token = get_token(profile_name)?;
        Ok(Self::basic(user_id, &token))
    }

    /// The `Authorization` header value, if any.
    pub fn header_value(&self) -> Option<&str> {
        match self {
            Credential::Basic(basic) => Some(basic.header_value()),
            Credential::Anonymous => None,
        }
    }
}

/// Basic Auth credentials.
///
/// The password is encoded on construction and the raw value is not kept.
#[derive(Clone)]
pub struct BasicAuth {
    user_id: String,
    auth_header: String,
}

impl BasicAuth {
    /// Create new Basic Auth credentials.
    pub fn new(user_id: &str, password: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            auth_header: build_auth_header(user_id, password),
        }
    }

    /// The user id (user name or email).
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The base64 encoded `user:password` pair.
    pub fn credential(&self) -> &str {
        self.auth_header.trim_start_matches("Basic ")
    }

    /// The complete "Basic ..." header value.
    pub fn header_value(&self) -> &str {
        &self.auth_header
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Build the Basic Auth header value.
fn build_auth_header(user_id: &str, password: &str) -> String {
    let credentials = format!("{}:{}", user_id, password);
    format!("Basic {}", BASE64.encode(credentials.as_bytes()))
}

/// Retrieve an API token from the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be retrieved from the keyring.
pub fn get_token(profile_name: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .get_password()
        .map_err(|e| ApiError::Keyring(format!("failed to retrieve token: {}", e)))
}

//! JIRA REST API client and types.
//!
//! [`JiraClient`] wraps the endpoints of `rest/api/2`. Requests go through a
//! [`Transport`]; [`HttpTransport`] is the reqwest-backed default.

mod auth;
mod client;
mod error;
mod result;
mod transport;
mod types;

pub use auth::{get_token, BasicAuth, Credential, KEYRING_SERVICE};
pub use client::JiraClient;
pub use error::{ApiError, Result, Severity};
pub use result::ApiResult;
pub use transport::{
    build_query, HttpTransport, Method, Transport, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS,
    DEFAULT_TIMEOUT_SECS,
};
pub use types::{
    ById, CreateMetaQuery, Field, FieldSelector, Issue, IssueType, Keyed, Priority, Resolution,
    SearchResult, Status, Transition, TransitionsResponse, Version,
};

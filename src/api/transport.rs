//! HTTP transport for the JIRA REST API.
//!
//! `JiraClient` never talks to the network directly; it hands a method, a path
//! and request data to a [`Transport`] and gets the raw response body back.
//! [`HttpTransport`] is the reqwest based implementation, with a request
//! timeout and retry logic for transient failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::auth::Credential;
use super::error::{ApiError, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default maximum number of attempts for transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between retries in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// The method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sends requests to a JIRA server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response body.
    ///
    /// For `GET` requests `data` must be a JSON object (or `null`) and is sent
    /// as the query string; other methods send it as the JSON body.
    /// `endpoint` is prepended to `url`; pass an empty endpoint for absolute URLs.
    ///
    /// # Errors
    ///
    /// * [`ApiError::Unauthorized`] when the credentials are rejected
    /// * [`ApiError::UnexpectedResponse`] on an empty body where data was expected
    /// * any other [`ApiError`] for communication failures
    async fn send_request(
        &self,
        method: Method,
        url: &str,
        data: &Value,
        endpoint: &str,
        credential: &Credential,
        is_file: bool,
    ) -> Result<String>;
}

/// reqwest based [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl HttpTransport {
    /// Create a transport with the default timeout and retry policy.
    pub fn new() -> Result<Self> {
        Self::with_settings(
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_MAX_RETRIES,
            DEFAULT_RETRY_DELAY_MS,
        )
    }

    /// Create a transport with an explicit timeout and retry policy.
    ///
    /// `max_retries` is the total number of attempts; values below 1 are treated as 1.
    pub fn with_settings(timeout: Duration, max_retries: u32, retry_delay_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            client,
            max_retries: max_retries.max(1),
            retry_delay_ms,
        })
    }

    /// Execute a single request.
    async fn execute(
        &self,
        method: Method,
        url: &str,
        data: &Value,
        credential: &Credential,
        is_file: bool,
    ) -> Result<String> {
        let mut request = match method {
            Method::Get => {
                let query = build_query(data)?;
                let full_url = if query.is_empty() {
                    url.to_string()
                } else {
                    format!("{}?{}", url, query)
                };
                self.client.get(full_url)
            }
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };

        request = request.header(header::ACCEPT, "application/json");

        if let Some(value) = credential.header_value() {
            request = request.header(header::AUTHORIZATION, value);
        }

        if is_file {
            request = request.header("X-Atlassian-Token", "nocheck");
        } else {
            request = request.header(header::CONTENT_TYPE, "application/json;charset=UTF-8");
        }

        if method != Method::Get && !data.is_null() {
            let body = serde_json::to_vec(data)
                .map_err(|e| ApiError::InvalidArgument(format!("cannot encode body: {}", e)))?;
            request = request.body(body);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Check the HTTP status and return the body.
    async fn handle_response(response: Response) -> Result<String> {
        let status = response.status();
        let url = response.url().to_string();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await?;

        if !status.is_success() {
            debug!("Error response body: {}", body);
            return Err(error_from_response(status, &url, &body));
        }

        if body.is_empty() && status != StatusCode::CREATED && status != StatusCode::NO_CONTENT {
            return Err(ApiError::UnexpectedResponse);
        }

        Ok(body)
    }

    /// Calculate retry delay with exponential backoff, saturating at `u64::MAX`.
    fn calculate_retry_delay(&self, attempt: u32) -> u64 {
        2u64.checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.retry_delay_ms.checked_mul(factor))
            .unwrap_or(u64::MAX)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, data, credential), fields(method = %method, url = %url))]
    async fn send_request(
        &self,
        method: Method,
        url: &str,
        data: &Value,
        endpoint: &str,
        credential: &Credential,
        is_file: bool,
    ) -> Result<String> {
        let full_url = format!("{}{}", endpoint, url);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!("Request attempt {}/{}", attempts, self.max_retries);

            match self.execute(method, &full_url, data, credential, is_file).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempts < self.max_retries => {
                    let delay = self.calculate_retry_delay(attempts);
                    warn!(
                        "Request failed (attempt {}), retrying in {}ms: {}",
                        attempts, delay, e
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Encode GET request data as a query string.
///
/// `null` values are dropped, arrays are comma-joined.
pub fn build_query(data: &Value) -> Result<String> {
    let map = match data {
        Value::Null => return Ok(String::new()),
        Value::Object(map) => map,
        _ => {
            return Err(ApiError::InvalidArgument(
                "GET request data must be a JSON object".to_string(),
            ))
        }
    };

    let pairs: Vec<String> = map
        .iter()
        .filter_map(|(key, value)| {
            query_value(value).map(|v| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(&v))
            })
        })
        .collect();

    Ok(pairs.join("&"))
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

/// Create an appropriate error from an HTTP response.
fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(messages) = json.get("errorMessages").and_then(Value::as_array) {
            let messages: Vec<&str> = messages.iter().filter_map(Value::as_str).collect();
            if !messages.is_empty() {
                return ApiError::from_status(status, &messages.join(", "));
            }
        }
        if let Some(errors) = json.get("errors").and_then(Value::as_object) {
            let error_strings: Vec<String> = errors
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect();
            if !error_strings.is_empty() {
                return ApiError::from_status(status, &error_strings.join(", "));
            }
        }
    }

    ApiError::from_status(status, url)
}

//! Decoded API response wrapper.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::error::{ApiError, Result};
use super::types::{Issue, SearchResult};

/// A decoded JSON response body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult {
    result: Value,
}

impl ApiResult {
    /// Parse a raw response body.
    pub fn from_body(body: &str) -> Result<Self> {
        let result = serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(Self { result })
    }

    pub fn new(result: Value) -> Self {
        Self { result }
    }

    /// The decoded body.
    pub fn get_result(&self) -> &Value {
        &self.result
    }

    pub fn into_inner(self) -> Value {
        self.result
    }

    /// Decode the body into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.result)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// `total` of a search response, 0 when absent. Saturates at `u32::MAX`.
    pub fn get_total(&self) -> u32 {
        self.result
            .get("total")
            .and_then(Value::as_u64)
            .map(|total| u32::try_from(total).unwrap_or(u32::MAX))
            .unwrap_or(0)
    }

    /// Issues of a search response.
    pub fn get_issues(&self) -> Result<Vec<Issue>> {
        match self.result.get("issues") {
            Some(issues) => Vec::<Issue>::deserialize(issues)
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse issues: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    /// Number of issues in a search response.
    pub fn get_issues_count(&self) -> usize {
        self.result
            .get("issues")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl TryFrom<ApiResult> for SearchResult {
    type Error = ApiError;

    fn try_from(result: ApiResult) -> Result<Self> {
        result.deserialize()
    }
}

//! JIRA API request and response types.
//!
//! These types model the JIRA REST API v2 responses. Issues are kept close to
//! the wire format: their `fields` map is not interpreted, because the set of
//! returned fields depends on the `fields` selector of the request.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::error::{ApiError, Result};

/// Search result from a JQL query.
///
/// Returned by `GET /rest/api/2/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The index of the first result.
    #[serde(default)]
    pub start_at: u32,
    /// Maximum results requested.
    #[serde(default)]
    pub max_results: u32,
    /// Total number of matching issues.
    #[serde(default)]
    pub total: u32,
    /// The issues on this page.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl SearchResult {
    /// Total number of issues matching the query, across all pages.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of issues on this page.
    pub fn issues_count(&self) -> usize {
        self.issues.len()
    }

    /// The issues on this page, in server order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Take the issues on this page.
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// Check if there are more pages of results.
    pub fn has_more(&self) -> bool {
        self.start_at + (self.issues.len() as u32) < self.total
    }

    /// Get the starting index for the next page.
    pub fn next_start(&self) -> u32 {
        self.start_at + self.issues.len() as u32
    }
}

/// Which issue fields a search should return.
///
/// Sent as the comma separated `fields` query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelector {
    /// A raw selector such as `"*navigable"` or `"summary,description"`.
    Raw(String),
    /// A list of field ids.
    List(Vec<String>),
}

impl FieldSelector {
    /// Render as a query parameter value.
    pub fn to_param(&self) -> String {
        match self {
            FieldSelector::Raw(raw) => raw.clone(),
            FieldSelector::List(fields) => fields.join(","),
        }
    }
}

impl From<&str> for FieldSelector {
    fn from(raw: &str) -> Self {
        FieldSelector::Raw(raw.to_string())
    }
}

impl From<String> for FieldSelector {
    fn from(raw: String) -> Self {
        FieldSelector::Raw(raw)
    }
}

impl From<Vec<String>> for FieldSelector {
    fn from(fields: Vec<String>) -> Self {
        FieldSelector::List(fields)
    }
}

impl From<&[&str]> for FieldSelector {
    fn from(fields: &[&str]) -> Self {
        FieldSelector::List(fields.iter().map(|f| f.to_string()).collect())
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_param())
    }
}

/// A JIRA issue.
///
/// Returned by `GET /rest/api/2/issue/{issueKey}` or as part of search results.
/// Top-level keys other than `expand`, `id`, `self`, `key` and `fields` (for
/// example `changelog` or `renderedFields` requested through `expand`) are
/// kept in [`Issue::expanded_information`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Expandable sections of this issue.
    #[serde(default, with = "comma_list", skip_serializing_if = "Vec::is_empty")]
    pub expand: Vec<String>,
    /// The internal issue ID.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    /// API URL of this issue.
    #[serde(rename = "self", default)]
    pub self_url: String,
    /// The issue key (e.g., "PROJ-123").
    #[serde(default)]
    pub key: String,
    /// The issue fields, keyed by field id.
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Everything else the server sent.
    #[serde(flatten)]
    pub expanded_information: Map<String, Value>,
}

impl Issue {
    /// Get a field by its id.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn summary(&self) -> Option<&Value> {
        self.get("summary")
    }

    pub fn issue_type(&self) -> Option<&Value> {
        self.get("issuetype")
    }

    pub fn reporter(&self) -> Option<&Value> {
        self.get("reporter")
    }

    pub fn created(&self) -> Option<&Value> {
        self.get("created")
    }

    pub fn assignee(&self) -> Option<&Value> {
        self.get("assignee")
    }

    pub fn updated(&self) -> Option<&Value> {
        self.get("updated")
    }

    pub fn priority(&self) -> Option<&Value> {
        self.get("priority")
    }

    pub fn description(&self) -> Option<&Value> {
        self.get("description")
    }

    pub fn status(&self) -> Option<&Value> {
        self.get("status")
    }

    pub fn labels(&self) -> Option<&Value> {
        self.get("labels")
    }

    pub fn project(&self) -> Option<&Value> {
        self.get("project")
    }

    pub fn fix_versions(&self) -> Option<&Value> {
        self.get("fixVersions")
    }

    pub fn resolution(&self) -> Option<&Value> {
        self.get("resolution")
    }

    pub fn resolution_date(&self) -> Option<&Value> {
        self.get("resolutiondate")
    }

    pub fn watchers(&self) -> Option<&Value> {
        self.get("watches")
    }

    pub fn due_date(&self) -> Option<&Value> {
        self.get("duedate")
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.summary().and_then(Value::as_str) {
            Some(summary) => write!(f, "{}: {}", self.key, summary),
            None => write!(f, "{}", self.key),
        }
    }
}

/// Issue type (Bug, Story, Task, Epic, etc.).
///
/// Returned by `GET /rest/api/2/issuetype`. Use [`IssueType::from_value`] to
/// decode: it rejects keys this type does not know about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueType {
    #[serde(default)]
    pub avatar_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    /// Unique ID for next-gen projects.
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub hierarchy_level: Option<i32>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Details of the next-gen projects the issue type is available in.
    #[serde(default)]
    pub scope: Option<Value>,
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
    #[serde(default)]
    pub subtask: bool,
    #[serde(default)]
    pub untranslated_name: Option<String>,
}

impl IssueType {
    /// Keys accepted in an issue type payload.
    pub const ACCEPTABLE_KEYS: &'static [&'static str] = &[
        "avatarId",
        "description",
        "entityId",
        "hierarchyLevel",
        "iconUrl",
        "id",
        "name",
        "scope",
        "self",
        "subtask",
        "untranslatedName",
    ];

    /// Decode an issue type, failing on unsupported keys.
    pub fn from_value(value: Value) -> Result<Self> {
        if let Value::Object(map) = &value {
            let unknown: Vec<&str> = map
                .keys()
                .map(String::as_str)
                .filter(|key| !Self::ACCEPTABLE_KEYS.contains(key))
                .collect();

            if !unknown.is_empty() {
                return Err(ApiError::InvalidResponse(format!(
                    "The \"{}\" issue type keys are not supported.",
                    unknown.join("\", \"")
                )));
            }
        }

        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse issue type: {}", e)))
    }

    /// Whether this is a subtask type.
    pub fn is_subtask(&self) -> bool {
        self.subtask
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A project version.
///
/// Returned by `GET /rest/api/2/project/{key}/versions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub released: bool,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub user_release_date: Option<String>,
    #[serde(default)]
    pub overdue: Option<bool>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
}

/// Entities that metadata caches index by id.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Metadata entries that are keyed by id (fields, priorities, statuses,
/// resolutions). Unmodelled attributes are kept in `extra`.
macro_rules! id_named_entity {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(default, deserialize_with = "string_or_number")]
            pub id: String,
            #[serde(default)]
            pub name: String,
            #[serde(default)]
            pub description: Option<String>,
            #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
            pub self_url: Option<String>,
            #[serde(flatten)]
            pub extra: Map<String, Value>,
        }

        impl Keyed for $name {
            fn key(&self) -> &str {
                &self.id
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.name)
            }
        }
    };
}

id_named_entity!(
    /// A field definition. Returned by `GET /rest/api/2/field`.
    Field
);
id_named_entity!(
    /// Issue priority. Returned by `GET /rest/api/2/priority`.
    Priority
);
id_named_entity!(
    /// Issue status. Returned by `GET /rest/api/2/status`.
    Status
);
id_named_entity!(
    /// Issue resolution. Returned by `GET /rest/api/2/resolution`.
    Resolution
);

/// Metadata map keyed by entity id.
pub type ById<T> = BTreeMap<String, T>;

/// A workflow transition available for an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    /// The status the issue moves to.
    #[serde(default)]
    pub to: Option<Value>,
}

/// Response of `GET /rest/api/2/issue/{key}/transitions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionsResponse {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

/// Filters for `GET /rest/api/2/issue/createmeta`.
///
/// Every list is sent comma separated; `None` leaves the filter out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateMetaQuery {
    pub project_ids: Option<Vec<String>>,
    pub project_keys: Option<Vec<String>>,
    pub issue_type_ids: Option<Vec<String>>,
    pub issue_type_names: Option<Vec<String>>,
    pub expand: Option<Vec<String>>,
}

impl CreateMetaQuery {
    /// Render as GET request data.
    pub fn to_data(&self) -> Value {
        let mut data = Map::new();
        let entries = [
            ("projectIds", &self.project_ids),
            ("projectKeys", &self.project_keys),
            ("issuetypeIds", &self.issue_type_ids),
            ("issuetypeNames", &self.issue_type_names),
            ("expand", &self.expand),
        ];

        for (key, values) in entries {
            if let Some(values) = values {
                data.insert(key.to_string(), Value::String(values.join(",")));
            }
        }

        Value::Object(data)
    }
}

/// Accept ids sent either as JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// `"a,b,c"` on the wire, `Vec<String>` in memory.
mod comma_list {
    use super::*;

    pub fn serialize<S: Serializer>(items: &[String], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&items.join(","))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }
}

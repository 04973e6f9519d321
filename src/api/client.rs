//! JIRA API client implementation.
//!
//! This module provides the main client for the JIRA REST API v2. Every
//! operation builds a path and request data and delegates to a [`Transport`];
//! the client only decodes the response.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::auth::Credential;
use super::error::{ApiError, Result};
use super::result::ApiResult;
use super::transport::{HttpTransport, Method, Transport};
use super::types::{
    ById, CreateMetaQuery, Field, FieldSelector, Issue, IssueType, Keyed, Priority, Resolution,
    SearchResult, Status, TransitionsResponse, Version,
};
use crate::config::{Profile, Settings};
use crate::issues::IssueSearch;

/// Name of the transition used by [`JiraClient::close_issue`].
const CLOSE_TRANSITION_NAME: &str = "Close Issue";

/// Lazily loaded metadata, dropped when the endpoint changes.
type MetadataCache<T> = RwLock<Option<ById<T>>>;

/// The JIRA API client.
pub struct JiraClient {
    /// The base URL for the JIRA instance, without trailing slash.
    endpoint: String,
    /// Credentials sent with every request.
    credential: Credential,
    /// Executes the HTTP requests.
    transport: Arc<dyn Transport>,
    fields: MetadataCache<Field>,
    priorities: MetadataCache<Priority>,
    statuses: MetadataCache<Status>,
    resolutions: MetadataCache<Resolution>,
}

impl fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraClient")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl JiraClient {
    /// Create a client that talks to `endpoint` over HTTP.
    ///
    /// Does NOT validate the connection.
    pub fn new(endpoint: &str, credential: Credential) -> Result<Self> {
        let transport = HttpTransport::new()?;
        Ok(Self::with_transport(endpoint, credential, Arc::new(transport)))
    }

    /// Create a client with a custom transport.
    pub fn with_transport(
        endpoint: &str,
        credential: Credential,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            endpoint: normalize_base_url(endpoint),
            credential,
            transport,
            fields: RwLock::new(None),
            priorities: RwLock::new(None),
            statuses: RwLock::new(None),
            resolutions: RwLock::new(None),
        }
    }

    /// Create a client from a configured profile.
    ///
    /// The API token is read from the OS keyring; timeout and retry policy
    /// come from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be retrieved from the keyring or
    /// the HTTP client cannot be built.
    #[instrument(skip(profile, settings), fields(profile_name = %profile.name))]
    pub fn from_profile(profile: &Profile, settings: &Settings) -> Result<Self> {
        info!("Creating JIRA client for profile");

        let credential = profile.credential()?;
        let transport = HttpTransport::with_settings(
            Duration::from_secs(settings.timeout_secs),
            settings.max_retries,
            settings.retry_delay_ms,
        )?;

        Ok(Self::with_transport(&profile.url, credential, Arc::new(transport)))
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Point the client at another JIRA instance.
    ///
    /// Trailing slashes are removed. Cached metadata is dropped when the
    /// endpoint actually changes.
    pub fn set_endpoint(&mut self, url: &str) {
        let url = normalize_base_url(url);

        if url != self.endpoint {
            self.endpoint = url;
            *self.fields.get_mut() = None;
            *self.priorities.get_mut() = None;
            *self.statuses.get_mut() = None;
            *self.resolutions.get_mut() = None;
        }
    }

    /// Send a request relative to the endpoint.
    ///
    /// Returns `None` when the server answered with an empty body.
    #[instrument(skip(self, data), fields(method = %method))]
    pub async fn api(&self, method: Method, path: &str, data: Value) -> Result<Option<ApiResult>> {
        let body = self.send(method, path, &data).await?;

        if body.is_empty() {
            return Ok(None);
        }

        ApiResult::from_body(&body).map(Some)
    }

    async fn send(&self, method: Method, path: &str, data: &Value) -> Result<String> {
        self.transport
            .send_request(method, path, data, &self.endpoint, &self.credential, false)
            .await
    }

    /// GET a path and decode the body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, data: Value) -> Result<T> {
        match self.api(Method::Get, path, data).await? {
            Some(result) => result.deserialize(),
            None => Err(ApiError::UnexpectedResponse),
        }
    }

    /// Load a metadata list once and serve it from memory afterwards.
    async fn cached_by_id<T>(&self, cache: &MetadataCache<T>, path: &str) -> Result<ById<T>>
    where
        T: DeserializeOwned + Keyed + Clone,
    {
        if let Some(cached) = cache.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let entries: Vec<T> = self.get_json(path, Value::Null).await?;
        let by_id: ById<T> = entries
            .into_iter()
            .map(|entry| (entry.key().to_string(), entry))
            .collect();

        debug!("Loaded {} entries from {}", by_id.len(), path);
        *cache.write().await = Some(by_id.clone());
        Ok(by_id)
    }

    /// Get field definitions, keyed by field id.
    pub async fn get_fields(&self) -> Result<ById<Field>> {
        self.cached_by_id(&self.fields, "/rest/api/2/field").await
    }

    /// Get available priorities, keyed by id.
    pub async fn get_priorities(&self) -> Result<ById<Priority>> {
        self.cached_by_id(&self.priorities, "/rest/api/2/priority")
            .await
    }

    /// Get available statuses, keyed by id.
    pub async fn get_statuses(&self) -> Result<ById<Status>> {
        self.cached_by_id(&self.statuses, "/rest/api/2/status").await
    }

    /// Get all resolutions, keyed by id.
    pub async fn get_resolutions(&self) -> Result<ById<Resolution>> {
        self.cached_by_id(&self.resolutions, "/rest/api/2/resolution")
            .await
    }

    /// Get a single issue by key.
    ///
    /// # Arguments
    ///
    /// * `key` - The issue key (e.g., "PROJ-123")
    /// * `expand` - Comma separated sections to expand, empty for none
    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn get_issue(&self, key: &str, expand: &str) -> Result<Issue> {
        debug!("Fetching issue");

        let data = if expand.is_empty() {
            Value::Null
        } else {
            json!({ "expand": expand })
        };

        self.get_json(&format!("/rest/api/2/issue/{}", key), data)
            .await
            .map_err(|e| match e {
                ApiError::NotFound(_) => ApiError::NotFound(format!("Issue '{}' not found", key)),
                e => e,
            })
    }

    /// Edit an issue.
    #[instrument(skip(self, params), fields(issue_key = %key))]
    pub async fn edit_issue(&self, key: &str, params: Value) -> Result<Option<ApiResult>> {
        self.api(Method::Put, &format!("/rest/api/2/issue/{}", key), params)
            .await
    }

    /// Create an issue.
    ///
    /// `options` are extra entries of the `fields` object and override the
    /// project, summary and issue type built from the other arguments.
    #[instrument(skip(self, options))]
    pub async fn create_issue(
        &self,
        project_key: &str,
        summary: &str,
        issue_type_id: &str,
        options: Value,
    ) -> Result<Option<ApiResult>> {
        let fields = merge(
            json!({
                "project": { "key": project_key },
                "summary": summary,
                "issuetype": { "id": issue_type_id },
            }),
            options,
        )?;

        self.api(Method::Post, "/rest/api/2/issue/", json!({ "fields": fields }))
            .await
    }

    /// Add a comment to an issue.
    ///
    /// A plain string is wrapped as `{"body": ...}`.
    #[instrument(skip(self, params), fields(issue_key = %key))]
    pub async fn add_comment(&self, key: &str, params: Value) -> Result<Option<ApiResult>> {
        let params = match params {
            Value::String(body) => json!({ "body": body }),
            other => other,
        };

        self.api(
            Method::Post,
            &format!("/rest/api/2/issue/{}/comment", key),
            params,
        )
        .await
    }

    /// Get all worklogs of an issue.
    pub async fn get_worklogs(&self, key: &str, params: Value) -> Result<Option<ApiResult>> {
        self.api(
            Method::Get,
            &format!("/rest/api/2/issue/{}/worklog", key),
            params,
        )
        .await
    }

    /// Get the transitions available for an issue.
    pub async fn get_transitions(&self, key: &str, params: Value) -> Result<TransitionsResponse> {
        self.get_json(&format!("/rest/api/2/issue/{}/transitions", key), params)
            .await
    }

    /// Transition an issue.
    #[instrument(skip(self, params), fields(issue_key = %key))]
    pub async fn transition(&self, key: &str, params: Value) -> Result<Option<ApiResult>> {
        self.api(
            Method::Post,
            &format!("/rest/api/2/issue/{}/transitions", key),
            params,
        )
        .await
    }

    /// Close an issue through its "Close Issue" transition.
    ///
    /// Returns `Ok(None)` when the issue has no such transition.
    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn close_issue(&self, key: &str) -> Result<Option<ApiResult>> {
        let transitions = self.get_transitions(key, Value::Null).await?;

        match transitions
            .transitions
            .iter()
            .find(|t| t.name == CLOSE_TRANSITION_NAME)
        {
            Some(close) => {
                self.transition(key, json!({ "transition": { "id": close.id } }))
                    .await
            }
            None => {
                warn!("No '{}' transition available", CLOSE_TRANSITION_NAME);
                Ok(None)
            }
        }
    }

    /// Add watchers to an issue, one request per watcher.
    pub async fn set_watchers(&self, key: &str, watchers: &[&str]) -> Result<Vec<Option<ApiResult>>> {
        let path = format!("/rest/api/2/issue/{}/watchers", key);
        let mut results = Vec::with_capacity(watchers.len());

        for watcher in watchers {
            results.push(self.api(Method::Post, &path, json!(watcher)).await?);
        }

        Ok(results)
    }

    /// Create a remote link on an issue.
    pub async fn create_remote_link(
        &self,
        key: &str,
        object: Value,
        relationship: Option<&str>,
        global_id: Option<&str>,
        application: Option<Value>,
    ) -> Result<Option<ApiResult>> {
        let mut options = json!({
            "globalid": global_id,
            "relationship": relationship,
            "object": object,
        });

        if let (Some(application), Some(map)) = (application, options.as_object_mut()) {
            map.insert("application".to_string(), application);
        }

        self.api(
            Method::Post,
            &format!("/rest/api/2/issue/{}/remotelink", key),
            options,
        )
        .await
    }

    /// Search for issues using JQL.
    ///
    /// # Arguments
    ///
    /// * `jql` - The JQL query string
    /// * `start_at` - The index of the first issue to return (0-based)
    /// * `max_results` - Maximum number of issues to return
    /// * `fields` - Fields to return; `None` lets the server decide
    #[instrument(skip(self, fields), fields(jql = %jql))]
    pub async fn search(
        &self,
        jql: &str,
        start_at: u32,
        max_results: u32,
        fields: Option<&FieldSelector>,
    ) -> Result<SearchResult> {
        debug!("Searching issues: startAt={}, maxResults={}", start_at, max_results);

        let data = json!({
            "jql": jql,
            "startAt": start_at,
            "maxResults": max_results,
            "fields": fields.map(FieldSelector::to_param),
        });

        let result: SearchResult = self.get_json("/rest/api/2/search", data).await?;
        debug!("Found {} issues (total: {})", result.issues.len(), result.total);
        Ok(result)
    }

    /// Get attachment settings (enabled, upload limit).
    pub async fn get_attachments_meta_information(&self) -> Result<Value> {
        self.get_json("/rest/api/2/attachment/meta", Value::Null).await
    }

    /// Get attachment metadata.
    pub async fn get_attachment(&self, attachment_id: &str) -> Result<Value> {
        self.get_json(
            &format!("/rest/api/2/attachment/{}", attachment_id),
            Value::Null,
        )
        .await
    }

    /// Download attachment contents from an absolute URL.
    #[instrument(skip(self))]
    pub async fn download_attachment(&self, url: &str) -> Result<String> {
        self.transport
            .send_request(Method::Get, url, &Value::Null, "", &self.credential, true)
            .await
    }

    /// Get all projects.
    pub async fn get_projects(&self) -> Result<Value> {
        self.get_json("/rest/api/2/project", Value::Null).await
    }

    /// Get one project.
    pub async fn get_project(&self, project_key: &str) -> Result<Value> {
        self.get_json(&format!("/rest/api/2/project/{}", project_key), Value::Null)
            .await
    }

    /// Get the roles of a project.
    pub async fn get_roles(&self, project_key: &str) -> Result<Value> {
        self.get_json(
            &format!("/rest/api/2/project/{}/role", project_key),
            Value::Null,
        )
        .await
    }

    /// Get the details of one project role.
    pub async fn get_role_details(&self, project_key: &str, role_id: &str) -> Result<Value> {
        self.get_json(
            &format!("/rest/api/2/project/{}/role/{}", project_key, role_id),
            Value::Null,
        )
        .await
    }

    /// Get the components of a project.
    pub async fn get_project_components(&self, project_key: &str) -> Result<Value> {
        self.get_json(
            &format!("/rest/api/2/project/{}/components", project_key),
            Value::Null,
        )
        .await
    }

    /// Get all issue types with their valid statuses for a project.
    pub async fn get_project_issue_types(&self, project_key: &str) -> Result<Value> {
        self.get_json(
            &format!("/rest/api/2/project/{}/statuses", project_key),
            Value::Null,
        )
        .await
    }

    /// Get the metadata for creating issues.
    ///
    /// Fields are only included when `projects.issuetypes.fields` is expanded.
    pub async fn get_create_meta(&self, query: &CreateMetaQuery) -> Result<Value> {
        self.get_json("/rest/api/2/issue/createmeta", query.to_data())
            .await
    }

    /// Get all issue types.
    pub async fn get_issue_types(&self) -> Result<Vec<IssueType>> {
        let types: Vec<Value> = self.get_json("/rest/api/2/issuetype", Value::Null).await?;
        types.into_iter().map(IssueType::from_value).collect()
    }

    /// Get the versions of a project.
    pub async fn get_versions(&self, project_key: &str) -> Result<Vec<Version>> {
        self.get_json(
            &format!("/rest/api/2/project/{}/versions", project_key),
            Value::Null,
        )
        .await
    }

    /// Find a project version by its name.
    pub async fn find_version_by_name(&self, project_key: &str, name: &str) -> Result<Option<Version>> {
        let versions = self.get_versions(project_key).await?;
        Ok(versions.into_iter().find(|version| version.name == name))
    }

    /// Create a new version.
    ///
    /// `options` may set `description`, `userReleaseDate`, `releaseDate`,
    /// `released` and `archived`.
    #[instrument(skip(self, options))]
    pub async fn create_version(
        &self,
        project_key: &str,
        version: &str,
        options: Value,
    ) -> Result<Option<ApiResult>> {
        let params = merge(
            json!({
                "name": version,
                "description": "",
                "project": project_key,
                "released": false,
                "archived": false,
            }),
            options,
        )?;

        self.api(Method::Post, "/rest/api/2/version", params).await
    }

    /// Update a version.
    #[instrument(skip(self, params))]
    pub async fn update_version(&self, version_id: u64, params: Value) -> Result<Option<ApiResult>> {
        self.api(
            Method::Put,
            &format!("/rest/api/2/version/{}", version_id),
            params,
        )
        .await
    }

    /// Mark a version as released.
    ///
    /// `release_date` is `YYYY-MM-DD` and defaults to today.
    pub async fn release_version(
        &self,
        version_id: u64,
        release_date: Option<&str>,
        params: Value,
    ) -> Result<Option<ApiResult>> {
        let release_date = match release_date {
            Some(date) => date.to_string(),
            None => today(),
        };

        let params = merge(
            json!({
                "releaseDate": release_date,
                "released": true,
            }),
            params,
        )?;

        self.update_version(version_id, params).await
    }
}

#[async_trait]
impl IssueSearch for JiraClient {
    async fn search(
        &self,
        jql: &str,
        start_at: u32,
        max_results: u32,
        fields: Option<&FieldSelector>,
    ) -> Result<SearchResult> {
        JiraClient::search(self, jql, start_at, max_results, fields).await
    }
}

/// Overlay `options` (an object or `null`) on top of `defaults`.
fn merge(defaults: Value, options: Value) -> Result<Value> {
    let mut merged: Map<String, Value> = match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    match options {
        Value::Null => {}
        Value::Object(options) => merged.extend(options),
        other => {
            return Err(ApiError::InvalidArgument(format!(
                "options must be a JSON object, got {}",
                other
            )))
        }
    }

    Ok(Value::Object(merged))
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    if !url.starts_with("https://") && !url.contains("localhost") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const ENDPOINT: &str = "http://jira.company.com";

    /// One expected request and its canned response: a body or an HTTP status.
    struct Expectation {
        method: Method,
        url: String,
        data: Value,
        response: std::result::Result<String, u16>,
    }

    /// Transport that answers from a list of expectations and records calls.
    #[derive(Default)]
    struct MockTransport {
        expectations: Mutex<Vec<Expectation>>,
        calls: Mutex<Vec<(Method, String, Value)>>,
    }

    impl MockTransport {
        fn expect(&self, method: Method, url: &str, data: Value, response: &str) {
            self.push(method, url, data, Ok(response.to_string()));
        }

        fn expect_status(&self, method: Method, url: &str, data: Value, status: u16) {
            self.push(method, url, data, Err(status));
        }

        fn push(&self, method: Method, url: &str, data: Value, response: std::result::Result<String, u16>) {
            self.expectations.lock().unwrap().push(Expectation {
                method,
                url: url.to_string(),
                data,
                response,
            });
        }

        fn calls(&self) -> Vec<(Method, String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send_request(
            &self,
            method: Method,
            url: &str,
            data: &Value,
            endpoint: &str,
            _credential: &Credential,
            _is_file: bool,
        ) -> Result<String> {
            assert_eq!(endpoint, ENDPOINT);
            self.calls
                .lock()
                .unwrap()
                .push((method, url.to_string(), data.clone()));

            let expectations = self.expectations.lock().unwrap();
            let expectation = expectations
                .iter()
                .find(|e| e.method == method && e.url == url && &e.data == data)
                .ok_or_else(|| ApiError::Transport(format!("unexpected {} {} {}", method, url, data)))?;

            match &expectation.response {
                Ok(body) => Ok(body.clone()),
                Err(status) => Err(ApiError::from_status(
                    reqwest::StatusCode::from_u16(*status).unwrap(),
                    url,
                )),
            }
        }
    }

    fn client() -> (JiraClient, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::default());
        let client = JiraClient::with_transport(ENDPOINT, Credential::basic("user", "pass"), transport.clone());
        (client, transport)
    }

    #[test]
    fn test_normalize_base_url_removes_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://company.atlassian.net/"),
            "https://company.atlassian.net"
        );
        assert_eq!(
            normalize_base_url("https://company.atlassian.net///"),
            "https://company.atlassian.net"
        );
        assert_eq!(normalize_base_url("https://test.test"), "https://test.test");
    }

    #[test]
    fn test_normalize_base_url_preserves_path() {
        assert_eq!(
            normalize_base_url("https://company.atlassian.net/jira/"),
            "https://company.atlassian.net/jira"
        );
    }

    #[test]
    fn test_merge_overrides_defaults() {
        let merged = merge(json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4})).unwrap();
        assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
        assert!(merge(json!({}), json!("nope")).is_err());
    }

    #[tokio::test]
    async fn test_update_version_empty_response() {
        let (client, transport) = client();
        let params = json!({"overdue": true, "description": "new description"});
        transport.expect(Method::Put, "/rest/api/2/version/111000", params.clone(), "");

        let result = client.update_version(111000, params).await.unwrap();

        assert!(result.is_none());
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_release_version_automatic_release_date() {
        let (client, transport) = client();
        transport.expect(
            Method::Put,
            "/rest/api/2/version/111000",
            json!({"released": true, "releaseDate": today()}),
            "",
        );

        assert!(client
            .release_version(111000, None, Value::Null)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_release_version_parameter_merging() {
        let (client, transport) = client();
        transport.expect(
            Method::Put,
            "/rest/api/2/version/111000",
            json!({"released": true, "releaseDate": "2010-07-06", "test": "extra"}),
            "",
        );

        assert!(client
            .release_version(111000, Some("2010-07-06"), json!({"test": "extra"}))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_version_by_name() {
        let (client, transport) = client();
        let versions = json!([
            {"id": "14205", "name": "3.62.0"},
            {"id": "14206", "name": "3.36.0"},
            {"id": "14207", "name": "3.66.0"},
        ]);
        transport.expect(
            Method::Get,
            "/rest/api/2/project/POR/versions",
            Value::Null,
            &versions.to_string(),
        );

        let found = client.find_version_by_name("POR", "3.36.0").await.unwrap().unwrap();
        assert_eq!(found.id, "14206");
        assert_eq!(found.name, "3.36.0");

        assert!(client
            .find_version_by_name("POR", "i_do_not_exist")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_get_resolutions_is_cached() {
        let (client, transport) = client();
        let response = r#"[{"self":"https://test.atlassian.net/rest/api/2/resolution/1","id":"1","description":"A fix for this issue is checked into the tree and tested.","name":"Fixed"},{"self":"https://test.atlassian.net/rest/api/2/resolution/10000","id":"10000","description":"This issue won't be actioned.","name":"Won't Do"}]"#;
        transport.expect(Method::Get, "/rest/api/2/resolution", Value::Null, response);

        let resolutions = client.get_resolutions().await.unwrap();
        assert_eq!(resolutions.len(), 2);
        assert_eq!(resolutions["1"].name, "Fixed");
        assert_eq!(resolutions["10000"].name, "Won't Do");
        assert_eq!(
            resolutions["10000"].self_url.as_deref(),
            Some("https://test.atlassian.net/rest/api/2/resolution/10000")
        );

        let again = client.get_resolutions().await.unwrap();
        assert_eq!(again, resolutions);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_set_endpoint_clears_caches() {
        let transport = Arc::new(MockTransport::default());
        transport.expect(Method::Get, "/rest/api/2/status", Value::Null, r#"[{"id":"1","name":"Open"}]"#);
        let mut client = JiraClient::with_transport(
            "http://jira.company.com/",
            Credential::Anonymous,
            transport.clone(),
        );
        assert_eq!(client.endpoint(), ENDPOINT);

        client.get_statuses().await.unwrap();
        client.set_endpoint("http://jira.company.com/");
        client.get_statuses().await.unwrap();
        assert_eq!(transport.calls().len(), 1);

        client.set_endpoint("http://other.company.com");
        assert_eq!(client.endpoint(), "http://other.company.com");
        assert!(client.statuses.read().await.is_none());
    }

    #[tokio::test]
    async fn test_search_sends_paging_parameters() {
        let (client, transport) = client();
        transport.expect(
            Method::Get,
            "/rest/api/2/search",
            json!({"jql": "test jql", "startAt": 5, "maxResults": 5, "fields": "description"}),
            r#"{"startAt":5,"maxResults":5,"total":7,"issues":[{"key":"PRJ-1"},{"key":"PRJ-2"}]}"#,
        );

        let fields = FieldSelector::from("description");
        let page = client.search("test jql", 5, 5, Some(&fields)).await.unwrap();

        assert_eq!(page.total(), 7);
        assert_eq!(page.issues_count(), 2);
    }

    #[tokio::test]
    async fn test_search_without_field_selector() {
        let (client, transport) = client();
        transport.expect(
            Method::Get,
            "/rest/api/2/search",
            json!({"jql": "test jql", "startAt": 0, "maxResults": 50, "fields": null}),
            r#"{"total":0,"issues":[]}"#,
        );

        let page = client.search("test jql", 0, 50, None).await.unwrap();
        assert_eq!(page.total(), 0);
    }

    #[tokio::test]
    async fn test_create_issue_body() {
        let (client, transport) = client();
        transport.expect(
            Method::Post,
            "/rest/api/2/issue/",
            json!({"fields": {
                "project": {"key": "PRJ"},
                "summary": "Broken walker",
                "issuetype": {"id": "1"},
                "labels": ["paging"],
            }}),
            r#"{"id":"10000","key":"PRJ-24","self":"http://jira.company.com/rest/api/2/issue/10000"}"#,
        );

        let created = client
            .create_issue("PRJ", "Broken walker", "1", json!({"labels": ["paging"]}))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(created.get_result()["key"], "PRJ-24");
    }

    #[tokio::test]
    async fn test_add_comment_wraps_plain_string() {
        let (client, transport) = client();
        transport.expect(
            Method::Post,
            "/rest/api/2/issue/PRJ-1/comment",
            json!({"body": "looks good"}),
            r#"{"id":"1"}"#,
        );

        assert!(client
            .add_comment("PRJ-1", json!("looks good"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_close_issue_uses_close_transition() {
        let (client, transport) = client();
        transport.expect(
            Method::Get,
            "/rest/api/2/issue/PRJ-1/transitions",
            Value::Null,
            r#"{"transitions":[{"id":"11","name":"Start Progress"},{"id":"2","name":"Close Issue"}]}"#,
        );
        transport.expect(
            Method::Post,
            "/rest/api/2/issue/PRJ-1/transitions",
            json!({"transition": {"id": "2"}}),
            "",
        );

        client.close_issue("PRJ-1").await.unwrap();
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_close_issue_without_transition() {
        let (client, transport) = client();
        transport.expect(
            Method::Get,
            "/rest/api/2/issue/PRJ-1/transitions",
            Value::Null,
            r#"{"transitions":[{"id":"11","name":"Start Progress"}]}"#,
        );

        assert!(client.close_issue("PRJ-1").await.unwrap().is_none());
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_get_issue_types_rejects_unknown_keys() {
        let (client, transport) = client();
        transport.expect(
            Method::Get,
            "/rest/api/2/issuetype",
            Value::Null,
            r#"[{"id":"1","name":"Bug","subtask":false},{"id":"2","name":"Task","colour":"blue"}]"#,
        );

        let err = client.get_issue_types().await.unwrap_err();
        assert!(err.to_string().contains("\"colour\""));
    }

    #[tokio::test]
    async fn test_get_create_meta_query() {
        let (client, transport) = client();
        transport.expect(
            Method::Get,
            "/rest/api/2/issue/createmeta",
            json!({"projectKeys": "PRJ", "issuetypeNames": "Bug,Task"}),
            r#"{"projects":[]}"#,
        );

        let meta = client
            .get_create_meta(&CreateMetaQuery {
                project_keys: Some(vec!["PRJ".to_string()]),
                issue_type_names: Some(vec!["Bug".to_string(), "Task".to_string()]),
                ..CreateMetaQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(meta, json!({"projects": []}));
    }

    #[tokio::test]
    async fn test_set_watchers_posts_each_watcher() {
        let (client, transport) = client();
        transport.expect(Method::Post, "/rest/api/2/issue/PRJ-1/watchers", json!("alice"), "");
        transport.expect(Method::Post, "/rest/api/2/issue/PRJ-1/watchers", json!("bob"), "");

        let results = client.set_watchers("PRJ-1", &["alice", "bob"]).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_create_remote_link_payload() {
        let (client, transport) = client();
        transport.expect(
            Method::Post,
            "/rest/api/2/issue/PRJ-1/remotelink",
            json!({
                "globalid": "system=http://www.mycompany.com/support&id=1",
                "relationship": "causes",
                "object": {"url": "http://www.mycompany.com/support?id=1", "title": "TSTSUPPORT-1"},
            }),
            r#"{"id":10000}"#,
        );

        let link = client
            .create_remote_link(
                "PRJ-1",
                json!({"url": "http://www.mycompany.com/support?id=1", "title": "TSTSUPPORT-1"}),
                Some("causes"),
                Some("system=http://www.mycompany.com/support&id=1"),
                None,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(link.get_result()["id"], 10000);
    }

    #[tokio::test]
    async fn test_get_issue_with_expand() {
        let (client, transport) = client();
        transport.expect(
            Method::Get,
            "/rest/api/2/issue/PRJ-1",
            json!({"expand": "changelog"}),
            r#"{"id":"10001","key":"PRJ-1","fields":{"summary":"Walker"},"changelog":{"total":0}}"#,
        );

        let issue = client.get_issue("PRJ-1", "changelog").await.unwrap();
        assert_eq!(issue.key, "PRJ-1");
        assert!(issue.expanded_information.contains_key("changelog"));
    }

    #[tokio::test]
    async fn test_get_issue_not_found_message() {
        let (client, transport) = client();
        transport.expect_status(Method::Get, "/rest/api/2/issue/PRJ-404", Value::Null, 404);

        let err = client.get_issue("PRJ-404", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Resource not found: Issue 'PRJ-404' not found");
    }

    #[tokio::test]
    async fn test_empty_body_on_get_is_unexpected() {
        let (client, transport) = client();
        transport.expect(Method::Get, "/rest/api/2/project", Value::Null, "");

        let err = client.get_projects().await.unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedResponse));
    }
}

//! Paging walker over JQL search results.
//!
//! A [`Walker`] runs a JQL query page by page and hands out the matching
//! issues one at a time. Pages are fetched lazily: a search request is only
//! sent when the buffered page is used up and the last reported total says
//! more issues exist.
//!
//! Failures are split by [`Severity`](crate::api::Severity): authorization
//! errors are returned to the caller, any other failed search is logged,
//! remembered in [`Walker::last_error`], and ends the walk.
//!
//! ```no_run
//! use jira_rest_client::api::{Credential, JiraClient};
//! use jira_rest_client::issues::Walker;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = JiraClient::new(
//!     "https://your-jira-project.net",
//!     Credential::basic("yourname", "password"),
//! )?;
//!
//! let mut walker = Walker::new(&client);
//! walker.push("project = PRJ AND updated > -1d ORDER BY priority DESC", Some("*navigable".into()));
//!
//! println!("{} issues", walker.count().await?);
//! while let Some(issue) = walker.next().await {
//!     println!("{}", issue?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The transform passed to [`Walker::map`] must be callable; anything else is
//! rejected at compile time:
//!
//! ```compile_fail
//! use jira_rest_client::api::{Credential, JiraClient};
//! use jira_rest_client::issues::Walker;
//!
//! let client = JiraClient::new("https://jira.example.com", Credential::Anonymous).unwrap();
//! let walker = Walker::new(&client).map("not a callable");
//! ```

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::api::{ApiError, FieldSelector, Issue, SearchResult};

/// Issues requested per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// The search capability a [`Walker`] pages through.
#[async_trait]
pub trait IssueSearch: Send + Sync {
    /// Run `jql` and return the page starting at `start_at`.
    async fn search(
        &self,
        jql: &str,
        start_at: u32,
        max_results: u32,
        fields: Option<&FieldSelector>,
    ) -> Result<SearchResult, ApiError>;
}

/// Errors returned by a [`Walker`].
#[derive(Debug, Error)]
pub enum WalkError {
    /// The walker was driven before a query was pushed.
    #[error("you have to call Walker::push(jql, fields) first")]
    QueryNotConfigured,

    /// The walker was built with an unusable argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A fatal (authorization) failure from the search.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The JQL query a walker runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub jql: String,
    /// Fields to return; `None` leaves the choice to the server.
    pub fields: Option<FieldSelector>,
}

/// One buffered search page.
#[derive(Debug)]
struct Page {
    issues: Vec<Issue>,
    /// Index of the next issue to hand out.
    offset: usize,
    /// Pages fetched so far, this one included (1-based).
    number: u32,
    /// Total reported by this page's response.
    total: u32,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    NotFetched,
    InPage(Page),
    /// A search failed or returned an empty page early. Nothing more is fetched
    /// until [`Walker::restart`], except that [`Walker::count`] retries a first
    /// page that failed fatally.
    Exhausted {
        total: Option<u32>,
        key: u32,
        fatal: bool,
    },
}

fn identity(issue: Issue) -> Issue {
    issue
}

/// Lazily paging cursor over the results of a JQL query.
///
/// `F` maps every issue before it is handed out; see [`Walker::map`].
pub struct Walker<'a, S: ?Sized, F = fn(Issue) -> Issue> {
    api: &'a S,
    page_size: u32,
    query: Option<Query>,
    state: State,
    last_error: Option<ApiError>,
    transform: F,
}

impl<'a, S: IssueSearch + ?Sized> Walker<'a, S> {
    /// Create a walker fetching [`DEFAULT_PAGE_SIZE`] issues per request.
    pub fn new(api: &'a S) -> Self {
        Self {
            api,
            page_size: DEFAULT_PAGE_SIZE,
            query: None,
            state: State::NotFetched,
            last_error: None,
            transform: identity,
        }
    }

    /// Create a walker with a custom page size.
    ///
    /// # Errors
    ///
    /// [`WalkError::InvalidArgument`] if `page_size` is 0.
    pub fn with_page_size(api: &'a S, page_size: u32) -> Result<Self, WalkError> {
        if page_size == 0 {
            return Err(WalkError::InvalidArgument(
                "page size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            page_size,
            ..Self::new(api)
        })
    }
}

impl<'a, S, F, T> Walker<'a, S, F>
where
    S: IssueSearch + ?Sized,
    F: FnMut(Issue) -> T,
{
    /// Map every issue through `transform` before it is handed out.
    ///
    /// Replaces any previously set transform.
    pub fn map<G, U>(self, transform: G) -> Walker<'a, S, G>
    where
        G: FnMut(Issue) -> U,
    {
        Walker {
            api: self.api,
            page_size: self.page_size,
            query: self.query,
            state: self.state,
            last_error: self.last_error,
            transform,
        }
    }

    /// Set the query to run.
    ///
    /// Does not send a request and does not reset the walk; call
    /// [`Walker::restart`] to run a new query from the start.
    pub fn push(&mut self, jql: impl Into<String>, fields: Option<FieldSelector>) {
        self.query = Some(Query {
            jql: jql.into(),
            fields,
        });
    }

    /// The configured query, if any.
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The last non-fatal search error, if one ended the walk.
    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    /// Forget all fetched pages so the next advance starts from the first issue.
    ///
    /// The query, page size and transform are kept.
    pub fn restart(&mut self) {
        self.state = State::NotFetched;
        self.last_error = None;
    }

    /// Absolute index of the next issue across all pages.
    ///
    /// This is also the `startAt` of the next search request.
    pub fn key(&self) -> u32 {
        match &self.state {
            State::NotFetched => 0,
            State::InPage(page) => page.offset as u32 + (page.number - 1) * self.page_size,
            State::Exhausted { key, .. } => *key,
        }
    }

    /// Total reported by the last successful search.
    fn total(&self) -> Option<u32> {
        match &self.state {
            State::NotFetched => None,
            State::InPage(page) => Some(page.total),
            State::Exhausted { total, .. } => *total,
        }
    }

    /// Check whether another issue is available, fetching the next page if needed.
    ///
    /// # Errors
    ///
    /// * [`WalkError::QueryNotConfigured`] if [`Walker::push`] was never called
    /// * [`WalkError::Api`] if a search failed with an authorization error
    pub async fn has_next(&mut self) -> Result<bool, WalkError> {
        if self.query.is_none() {
            return Err(WalkError::QueryNotConfigured);
        }

        let key = self.key();

        match &self.state {
            State::NotFetched => self.fetch(0).await,
            State::InPage(page) if page.offset >= page.issues.len() && key < page.total => {
                self.fetch(key).await
            }
            State::InPage(page) => Ok(key < page.total),
            State::Exhausted { .. } => Ok(false),
        }
    }

    /// Advance to the next issue.
    ///
    /// Returns `None` when the walk is over. After an error the walker yields
    /// nothing more until [`Walker::restart`].
    pub async fn next(&mut self) -> Option<Result<T, WalkError>> {
        match self.has_next().await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => return Some(Err(e)),
        }

        let State::InPage(page) = &mut self.state else {
            return None;
        };
        let issue = std::mem::take(page.issues.get_mut(page.offset)?);
        page.offset += 1;

        Some(Ok((self.transform)(issue)))
    }

    /// Total number of matching issues.
    ///
    /// Fetches the first page if nothing was fetched yet. A walk that ended on
    /// a non-fatal error before any page arrived counts 0. If the first page
    /// failed with an authorization error it is requested again, so the error
    /// is returned on every call instead of a count of 0.
    pub async fn count(&mut self) -> Result<u32, WalkError> {
        if let State::Exhausted {
            total: None,
            fatal: true,
            ..
        } = self.state
        {
            self.state = State::NotFetched;
        }

        if self.total().is_none() {
            self.has_next().await?;
        }

        Ok(self.total().unwrap_or(0))
    }

    /// Turn the walker into a stream of issues.
    ///
    /// The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, WalkError>> + 'a
    where
        F: 'a,
        T: 'a,
    {
        futures::stream::unfold(Some(self), |walker| async move {
            let mut walker = walker?;
            match walker.next().await? {
                Ok(item) => Some((Ok(item), Some(walker))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Fetch the page starting at `start_at` and make it current.
    async fn fetch(&mut self, start_at: u32) -> Result<bool, WalkError> {
        let Some(query) = &self.query else {
            return Err(WalkError::QueryNotConfigured);
        };

        let (number, known_total) = match &self.state {
            State::InPage(page) => (page.number + 1, Some(page.total)),
            _ => (1, None),
        };

        debug!(jql = %query.jql, start_at, page = number, "Fetching search page");

        let result = self
            .api
            .search(&query.jql, start_at, self.page_size, query.fields.as_ref())
            .await;

        match result {
            Ok(result) => {
                let total = result.total();
                let issues = result.into_issues();

                if issues.is_empty() && start_at < total {
                    warn!(start_at, total, "Search returned an empty page, ending walk");
                    self.state = State::Exhausted {
                        total: Some(total),
                        key: start_at,
                        fatal: false,
                    };
                    return Ok(false);
                }

                self.state = State::InPage(Page {
                    issues,
                    offset: 0,
                    number,
                    total,
                });
                Ok(start_at < total)
            }
            Err(e) if e.is_fatal() => {
                self.state = State::Exhausted {
                    total: known_total,
                    key: start_at,
                    fatal: true,
                };
                Err(WalkError::Api(e))
            }
            Err(e) => {
                error!(jql = %query.jql, start_at, "Issue search failed: {}", e);
                self.state = State::Exhausted {
                    total: known_total,
                    key: start_at,
                    fatal: false,
                };
                self.last_error = Some(e);
                Ok(false)
            }
        }
    }
}

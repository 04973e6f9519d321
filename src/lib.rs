//! A JIRA REST API client.
//!
//! [`api::JiraClient`] covers the `rest/api/2` endpoints for issues,
//! projects, versions and metadata. [`issues::Walker`] runs a JQL search and
//! pages through the results for you:
//!
//! ```no_run
//! use jira_rest_client::api::{Credential, JiraClient};
//! use jira_rest_client::issues::Walker;
//!
//! # async fn run() -> jira_rest_client::Result<()> {
//! let client = JiraClient::new("https://your-jira-project.net", Credential::basic("yourname", "password"))?;
//!
//! let mut walker = Walker::with_page_size(&client, 100)?.map(|issue| issue.key);
//! walker.push("project = PRJ ORDER BY key", None);
//!
//! while let Some(key) = walker.next().await {
//!     println!("{}", key?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Connection profiles can be kept in a config file, see [`config::Config`].

pub mod api;
pub mod config;
pub mod error;
pub mod issues;
pub mod logging;

pub use error::{Error, Result};

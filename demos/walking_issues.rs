//! Walk every issue matching a JQL query.
//!
//! The walker pages through the search results on its own; the loop below
//! never deals with `startAt` or `maxResults`.
//!
//! ```sh
//! JIRA_URL=https://your-jira-project.net JIRA_USER=yourname JIRA_TOKEN=password \
//!     cargo run --example walking_issues -- "project = PRJ AND updated > -1d ORDER BY priority DESC"
//! ```

mod common;

use jira_rest_client::issues::Walker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jira_rest_client::logging::init_stderr()?;

    let jql = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "updated > -1d ORDER BY priority DESC".to_string());

    let client = common::api_client().map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let mut walker = Walker::with_page_size(&client, common::page_size())?;
    walker.push(jql, Some("*navigable".into()));

    println!("{} issues", walker.count().await?);

    while let Some(issue) = walker.next().await {
        println!("{}", issue?);
    }

    if let Some(e) = walker.last_error() {
        eprintln!("walk stopped early: {}", e);
    }

    Ok(())
}

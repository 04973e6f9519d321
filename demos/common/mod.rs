use jira_rest_client::api::{Credential, JiraClient};
use jira_rest_client::config::Config;

/// Build a client from `JIRA_URL`, `JIRA_USER` and `JIRA_TOKEN`, falling back
/// to the default profile of the config file.
pub fn api_client() -> jira_rest_client::Result<JiraClient> {
    if let Ok(url) = std::env::var("JIRA_URL") {
        let credential = match (std::env::var("JIRA_USER"), std::env::var("JIRA_TOKEN")) {
            (Ok(user), Ok(token)) => Credential::basic(&user, &token),
            _ => Credential::Anonymous,
        };
        return Ok(JiraClient::new(&url, credential)?);
    }

    let config = Config::load()?;
    let profile = config.default_profile()?;
    Ok(JiraClient::from_profile(profile, &config.settings)?)
}

/// Page size from the config file, or the walker default.
#[allow(dead_code)]
pub fn page_size() -> u32 {
    Config::load()
        .map(|config| config.settings.page_size)
        .unwrap_or(jira_rest_client::issues::DEFAULT_PAGE_SIZE)
}

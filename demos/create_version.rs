//! Create a version in a project.
//!
//! Available options: `description`, `userReleaseDate` and `releaseDate`
//! (YYYY-MM-DD), `released` and `archived` (booleans). The server rejects
//! unknown options and versions that already exist.
//!
//! ```sh
//! cargo run --example create_version -- PRJ 0.3.1
//! ```

mod common;

use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jira_rest_client::logging::init_stderr()?;

    let mut args = std::env::args().skip(1);
    let (Some(project), Some(version)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: create_version <PROJECT> <VERSION>");
    };

    let client = common::api_client().map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if let Some(existing) = client.find_version_by_name(&project, &version).await? {
        println!("version {} already exists (id {})", existing.name, existing.id);
        return Ok(());
    }

    client
        .create_version(&project, &version, json!({ "description": "created from the demo" }))
        .await?;
    println!("created version {} in {}", version, project);

    Ok(())
}

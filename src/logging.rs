//! Logging setup for applications using the client.
//!
//! The library itself only emits `tracing` events. Binaries that want them
//! written somewhere can call [`init`], which logs to a daily rotating file.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "jira_rest_client=info,warn";

const LOG_FILE_PREFIX: &str = "jira-rest-client.log";

/// Install a global subscriber writing to the log directory.
///
/// Logs go to `<data_local_dir>/jira-rest-client/logs/`, rotated daily.
/// The level is taken from `RUST_LOG`, e.g. `RUST_LOG=jira_rest_client=debug`
/// to see every search page fetched by a walker.
///
/// # Errors
///
/// Fails if the log directory cannot be determined or created, or if a
/// global subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use jira_rest_client::logging;
///
/// logging::init().expect("Failed to initialize logging");
/// ```
pub fn init() -> anyhow::Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %log_dir.display(),
        "Logging initialized"
    );

    Ok(())
}

/// Install a global subscriber printing to stderr.
///
/// Meant for short-lived tools and demos.
pub fn init_stderr() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()?;

    Ok(())
}

fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("jira-rest-client").join("logs"))
}

/// Where [`init`] writes its log files.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_has_expected_structure() {
        let dir = get_log_directory().unwrap();
        assert!(dir.ends_with("jira-rest-client/logs"));
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}

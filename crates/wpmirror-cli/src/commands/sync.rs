use wpmirror_core::source::PostSource;
use wpmirror_core::storage::SnapshotStore;
use wpmirror_core::SyncRunner;

use crate::commands::common::{build_source, build_store, format_report_lines, load_config};
use crate::error::CliError;

pub async fn run_sync(as_json: bool, strict: bool) -> Result<(), CliError> {
    let config = load_config()?;
    let runner = SyncRunner::new(build_source(&config)?, build_store(&config));
    sync_once(&runner, as_json, strict).await
}

pub async fn sync_once<S, B>(
    runner: &SyncRunner<S, B>,
    as_json: bool,
    strict: bool,
) -> Result<(), CliError>
where
    S: PostSource,
    B: SnapshotStore,
{
    let report = runner.run_cycle().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_report_lines(&report) {
            println!("{line}");
        }
    }

    if strict && report.has_failures() {
        return Err(CliError::ItemFailures(report.failed()));
    }
    Ok(())
}

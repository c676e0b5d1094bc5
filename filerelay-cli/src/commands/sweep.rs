//! `sweep` - run one retention pass immediately.

use std::time::Duration;

use filerelay::config::format_size;
use filerelay::retention::{RetentionSweeper, SweepReport};
use filerelay::storage::Storage;

use crate::error::CliError;
use crate::runner::CliRunner;

pub fn run(runner: &CliRunner, older_than_secs: Option<u64>) -> Result<(), CliError> {
    let config = runner.config();
    let window = older_than_secs
        .map(Duration::from_secs)
        .unwrap_or(config.retention_window);

    let sweeper = RetentionSweeper::new(Storage::new(&config.storage_root), window);
    let report = sweeper.sweep()?;

    println!("{}", summary(&report, window));
    Ok(())
}

fn summary(report: &SweepReport, window: Duration) -> String {
    let mut text = format!(
        "Removed {} file(s) older than {}s across {} namespace(s), freed {}",
        report.files_deleted,
        window.as_secs(),
        report.namespaces,
        format_size(report.bytes_freed)
    );
    if report.failures > 0 {
        text.push_str(&format!(" ({} failure(s), see log)", report.failures));
    }
    text
}

use std::path::Path;

use crate::backup::BackupReport;
use crate::error::{DownloadError, LookupError};
use crate::project::Project;

/// `Downloading backup for <url> to <path>`
pub fn download_message(project: &Project, path: &Path) -> String {
    format!(
        "Downloading backup for {} to {}",
        project.display_url(),
        path.display()
    )
}

/// Callbacks for observing a backup run.
pub trait BackupProgress: Send + Sync {
    /// Called once enumeration finished, with the deduplicated project list.
    fn on_enumerated(&self, _projects: &[Project]) {}

    fn on_lookup_failed(&self, _error: &LookupError) {}

    /// Called when the archive is ready and about to be written to `path`.
    fn on_download_start(&self, project: &Project, path: &Path);

    fn on_download_complete(&self, _project: &Project, _path: &Path, _bytes: u64) {}

    fn on_download_failed(&self, _error: &DownloadError) {}

    fn on_complete(&self, _report: &BackupReport) {}
}

/// No-op progress reporter for when progress isn't needed.
pub struct NoopProgress;

impl BackupProgress for NoopProgress {
    fn on_download_start(&self, _project: &Project, _path: &Path) {}
}

/// Prints one line per download to stdout.
pub struct ConsoleProgress;

impl BackupProgress for ConsoleProgress {
    fn on_enumerated(&self, projects: &[Project]) {
        println!("Found {} projects", projects.len());
    }

    fn on_download_start(&self, project: &Project, path: &Path) {
        println!("{}", download_message(project, path));
    }

    fn on_complete(&self, report: &BackupReport) {
        println!();
        println!("Backup completed:");
        println!("  Archives: {}", report.artifacts.len());
        println!("  Bytes:    {:.2} MB", report.bytes_written as f64 / 1_000_000.0);
        println!("  Failures: {}", report.failure_count());
    }
}

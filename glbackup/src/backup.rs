//! One complete backup pass: enumerate, then download each project in turn.

use std::path::PathBuf;
use tracing::{info, warn};

use crate::api::GitlabApi;
use crate::config::Config;
use crate::download::Downloader;
use crate::enumerate::enumerate_projects;
use crate::error::{DownloadError, LookupError};
use crate::progress::BackupProgress;

/// Outcome of a backup pass.
#[derive(Debug, Default)]
pub struct BackupReport {
    /// Artifacts written during this run, in download order.
    pub artifacts: Vec<PathBuf>,
    pub bytes_written: u64,
    pub lookup_failures: Vec<LookupError>,
    pub download_failures: Vec<DownloadError>,
}

impl BackupReport {
    pub fn failure_count(&self) -> usize {
        self.lookup_failures.len() + self.download_failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }
}

pub async fn run_backup(
    api: &dyn GitlabApi,
    config: &Config,
    progress: &dyn BackupProgress,
) -> BackupReport {
    let enumeration = enumerate_projects(api, config).await;
    for failure in &enumeration.failures {
        progress.on_lookup_failed(failure);
    }
    progress.on_enumerated(&enumeration.projects);
    info!("Backing up {} projects", enumeration.projects.len());

    let mut report = BackupReport {
        lookup_failures: enumeration.failures,
        ..Default::default()
    };

    let downloader = Downloader::new(api, config);
    for project in &enumeration.projects {
        match downloader.backup(project, progress).await {
            Ok((path, bytes)) => {
                progress.on_download_complete(project, &path, bytes);
                report.bytes_written += bytes;
                report.artifacts.push(path);
            }
            Err(error) => {
                warn!("{}", error);
                progress.on_download_failed(&error);
                report.download_failures.push(error);
            }
        }
    }

    progress.on_complete(&report);
    report
}

//! Export a project on the server and persist the archive.
//!
//! Archives are streamed into a temporary file next to the destination and
//! renamed into place only once fully written, so an artifact at its final
//! path is always complete.

use chrono::{DateTime, Local};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::api::{ByteStream, ExportStatus, GitlabApi};
use crate::config::{Config, ExportPolicy};
use crate::error::{DownloadError, DownloadFailure};
use crate::progress::{download_message, BackupProgress};
use crate::project::Project;

pub const ARCHIVE_EXTENSION: &str = "tar.gz";
pub const TIMESTAMP_FORMAT: &str = "%d-%b-%Y-%H-%M-%S";

/// Artifact file name for a given time, e.g. `16-Oct-2026-09-30-05.tar.gz`.
pub fn artifact_name(at: &DateTime<Local>) -> String {
    format!("{}.{}", at.format(TIMESTAMP_FORMAT), ARCHIVE_EXTENSION)
}

pub fn artifact_path(backup_dir: &Path, project: &Project, at: &DateTime<Local>) -> PathBuf {
    project.backup_dir(backup_dir).join(artifact_name(at))
}

pub struct Downloader<'a> {
    api: &'a dyn GitlabApi,
    backup_dir: &'a Path,
    policy: ExportPolicy,
}

impl<'a> Downloader<'a> {
    pub fn new(api: &'a dyn GitlabApi, config: &'a Config) -> Self {
        Self {
            api,
            backup_dir: &config.backup_dir,
            policy: config.export,
        }
    }

    /// Export, wait, and download one project. Returns the artifact path.
    pub async fn backup(
        &self,
        project: &Project,
        progress: &dyn BackupProgress,
    ) -> Result<(PathBuf, u64), DownloadError> {
        self.try_backup(project, progress)
            .await
            .map_err(|reason| DownloadError {
                project: project.path_with_namespace.clone(),
                reason,
            })
    }

    async fn try_backup(
        &self,
        project: &Project,
        progress: &dyn BackupProgress,
    ) -> Result<(PathBuf, u64), DownloadFailure> {
        debug!("Triggering export for {}", project.path_with_namespace);
        self.api.start_export(project.id).await?;
        self.wait_for_export(project).await?;

        let dest = artifact_path(self.backup_dir, project, &Local::now());
        let stream = self.api.download_export(project.id).await?;

        debug!("{}", download_message(project, &dest));
        progress.on_download_start(project, &dest);

        let written = write_archive(stream, &dest).await?;
        Ok((dest, written))
    }

    /// Poll the export status until finished, failed, or the policy timeout.
    async fn wait_for_export(&self, project: &Project) -> Result<(), DownloadFailure> {
        let deadline = Instant::now() + self.policy.timeout;
        loop {
            match self.api.export_status(project.id).await? {
                ExportStatus::Finished => return Ok(()),
                ExportStatus::Failed => return Err(DownloadFailure::ExportFailed),
                status => debug!(
                    "Export of {} is {:?}, waiting",
                    project.path_with_namespace, status
                ),
            }
            if Instant::now() + self.policy.poll_interval > deadline {
                return Err(DownloadFailure::Timeout(self.policy.timeout));
            }
            sleep(self.policy.poll_interval).await;
        }
    }
}

/// Stream `body` into `dest` atomically. Returns the number of bytes written.
///
/// On any error the temporary file is removed and `dest` is left untouched.
/// An existing file at `dest` is never replaced.
pub async fn write_archive(mut body: ByteStream, dest: &Path) -> Result<u64, DownloadFailure> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir).await?;

    let temp = tempfile::Builder::new()
        .prefix(".glbackup-")
        .suffix(".part")
        .tempfile_in(dir)?;
    let mut file = tokio::fs::File::from_std(temp.reopen()?);

    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    if written == 0 {
        return Err(DownloadFailure::EmptyArchive);
    }

    // An archive already at `dest` (same project, same second) is kept.
    temp.persist_noclobber(dest).map_err(|e| e.error)?;
    debug!("Wrote {} bytes to {}", written, dest.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_artifact_name_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 42).unwrap();
        assert_eq!(artifact_name(&at), "07-Mar-2024-09-05-42.tar.gz");
    }

    #[test]
    fn test_artifact_path_layout() {
        let at = Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap();
        let project = Project {
            id: 7,
            name: "site".into(),
            path_with_namespace: "alice/site".into(),
            web_url: String::new(),
        };
        assert_eq!(
            artifact_path(Path::new("/b"), &project, &at),
            PathBuf::from("/b/alice/site/31-Dec-2024-23-59-00.tar.gz")
        );
    }
}

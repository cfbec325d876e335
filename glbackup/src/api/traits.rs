use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::Deserialize;
use std::pin::Pin;

use crate::error::Result;
use crate::project::Project;

/// Archive body, delivered in chunks as the server sends it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// `export_status` reported by `GET /projects/:id/export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    None,
    Queued,
    Started,
    Finished,
    RegenerationInProgress,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Operations the backup pipeline needs from a GitLab server.
#[async_trait]
pub trait GitlabApi: Send + Sync {
    /// All projects owned by a user, every page.
    async fn user_projects(&self, username: &str) -> Result<Vec<Project>>;

    /// All projects of a group including subgroups, every page.
    async fn group_projects(&self, group: &str) -> Result<Vec<Project>>;

    /// Ask the server to start generating an export archive.
    async fn start_export(&self, project_id: u64) -> Result<()>;

    async fn export_status(&self, project_id: u64) -> Result<ExportStatus>;

    /// Stream the finished export archive.
    async fn download_export(&self, project_id: u64) -> Result<ByteStream>;
}

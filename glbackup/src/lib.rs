//! glbackup: back up GitLab projects as export archives
//!
//! Pipeline:
//! - [`config`] loads the INI configuration
//! - [`enumerate`] lists projects of configured users and groups
//! - [`download`] exports each project and writes a timestamped archive

pub mod api;
pub mod backup;
pub mod config;
pub mod download;
pub mod enumerate;
pub mod error;
pub mod progress;
pub mod project;

pub use api::{GitlabApi, GitlabClient};
pub use backup::{run_backup, BackupReport};
pub use config::{Config, ExportPolicy, SectionConfig};
pub use enumerate::{enumerate_projects, Enumeration};
pub use error::{ApiError, ConfigError, DownloadError, DownloadFailure, LookupError, OwnerKind};
pub use progress::{BackupProgress, ConsoleProgress, NoopProgress};
pub use project::Project;

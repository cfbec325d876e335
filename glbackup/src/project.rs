use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// A project as returned by the GitLab projects API.
///
/// Only the fields needed to name and fetch a backup are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    /// e.g. `team-x/platform/site`
    pub path_with_namespace: String,
    #[serde(default)]
    pub web_url: String,
}

impl Project {
    /// Directory holding this project's artifacts: `backup_dir/<namespace>/<project>`.
    ///
    /// Only normal path components of `path_with_namespace` are used, so a
    /// hostile server cannot point the artifact outside `backup_dir`.
    pub fn backup_dir(&self, backup_dir: &Path) -> PathBuf {
        let mut dir = backup_dir.to_path_buf();
        for part in self.path_with_namespace.split('/') {
            let mut components = Path::new(part).components();
            if let (Some(Component::Normal(c)), None) = (components.next(), components.next()) {
                dir.push(c);
            }
        }
        dir
    }

    /// URL for log lines; falls back to the namespaced path.
    pub fn display_url(&self) -> &str {
        if self.web_url.is_empty() {
            &self.path_with_namespace
        } else {
            &self.web_url
        }
    }
}

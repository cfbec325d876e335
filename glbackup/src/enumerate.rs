//! Project enumeration across configured users and groups.

use std::collections::HashSet;
use tracing::{info, warn};

use crate::api::GitlabApi;
use crate::config::Config;
use crate::error::{LookupError, OwnerKind};
use crate::project::Project;

#[derive(Debug, Default)]
pub struct Enumeration {
    /// Deduplicated by project id, in first-seen order.
    pub projects: Vec<Project>,
    /// One entry per user or group that could not be listed.
    pub failures: Vec<LookupError>,
}

impl Enumeration {
    fn absorb(&mut self, seen: &mut HashSet<u64>, projects: Vec<Project>) {
        for project in projects {
            if seen.insert(project.id) {
                self.projects.push(project);
            }
        }
    }
}

/// List every project of the configured users (first) and groups.
///
/// A user or group that fails to resolve is logged and skipped.
pub async fn enumerate_projects(api: &dyn GitlabApi, config: &Config) -> Enumeration {
    let mut result = Enumeration::default();
    let mut seen = HashSet::new();

    if config.has_no_owners() {
        warn!("No users or groups configured, nothing to back up");
        return result;
    }

    let owners = config
        .users
        .iter()
        .map(|u| (OwnerKind::User, u))
        .chain(config.groups.iter().map(|g| (OwnerKind::Group, g)));

    for (kind, name) in owners {
        let listed = match kind {
            OwnerKind::User => api.user_projects(name).await,
            OwnerKind::Group => api.group_projects(name).await,
        };
        match listed {
            Ok(projects) => {
                info!("Found {} projects for {} '{}'", projects.len(), kind, name);
                result.absorb(&mut seen, projects);
            }
            Err(source) => {
                let error = LookupError {
                    kind,
                    name: name.clone(),
                    source,
                };
                warn!("{}", error);
                result.failures.push(error);
            }
        }
    }

    result
}

use chrono::Local;
use glbackup::download::artifact_path;
use glbackup::{enumerate_projects, Config, GitlabApi};

/// Print the projects a backup would cover and where each archive would go.
///
/// Returns the number of users and groups that could not be listed.
pub async fn run_list(api: &dyn GitlabApi, config: &Config) -> usize {
    let enumeration = enumerate_projects(api, config).await;
    let now = Local::now();

    for project in &enumeration.projects {
        println!(
            "{:>8}  {}  ->  {}",
            project.id,
            project.path_with_namespace,
            artifact_path(&config.backup_dir, project, &now).display()
        );
    }
    println!();
    println!("{} projects", enumeration.projects.len());

    for failure in &enumeration.failures {
        eprintln!("  {}", failure);
    }
    enumeration.failures.len()
}

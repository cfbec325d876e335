use glbackup::{BackupReport, Config, ConsoleProgress, GitlabApi};

/// Run a full backup pass and print a summary, including every failure.
pub async fn run_backup(api: &dyn GitlabApi, config: &Config) -> BackupReport {
    println!(
        "Backing up {} users and {} groups from {} into {}",
        config.users.len(),
        config.groups.len(),
        config.server_url,
        config.backup_dir.display()
    );
    println!();

    let report = glbackup::run_backup(api, config, &ConsoleProgress).await;

    if !report.is_clean() {
        eprintln!();
        eprintln!("Failures:");
        for failure in &report.lookup_failures {
            eprintln!("  {}", failure);
        }
        for failure in &report.download_failures {
            eprintln!("  {}", failure);
        }
    }

    report
}

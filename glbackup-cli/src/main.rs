use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use glbackup::{Config, GitlabClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "glbackup")]
#[command(about = "Download export archives of GitLab projects owned by users and groups")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.glbackup.ini)
    #[arg(short, long, env = "GLBACKUP_CONFIG")]
    config: Option<PathBuf>,

    /// Config section to read
    #[arg(long, default_value = glbackup::config::DEFAULT_SECTION, conflicts_with = "all_sections")]
    section: String,

    /// Back up every section of the config file, each into `backup_dir/<section>`
    #[arg(long)]
    all_sections: bool,

    /// Exit with status 1 if any user, group or project failed
    #[arg(long)]
    strict: bool,

    /// List the projects that would be backed up, download nothing
    #[arg(long)]
    dry_run: bool,
}

const EXIT_SUCCESS: u8 = 0;
/// Exit status when the run could not start (bad config, bad client setup).
const EXIT_SETUP_FAILED: u8 = 2;
/// Exit status in `--strict` mode when anything failed.
const EXIT_PARTIAL_FAILURE: u8 = 1;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,glbackup=info".into()),
    );
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    // Logs go to stderr; stdout carries the progress lines.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_SETUP_FAILED)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config_path = match &cli.config {
        Some(path) => glbackup::config::expand_tilde(path)?,
        None => glbackup::config::default_config_path()?,
    };
    tracing::info!("Config file: {}", config_path.display());

    if cli.all_sections {
        let sections = Config::load_all_sections(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

        let mut failures = 0;
        for section in sections {
            println!("[{}]", section.name);
            let outcome = match section.config {
                Ok(config) => run_section(&config, cli.dry_run).await,
                Err(e) => Err(e.into()),
            };
            match outcome {
                Ok(count) => failures += count,
                Err(e) => {
                    eprintln!("Skipping section {}: {:#}", section.name, e);
                    failures += 1;
                }
            }
            println!();
        }
        return Ok(exit_code(failures, cli.strict));
    }

    let config = Config::load_section(&config_path, &cli.section)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let failures = run_section(&config, cli.dry_run).await?;
    Ok(exit_code(failures, cli.strict))
}

/// Back up (or list) one config section. Returns the number of failures.
async fn run_section(config: &Config, dry_run: bool) -> Result<usize> {
    let client = GitlabClient::new(config).context("Failed to create API client")?;
    if dry_run {
        return Ok(commands::run_list(&client, config).await);
    }
    Ok(commands::run_backup(&client, config).await.failure_count())
}

/// Failures only change the exit status in `--strict` mode.
fn exit_code(failures: usize, strict: bool) -> u8 {
    if strict && failures > 0 {
        EXIT_PARTIAL_FAILURE
    } else {
        EXIT_SUCCESS
    }
}

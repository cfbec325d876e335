//! Tests for config loading

use glbackup::config::{expand_tilde, Config, DEFAULT_BACKUP_DIR};
use glbackup::ConfigError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("glbackup.ini");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_full_config() {
    let temp = tempdir().unwrap();
    let path = write_config(
        temp.path(),
        r#"
[main]
server = https://gitlab.example.com
token = glpat-abc123
user =
  alice
  bob
group =
  team-x
  team-y/platform
backup_dir = /srv/gitlab-backup
poll_interval = 5
export_timeout = 120
request_timeout = 10
per_page = 50
"#,
    );

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.server_url.as_str(), "https://gitlab.example.com/");
    assert_eq!(config.access_token, "glpat-abc123");
    assert_eq!(config.users, vec!["alice", "bob"]);
    assert_eq!(config.groups, vec!["team-x", "team-y/platform"]);
    assert_eq!(config.backup_dir, PathBuf::from("/srv/gitlab-backup"));
    assert_eq!(config.export.poll_interval, Duration::from_secs(5));
    assert_eq!(config.export.timeout, Duration::from_secs(120));
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(config.per_page, 50);
}

#[test]
fn test_defaults_for_optional_keys() {
    let temp = tempdir().unwrap();
    let path = write_config(
        temp.path(),
        "[main]\nserver = https://gitlab.com\ntoken = t\n",
    );

    let config = Config::load_from(&path).unwrap();

    assert!(config.users.is_empty());
    assert!(config.groups.is_empty());
    assert!(config.has_no_owners());
    assert_eq!(
        config.backup_dir,
        expand_tilde(Path::new(DEFAULT_BACKUP_DIR)).unwrap()
    );
    assert_eq!(config.export.poll_interval, Duration::from_secs(2));
    assert_eq!(config.export.timeout, Duration::from_secs(600));
    assert_eq!(config.per_page, 100);
}

#[test]
fn test_single_line_lists() {
    let temp = tempdir().unwrap();
    let path = write_config(
        temp.path(),
        "[main]\nserver = https://gitlab.com\ntoken = t\nuser = alice\ngroup = team-x\n",
    );

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.users, vec!["alice"]);
    assert_eq!(config.groups, vec!["team-x"]);
}

#[test]
fn test_backup_dir_tilde_expanded() {
    let temp = tempdir().unwrap();
    let path = write_config(
        temp.path(),
        "[main]\nserver = https://gitlab.com\ntoken = t\nbackup_dir = ~/backups/gitlab\n",
    );

    let config = Config::load_from(&path).unwrap();
    let home = dirs::home_dir().unwrap();
    assert_eq!(config.backup_dir, home.join("backups/gitlab"));
}

#[test]
fn test_per_page_clamped() {
    let temp = tempdir().unwrap();
    let path = write_config(
        temp.path(),
        "[main]\nserver = https://gitlab.com\ntoken = t\nper_page = 500\n",
    );
    assert_eq!(Config::load_from(&path).unwrap().per_page, 100);
}

#[test]
fn test_other_section() {
    let temp = tempdir().unwrap();
    let path = write_config(
        temp.path(),
        "[main]\nserver = https://gitlab.com\ntoken = a\n\n[work]\nserver = https://git.work.test\ntoken = b\n",
    );

    let config = Config::load_section(&path, "work").unwrap();
    assert_eq!(config.server_url.as_str(), "https://git.work.test/");
    assert_eq!(config.access_token, "b");
}

#[test]
fn test_missing_file() {
    let temp = tempdir().unwrap();
    let err = Config::load_from(&temp.path().join("nope.ini")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn test_missing_server() {
    let temp = tempdir().unwrap();
    let path = write_config(temp.path(), "[main]\ntoken = t\n");
    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey(ref k) if k == "server"));
}

#[test]
fn test_missing_token() {
    let temp = tempdir().unwrap();
    let path = write_config(temp.path(), "[main]\nserver = https://gitlab.com\n");
    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey(ref k) if k == "token"));
}

#[test]
fn test_empty_token_is_missing() {
    let temp = tempdir().unwrap();
    let path = write_config(temp.path(), "[main]\nserver = https://gitlab.com\ntoken =\n");
    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey(ref k) if k == "token"));
}

#[test]
fn test_missing_section() {
    let temp = tempdir().unwrap();
    let path = write_config(temp.path(), "[gitlab.com]\nserver = https://gitlab.com\ntoken = t\n");
    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::MissingSection(ref s) if s == "main"));
}

#[test]
fn test_invalid_values() {
    let temp = tempdir().unwrap();

    let path = write_config(temp.path(), "[main]\nserver = not a url\ntoken = t\n");
    assert!(matches!(
        Config::load_from(&path).unwrap_err(),
        ConfigError::InvalidValue { ref key, .. } if key == "server"
    ));

    let path = write_config(temp.path(), "[main]\nserver = ftp://gitlab.com\ntoken = t\n");
    assert!(matches!(
        Config::load_from(&path).unwrap_err(),
        ConfigError::InvalidValue { ref key, .. } if key == "server"
    ));

    let path = write_config(
        temp.path(),
        "[main]\nserver = https://gitlab.com\ntoken = t\npoll_interval = 0\n",
    );
    assert!(matches!(
        Config::load_from(&path).unwrap_err(),
        ConfigError::InvalidValue { ref key, .. } if key == "poll_interval"
    ));
}

#[test]
fn test_malformed_file() {
    let temp = tempdir().unwrap();
    let path = write_config(temp.path(), "[main\nserver = https://gitlab.com\n");
    assert!(matches!(
        Config::load_from(&path).unwrap_err(),
        ConfigError::Parse(_)
    ));
}

#[test]
fn test_debug_redacts_token() {
    let temp = tempdir().unwrap();
    let path = write_config(
        temp.path(),
        "[main]\nserver = https://gitlab.com\ntoken = glpat-supersecret\n",
    );
    let config = Config::load_from(&path).unwrap();
    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("supersecret"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn test_expand_tilde() {
    let home = dirs::home_dir().unwrap();

    let expanded = expand_tilde(&PathBuf::from("~/foo")).unwrap();
    assert_eq!(expanded, home.join("foo"));

    let expanded = expand_tilde(&PathBuf::from("~")).unwrap();
    assert_eq!(expanded, home);

    let expanded = expand_tilde(&PathBuf::from("/absolute/path")).unwrap();
    assert_eq!(expanded, PathBuf::from("/absolute/path"));
}

#[test]
fn test_load_all_sections_nests_backup_dirs() {
    let temp = tempdir().unwrap();
    let path = write_config(
        temp.path(),
        r#"
[DEFAULT]
backup_dir = /srv/backups

[gitlab.com]
type = gitlab
server = https://gitlab.com
token = a
user = alice

[internal]
server = not a url
token = b
group = team-x
"#,
    );

    let sections = Config::load_all_sections(&path).unwrap();
    assert_eq!(sections.len(), 2);

    assert_eq!(sections[0].name, "gitlab.com");
    let first = sections[0].config.as_ref().unwrap();
    assert_eq!(first.backup_dir, PathBuf::from("/srv/backups/gitlab.com"));
    assert_eq!(first.users, vec!["alice"]);

    assert_eq!(sections[1].name, "internal");
    assert!(matches!(
        sections[1].config,
        Err(ConfigError::InvalidValue { ref key, .. }) if key == "server"
    ));
}

#[test]
fn test_section_name_cannot_escape_backup_dir() {
    let temp = tempdir().unwrap();
    let path = write_config(
        temp.path(),
        "[../outside]\nserver = https://gitlab.com\ntoken = t\nbackup_dir = /srv/backups\n",
    );

    let sections = Config::load_all_sections(&path).unwrap();
    let config = sections[0].config.as_ref().unwrap();
    assert_eq!(config.backup_dir, PathBuf::from("/srv/backups/outside"));
}

#[test]
fn test_load_all_sections_empty_file() {
    let temp = tempdir().unwrap();
    let path = write_config(temp.path(), "# nothing here\n");
    assert!(matches!(
        Config::load_all_sections(&path).unwrap_err(),
        ConfigError::NoSections
    ));
}

#[test]
fn test_unsupported_type_rejected() {
    let temp = tempdir().unwrap();
    let path = write_config(
        temp.path(),
        "[main]\ntype = github\nserver = https://github.com\ntoken = t\n",
    );
    assert!(matches!(
        Config::load_from(&path).unwrap_err(),
        ConfigError::InvalidValue { ref key, .. } if key == "type"
    ));
}

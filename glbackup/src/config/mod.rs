//! Configuration loading
//!
//! Default config location: ~/.glbackup.ini
//!
//! ```ini
//! [main]
//! server = https://gitlab.com
//! token = <personal-access-token>
//! user =
//!   alice
//!   bob
//! group = team-x
//! backup_dir = ~/.gitlab-backup
//! ```

mod ini;

pub use ini::{IniDocument, Section};

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = ".glbackup.ini";
pub const DEFAULT_SECTION: &str = "main";
pub const DEFAULT_BACKUP_DIR: &str = "~/.gitlab-backup";

/// Only value accepted for a section's optional `type` key.
const SUPPORTED_TYPE: &str = "gitlab";

/// GitLab caps `per_page` at 100.
const MAX_PER_PAGE: u32 = 100;

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_export_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

/// How long to wait for the server to finish an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ExportPolicy {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            timeout: default_export_timeout(),
        }
    }
}

/// One section of a multi-section config file.
#[derive(Debug)]
pub struct SectionConfig {
    pub name: String,
    pub config: Result<Config, ConfigError>,
}

/// Validated backup configuration.
#[derive(Clone)]
pub struct Config {
    pub server_url: Url,
    pub access_token: String,
    pub users: Vec<String>,
    pub groups: Vec<String>,
    pub backup_dir: PathBuf,
    pub export: ExportPolicy,
    /// Applies to API calls, not to the archive body stream
    pub request_timeout: Duration,
    pub per_page: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_url", &self.server_url.as_str())
            .field("access_token", &"<redacted>")
            .field("users", &self.users)
            .field("groups", &self.groups)
            .field("backup_dir", &self.backup_dir)
            .field("export", &self.export)
            .field("request_timeout", &self.request_timeout)
            .field("per_page", &self.per_page)
            .finish()
    }
}

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &Path) -> Result<PathBuf, ConfigError> {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(rest))
    } else if s == "~" {
        dirs::home_dir().ok_or(ConfigError::NoHomeDir)
    } else {
        Ok(path.to_path_buf())
    }
}

/// Path of the config file in the user's home directory.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_CONFIG_FILE))
        .ok_or(ConfigError::NoHomeDir)
}

impl Config {
    /// Config with no users or groups and default policy, mainly for embedding
    /// and tests. `backup_dir` defaults to the current directory.
    pub fn new(server_url: Url, access_token: impl Into<String>) -> Self {
        Self {
            server_url,
            access_token: access_token.into(),
            users: Vec::new(),
            groups: Vec::new(),
            backup_dir: PathBuf::from("."),
            export: ExportPolicy::default(),
            request_timeout: default_request_timeout(),
            per_page: MAX_PER_PAGE,
        }
    }

    /// Load the `main` section from ~/.glbackup.ini
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path()?)
    }

    /// Load the `main` section from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_section(path, DEFAULT_SECTION)
    }

    pub fn load_section(path: &Path, section: &str) -> Result<Self, ConfigError> {
        Self::from_ini(&read_document(path)?, section)
    }

    /// Load every section of the file.
    ///
    /// Each section backs up into its own `backup_dir/<section>` directory.
    /// A section that fails validation is returned as an error alongside the
    /// others; only an unreadable or empty file fails the whole call.
    pub fn load_all_sections(path: &Path) -> Result<Vec<SectionConfig>, ConfigError> {
        let doc = read_document(path)?;
        let sections: Vec<SectionConfig> = doc
            .section_names()
            .map(|name| SectionConfig {
                name: name.to_string(),
                config: Self::from_ini(&doc, name).map(|mut config| {
                    config.backup_dir = section_dir(&config.backup_dir, name);
                    config
                }),
            })
            .collect();
        if sections.is_empty() {
            return Err(ConfigError::NoSections);
        }
        Ok(sections)
    }

    pub fn from_ini(doc: &IniDocument, section: &str) -> Result<Self, ConfigError> {
        let values = doc
            .section(section)
            .ok_or_else(|| ConfigError::MissingSection(section.to_string()))?;

        if let Some(kind) = values.get("type") {
            if !kind.eq_ignore_ascii_case(SUPPORTED_TYPE) {
                return Err(invalid("type", format!("unsupported server type '{}'", kind)));
            }
        }

        let server = required(&values, "server")?;
        let server_url = Url::parse(server).map_err(|e| invalid("server", e.to_string()))?;
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(invalid("server", "expected an http(s) URL".to_string()));
        }

        let access_token = required(&values, "token")?.to_string();
        if !access_token.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(invalid("token", "must be printable ASCII".to_string()));
        }

        let backup_dir = values.get("backup_dir").unwrap_or(DEFAULT_BACKUP_DIR);
        let backup_dir = expand_tilde(Path::new(backup_dir))?;

        let export = ExportPolicy {
            poll_interval: seconds(&values, "poll_interval")?
                .unwrap_or_else(default_poll_interval),
            timeout: seconds(&values, "export_timeout")?.unwrap_or_else(default_export_timeout),
        };

        let per_page = match values.get("per_page") {
            Some(raw) => positive(raw, "per_page")?.min(u64::from(MAX_PER_PAGE)) as u32,
            None => MAX_PER_PAGE,
        };

        Ok(Config {
            server_url,
            access_token,
            users: list(&values, "user"),
            groups: list(&values, "group"),
            backup_dir,
            export,
            request_timeout: seconds(&values, "request_timeout")?
                .unwrap_or_else(default_request_timeout),
            per_page,
        })
    }

    /// True when neither users nor groups are configured
    pub fn has_no_owners(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }
}

fn read_document(path: &Path) -> Result<IniDocument, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    IniDocument::parse(&content)
}

/// `backup_dir/<section>`, keeping only plain components of the section name.
fn section_dir(backup_dir: &Path, section: &str) -> PathBuf {
    let mut dir = backup_dir.to_path_buf();
    dir.extend(
        Path::new(section)
            .components()
            .filter(|c| matches!(c, Component::Normal(_))),
    );
    dir
}

fn required<'a>(values: &Section<'a>, key: &str) -> Result<&'a str, ConfigError> {
    values
        .get(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
}

fn list(values: &Section<'_>, key: &str) -> Vec<String> {
    values
        .get(key)
        .map(|v| v.split_whitespace().map(String::from).collect())
        .unwrap_or_default()
}

fn seconds(values: &Section<'_>, key: &str) -> Result<Option<Duration>, ConfigError> {
    values
        .get(key)
        .map(|raw| positive(raw, key).map(Duration::from_secs))
        .transpose()
}

fn positive(raw: &str, key: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(key, format!("expected a positive integer, got '{}'", raw))),
    }
}

fn invalid(key: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason,
    }
}

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal errors raised while loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(String),

    #[error("No `{0}` section in config file")]
    MissingSection(String),

    #[error("No sections in config file")]
    NoSections,

    #[error("Missing required key '{0}'")]
    MissingKey(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Errors from talking to the GitLab API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Connection failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed (status {status})")]
    Unauthorized { status: u16 },

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Access token is not a valid header value")]
    InvalidToken,
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Which kind of owner a lookup was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    User,
    Group,
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKind::User => write!(f, "user"),
            OwnerKind::Group => write!(f, "group"),
        }
    }
}

/// A configured user or group whose projects could not be listed.
#[derive(Error, Debug)]
#[error("Lookup failed for {kind} '{name}': {source}")]
pub struct LookupError {
    pub kind: OwnerKind,
    pub name: String,
    #[source]
    pub source: ApiError,
}

/// A single project whose archive could not be backed up.
#[derive(Error, Debug)]
#[error("Backup of '{project}' failed: {reason}")]
pub struct DownloadError {
    pub project: String,
    #[source]
    pub reason: DownloadFailure,
}

#[derive(Error, Debug)]
pub enum DownloadFailure {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Export failed on the server")]
    ExportFailed,

    #[error("Export not ready after {0:?}")]
    Timeout(Duration),

    #[error("Server returned an empty archive")]
    EmptyArchive,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

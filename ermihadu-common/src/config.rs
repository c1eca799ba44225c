//! Bootstrap configuration and root folder resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Built-in defaults
//!
//! A missing or malformed TOML file is never fatal: it is logged and the
//! defaults are used.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

pub const ENV_ROOT_FOLDER: &str = "ERMIHADU_ROOT_FOLDER";
pub const ENV_ACCESS_TOKEN: &str = "ERMIHADU_GOOGLE_ACCESS_TOKEN";
pub const ENV_REFRESH_TOKEN: &str = "ERMIHADU_GOOGLE_REFRESH_TOKEN";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the local settings database
    pub root_folder: Option<PathBuf>,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub source: SourceConfig,
    pub google: GoogleConfig,
    pub vault: VaultConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5730,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides
    pub level: String,
    /// Log file path (logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Where the item list is read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Sheets values API (authenticated)
    #[default]
    Sheets,
    /// Published CSV export of the same spreadsheet (read only)
    PublishedCsv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Required when `kind = "published_csv"`
    pub csv_url: Option<String>,
    /// Values range holding item rows (header excluded)
    pub items_range: String,
    /// Range rows are appended to
    pub append_range: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Sheets,
            csv_url: None,
            items_range: "Items!A2:L".to_string(),
            append_range: "Items!A:L".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub access_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    /// Use this spreadsheet instead of the stored or a newly created one
    pub spreadsheet_id: Option<String>,
    pub sheets_base_url: String,
    pub drive_base_url: String,
    pub upload_base_url: String,
    pub token_url: String,
    pub request_timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            client_id: None,
            client_secret: None,
            refresh_token: None,
            spreadsheet_id: None,
            sheets_base_url: "https://sheets.googleapis.com".to_string(),
            drive_base_url: "https://www.googleapis.com".to_string(),
            upload_base_url: "https://www.googleapis.com".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Seed people list; the built-in seed when absent
    pub people: Option<Vec<String>>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load from an explicit path, or the platform default path
    ///
    /// Never fails: problems fall back to defaults. Nothing is logged here
    /// because this runs before the subscriber exists; the caller logs the
    /// returned [`ConfigNotice`] once tracing is up.
    pub fn load(explicit: Option<&Path>) -> (Self, ConfigNotice) {
        let path = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => return (Self::default(), ConfigNotice::NoConfigDir),
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => match Self::from_toml_str(&text) {
                Ok(config) => (config, ConfigNotice::Loaded(path)),
                Err(e) => (
                    Self::default(),
                    ConfigNotice::Malformed {
                        path,
                        reason: e.to_string(),
                    },
                ),
            },
            Err(_) if explicit.is_none() => (Self::default(), ConfigNotice::NotFound(path)),
            Err(e) => (
                Self::default(),
                ConfigNotice::Unreadable {
                    path,
                    reason: e.to_string(),
                },
            ),
        }
    }

    /// Overlay secrets supplied through the environment
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = non_empty_env(ENV_ACCESS_TOKEN) {
            self.google.access_token = Some(token);
        }
        if let Some(token) = non_empty_env(ENV_REFRESH_TOKEN) {
            self.google.refresh_token = Some(token);
        }
    }

    /// Check combinations the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.source.kind == SourceKind::PublishedCsv
            && self.source.csv_url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(Error::Config(
                "source.kind = \"published_csv\" requires source.csv_url".to_string(),
            ));
        }
        if self.google.request_timeout_secs == 0 {
            return Err(Error::Config("google.request_timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }
}

/// How [`TomlConfig::load`] found (or failed to find) its file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigNotice {
    Loaded(PathBuf),
    /// No file at the default path; defaults are expected here
    NotFound(PathBuf),
    /// Explicitly named file could not be read
    Unreadable { path: PathBuf, reason: String },
    Malformed { path: PathBuf, reason: String },
    NoConfigDir,
}

impl ConfigNotice {
    /// True when the built-in defaults replaced a file the user asked for
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            ConfigNotice::Unreadable { .. } | ConfigNotice::Malformed { .. } | ConfigNotice::NoConfigDir
        )
    }

    pub fn log(&self) {
        match self {
            ConfigNotice::Loaded(path) => info!("Loaded config: {}", path.display()),
            ConfigNotice::NotFound(path) => {
                info!("No config file at {}, using defaults", path.display())
            }
            ConfigNotice::Unreadable { path, reason } => {
                warn!("Config file {} unreadable ({}), using defaults", path.display(), reason)
            }
            ConfigNotice::Malformed { path, reason } => {
                warn!("Ignoring config {}: {}", path.display(), reason)
            }
            ConfigNotice::NoConfigDir => {
                warn!("Could not determine config directory, using defaults")
            }
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// `~/.config/ermihadu/config.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ermihadu").join("config.toml"))
}

/// Resolve the root folder: CLI > environment > TOML > OS default
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Some(path) = non_empty_env(ENV_ROOT_FOLDER) {
        return PathBuf::from(path);
    }
    if let Some(path) = &toml.root_folder {
        return path.clone();
    }
    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ermihadu"))
        .unwrap_or_else(|| PathBuf::from("./ermihadu_data"))
}

/// Create the root folder if missing and return the settings database path
pub fn ensure_root_folder(root: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root)?;
    Ok(root.join("ermihadu.db"))
}

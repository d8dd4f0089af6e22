//! Runtime settings and their resolution.
//!
//! Precedence, highest first: CLI flags, environment variables, the JSON
//! settings file, built-in defaults. A missing settings file falls back to
//! defaults; a malformed one is an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit settings file.
pub const ENV_CONFIG: &str = "TICKETDASH_CONFIG";
/// Environment variable overriding the default export path.
pub const ENV_DATA: &str = "TICKETDASH_DATA";
/// Environment variable overriding the HTTP bind address.
pub const ENV_BIND: &str = "TICKETDASH_BIND";
/// Environment variable enabling JSON log lines.
pub const ENV_LOG_JSON: &str = "TICKETDASH_LOG_JSON";

const SETTINGS_FILE_NAME: &str = "config.json";

/// Errors from settings resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("settings file {path} has incompatible schema_version {version}")]
    IncompatibleSchema { path: PathBuf, version: String },
}

impl From<ConfigError> for td_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io { path, source } => td_common::Error::InvalidSettings {
                path: path.display().to_string(),
                message: source.to_string(),
            },
            ConfigError::Parse { path, message } => td_common::Error::InvalidSettings {
                path: path.display().to_string(),
                message,
            },
            ConfigError::IncompatibleSchema { path, version } => {
                td_common::Error::InvalidSettings {
                    path: path.display().to_string(),
                    message: format!("incompatible schema_version {version}"),
                }
            }
        }
    }
}

/// Dashboard runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub schema_version: String,

    /// Export loaded when nothing has been uploaded.
    pub data_path: PathBuf,

    /// Address the HTTP service listens on.
    pub bind_addr: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,

    /// Cap on rows returned in the detail table (None = all rows).
    pub detail_row_limit: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            data_path: PathBuf::from("glpi.csv"),
            bind_addr: "127.0.0.1:8501".to_string(),
            log_json: false,
            detail_row_limit: None,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if !td_common::schema::is_compatible(&settings.schema_version) {
            return Err(ConfigError::IncompatibleSchema {
                path: path.to_path_buf(),
                version: settings.schema_version,
            });
        }
        Ok(settings)
    }
}

/// Values supplied on the command line; `None` defers to lower layers.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub config_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub log_json: Option<bool>,
}

/// Settings plus the file they were read from, if any.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSettings {
    pub settings: Settings,
    pub source: Option<PathBuf>,
    pub using_defaults: bool,
}

/// Resolve settings from the process environment.
pub fn resolve_settings(overrides: &SettingsOverrides) -> Result<ResolvedSettings, ConfigError> {
    resolve_settings_with(overrides, |key| std::env::var(key).ok())
}

/// Resolve settings with an injectable environment lookup.
pub fn resolve_settings_with<F>(
    overrides: &SettingsOverrides,
    env: F,
) -> Result<ResolvedSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = overrides
        .config_path
        .clone()
        .or_else(|| env(ENV_CONFIG).map(PathBuf::from));

    // An explicit path must exist; the default location is optional.
    let (mut settings, source) = match explicit {
        Some(path) => (Settings::load_from_file(&path)?, Some(path)),
        None => match default_settings_path().filter(|p| p.exists()) {
            Some(path) => (Settings::load_from_file(&path)?, Some(path)),
            None => (Settings::default(), None),
        },
    };
    let using_defaults = source.is_none();

    if let Some(data) = env(ENV_DATA) {
        settings.data_path = PathBuf::from(data);
    }
    if let Some(bind) = env(ENV_BIND) {
        settings.bind_addr = bind;
    }
    if let Some(flag) = env(ENV_LOG_JSON).and_then(|v| parse_bool(&v)) {
        settings.log_json = flag;
    }

    if let Some(data) = &overrides.data_path {
        settings.data_path = data.clone();
    }
    if let Some(bind) = &overrides.bind_addr {
        settings.bind_addr = bind.clone();
    }
    if let Some(flag) = overrides.log_json {
        settings.log_json = flag;
    }

    Ok(ResolvedSettings {
        settings,
        source,
        using_defaults,
    })
}

/// `<config_dir>/ticketdash/config.json`, when a config dir exists.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ticketdash").join(SETTINGS_FILE_NAME))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

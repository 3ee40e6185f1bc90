use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{IndexSpec, TimeRange};
use crate::error::{Error, Result};

/// Default backend base URL when neither config nor environment provide one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Upper bound for one primary series fetch.
pub const DEFAULT_SERIES_TIMEOUT_SECS: u64 = 10;

/// Upper bound for each reference-index fetch.
pub const DEFAULT_INDEX_TIMEOUT_SECS: u64 = 10;

/// File name used in the XDG config directory.
pub const CONFIG_FILE_NAME: &str = "marketview.toml";

/// Application configuration loaded from `$XDG_CONFIG_HOME/marketview.toml`
/// or `~/.config/marketview.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub defaults: DefaultsConfig,
    pub indices: Vec<IndexSpec>,
}

/// Backend connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub series_timeout_secs: Option<u64>,
    pub index_timeout_secs: Option<u64>,
    pub auth_token: Option<String>,
}

/// Initial selection used when CLI arguments are not provided.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub symbol: Option<String>,
    pub range: Option<TimeRange>,
}

impl AppConfig {
    pub fn base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn series_timeout(&self) -> Duration {
        Duration::from_secs(
            self.api
                .series_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_SERIES_TIMEOUT_SECS),
        )
    }

    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(
            self.api
                .index_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_INDEX_TIMEOUT_SECS),
        )
    }

    /// Configured reference indices, or the four US benchmarks when none are set.
    pub fn index_specs(&self) -> Vec<IndexSpec> {
        if self.indices.is_empty() {
            IndexSpec::defaults()
        } else {
            self.indices.clone()
        }
    }
}

/// Resolve the configuration file path based on XDG conventions.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config_home.trim().is_empty()
    {
        return Some(PathBuf::from(xdg_config_home).join(CONFIG_FILE_NAME));
    }

    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config").join(CONFIG_FILE_NAME))
}

/// Load config from disk. Returns defaults when the file does not exist.
pub fn load() -> Result<AppConfig> {
    let Some(path) = config_path() else {
        return Ok(AppConfig::default());
    };

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(err) => return Err(read_config_error(&path, err)),
    };

    parse(&raw).map_err(|err| parse_config_error(&path, err))
}

/// Load config from an explicit path.
///
/// Unlike [`load`], this returns an error when the file is missing.
pub fn load_from_path(path: &Path) -> Result<AppConfig> {
    let raw = fs::read_to_string(path).map_err(|err| read_config_error(path, err))?;
    parse(&raw).map_err(|err| parse_config_error(path, err))
}

fn parse(raw: &str) -> std::result::Result<AppConfig, toml::de::Error> {
    toml::from_str(raw)
}

fn read_config_error(path: &Path, err: std::io::Error) -> Error {
    Error::Config(format!(
        "failed to read config file '{}': {}",
        path.display(),
        err
    ))
}

fn parse_config_error(path: &Path, err: toml::de::Error) -> Error {
    Error::Config(format!(
        "failed to parse config file '{}': {}",
        path.display(),
        err
    ))
}

//! Server configuration
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! environment variables, then CLI flags (applied by the binary).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::TEMP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),
    #[error("Failed to read config: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Workspace root every file operation is sandboxed to
    pub data_dir: PathBuf,
    /// Draft root; defaults to `<data_dir>/.tmp`
    pub temp_dir: Option<PathBuf>,
    pub bind: String,
    pub port: u16,
    /// Static file → service associations
    pub file_containers: BTreeMap<String, String>,
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LogSection {
    /// Directory for daily JSON log files; disabled when unset
    pub dir: Option<PathBuf>,
    /// JSON console output instead of human-readable lines
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/data"),
            temp_dir: None,
            bind: "127.0.0.1".to_string(),
            port: 8080,
            file_containers: BTreeMap::new(),
            log: LogSection::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the per-user default location if present,
    /// then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.display().to_string()));
                }
                Self::from_file(p)?
            }
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// `~/.config/filedesk/config.toml` (platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("filedesk").join("config.toml"))
    }

    /// Override fields from environment variables.
    ///
    /// Unparseable numeric values are ignored, keeping the previous value.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("TEMP_DIR").filter(|v| !v.is_empty()) {
            self.temp_dir = Some(PathBuf::from(dir));
        }
        if let Some(bind) = lookup("FILEDESK_BIND").filter(|v| !v.is_empty()) {
            self.bind = bind;
        }
        if let Some(port) = lookup("FILEDESK_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(raw) = lookup("FILE_CONTAINERS") {
            self.file_containers.extend(parse_file_containers(&raw));
        }
        if let Some(dir) = lookup("FILEDESK_LOG_DIR").filter(|v| !v.is_empty()) {
            self.log.dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = lookup("FILEDESK_LOG_JSON") {
            self.log.json = parse_bool(&flag);
        }
    }

    pub fn effective_temp_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(TEMP_DIR_NAME))
    }
}

/// Parse `file:service,file2:service2`; malformed pairs are skipped
pub fn parse_file_containers(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (file, service) = pair.trim().split_once(':')?;
            let (file, service) = (file.trim(), service.trim());
            if file.is_empty() || service.is_empty() {
                return None;
            }
            Some((file.trim_start_matches('/').to_string(), service.to_string()))
        })
        .collect()
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

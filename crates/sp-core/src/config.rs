//! Snapshot configuration loading and validation.
//!
//! Resolution order (highest to lowest priority):
//! 1. Explicit CLI flags ([`ConfigOverrides`])
//! 2. Environment variables (`SHOWPROC_*`)
//! 3. Config file (`--config`, or `$XDG_CONFIG_HOME/showproc/config.json`)
//! 4. Built-in defaults

use crate::collect::{DEFAULT_CMDLINE_MAX_BYTES, DEFAULT_PROC_ROOT};
use crate::tty::DEFAULT_DEV_ROOT;
use serde::{Deserialize, Serialize};
use sp_common::OutputFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default XDG config directory name.
const CONFIG_DIR_NAME: &str = "showproc";

/// Config file name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.json";

/// Upper bound on worker threads.
pub const MAX_JOBS: usize = 256;

pub mod env_keys {
    pub const PROC_ROOT: &str = "SHOWPROC_PROC_ROOT";
    pub const DEV_ROOT: &str = "SHOWPROC_DEV_ROOT";
    pub const CMDLINE_MAX_BYTES: &str = "SHOWPROC_CMDLINE_MAX_BYTES";
    pub const JOBS: &str = "SHOWPROC_JOBS";
    pub const FORMAT: &str = "SHOWPROC_FORMAT";
}

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

/// Fully resolved snapshot settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Procfs root to enumerate.
    pub proc_root: PathBuf,
    /// Device root searched for terminals.
    pub dev_root: PathBuf,
    /// Cap on bytes read from each command line.
    pub cmdline_max_bytes: usize,
    /// Extraction worker threads; 1 is fully sequential.
    pub jobs: usize,
    pub format: OutputFormat,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        SnapshotConfig {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            dev_root: PathBuf::from(DEFAULT_DEV_ROOT),
            cmdline_max_bytes: DEFAULT_CMDLINE_MAX_BYTES,
            jobs: 1,
            format: OutputFormat::Table,
        }
    }
}

impl SnapshotConfig {
    /// Check semantic constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == 0 || self.jobs > MAX_JOBS {
            return Err(ConfigError::Validation {
                field: "jobs",
                message: format!("must be between 1 and {MAX_JOBS}, got {}", self.jobs),
            });
        }
        if self.cmdline_max_bytes == 0 {
            return Err(ConfigError::Validation {
                field: "cmdline_max_bytes",
                message: "must be at least 1".to_string(),
            });
        }
        if self.proc_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "proc_root",
                message: "must not be empty".to_string(),
            });
        }
        if self.dev_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "dev_root",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&mut self, layer: ConfigOverrides) {
        if let Some(v) = layer.proc_root {
            self.proc_root = v;
        }
        if let Some(v) = layer.dev_root {
            self.dev_root = v;
        }
        if let Some(v) = layer.cmdline_max_bytes {
            self.cmdline_max_bytes = v;
        }
        if let Some(v) = layer.jobs {
            self.jobs = v;
        }
        if let Some(v) = layer.format {
            self.format = v;
        }
    }
}

/// One partial settings layer: CLI flags, environment, or a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub proc_root: Option<PathBuf>,
    pub dev_root: Option<PathBuf>,
    pub cmdline_max_bytes: Option<usize>,
    pub jobs: Option<usize>,
    pub format: Option<OutputFormat>,
}

impl ConfigOverrides {
    /// Read the `SHOWPROC_*` layer through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_usize = |key: &'static str| -> Result<Option<usize>, ConfigError> {
            match lookup(key) {
                None => Ok(None),
                Some(value) => value
                    .trim()
                    .parse::<usize>()
                    .map(Some)
                    .map_err(|_| ConfigError::InvalidEnv { key, value }),
            }
        };

        let format = match lookup(env_keys::FORMAT) {
            None => None,
            Some(value) => Some(value.parse::<OutputFormat>().map_err(|_| {
                ConfigError::InvalidEnv {
                    key: env_keys::FORMAT,
                    value,
                }
            })?),
        };

        Ok(ConfigOverrides {
            proc_root: lookup(env_keys::PROC_ROOT).map(PathBuf::from),
            dev_root: lookup(env_keys::DEV_ROOT).map(PathBuf::from),
            cmdline_max_bytes: parse_usize(env_keys::CMDLINE_MAX_BYTES)?,
            jobs: parse_usize(env_keys::JOBS)?,
            format,
        })
    }
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config file; must exist when given.
    pub config_path: Option<PathBuf>,
    /// CLI flag values.
    pub cli: ConfigOverrides,
}

/// Resolved configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: SnapshotConfig,
    /// Config file that contributed (None if none was found).
    pub source_path: Option<PathBuf>,
}

/// Load configuration from the process environment.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    load_config_with(options, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup.
pub fn load_config_with<F>(options: &ConfigOptions, lookup: F) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = SnapshotConfig::default();

    let source_path = match &options.config_path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound { path: path.clone() });
            }
            Some(path.clone())
        }
        None => default_config_path(&lookup).filter(|path| path.exists()),
    };

    if let Some(path) = &source_path {
        config.apply(load_file(path)?);
    }
    config.apply(ConfigOverrides::from_lookup(&lookup)?);
    config.apply(options.cli.clone());

    config.validate()?;

    Ok(ResolvedConfig {
        config,
        source_path,
    })
}

/// `$XDG_CONFIG_HOME/showproc/config.json`, falling back to `~/.config`.
fn default_config_path<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let xdg_config = lookup("XDG_CONFIG_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))?;
    Some(xdg_config.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Parse one config file layer.
fn load_file(path: &Path) -> Result<ConfigOverrides, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

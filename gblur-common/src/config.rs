//! Bootstrap configuration
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (handled by each binary's clap parser)
//! 2. Environment variables (`GBLUR_HOST`, `GBLUR_PORT`, `GBLUR_CONFIG`)
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! A missing TOML file is never fatal: the service logs a warning and starts
//! on compiled defaults. A file that exists but fails to parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "GBLUR_CONFIG";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_WORKERS: i32 = 1024;
pub const DEFAULT_MAX_RADIUS: i32 = 512;

/// Container format used to encode replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Bmp,
    #[serde(alias = "tif")]
    Tiff,
    #[serde(alias = "jpg")]
    Jpeg,
}

impl OutputFormat {
    pub fn all_variants() -> &'static [OutputFormat] {
        &[
            OutputFormat::Png,
            OutputFormat::Bmp,
            OutputFormat::Tiff,
            OutputFormat::Jpeg,
        ]
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "bmp" => Ok(OutputFormat::Bmp),
            "tiff" | "tif" => Ok(OutputFormat::Tiff),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            other => Err(Error::Config(format!("Unknown output format: {:?}", other))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Png => "png",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Jpeg => "jpeg",
        };
        f.write_str(name)
    }
}

/// Bootstrap configuration loaded from TOML file
///
/// Cannot change while the server is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Container format for blurred replies
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Largest worker count a single request may ask for
    #[serde(default = "default_max_workers")]
    pub max_workers: i32,

    /// Largest blur radius a single request may ask for
    #[serde(default = "default_max_radius")]
    pub max_radius: i32,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            output_format: OutputFormat::default(),
            max_workers: default_max_workers(),
            max_radius: default_max_radius(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_workers() -> i32 {
    DEFAULT_MAX_WORKERS
}

fn default_max_radius() -> i32 {
    DEFAULT_MAX_RADIUS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to compiled defaults
    ///
    /// `explicit` is the `--config` argument, if any. Without it the
    /// `GBLUR_CONFIG` variable and then the platform locations are tried.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match resolve_config_path(explicit) {
            Some(path) => path,
            None => {
                warn!("No config file found, using compiled defaults");
                return Ok(Self::default());
            }
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let config = Self::from_toml_str(&content)?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(Error::Config(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers < 1 {
            return Err(Error::Config(format!(
                "max_workers must be at least 1, got {}",
                self.max_workers
            )));
        }
        if self.max_radius < 0 {
            return Err(Error::Config(format!(
                "max_radius must not be negative, got {}",
                self.max_radius
            )));
        }
        Ok(())
    }

    /// Address string suitable for `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locate the TOML file to read, if any
///
/// Explicit path first, then `GBLUR_CONFIG`, then the per-user config
/// directory, then `/etc/gblur/config.toml` on Linux. Returns `None` when no
/// candidate exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("gblur").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/gblur/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

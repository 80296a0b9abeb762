//! Bootstrap configuration loading
//!
//! Settings are resolved in this priority order:
//! 1. Command-line argument (handled by each binary through clap)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is never fatal: the service logs a warning and starts
//! with compiled defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name used under the platform config/data directories
pub const APP_DIR_NAME: &str = "ecosort";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

/// Default bind address (loopback only)
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Default request body limit: the vision service rejects images over 4 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;

/// Default language hint sent to the vision service
pub const DEFAULT_VISION_LANGUAGE: &str = "es";

/// Default vision request timeout
pub const DEFAULT_VISION_TIMEOUT_SECS: u64 = 30;

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; absent values fall back to [`CompiledDefaults`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Address the HTTP server binds to
    #[serde(default)]
    pub bind_address: Option<String>,

    /// Path to the SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Directory where uploads are staged while a request is processed
    #[serde(default)]
    pub upload_dir: Option<PathBuf>,

    /// Request body limit for uploads
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    #[serde(default)]
    pub vision: VisionSection,

    #[serde(default)]
    pub keywords: KeywordSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[vision]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisionSection {
    /// Base URL of the vision service resource
    pub endpoint: Option<String>,
    /// Subscription key
    pub api_key: Option<String>,
    /// Language hint for tags and captions
    pub language: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[keywords]` section, overriding the built-in keyword lists
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordSection {
    pub organic: Option<Vec<String>>,
    pub inorganic: Option<Vec<String>>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directives (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
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

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub port: u16,
    pub bind_address: String,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let data_dir = default_data_dir();
        Self {
            port: DEFAULT_PORT,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            database_path: data_dir.join("ecosort.db"),
            upload_dir: data_dir.join("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// OS-dependent data directory
fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/ecosort (or /var/lib/ecosort for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/var/lib").join(APP_DIR_NAME))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/ecosort
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support").join(APP_DIR_NAME))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\ecosort
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData").join(APP_DIR_NAME))
    } else {
        PathBuf::from("./ecosort_data")
    }
}

/// Locate the default configuration file for the platform
///
/// Linux also checks `/etc/ecosort/config.toml` after the user config dir.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR_NAME).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Where the bootstrap config was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// File named on the command line or in `ECOSORT_CONFIG`
    Explicit(PathBuf),
    /// File found at the platform default location
    DefaultLocation(PathBuf),
    /// No file; compiled defaults only
    CompiledDefaults,
}

impl ConfigSource {
    /// Report the source; call once the tracing subscriber is installed
    pub fn log(&self) {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::DefaultLocation(path) => {
                info!("Loaded config from {}", path.display());
            }
            ConfigSource::CompiledDefaults => {
                warn!("No config file found, using compiled defaults");
            }
        }
    }
}

/// Load the TOML bootstrap config
///
/// An explicitly requested file must exist and parse. Without one, the default
/// location is tried and a missing file yields defaults.
///
/// Nothing is logged here: the `[logging]` section is needed before the
/// subscriber exists. Log the returned [`ConfigSource`] afterwards.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config = TomlConfig::load(path)?;
        return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
    }

    match default_config_path() {
        Some(path) => {
            let config = TomlConfig::load(&path)?;
            Ok((config, ConfigSource::DefaultLocation(path)))
        }
        None => Ok((TomlConfig::default(), ConfigSource::CompiledDefaults)),
    }
}

/// Where a resolved setting came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    Environment(&'static str),
    Toml,
}

impl std::fmt::Display for SettingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingSource::Environment(name) => write!(f, "environment ({})", name),
            SettingSource::Toml => write!(f, "TOML config"),
        }
    }
}

/// Resolve a string setting: environment variables (in order) → TOML value
///
/// Blank values are ignored. Warns when more than one source provides a value.
pub fn resolve_setting(
    name: &str,
    env_vars: &[&'static str],
    toml_value: Option<&str>,
) -> Option<(String, SettingSource)> {
    let mut found: Vec<(String, SettingSource)> = Vec::new();

    for var in env_vars {
        if let Ok(value) = std::env::var(var) {
            if is_valid_value(&value) {
                found.push((value.trim().to_string(), SettingSource::Environment(var)));
            }
        }
    }

    if let Some(value) = toml_value {
        if is_valid_value(value) {
            found.push((value.trim().to_string(), SettingSource::Toml));
        }
    }

    if found.len() > 1 {
        let sources: Vec<String> = found.iter().map(|(_, s)| s.to_string()).collect();
        warn!(
            "{} found in multiple sources: {}. Using {}.",
            name,
            sources.join(", "),
            found[0].1
        );
    }

    found.into_iter().next()
}

/// Validate a setting value (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

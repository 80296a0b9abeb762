//! Service configuration resolution
//!
//! Combines command-line overrides, environment variables, the TOML file and
//! compiled defaults into the settings the service starts with.

use crate::upload::UploadSettings;
use crate::vision::VisionSettings;
use ecosort_common::config::{
    resolve_setting, CompiledDefaults, KeywordSection, TomlConfig, VisionSection,
    DEFAULT_VISION_LANGUAGE, DEFAULT_VISION_TIMEOUT_SECS,
};
use ecosort_common::{Error, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Environment variables holding the vision endpoint, in priority order
pub const VISION_ENDPOINT_ENV: &[&str] = &["ECOSORT_VISION_ENDPOINT", "ENDPOINT_AZURE"];

/// Environment variables holding the vision key, in priority order
pub const VISION_KEY_ENV: &[&str] = &["ECOSORT_VISION_KEY", "API_AZURE"];

/// Values given on the command line (clap already folded in their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub database_path: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
}

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub bind_address: String,
    pub database_path: PathBuf,
    pub uploads: UploadSettings,
    pub vision: VisionSettings,
    pub keywords: KeywordSection,
}

impl ServiceConfig {
    /// Resolve every setting: CLI → environment → TOML → compiled default
    pub fn resolve(cli: CliOverrides, toml: &TomlConfig, defaults: &CompiledDefaults) -> Result<Self> {
        let max_upload_bytes = toml.max_upload_bytes.unwrap_or(defaults.max_upload_bytes);
        if max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be greater than zero".to_string()));
        }

        let config = Self {
            port: cli.port.or(toml.port).unwrap_or(defaults.port),
            bind_address: cli
                .bind_address
                .or_else(|| toml.bind_address.clone())
                .unwrap_or_else(|| defaults.bind_address.clone()),
            database_path: cli
                .database_path
                .or_else(|| toml.database_path.clone())
                .unwrap_or_else(|| defaults.database_path.clone()),
            uploads: UploadSettings {
                upload_dir: cli
                    .upload_dir
                    .or_else(|| toml.upload_dir.clone())
                    .unwrap_or_else(|| defaults.upload_dir.clone()),
                max_upload_bytes,
            },
            vision: resolve_vision_settings(&toml.vision)?,
            keywords: toml.keywords.clone(),
        };

        // Fail here rather than at bind time
        config.socket_addr()?;

        Ok(config)
    }

    /// Address the HTTP server listens on
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            Error::Config(format!("Invalid bind address: {}", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Resolve the vision service connection settings
///
/// Endpoint and key are required. Environment variables take priority over
/// the `[vision]` section.
pub fn resolve_vision_settings(section: &VisionSection) -> Result<VisionSettings> {
    let (endpoint, endpoint_source) =
        resolve_setting("vision endpoint", VISION_ENDPOINT_ENV, section.endpoint.as_deref())
            .ok_or_else(|| {
                Error::Config(format!(
                    "Vision endpoint not configured. Set {} or add `endpoint` under [vision] in config.toml",
                    VISION_ENDPOINT_ENV[0]
                ))
            })?;

    let (api_key, key_source) =
        resolve_setting("vision key", VISION_KEY_ENV, section.api_key.as_deref()).ok_or_else(|| {
            Error::Config(format!(
                "Vision key not configured. Set {} or add `api_key` under [vision] in config.toml",
                VISION_KEY_ENV[0]
            ))
        })?;

    info!("Vision endpoint {} from {}", endpoint, endpoint_source);
    info!("Vision key from {}", key_source);

    let language = section
        .language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_VISION_LANGUAGE)
        .to_string();

    let timeout_secs = section.timeout_secs.unwrap_or(DEFAULT_VISION_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(Error::Config("vision.timeout_secs must be greater than zero".to_string()));
    }

    Ok(VisionSettings {
        endpoint,
        api_key,
        language,
        timeout: Duration::from_secs(timeout_secs),
    })
}

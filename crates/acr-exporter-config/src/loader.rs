// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use crate::error::{ConfigError, ConfigResult};
use crate::schema::{Config, ServicePrincipal};
use crate::validation::Validator;
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, info};

/// Registry name
pub const ENV_REGISTRY_NAME: &str = "ACR_NAME";
/// Seconds between cycles
pub const ENV_REFRESH_INTERVAL: &str = "REFRESH_INTERVAL";
/// Per-call timeout in seconds
pub const ENV_COMMAND_TIMEOUT: &str = "ACR_COMMAND_TIMEOUT";
/// Azure CLI executable
pub const ENV_AZ_PATH: &str = "AZ_PATH";
/// Service principal client id
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
/// Service principal secret
pub const ENV_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
/// Service principal tenant
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
/// Bind interface
pub const ENV_METRICS_HOST: &str = "METRICS_HOST";
/// Bind port
pub const ENV_METRICS_PORT: &str = "METRICS_PORT";
/// Toggle for exporter self-metrics
pub const ENV_EXPORTER_METRICS: &str = "EXPORTER_METRICS";
/// Log level
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Log format
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML document
    Toml,
    /// YAML document
    Yaml,
    /// JSON document
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::InvalidPath(path.to_path_buf())),
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Configuration loader
///
/// Values are layered: built-in defaults, then an optional file, then the
/// process environment. Validation runs once on the final result.
#[derive(Debug)]
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from a file
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).await?;

        info!(
            "Loaded {} configuration file: {}",
            format.name(),
            path.display()
        );

        self.load_from_string(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let config: Config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };

        debug!("Configuration loaded from {}", format.name());
        self.finish(config)
    }

    /// Load configuration from defaults plus the process environment
    pub fn from_env(&self) -> ConfigResult<Config> {
        let mut config = Config::default();
        self.apply_env_overrides(&mut config)?;
        self.finish(config)
    }

    /// Load a file (when given) and layer the process environment over it
    pub async fn load_with_overrides<P: AsRef<Path>>(
        &self,
        path: Option<P>,
    ) -> ConfigResult<Config> {
        let mut config = match path {
            Some(path) => Self::without_validation().load_file(path).await?,
            None => Config::default(),
        };
        self.apply_env_overrides(&mut config)?;
        self.finish(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&self, config: &mut Config) -> ConfigResult<()> {
        apply_overrides(config, |key| std::env::var(key).ok())
    }

    fn finish(&self, config: Config) -> ConfigResult<Config> {
        if self.validate {
            config.validate()?;
            info!("Configuration validated successfully");
        }
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply overrides from an arbitrary key lookup
///
/// Empty values are treated as unset.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    // Registry settings
    if let Some(value) = get(ENV_REGISTRY_NAME) {
        config.registry.name = value.trim().to_string();
    }
    if let Some(value) = get(ENV_AZ_PATH) {
        config.registry.az_path = value;
    }
    if let Some(value) = get(ENV_COMMAND_TIMEOUT) {
        config.registry.command_timeout_secs =
            parse_env(ENV_COMMAND_TIMEOUT, &value, "expected a whole number of seconds")?;
    }

    let client_id = get(ENV_CLIENT_ID);
    let client_secret = get(ENV_CLIENT_SECRET);
    let tenant_id = get(ENV_TENANT_ID);
    if client_id.is_some() || client_secret.is_some() || tenant_id.is_some() {
        let existing = config.registry.credentials.take();
        let (old_id, old_secret, old_tenant) = match existing {
            Some(sp) => (sp.client_id, sp.client_secret, sp.tenant_id),
            None => (String::new(), String::new(), String::new()),
        };
        config.registry.credentials = Some(ServicePrincipal {
            client_id: client_id.unwrap_or(old_id),
            client_secret: client_secret.unwrap_or(old_secret),
            tenant_id: tenant_id.unwrap_or(old_tenant),
        });
    }

    // Scrape settings
    if let Some(value) = get(ENV_REFRESH_INTERVAL) {
        config.scrape.refresh_interval_secs =
            parse_env(ENV_REFRESH_INTERVAL, &value, "expected a whole number of seconds")?;
    }

    // Server settings
    if let Some(value) = get(ENV_METRICS_HOST) {
        config.server.host = value;
    }
    if let Some(value) = get(ENV_METRICS_PORT) {
        config.server.port = parse_env(ENV_METRICS_PORT, &value, "expected valid port number")?;
    }
    if let Some(value) = get(ENV_EXPORTER_METRICS) {
        config.server.exporter_metrics = parse_bool(ENV_EXPORTER_METRICS, &value)?;
    }

    // Observability settings
    if let Some(value) = get(ENV_LOG_LEVEL) {
        config.observability.log_level = value;
    }
    if let Some(value) = get(ENV_LOG_FORMAT) {
        config.observability.log_format = value;
    }

    Ok(())
}

fn parse_env<T: FromStr>(variable: &str, value: &str, reason: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_var_parsing_error(variable, value, reason))
}

/// Parse boolean from string (accepts: true, false, yes, no, 1, 0, on, off)
fn parse_bool(variable: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::env_var_parsing_error(
            variable,
            value,
            "expected 'true', 'false', 'yes', 'no', '1', '0', 'on', or 'off'",
        )),
    }
}

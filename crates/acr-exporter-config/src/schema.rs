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
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Smallest refresh interval the exporter accepts, in seconds
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 5;

/// Refresh interval used when none is configured, in seconds
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Port the metrics endpoint listens on by default
pub const DEFAULT_METRICS_PORT: u16 = 9101;

/// Upper bound for a single `az` invocation, in seconds
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Which registry to scrape and how to reach it
    pub registry: RegistryConfig,

    /// Refresh scheduling
    pub scrape: ScrapeConfig,

    /// Metrics endpoint
    pub server: ServerConfig,

    /// Logging
    pub observability: ObservabilityConfig,
}

/// Registry connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry name as understood by `az acr` (e.g. `myregistry`)
    pub name: String,

    /// Path or name of the Azure CLI executable
    pub az_path: String,

    /// Timeout applied to every registry call, in seconds
    pub command_timeout_secs: u64,

    /// Service principal used for `az login`; absent means an existing session is reused
    pub credentials: Option<ServicePrincipal>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            az_path: "az".to_string(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            credentials: None,
        }
    }
}

impl RegistryConfig {
    /// Per-call timeout as a [`Duration`]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// Azure service principal credentials
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServicePrincipal {
    /// Application (client) id
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Directory (tenant) id
    pub tenant_id: String,
}

impl fmt::Debug for ServicePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServicePrincipal")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Refresh scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Seconds between the end of one cycle and the start of the next
    pub refresh_interval_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

impl ScrapeConfig {
    /// Refresh interval as a [`Duration`]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Metrics endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (all interfaces by default)
    pub host: String,

    /// TCP port
    pub port: u16,

    /// Append the exporter's own health metrics after the registry snapshot
    pub exporter_metrics: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_METRICS_PORT,
            exporter_metrics: true,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, compact, json)
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

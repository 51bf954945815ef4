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
use crate::schema::*;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

/// Validator for configuration settings
pub trait Validator {
    /// Check every invariant of `self`, returning the first violation
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        self.registry.validate()?;
        self.scrape.validate()?;
        self.server.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

impl Validator for RegistryConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::missing("registry.name"));
        }

        if self.az_path.trim().is_empty() {
            return Err(ConfigError::missing("registry.az_path"));
        }

        if self.command_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "registry.command_timeout_secs",
                "timeout must be at least 1 second",
            ));
        }

        if let Some(credentials) = &self.credentials {
            credentials.validate()?;
        }

        Ok(())
    }
}

impl Validator for ServicePrincipal {
    fn validate(&self) -> ConfigResult<()> {
        let fields = [
            ("registry.credentials.client_id", &self.client_id),
            ("registry.credentials.client_secret", &self.client_secret),
            ("registry.credentials.tenant_id", &self.tenant_id),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::missing(field));
            }
        }
        Ok(())
    }
}

impl Validator for ScrapeConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.refresh_interval_secs < MIN_REFRESH_INTERVAL_SECS {
            return Err(ConfigError::invalid_value(
                "scrape.refresh_interval_secs",
                format!(
                    "refresh interval must be >= {}, got {}",
                    MIN_REFRESH_INTERVAL_SECS, self.refresh_interval_secs
                ),
            ));
        }
        Ok(())
    }
}

impl Validator for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::missing("server.host"));
        }

        if self.port == 0 {
            return Err(ConfigError::invalid_value(
                "server.port",
                "port must be between 1 and 65535",
            ));
        }

        Ok(())
    }
}

impl Validator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_level",
                format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_format",
                format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
            ));
        }

        Ok(())
    }
}

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
//! Configuration management for the ACR storage exporter
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults (60 s refresh, port 9101 on all interfaces)
//! 2. An optional TOML, YAML or JSON file
//! 3. Process environment (`ACR_NAME`, `REFRESH_INTERVAL`, `METRICS_PORT`, ...)
//!
//! The result is validated before the exporter starts; a registry name is
//! required and the refresh interval may not drop below five seconds.
//!
//! # Example
//!
//! ```no_run
//! use acr_exporter_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = ConfigLoader::new();
//!     let config = loader.load_with_overrides(Some("exporter.toml")).await?;
//!
//!     println!("Scraping registry: {}", config.registry.name);
//!     println!("Serving on: {}", config.server.bind_addr());
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{apply_overrides, ConfigFormat, ConfigLoader};
pub use schema::*;
pub use validation::Validator;

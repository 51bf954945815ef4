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
//! Structured logging for the ACR storage exporter
//!
//! One `tracing-subscriber` fmt layer on stderr, in pretty, compact or JSON
//! layout, behind an `EnvFilter`. The filter is the configured level when
//! set, otherwise `RUST_LOG`, otherwise `info`.
//!
//! # Example
//!
//! ```ignore
//! use acr_exporter_observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Json, Some("info"))?;
//! tracing::info!(registry = "contoso", "scrape cycle started");
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, DEFAULT_FILTER};
pub use initialization::{init_tracing, init_tracing_with_config};

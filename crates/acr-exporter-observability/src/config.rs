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
//! Logging settings for the exporter.
//!
//! Logs always go to stderr. Stdout is reserved for the snapshot printed by
//! `--once`.

use std::io::{self, IsTerminal};
use std::str::FromStr;
use thiserror::Error;

/// Filter used when neither an explicit level nor `RUST_LOG` is set
pub const DEFAULT_FILTER: &str = "info";

/// Errors raised while setting up logging
#[derive(Error, Debug)]
pub enum LogError {
    /// Format name not recognised
    #[error("unknown log format '{0}', expected pretty, compact or json")]
    UnknownFormat(String),

    /// Level or directive string rejected by the filter parser
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter {
        /// The rejected filter
        filter: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber is already installed
    #[error("logging already initialised: {0}")]
    AlreadyInitialized(String),
}

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, for a terminal
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// One JSON object per event, for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(LogError::UnknownFormat(s.to_string())),
        }
    }
}

/// Resolved logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Line layout
    pub format: LogFormat,
    /// Explicit level or directive list, e.g. `acr_exporter_metrics=debug`
    pub filter: Option<String>,
    /// Colour escapes in pretty and compact output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::default(),
            filter: None,
            ansi: io::stderr().is_terminal(),
        }
    }
}

impl LogConfig {
    /// Settings for the given format, colour only when stderr is a terminal
    pub fn new(format: LogFormat) -> Self {
        LogConfig {
            format,
            ..Default::default()
        }
    }

    /// Use an explicit filter instead of `RUST_LOG`
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Force colour on or off
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Filter actually applied: explicit, else `RUST_LOG`, else [`DEFAULT_FILTER`]
    pub fn effective_filter(&self) -> String {
        resolve_filter(self.filter.as_deref(), std::env::var("RUST_LOG").ok())
    }
}

fn resolve_filter(explicit: Option<&str>, rust_log: Option<String>) -> String {
    explicit
        .map(str::to_string)
        .or(rust_log.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

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
//! Registry client error types

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while talking to the registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The command-line tool could not be started
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// Command that was attempted, without arguments that carry secrets
        command: String,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// The command ran but exited unsuccessfully
    #[error("{command} failed: {stderr}")]
    CommandFailed {
        /// Command that failed
        command: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Trimmed standard error output
        stderr: String,
    },

    /// The command did not finish within the configured timeout
    #[error("{command} timed out after {after:?}")]
    Timeout {
        /// Command that was killed
        command: String,
        /// Timeout that elapsed
        after: Duration,
    },

    /// The command printed output that could not be decoded
    #[error("malformed output from {context}: {source}")]
    MalformedPayload {
        /// What was being decoded
        context: String,
        /// Decoder failure
        #[source]
        source: serde_json::Error,
    },

    /// Service principal login was rejected
    #[error("registry login failed: {0}")]
    Login(String),

    /// Any other backend failure
    #[error("registry backend error: {0}")]
    Backend(String),
}

impl RegistryError {
    /// Create a Backend error with context
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        RegistryError::Backend(msg.into())
    }

    /// Create a Login error with context
    pub fn login<S: Into<String>>(msg: S) -> Self {
        RegistryError::Login(msg.into())
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, RegistryError::Timeout { .. })
    }

    /// Check if the remote tool reported the failure itself
    pub fn is_command_failure(&self) -> bool {
        matches!(self, RegistryError::CommandFailed { .. })
    }
}

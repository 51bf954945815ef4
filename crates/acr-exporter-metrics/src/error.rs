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
//! Error types for the metrics crate

use std::io;
use thiserror::Error;

/// Result type alias for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors raised while building self-metrics or serving the endpoint
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Registering or encoding a Prometheus collector failed
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The listen address could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested listen address
        addr: String,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// The HTTP server stopped with an I/O error
    #[error("metrics server error: {0}")]
    Serve(#[source] io::Error),
}

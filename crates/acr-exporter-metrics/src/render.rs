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
//! Text exposition rendering for one scrape cycle
//!
//! Rendering is a pure function of the cycle's results. Storage lines keep
//! the order in which the registry listed the repositories.

use crate::naming::{escape_label_value, root_repository_name};
use std::fmt::Write;
use std::time::Duration;

/// Repository count metric name
pub const REPOSITORIES_COUNT: &str = "acr_repositories_count";

/// Per-repository storage metric name
pub const REPOSITORY_STORAGE_BYTES: &str = "acr_repository_storage_bytes";

/// Scrape duration metric name
pub const SCRAPE_DURATION_SECONDS: &str = "acr_metrics_scrape_duration_seconds";

const REPOSITORIES_COUNT_HELP: &str = "Total number of repositories in the ACR";
const REPOSITORY_STORAGE_BYTES_HELP: &str = "Total storage used per ACR repository in bytes";
const SCRAPE_DURATION_SECONDS_HELP: &str = "Duration of the last metrics scrape in seconds";

/// Summed manifest size for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryAggregate {
    /// Sanitised first path segment, the `repository` label
    pub root: String,
    /// Full repository path, the `path` label
    pub path: String,
    /// Sum of manifest sizes in bytes
    pub total_bytes: u64,
}

impl RepositoryAggregate {
    /// Build an aggregate, deriving the root label from the path
    pub fn new(path: impl Into<String>, total_bytes: u64) -> Self {
        let path = path.into();
        RepositoryAggregate {
            root: root_repository_name(&path),
            path,
            total_bytes,
        }
    }
}

/// Everything one successful cycle produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotData {
    /// Number of repositories the listing returned
    pub repository_count: usize,
    /// Aggregates for repositories whose metadata was fetched
    pub aggregates: Vec<RepositoryAggregate>,
    /// Wall-clock duration of the cycle
    pub scrape_duration: Duration,
}

/// Render a cycle's results in the Prometheus text format
pub fn render_snapshot(data: &SnapshotData) -> String {
    let mut out = String::with_capacity(512 + data.aggregates.len() * 96);

    let _ = writeln!(out, "# HELP {REPOSITORIES_COUNT} {REPOSITORIES_COUNT_HELP}");
    let _ = writeln!(out, "# TYPE {REPOSITORIES_COUNT} gauge");
    let _ = writeln!(out, "{REPOSITORIES_COUNT} {}", data.repository_count);
    out.push('\n');

    let _ = writeln!(
        out,
        "# HELP {REPOSITORY_STORAGE_BYTES} {REPOSITORY_STORAGE_BYTES_HELP}"
    );
    let _ = writeln!(out, "# TYPE {REPOSITORY_STORAGE_BYTES} gauge");
    for aggregate in &data.aggregates {
        let _ = writeln!(
            out,
            "{REPOSITORY_STORAGE_BYTES}{{repository=\"{}\", path=\"{}\"}} {}",
            aggregate.root,
            escape_label_value(&aggregate.path),
            aggregate.total_bytes
        );
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "# HELP {SCRAPE_DURATION_SECONDS} {SCRAPE_DURATION_SECONDS_HELP}"
    );
    let _ = writeln!(out, "# TYPE {SCRAPE_DURATION_SECONDS} gauge");
    let _ = writeln!(
        out,
        "{SCRAPE_DURATION_SECONDS} {:.2}",
        data.scrape_duration.as_secs_f64()
    );

    out
}

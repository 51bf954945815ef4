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
//! Scrape-and-serve core of the ACR storage exporter
//!
//! A background [`Scheduler`] runs the [`Aggregator`] on a fixed interval.
//! Each cycle lists the registry's repositories, sums manifest sizes per
//! repository and publishes a freshly rendered snapshot into the
//! [`SnapshotStore`]. The [`MetricsServer`] answers `GET /metrics` from
//! that store without ever touching the registry.
//!
//! # Metric families
//!
//! - `acr_repositories_count`: repositories in the last successful listing
//! - `acr_repository_storage_bytes{repository, path}`: summed manifest bytes
//! - `acr_metrics_scrape_duration_seconds`: duration of the last cycle
//!
//! Optional self-metrics (`acr_exporter_*`) are appended when enabled.
//!
//! # Example
//!
//! ```rust,no_run
//! use acr_exporter_metrics::{Aggregator, MetricsServer, Scheduler, SnapshotStore};
//! use acr_exporter_registry::AzCliRegistry;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SnapshotStore::new();
//! let client = Arc::new(AzCliRegistry::new("az", Duration::from_secs(120)));
//! let scheduler = Scheduler::new(
//!     Aggregator::new(client, "contoso", store.clone()),
//!     Duration::from_secs(60),
//! );
//!
//! let shutdown = CancellationToken::new();
//! let token = shutdown.clone();
//! tokio::spawn(async move { scheduler.run(token).await });
//!
//! MetricsServer::new(store, "0.0.0.0:9101").serve(shutdown).await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod error;
pub mod exporter_metrics;
pub mod naming;
pub mod render;
pub mod scheduler;
pub mod server;
pub mod snapshot;

pub use aggregator::{Aggregator, CycleOutcome, CycleReport};
pub use error::{MetricsError, MetricsResult};
pub use exporter_metrics::ExporterMetrics;
pub use naming::{escape_label_value, extract_root_repo, root_repository_name, sanitize_repo_name};
pub use render::{render_snapshot, RepositoryAggregate, SnapshotData};
pub use scheduler::{Scheduler, SchedulerState, MIN_REFRESH_INTERVAL};
pub use server::{MetricsServer, EXPOSITION_CONTENT_TYPE};
pub use snapshot::SnapshotStore;

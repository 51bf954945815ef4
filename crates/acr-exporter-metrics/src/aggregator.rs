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
//! One scrape cycle: list, fetch, sum, render, publish
//!
//! The whole snapshot is built in a local buffer and published once at the
//! end of a successful cycle. A failed listing leaves the previous snapshot
//! in place and records the failure as the store's last error. A failed
//! metadata call only drops that repository from the snapshot.

use acr_exporter_registry::{ManifestRecord, RegistryClient};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::exporter_metrics::ExporterMetrics;
use crate::render::{render_snapshot, RepositoryAggregate, SnapshotData};
use crate::snapshot::SnapshotStore;

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new snapshot was published
    Published,
    /// The repository listing failed; the previous snapshot is still served
    ListingFailed {
        /// Error recorded as the store's last error
        error: String,
    },
}

impl CycleOutcome {
    /// Label value for [`CycleOutcome::Published`]
    pub const PUBLISHED: &'static str = "published";
    /// Label value for [`CycleOutcome::ListingFailed`]
    pub const LISTING_FAILED: &'static str = "listing_failed";

    /// Metric label for this outcome
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Published => Self::PUBLISHED,
            CycleOutcome::ListingFailed { .. } => Self::LISTING_FAILED,
        }
    }
}

/// Summary of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// How the cycle ended
    pub outcome: CycleOutcome,
    /// Repositories returned by the listing
    pub repositories: usize,
    /// Repositories with a storage line in the snapshot
    pub succeeded: usize,
    /// Repositories skipped after a metadata failure
    pub failed: usize,
    /// Wall-clock duration of the cycle
    pub duration: Duration,
}

impl CycleReport {
    /// Whether a new snapshot was published
    pub fn is_published(&self) -> bool {
        self.outcome == CycleOutcome::Published
    }
}

/// Drives scrape cycles against one registry
pub struct Aggregator {
    client: Arc<dyn RegistryClient>,
    registry: String,
    store: SnapshotStore,
    metrics: Option<ExporterMetrics>,
}

impl Aggregator {
    /// Create an aggregator publishing into `store`
    pub fn new(
        client: Arc<dyn RegistryClient>,
        registry: impl Into<String>,
        store: SnapshotStore,
    ) -> Self {
        Aggregator {
            client,
            registry: registry.into(),
            store,
            metrics: None,
        }
    }

    /// Record cycle outcomes in the given self-metrics
    pub fn with_metrics(mut self, metrics: ExporterMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Registry being scraped
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Store this aggregator publishes into
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Self-metrics, if enabled
    pub fn metrics(&self) -> Option<&ExporterMetrics> {
        self.metrics.as_ref()
    }

    /// Run one cycle
    ///
    /// Never fails outright; failures are reflected in the report and in the
    /// store's last error.
    pub async fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        info!(registry = %self.registry, "Fetching ACR repository metrics");

        let repositories = match self.client.list_repositories(&self.registry).await {
            Ok(repositories) => repositories,
            Err(e) => {
                let message = e.to_string();
                error!(registry = %self.registry, error = %message, "Repository listing failed");
                self.store.set_error(message.clone());
                let report = CycleReport {
                    outcome: CycleOutcome::ListingFailed { error: message },
                    repositories: 0,
                    succeeded: 0,
                    failed: 0,
                    duration: started.elapsed(),
                };
                self.record(&report);
                return report;
            }
        };

        let total = repositories.len();
        let mut aggregates = Vec::with_capacity(total);
        let mut failed = 0;

        for (idx, repository) in repositories.iter().enumerate() {
            debug!(
                registry = %self.registry,
                repository = %repository,
                "Processing repo {}/{}",
                idx + 1,
                total
            );
            match self
                .client
                .list_manifest_metadata(&self.registry, repository)
                .await
            {
                Ok(manifests) => {
                    let total_bytes = manifests
                        .iter()
                        .map(ManifestRecord::size_bytes)
                        .fold(0u64, u64::saturating_add);
                    aggregates.push(RepositoryAggregate::new(repository.as_str(), total_bytes));
                }
                Err(e) => {
                    warn!(
                        registry = %self.registry,
                        repository = %repository,
                        error = %e,
                        "Skipping repository after metadata failure"
                    );
                    failed += 1;
                }
            }
        }

        let duration = started.elapsed();
        let data = SnapshotData {
            repository_count: total,
            aggregates,
            scrape_duration: duration,
        };
        self.store.publish(render_snapshot(&data));
        self.store.clear_error();

        info!(
            registry = %self.registry,
            repositories = total,
            skipped = failed,
            duration_secs = duration.as_secs_f64(),
            "Completed metrics update in {:.2} seconds",
            duration.as_secs_f64()
        );

        let report = CycleReport {
            outcome: CycleOutcome::Published,
            repositories: total,
            succeeded: data.aggregates.len(),
            failed,
            duration,
        };
        self.record(&report);
        report
    }

    fn record(&self, report: &CycleReport) {
        if let Some(metrics) = &self.metrics {
            metrics.record_cycle(report);
        }
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("client", &self.client)
            .field("registry", &self.registry)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

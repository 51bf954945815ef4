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
//! Exporter self-metrics
//!
//! Health of the scrape loop itself, kept in a private Prometheus registry
//! and appended to the snapshot by the endpoint.

use prometheus::{Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::fmt;
use std::sync::Arc;

use crate::aggregator::{CycleOutcome, CycleReport};
use crate::error::MetricsResult;

/// Outcome label for a cycle that panicked
pub const OUTCOME_PANICKED: &str = "panicked";

/// Self-metrics of the exporter
///
/// Cheap to clone and shared between the scheduler and the HTTP handler.
#[derive(Clone)]
pub struct ExporterMetrics {
    inner: Arc<ExporterMetricsInner>,
}

struct ExporterMetricsInner {
    registry: Registry,
    /// 1 when no cycle error is recorded
    up: IntGauge,
    /// Cycles by outcome
    cycles_total: IntCounterVec,
    /// Repositories skipped because their metadata call failed
    repository_failures_total: IntCounter,
    /// Unix time of the last published snapshot
    last_success_timestamp: Gauge,
}

impl ExporterMetrics {
    /// Create and register all exporter metrics
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();

        let up = IntGauge::with_opts(Opts::new(
            "acr_exporter_up",
            "Whether the last scrape cycle completed without a cycle-level error",
        ))?;
        registry.register(Box::new(up.clone()))?;

        let cycles_total = IntCounterVec::new(
            Opts::new(
                "acr_exporter_cycles_total",
                "Scrape cycles run, by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(cycles_total.clone()))?;

        let repository_failures_total = IntCounter::with_opts(Opts::new(
            "acr_exporter_repository_failures_total",
            "Repositories skipped because their manifest metadata could not be fetched",
        ))?;
        registry.register(Box::new(repository_failures_total.clone()))?;

        let last_success_timestamp = Gauge::with_opts(Opts::new(
            "acr_exporter_last_success_timestamp_seconds",
            "Unix timestamp of the last published snapshot",
        ))?;
        registry.register(Box::new(last_success_timestamp.clone()))?;

        // Every outcome is visible from the first scrape
        for outcome in [
            CycleOutcome::PUBLISHED,
            CycleOutcome::LISTING_FAILED,
            OUTCOME_PANICKED,
        ] {
            cycles_total.with_label_values(&[outcome]).inc_by(0);
        }

        Ok(ExporterMetrics {
            inner: Arc::new(ExporterMetricsInner {
                registry,
                up,
                cycles_total,
                repository_failures_total,
                last_success_timestamp,
            }),
        })
    }

    /// Record a finished cycle
    pub fn record_cycle(&self, report: &CycleReport) {
        let inner = &self.inner;
        inner
            .cycles_total
            .with_label_values(&[report.outcome.label()])
            .inc();
        inner.repository_failures_total.inc_by(report.failed as u64);

        match report.outcome {
            CycleOutcome::Published => {
                inner.up.set(1);
                let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
                inner.last_success_timestamp.set(now);
            }
            CycleOutcome::ListingFailed { .. } => inner.up.set(0),
        }
    }

    /// Record a cycle that panicked
    pub fn record_panic(&self) {
        self.inner
            .cycles_total
            .with_label_values(&[OUTCOME_PANICKED])
            .inc();
        self.inner.up.set(0);
    }

    /// Underlying Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Encode all exporter metrics in the text format
    pub fn encode(&self) -> MetricsResult<String> {
        let families = self.inner.registry.gather();
        Ok(TextEncoder::new().encode_to_string(&families)?)
    }
}

impl fmt::Debug for ExporterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterMetrics")
            .field("up", &self.inner.up.get())
            .finish_non_exhaustive()
    }
}

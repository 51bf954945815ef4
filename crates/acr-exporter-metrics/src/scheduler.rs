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
//! Refresh scheduler
//!
//! Runs the aggregator on a fixed interval until cancelled:
//!
//! ```text
//! Idle -> Running -> Sleeping -> Running -> Sleeping -> ...
//! ```
//!
//! A panic inside a cycle is caught, recorded as the store's last error and
//! followed by the normal sleep. Cancellation is honoured before a cycle
//! starts and while sleeping, never in the middle of a cycle.

use acr_exporter_config::MIN_REFRESH_INTERVAL_SECS;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::aggregator::{Aggregator, CycleReport};

/// Shortest interval the scheduler will run with
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(MIN_REFRESH_INTERVAL_SECS);

/// Observable scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, not started
    Idle,
    /// A cycle is in progress
    Running,
    /// Waiting for the next cycle
    Sleeping,
    /// Cancelled and returned
    Stopped,
}

/// Periodic driver for an [`Aggregator`]
#[derive(Debug)]
pub struct Scheduler {
    aggregator: Aggregator,
    interval: Duration,
    state: watch::Sender<SchedulerState>,
}

impl Scheduler {
    /// Create a scheduler
    ///
    /// Intervals below [`MIN_REFRESH_INTERVAL`] are raised to it.
    pub fn new(aggregator: Aggregator, interval: Duration) -> Self {
        let interval = if interval < MIN_REFRESH_INTERVAL {
            warn!(
                requested_secs = interval.as_secs_f64(),
                minimum_secs = MIN_REFRESH_INTERVAL.as_secs(),
                "Refresh interval below minimum, clamping"
            );
            MIN_REFRESH_INTERVAL
        } else {
            interval
        };
        let (state, _) = watch::channel(SchedulerState::Idle);
        Scheduler {
            aggregator,
            interval,
            state,
        }
    }

    /// Effective interval between cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The driven aggregator
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: SchedulerState) {
        self.state.send_modify(|state| *state = next);
    }

    /// Run a single supervised cycle outside the loop
    ///
    /// Returns `None` if the cycle panicked.
    pub async fn run_once(&self) -> Option<CycleReport> {
        let report = self.supervised_cycle().await;
        self.set_state(SchedulerState::Idle);
        report
    }

    async fn supervised_cycle(&self) -> Option<CycleReport> {
        self.set_state(SchedulerState::Running);

        match AssertUnwindSafe(self.aggregator.run_cycle())
            .catch_unwind()
            .await
        {
            Ok(report) => Some(report),
            Err(payload) => {
                let message = format!("scrape cycle panicked: {}", panic_message(&*payload));
                error!(registry = %self.aggregator.registry(), error = %message, "Unexpected error in scrape cycle");
                self.aggregator.store().set_error(message);
                if let Some(metrics) = self.aggregator.metrics() {
                    metrics.record_panic();
                }
                None
            }
        }
    }

    /// Run cycles until `shutdown` is cancelled
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            registry = %self.aggregator.registry(),
            interval_secs = self.interval.as_secs(),
            "Refresh scheduler started"
        );

        while !shutdown.is_cancelled() {
            self.supervised_cycle().await;
            self.set_state(SchedulerState::Sleeping);

            if let Some(next) = chrono::TimeDelta::from_std(self.interval)
                .ok()
                .and_then(|delta| chrono::Local::now().checked_add_signed(delta))
            {
                info!(
                    "Next metrics fetch scheduled at: {}",
                    next.format("%Y-%m-%d %H:%M:%S")
                );
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        self.set_state(SchedulerState::Stopped);
        info!("Refresh scheduler stopped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotStore;
    use acr_exporter_registry::mock::MockRegistry;
    use std::sync::Arc;

    fn scheduler(interval: Duration) -> Scheduler {
        let aggregator = Aggregator::new(
            Arc::new(MockRegistry::new()),
            "contoso",
            SnapshotStore::new(),
        );
        Scheduler::new(aggregator, interval)
    }

    #[test]
    fn test_interval_is_clamped() {
        assert_eq!(scheduler(Duration::from_secs(1)).interval(), MIN_REFRESH_INTERVAL);
        assert_eq!(scheduler(Duration::ZERO).interval(), MIN_REFRESH_INTERVAL);
        assert_eq!(
            scheduler(Duration::from_secs(60)).interval(),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_starts_idle() {
        assert_eq!(scheduler(Duration::from_secs(5)).state(), SchedulerState::Idle);
    }

    #[test]
    fn test_panic_message_extraction() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(&*literal), "boom");
        assert_eq!(panic_message(&*owned), "bang");
        assert_eq!(panic_message(&*other), "unknown panic payload");
    }
}

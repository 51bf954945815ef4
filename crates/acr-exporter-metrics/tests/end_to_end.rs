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
//! End-to-end scrape scenarios over the in-memory registry

#![allow(clippy::unwrap_used)]

use acr_exporter_metrics::{
    root_repository_name, Aggregator, CycleOutcome, Scheduler, SnapshotStore,
};
use acr_exporter_registry::{mock::MockRegistry, ManifestRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn sizes(sizes: &[u64]) -> Vec<ManifestRecord> {
    sizes.iter().copied().map(ManifestRecord::with_size).collect()
}

#[tokio::test]
async fn scenario_a_partial_repository_failure() {
    let registry = MockRegistry::with_repositories(vec![
        ("app/web", sizes(&[600, 400])),
        ("app/api", sizes(&[2500])),
        ("infra/db", sizes(&[99])),
    ]);
    registry
        .fail_repository("infra/db", "ERROR: manifest list throttled")
        .await;
    let store = SnapshotStore::new();
    let aggregator = Aggregator::new(Arc::new(registry.clone()), "contoso", store.clone());

    let report = aggregator.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::Published);
    assert_eq!((report.repositories, report.succeeded, report.failed), (3, 2, 1));

    let snapshot = store.read();
    assert!(snapshot.contains("\nacr_repositories_count 3\n"));
    assert!(snapshot
        .contains("acr_repository_storage_bytes{repository=\"app\", path=\"app/web\"} 1000\n"));
    assert!(snapshot
        .contains("acr_repository_storage_bytes{repository=\"app\", path=\"app/api\"} 2500\n"));
    assert!(!snapshot.contains("infra/db"));
    assert!(snapshot.contains("\nacr_metrics_scrape_duration_seconds "));
    assert_eq!(store.get_error(), "");
    assert_eq!(registry.metadata_calls(), 3);

    let web = snapshot.find("path=\"app/web\"").unwrap();
    let api = snapshot.find("path=\"app/api\"").unwrap();
    assert!(web < api);
}

#[tokio::test]
async fn undecodable_metadata_skips_repository() {
    let registry = MockRegistry::with_repositories(vec![
        ("app/web", sizes(&[10])),
        ("app/blank", vec![]),
        ("app/garbled", vec![]),
    ]);
    registry.set_raw_metadata("app/blank", "").await;
    registry
        .set_raw_metadata("app/garbled", "Traceback (most recent call last):")
        .await;
    let store = SnapshotStore::new();
    let aggregator = Aggregator::new(Arc::new(registry.clone()), "contoso", store.clone());

    let report = aggregator.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::Published);
    assert_eq!((report.succeeded, report.failed), (1, 2));

    let snapshot = store.read();
    assert!(snapshot.contains("\nacr_repositories_count 3\n"));
    assert!(snapshot
        .contains("acr_repository_storage_bytes{repository=\"app\", path=\"app/web\"} 10\n"));
    assert!(!snapshot.contains("app/blank"));
    assert!(!snapshot.contains("app/garbled"));
    assert_eq!(store.get_error(), "");
}

#[tokio::test(start_paused = true)]
async fn scenario_b_listing_failure_is_retried_next_interval() {
    let registry = MockRegistry::with_repositories(vec![("app/web", sizes(&[1]))]);
    registry
        .set_listing_failure(Some("ERROR: Please run 'az login' to setup account."))
        .await;
    let store = SnapshotStore::new();
    let scheduler = Arc::new(Scheduler::new(
        Aggregator::new(Arc::new(registry.clone()), "contoso", store.clone()),
        Duration::from_secs(5),
    ));
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        let shutdown = shutdown.clone();
        async move { scheduler.run(shutdown).await }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(registry.listing_calls(), 1);
    assert_eq!(&*store.read(), "");
    assert_eq!(
        store.get_error(),
        "az acr repository list failed: ERROR: Please run 'az login' to setup account."
    );

    // Still failing on the second attempt: the error is refreshed, nothing published
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(registry.listing_calls(), 2);
    assert_eq!(&*store.read(), "");

    // Recovery on the third attempt
    registry.set_listing_failure(None).await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(registry.listing_calls(), 3);
    assert!(store.read().contains("acr_repositories_count 1\n"));
    assert_eq!(store.get_error(), "");

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn scenario_b_listing_failure_preserves_previous_snapshot() {
    let registry = MockRegistry::with_repositories(vec![("app/web", sizes(&[10]))]);
    let store = SnapshotStore::new();
    let aggregator = Aggregator::new(Arc::new(registry.clone()), "contoso", store.clone());

    aggregator.run_cycle().await;
    let published = store.read();

    registry.add_repository("app/new", sizes(&[5])).await;
    registry.set_listing_failure(Some("ERROR: timeout")).await;
    let report = aggregator.run_cycle().await;

    assert!(!report.is_published());
    assert_eq!(store.read(), published);
    assert!(!store.get_error().is_empty());
}

#[tokio::test]
async fn scenario_c_root_name_is_sanitised() {
    assert_eq!(root_repository_name("my-repo!!/sub"), "my_repo__");

    let registry = MockRegistry::with_repositories(vec![("my-repo!!/sub", sizes(&[42]))]);
    let store = SnapshotStore::new();
    Aggregator::new(Arc::new(registry), "contoso", store.clone())
        .run_cycle()
        .await;

    assert!(store
        .read()
        .contains("acr_repository_storage_bytes{repository=\"my_repo__\", path=\"my-repo!!/sub\"} 42\n"));
}

#[tokio::test]
async fn repository_count_matches_listing() {
    for n in [0usize, 1, 7, 40] {
        let registry = MockRegistry::with_repositories(
            (0..n)
                .map(|i| (format!("team{i}/svc"), sizes(&[i as u64])))
                .collect::<Vec<_>>(),
        );
        let store = SnapshotStore::new();
        Aggregator::new(Arc::new(registry), "contoso", store.clone())
            .run_cycle()
            .await;

        let snapshot = store.read();
        assert!(snapshot.contains(&format!("\nacr_repositories_count {n}\n")));
        assert_eq!(snapshot.matches("acr_repository_storage_bytes{").count(), n);
    }
}

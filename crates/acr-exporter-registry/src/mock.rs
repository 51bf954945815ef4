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
//! In-memory mock registry for testing
//!
//! Provides a thread-safe implementation of [`RegistryClient`](crate::RegistryClient)
//! with scripted failures, call counters and an optional per-call delay.
//! Failures are reported the same way the Azure CLI client reports them, so
//! error messages seen by the aggregator match production.
//!
//! # Examples
//!
//! ```rust,no_run
//! use acr_exporter_registry::{RegistryClient, ManifestRecord, mock::MockRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = MockRegistry::new();
//!     registry
//!         .add_repository("team/app", vec![ManifestRecord::with_size(10)])
//!         .await;
//!     registry.fail_repository("team/app", "ERROR: throttled").await;
//!
//!     let repos = registry.list_repositories("contoso").await?;
//!     assert!(registry.list_manifest_metadata("contoso", &repos[0]).await.is_err());
//!     Ok(())
//! }
//! ```

use crate::azcli::parse_manifest_metadata;
use crate::error::{RegistryError, RegistryResult};
use crate::{ManifestRecord, RegistryClient, RepositoryPath};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Default)]
struct MockState {
    repositories: Vec<(RepositoryPath, Vec<ManifestRecord>)>,
    listing_failure: Option<String>,
    repository_failures: HashMap<RepositoryPath, String>,
    raw_metadata: HashMap<RepositoryPath, String>,
    delay: Option<Duration>,
    panic_on_listing: bool,
}

/// In-memory mock registry for testing
///
/// Clones share state, so a test can keep a handle while the aggregator
/// owns another.
#[derive(Clone, Default)]
pub struct MockRegistry {
    state: Arc<RwLock<MockState>>,
    listing_calls: Arc<AtomicUsize>,
    metadata_calls: Arc<AtomicUsize>,
}

impl MockRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with repositories in the given order
    pub fn with_repositories<P>(repositories: Vec<(P, Vec<ManifestRecord>)>) -> Self
    where
        P: Into<RepositoryPath>,
    {
        let state = MockState {
            repositories: repositories
                .into_iter()
                .map(|(path, manifests)| (path.into(), manifests))
                .collect(),
            ..Default::default()
        };
        MockRegistry {
            state: Arc::new(RwLock::new(state)),
            ..Default::default()
        }
    }

    /// Append a repository, replacing its manifests if it already exists
    pub async fn add_repository(
        &self,
        path: impl Into<RepositoryPath>,
        manifests: Vec<ManifestRecord>,
    ) {
        let path = path.into();
        let mut state = self.state.write().await;
        match state.repositories.iter_mut().find(|(p, _)| *p == path) {
            Some(entry) => entry.1 = manifests,
            None => state.repositories.push((path, manifests)),
        }
    }

    /// Remove a repository from the listing
    pub async fn remove_repository(&self, path: impl Into<RepositoryPath>) {
        let path = path.into();
        self.state
            .write()
            .await
            .repositories
            .retain(|(p, _)| *p != path);
    }

    /// Make the repository listing fail with the given stderr, or succeed again with `None`
    pub async fn set_listing_failure(&self, stderr: Option<&str>) {
        self.state.write().await.listing_failure = stderr.map(str::to_string);
    }

    /// Make metadata calls for one repository fail with the given stderr
    pub async fn fail_repository(&self, path: impl Into<RepositoryPath>, stderr: &str) {
        self.state
            .write()
            .await
            .repository_failures
            .insert(path.into(), stderr.to_string());
    }

    /// Answer metadata calls for one repository with raw CLI output
    ///
    /// The output goes through the same decoder as the Azure CLI client, so
    /// blank or non-JSON text yields [`RegistryError::MalformedPayload`].
    pub async fn set_raw_metadata(&self, path: impl Into<RepositoryPath>, stdout: &str) {
        self.state
            .write()
            .await
            .raw_metadata
            .insert(path.into(), stdout.to_string());
    }

    /// Sleep this long inside every call
    pub async fn set_delay(&self, delay: Duration) {
        self.state.write().await.delay = Some(delay);
    }

    /// Panic inside the next listing calls, to exercise supervisor recovery
    pub async fn set_panic_on_listing(&self, panic: bool) {
        self.state.write().await.panic_on_listing = panic;
    }

    /// Number of repository listings served so far
    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    /// Number of metadata calls served so far
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = self.state.read().await.delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl fmt::Debug for MockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRegistry")
            .field("listing_calls", &self.listing_calls())
            .field("metadata_calls", &self.metadata_calls())
            .finish()
    }
}

#[async_trait]
impl RegistryClient for MockRegistry {
    async fn list_repositories(&self, _registry: &str) -> RegistryResult<Vec<RepositoryPath>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let (panic_requested, failure, repositories) = {
            let state = self.state.read().await;
            (
                state.panic_on_listing,
                state.listing_failure.clone(),
                state
                    .repositories
                    .iter()
                    .map(|(path, _)| path.clone())
                    .collect::<Vec<_>>(),
            )
        };

        if panic_requested {
            panic!("mock registry listing panicked");
        }
        if let Some(stderr) = failure {
            return Err(RegistryError::CommandFailed {
                command: "az acr repository list".to_string(),
                code: Some(1),
                stderr,
            });
        }
        Ok(repositories)
    }

    async fn list_manifest_metadata(
        &self,
        _registry: &str,
        repository: &RepositoryPath,
    ) -> RegistryResult<Vec<ManifestRecord>> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let state = self.state.read().await;
        let command = "az acr manifest list-metadata".to_string();
        if let Some(stderr) = state.repository_failures.get(repository) {
            return Err(RegistryError::CommandFailed {
                command,
                code: Some(1),
                stderr: stderr.clone(),
            });
        }
        if let Some(stdout) = state.raw_metadata.get(repository) {
            return parse_manifest_metadata(repository, stdout);
        }
        state
            .repositories
            .iter()
            .find(|(path, _)| path == repository)
            .map(|(_, manifests)| manifests.clone())
            .ok_or_else(|| RegistryError::CommandFailed {
                command,
                code: Some(3),
                stderr: format!("ERROR: repository {repository} not found"),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listing_preserves_order() {
        let registry = MockRegistry::with_repositories(vec![
            ("zeta", vec![]),
            ("alpha/one", vec![]),
            ("mid", vec![]),
        ]);
        let repos = registry.list_repositories("contoso").await.unwrap();
        let names: Vec<&str> = repos.iter().map(RepositoryPath::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha/one", "mid"]);
        assert_eq!(registry.listing_calls(), 1);
    }

    #[tokio::test]
    async fn test_add_repository_replaces_manifests() {
        let registry = MockRegistry::new();
        registry
            .add_repository("a", vec![ManifestRecord::with_size(1)])
            .await;
        registry
            .add_repository("a", vec![ManifestRecord::with_size(5)])
            .await;

        let repos = registry.list_repositories("r").await.unwrap();
        assert_eq!(repos.len(), 1);
        let manifests = registry.list_manifest_metadata("r", &repos[0]).await.unwrap();
        assert_eq!(manifests, vec![ManifestRecord::with_size(5)]);
    }

    #[tokio::test]
    async fn test_listing_failure_and_recovery() {
        let registry = MockRegistry::with_repositories(vec![("a", vec![])]);
        registry.set_listing_failure(Some("ERROR: denied")).await;

        let err = registry.list_repositories("r").await.unwrap_err();
        assert_eq!(err.to_string(), "az acr repository list failed: ERROR: denied");

        registry.set_listing_failure(None).await;
        assert_eq!(registry.list_repositories("r").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_repository_failure_and_unknown_repository() {
        let registry = MockRegistry::with_repositories(vec![("a", vec![])]);
        registry.fail_repository("a", "ERROR: throttled").await;

        let failed = registry
            .list_manifest_metadata("r", &RepositoryPath::from("a"))
            .await;
        assert!(failed.unwrap_err().is_command_failure());

        let unknown = registry
            .list_manifest_metadata("r", &RepositoryPath::from("ghost"))
            .await;
        assert!(unknown.is_err());
        assert_eq!(registry.metadata_calls(), 2);
    }

    #[tokio::test]
    async fn test_raw_metadata_is_decoded() {
        let registry = MockRegistry::with_repositories(vec![("app/web", vec![]), ("app/api", vec![])]);
        registry.set_raw_metadata("app/web", "").await;
        registry
            .set_raw_metadata("app/api", r#"[{"imageSize": 7}]"#)
            .await;

        let blank = registry
            .list_manifest_metadata("r", &RepositoryPath::from("app/web"))
            .await
            .unwrap_err();
        assert!(matches!(blank, RegistryError::MalformedPayload { .. }));

        let decoded = registry
            .list_manifest_metadata("r", &RepositoryPath::from("app/api"))
            .await
            .unwrap();
        assert_eq!(decoded, vec![ManifestRecord::with_size(7)]);
    }

    #[tokio::test]
    async fn test_remove_repository() {
        let registry = MockRegistry::with_repositories(vec![("a", vec![]), ("b", vec![])]);
        registry.remove_repository("a").await;
        let repos = registry.list_repositories("r").await.unwrap();
        assert_eq!(repos, vec![RepositoryPath::from("b")]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let registry = MockRegistry::new();
        let handle = registry.clone();
        handle.add_repository("shared", vec![]).await;
        assert_eq!(registry.list_repositories("r").await.unwrap().len(), 1);
        assert_eq!(handle.listing_calls(), 1);
    }
}

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
//! Container registry access for the ACR storage exporter
//!
//! This crate defines the [`RegistryClient`] trait, the single seam between
//! the metric aggregation logic and the registry itself. Two implementations
//! are provided:
//!
//! - [`AzCliRegistry`]: shells out to the Azure CLI (`az acr ...`)
//! - [`mock::MockRegistry`]: in-memory registry for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use acr_exporter_registry::{RegistryClient, mock::MockRegistry, ManifestRecord};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = MockRegistry::with_repositories(vec![(
//!     "team/app",
//!     vec![ManifestRecord::with_size(1024)],
//! )]);
//!
//! for repo in registry.list_repositories("contoso").await? {
//!     let manifests = registry.list_manifest_metadata("contoso", &repo).await?;
//!     let total: u64 = manifests.iter().map(ManifestRecord::size_bytes).sum();
//!     println!("{repo}: {total} bytes");
//! }
//! # Ok(())
//! # }
//! ```

pub mod azcli;
pub mod error;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use azcli::AzCliRegistry;
pub use error::{RegistryError, RegistryResult};

/// Full path of a repository inside a registry, e.g. `team/app/api`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryPath(String);

impl RepositoryPath {
    /// Wrap a repository path as reported by the registry
    pub fn new(path: impl Into<String>) -> Self {
        RepositoryPath(path.into())
    }

    /// Borrow the path
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepositoryPath {
    fn from(path: &str) -> Self {
        RepositoryPath::new(path)
    }
}

impl From<String> for RepositoryPath {
    fn from(path: String) -> Self {
        RepositoryPath(path)
    }
}

/// One manifest as reported by `az acr manifest list-metadata`
///
/// Only the fields the exporter needs are decoded; everything else in the
/// payload is ignored. A missing or null `imageSize` counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRecord {
    /// Content digest (`sha256:...`)
    #[serde(default)]
    pub digest: Option<String>,

    /// Tags pointing at this manifest
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// Reported image size in bytes
    #[serde(default)]
    pub image_size: Option<u64>,
}

impl ManifestRecord {
    /// A manifest with only a size, mostly useful in tests
    pub fn with_size(image_size: u64) -> Self {
        ManifestRecord {
            image_size: Some(image_size),
            ..Default::default()
        }
    }

    /// Size in bytes, zero when the registry did not report one
    pub fn size_bytes(&self) -> u64 {
        self.image_size.unwrap_or(0)
    }
}

/// Read-only view of a container registry
///
/// Implementations must be safe to share between the scheduler task and
/// anything else holding the client.
#[async_trait]
pub trait RegistryClient: Send + Sync + fmt::Debug {
    /// List every repository path in the registry, in registry order
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached or the listing
    /// command fails. Callers treat this as a failed cycle.
    async fn list_repositories(&self, registry: &str) -> RegistryResult<Vec<RepositoryPath>>;

    /// List manifest metadata for one repository
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or its output cannot be decoded.
    /// Callers skip the repository and carry on with the rest.
    async fn list_manifest_metadata(
        &self,
        registry: &str,
        repository: &RepositoryPath,
    ) -> RegistryResult<Vec<ManifestRecord>>;
}

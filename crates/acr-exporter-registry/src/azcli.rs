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
//! Registry client backed by the Azure CLI
//!
//! Every call spawns `az` with a bounded runtime. A call that exceeds the
//! timeout is killed and reported as [`RegistryError::Timeout`].
//!
//! Commands used:
//!
//! - `az login --service-principal -u <id> -p <secret> --tenant <tenant>`
//! - `az acr repository list --name <registry> -o tsv`
//! - `az acr manifest list-metadata -r <registry> -n <repository> -o json`

use crate::error::{RegistryError, RegistryResult};
use crate::{ManifestRecord, RegistryClient, RepositoryPath};
use acr_exporter_config::{RegistryConfig, ServicePrincipal};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Azure CLI registry client
#[derive(Debug, Clone)]
pub struct AzCliRegistry {
    az_path: String,
    timeout: Duration,
}

impl AzCliRegistry {
    /// Create a client that runs the given `az` executable
    pub fn new(az_path: impl Into<String>, timeout: Duration) -> Self {
        AzCliRegistry {
            az_path: az_path.into(),
            timeout,
        }
    }

    /// Create a client from the registry section of the configuration
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.az_path.clone(), config.command_timeout())
    }

    /// Per-command timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Log in with a service principal
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Login`] if the CLI rejects the credentials,
    /// or a spawn/timeout error if the CLI cannot be run.
    pub async fn login(&self, principal: &ServicePrincipal) -> RegistryResult<()> {
        info!(client_id = %principal.client_id, tenant = %principal.tenant_id, "Logging in with service principal");
        let args = [
            "login",
            "--service-principal",
            "-u",
            principal.client_id.as_str(),
            "-p",
            principal.client_secret.as_str(),
            "--tenant",
            principal.tenant_id.as_str(),
        ];
        match self.run(&args).await {
            Ok(_) => Ok(()),
            Err(RegistryError::CommandFailed { stderr, .. }) => Err(RegistryError::login(stderr)),
            Err(e) => Err(e),
        }
    }

    /// Run the CLI and return its standard output
    async fn run(&self, args: &[&str]) -> RegistryResult<String> {
        let command = describe(args);
        debug!(command = %command, "Running registry command");

        let mut cmd = Command::new(&self.az_path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| RegistryError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => {
                warn!(command = %command, timeout = ?self.timeout, "Registry command timed out");
                return Err(RegistryError::Timeout {
                    command,
                    after: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RegistryError::CommandFailed {
                command,
                code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl RegistryClient for AzCliRegistry {
    async fn list_repositories(&self, registry: &str) -> RegistryResult<Vec<RepositoryPath>> {
        let stdout = self
            .run(&["acr", "repository", "list", "--name", registry, "-o", "tsv"])
            .await?;
        Ok(parse_repository_listing(&stdout))
    }

    async fn list_manifest_metadata(
        &self,
        registry: &str,
        repository: &RepositoryPath,
    ) -> RegistryResult<Vec<ManifestRecord>> {
        let stdout = self
            .run(&[
                "acr",
                "manifest",
                "list-metadata",
                "-r",
                registry,
                "-n",
                repository.as_str(),
                "-o",
                "json",
            ])
            .await?;
        parse_manifest_metadata(repository, &stdout)
    }
}

/// Human-readable command name: `az` plus the leading subcommands
///
/// Stops at the first flag so credentials never reach logs or errors.
fn describe(args: &[&str]) -> String {
    let mut parts = vec!["az"];
    parts.extend(args.iter().take_while(|a| !a.starts_with('-')).copied());
    parts.join(" ")
}

/// Split the TSV repository listing into paths, one per non-blank line
pub fn parse_repository_listing(stdout: &str) -> Vec<RepositoryPath> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(RepositoryPath::from)
        .collect()
}

/// Decode the JSON manifest listing for one repository
///
/// Blank output is not JSON and fails like any other undecodable payload.
pub fn parse_manifest_metadata(
    repository: &RepositoryPath,
    stdout: &str,
) -> RegistryResult<Vec<ManifestRecord>> {
    serde_json::from_str(stdout).map_err(|source| RegistryError::MalformedPayload {
        context: format!("manifest metadata for {repository}"),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_stops_at_flags() {
        assert_eq!(
            describe(&["acr", "repository", "list", "--name", "contoso"]),
            "az acr repository list"
        );
        assert_eq!(
            describe(&["login", "--service-principal", "-p", "hunter2"]),
            "az login"
        );
    }

    #[test]
    fn test_parse_repository_listing() {
        let repos = parse_repository_listing("team/app\nteam/api\r\n\nlone\n");
        let names: Vec<&str> = repos.iter().map(RepositoryPath::as_str).collect();
        assert_eq!(names, vec!["team/app", "team/api", "lone"]);
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(parse_repository_listing("").is_empty());
        assert!(parse_repository_listing("\n  \n").is_empty());
    }

    #[test]
    fn test_parse_manifest_metadata_sums() {
        let repo = RepositoryPath::from("team/app");
        let records = parse_manifest_metadata(
            &repo,
            r#"[{"imageSize": 100}, {"imageSize": 250, "tags": ["latest"]}, {}]"#,
        )
        .unwrap();
        let total: u64 = records.iter().map(ManifestRecord::size_bytes).sum();
        assert_eq!(records.len(), 3);
        assert_eq!(total, 350);
    }

    #[test]
    fn test_parse_manifest_metadata_rejects_garbage() {
        let repo = RepositoryPath::from("team/app");
        let err = parse_manifest_metadata(&repo, "ERROR: not json").unwrap_err();
        assert!(matches!(err, RegistryError::MalformedPayload { .. }));
        assert!(err.to_string().contains("team/app"));
    }

    #[test]
    fn test_parse_manifest_metadata_blank_is_malformed() {
        let repo = RepositoryPath::from("app/web");
        for stdout in ["", "  \n"] {
            let err = parse_manifest_metadata(&repo, stdout).unwrap_err();
            assert!(matches!(err, RegistryError::MalformedPayload { .. }));
        }
        assert!(parse_manifest_metadata(&repo, "[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let client = AzCliRegistry::new(
            "/nonexistent/acr-exporter/az",
            Duration::from_secs(5),
        );
        let err = client.list_repositories("contoso").await.unwrap_err();
        assert!(matches!(err, RegistryError::Spawn { .. }));
        assert!(err.to_string().starts_with("failed to run az acr repository list"));
    }

    #[test]
    fn test_from_config() {
        let config = RegistryConfig {
            name: "contoso".to_string(),
            az_path: "/opt/az/bin/az".to_string(),
            command_timeout_secs: 7,
            credentials: None,
        };
        let client = AzCliRegistry::from_config(&config);
        assert_eq!(client.timeout(), Duration::from_secs(7));
        assert_eq!(client.az_path, "/opt/az/bin/az");
    }
}

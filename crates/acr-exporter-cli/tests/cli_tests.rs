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
//! Command-line startup behaviour of the `acr-exporter` binary

#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

const EXPORTER_ENV: [&str; 12] = [
    "ACR_NAME",
    "REFRESH_INTERVAL",
    "ACR_COMMAND_TIMEOUT",
    "AZ_PATH",
    "AZURE_CLIENT_ID",
    "AZURE_CLIENT_SECRET",
    "AZURE_TENANT_ID",
    "METRICS_HOST",
    "METRICS_PORT",
    "EXPORTER_METRICS",
    "LOG_LEVEL",
    "LOG_FORMAT",
];

/// Exporter command with a clean environment
#[allow(deprecated)]
fn exporter() -> Command {
    let mut cmd = Command::cargo_bin("acr-exporter").unwrap();
    for var in EXPORTER_ENV {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_flags() {
    exporter()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--refresh-interval"))
        .stdout(predicate::str::contains("--once"));
}

#[test]
fn test_missing_registry_exits_with_error() {
    exporter()
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Missing required configuration field: registry.name",
        ));
}

#[test]
fn test_sub_minimum_interval_is_rejected() {
    exporter()
        .env("ACR_NAME", "contoso")
        .env("REFRESH_INTERVAL", "3")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("refresh interval must be >= 5, got 3"));
}

#[test]
fn test_unparseable_interval_names_the_variable() {
    exporter()
        .env("ACR_NAME", "contoso")
        .env("REFRESH_INTERVAL", "soon")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("REFRESH_INTERVAL=soon"));
}

#[test]
fn test_flag_overrides_environment() {
    exporter()
        .env("ACR_NAME", "contoso")
        .env("REFRESH_INTERVAL", "30")
        .args(["--refresh-interval", "2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("got 2"));
}

#[test]
fn test_missing_config_file() {
    exporter()
        .args(["--config", "/nonexistent/acr-exporter.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
}

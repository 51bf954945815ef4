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
//! `--once` against a stand-in `az` executable
//!
//! Kept to a single test so the script is never being written while another
//! test in this binary spawns a process.

#![cfg(unix)]
#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

const FAKE_AZ: &str = r#"#!/bin/sh
if [ "$1 $2 $3" = "acr repository list" ]; then
  if [ "$5" = "broken" ]; then
    echo "ERROR: registry broken not found" >&2
    exit 1
  fi
  printf 'app/web\napp/api\ninfra/db\n'
  exit 0
fi
if [ "$1 $2 $3" = "acr manifest list-metadata" ]; then
  case "$7" in
    app/web) echo '[{"imageSize":600},{"imageSize":400}]' ;;
    app/api) echo '[{"imageSize":2500}]' ;;
    *) echo "ERROR: throttled" >&2; exit 1 ;;
  esac
  exit 0
fi
exit 2
"#;

#[test]
#[allow(deprecated)]
fn test_once_prints_snapshot() {
    let dir = TempDir::new().unwrap();
    let az = dir.path().join("az");
    fs::write(&az, FAKE_AZ).unwrap();
    fs::set_permissions(&az, fs::Permissions::from_mode(0o755)).unwrap();

    let run = |registry: &str| {
        let mut cmd = Command::cargo_bin("acr-exporter").unwrap();
        for var in ["AZURE_CLIENT_ID", "AZURE_CLIENT_SECRET", "AZURE_TENANT_ID", "REFRESH_INTERVAL"] {
            cmd.env_remove(var);
        }
        cmd.env("ACR_NAME", registry)
            .env("AZ_PATH", &az)
            .args(["--once", "--log-format", "compact"]);
        cmd
    };

    run("contoso")
        .assert()
        .success()
        .stdout(predicate::str::contains("acr_repositories_count 3\n"))
        .stdout(predicate::str::contains(
            "acr_repository_storage_bytes{repository=\"app\", path=\"app/web\"} 1000\n",
        ))
        .stdout(predicate::str::contains(
            "acr_repository_storage_bytes{repository=\"app\", path=\"app/api\"} 2500\n",
        ))
        .stdout(predicate::str::contains("infra/db").not());

    run("broken")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

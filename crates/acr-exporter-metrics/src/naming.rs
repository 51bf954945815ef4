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
//! Metric name and label helpers

use std::borrow::Cow;

/// First segment of a repository path
///
/// `"team/app/api"` gives `"team"`; a path without `/` is returned whole.
pub fn extract_root_repo(path: &str) -> &str {
    path.split_once('/').map_or(path, |(root, _)| root)
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`
///
/// Works per character, so a multi-byte character becomes a single `_`.
pub fn sanitize_repo_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Value of the `repository` label for a repository path
pub fn root_repository_name(path: &str) -> String {
    sanitize_repo_name(extract_root_repo(path))
}

/// Escape a label value for the text exposition format
///
/// Backslash, double quote and line feed are the only characters that need
/// escaping; registry paths normally contain none of them.
pub fn escape_label_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', '"', '\n']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

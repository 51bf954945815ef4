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
//! Shared holder for the latest snapshot and the last cycle error
//!
//! Writers replace the snapshot wholesale; readers get an `Arc<str>` and
//! release the lock before doing any I/O. A reader therefore sees either the
//! previous snapshot or the new one, never a mix.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
struct Shared {
    snapshot: Arc<str>,
    last_error: String,
}

/// Thread-safe handle to the published snapshot
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Shared>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    /// Create a store holding an empty snapshot and no error
    pub fn new() -> Self {
        SnapshotStore {
            inner: Arc::new(RwLock::new(Shared {
                snapshot: Arc::from(""),
                last_error: String::new(),
            })),
        }
    }

    // The guarded values are plain data, so a panic while a guard was held
    // cannot leave them half-updated.
    fn read_guard(&self) -> RwLockReadGuard<'_, Shared> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Shared> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the current snapshot
    pub fn publish(&self, snapshot: impl Into<Arc<str>>) {
        let snapshot = snapshot.into();
        self.write_guard().snapshot = snapshot;
    }

    /// Current snapshot, empty before the first successful cycle
    pub fn read(&self) -> Arc<str> {
        Arc::clone(&self.read_guard().snapshot)
    }

    /// Record the most recent cycle failure
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.write_guard().last_error = message;
    }

    /// Most recent cycle failure, empty when the last cycle succeeded
    pub fn get_error(&self) -> String {
        self.read_guard().last_error.clone()
    }

    /// Forget the last error
    pub fn clear_error(&self) {
        self.write_guard().last_error.clear();
    }

    /// Whether a cycle failure is currently recorded
    pub fn has_error(&self) -> bool {
        !self.read_guard().last_error.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_store_is_empty() {
        let store = SnapshotStore::new();
        assert_eq!(&*store.read(), "");
        assert_eq!(store.get_error(), "");
        assert!(!store.has_error());
    }

    #[test]
    fn test_publish_replaces_wholesale() {
        let store = SnapshotStore::new();
        store.publish("first\n");
        store.publish(String::from("second\n"));
        assert_eq!(&*store.read(), "second\n");
    }

    #[test]
    fn test_error_is_independent_of_snapshot() {
        let store = SnapshotStore::new();
        store.publish("data\n");
        store.set_error("listing failed");
        assert_eq!(&*store.read(), "data\n");
        assert_eq!(store.get_error(), "listing failed");
        store.clear_error();
        assert!(!store.has_error());
        assert_eq!(&*store.read(), "data\n");
    }

    #[test]
    fn test_reader_keeps_old_snapshot_after_publish() {
        let store = SnapshotStore::new();
        store.publish("old");
        let held = store.read();
        store.publish("new");
        assert_eq!(&*held, "old");
        assert_eq!(&*store.read(), "new");
    }

    #[test]
    fn test_recovers_from_poisoned_lock() {
        let store = SnapshotStore::new();
        store.publish("before");
        let poisoner = store.clone();
        let result = thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(result.is_err());
        assert!(store.inner.is_poisoned());

        assert_eq!(&*store.read(), "before");
        store.publish("after");
        assert_eq!(&*store.read(), "after");
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_snapshots() {
        let store = SnapshotStore::new();
        let a = "A".repeat(4096);
        let b = "B".repeat(4096);
        store.publish(a.as_str());

        let writer = {
            let store = store.clone();
            let (a, b) = (a.clone(), b.clone());
            thread::spawn(move || {
                for i in 0..500 {
                    store.publish(if i % 2 == 0 { b.as_str() } else { a.as_str() });
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let (a, b) = (a.clone(), b.clone());
                thread::spawn(move || {
                    for _ in 0..500 {
                        let seen = store.read();
                        assert!(*seen == *a || *seen == *b);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}

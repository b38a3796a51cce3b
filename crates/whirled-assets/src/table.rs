// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The key-addressed cache table and its pending-work queue.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use ahash::AHashMap;
use whirled_core::asset::AssetKey;

use crate::entry::{CacheEntry, EntryState};

/// Per-state entry counts, as reported by `AssetManager::stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries created but not yet queued or claimed.
    pub init: usize,
    /// Entries waiting for a claimer.
    pub queued: usize,
    /// Entries whose loader is running.
    pub working: usize,
    /// Entries holding a value.
    pub complete: usize,
    /// Entries that failed to load.
    pub failed: usize,
}

impl CacheStats {
    /// Number of entries in the table.
    pub fn total(&self) -> usize {
        self.init + self.queued + self.working + self.complete + self.failed
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries ({} complete, {} failed, {} working, {} queued, {} init)",
            self.total(),
            self.complete,
            self.failed,
            self.working,
            self.queued,
            self.init
        )
    }
}

/// Result of [`CacheTable::admit`].
pub(crate) struct Admission {
    /// One entry per requested key, in request order.
    pub entries: Vec<Arc<CacheEntry>>,
    /// A freshly created entry left in `Init` for the caller to load.
    pub inline: Option<Arc<CacheEntry>>,
    /// How many entries were queued by this call.
    pub queued: usize,
}

/// Maps keys to entries and keeps queued entries in FIFO order.
///
/// Lock order is table, then queue. Entries are never removed.
#[derive(Default)]
pub(crate) struct CacheTable {
    entries: RwLock<AHashMap<AssetKey, Arc<CacheEntry>>>,
    queue: Mutex<VecDeque<Arc<CacheEntry>>>,
}

impl CacheTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &AssetKey) -> Option<Arc<CacheEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Looks up every key under a single read lock.
    pub(crate) fn lookup(&self, keys: &[AssetKey]) -> Vec<Option<Arc<CacheEntry>>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        keys.iter().map(|key| entries.get(key).cloned()).collect()
    }

    /// Returns the entry for every key, creating the missing ones.
    ///
    /// New entries are queued before the write lock is released, except the
    /// first one when `claim_inline` is set: that entry is returned in
    /// `Init` and the caller must load it. Duplicate keys map to one entry.
    pub(crate) fn admit(&self, keys: &[AssetKey], claim_inline: bool) -> Admission {
        let mut table = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut entries = Vec::with_capacity(keys.len());
        let mut inline = None;
        let mut fresh = Vec::new();

        for key in keys {
            if let Some(entry) = table.get(key) {
                entries.push(entry.clone());
                continue;
            }
            let entry = Arc::new(CacheEntry::new(key.clone()));
            table.insert(key.clone(), entry.clone());
            if claim_inline && inline.is_none() {
                inline = Some(entry.clone());
            } else {
                entry.enqueue();
                fresh.push(entry.clone());
            }
            entries.push(entry);
        }

        let queued = fresh.len();
        if queued > 0 {
            self.queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(fresh);
        }

        Admission {
            entries,
            inline,
            queued,
        }
    }

    /// Pops queued entries until one can be claimed.
    ///
    /// Entries whose permit was already taken by a stealing caller are
    /// discarded along the way.
    pub(crate) fn pop_claimable(&self) -> Option<Arc<CacheEntry>> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(entry) = queue.pop_front() {
            if entry.try_claim() {
                return Some(entry);
            }
        }
        None
    }

    pub(crate) fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut stats = CacheStats::default();
        for entry in entries.values() {
            match entry.state() {
                EntryState::Init => stats.init += 1,
                EntryState::Queued => stats.queued += 1,
                EntryState::Working => stats.working += 1,
                EntryState::Complete => stats.complete += 1,
                EntryState::Failed => stats.failed += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str) -> AssetKey {
        AssetKey::new(path, "Blob")
    }

    #[test]
    fn test_admit_queues_new_entries_in_order() {
        let table = CacheTable::new();
        let admission = table.admit(&[key("/a"), key("/b"), key("/a")], false);
        assert_eq!(admission.entries.len(), 3);
        assert!(admission.inline.is_none());
        assert_eq!(admission.queued, 2);
        assert!(Arc::ptr_eq(&admission.entries[0], &admission.entries[2]));
        assert_eq!(table.stats().total(), 2);

        assert_eq!(table.pop_claimable().unwrap().key(), &key("/a"));
        assert_eq!(table.pop_claimable().unwrap().key(), &key("/b"));
        assert!(table.pop_claimable().is_none());
    }

    #[test]
    fn test_admit_leaves_first_new_entry_for_inline_load() {
        let table = CacheTable::new();
        table.admit(&[key("/known")], false);

        let admission = table.admit(&[key("/known"), key("/x"), key("/y")], true);
        assert_eq!(admission.queued, 1);
        let inline = admission.inline.expect("an inline entry");
        assert_eq!(inline.key(), &key("/x"));
        assert_eq!(inline.state(), EntryState::Init);
        assert_eq!(admission.entries[2].state(), EntryState::Queued);

        let stats = table.stats();
        assert_eq!(stats.init, 1);
        assert_eq!(stats.queued, 2);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_pop_skips_stolen_entries() {
        let table = CacheTable::new();
        let admission = table.admit(&[key("/a"), key("/b")], false);
        assert!(admission.entries[0].try_claim());

        let next = table.pop_claimable().expect("b is still claimable");
        assert_eq!(next.key(), &key("/b"));
        assert!(table.pop_claimable().is_none());
    }

    #[test]
    fn test_lookup_reports_unknown_keys() {
        let table = CacheTable::new();
        table.admit(&[key("/a")], false);
        let found = table.lookup(&[key("/a"), key("/z")]);
        assert!(found[0].is_some());
        assert!(found[1].is_none());
        assert!(table.get(&key("/z")).is_none());
    }
}

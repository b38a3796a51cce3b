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

//! Per-key cache entries and their state machine.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use whirled_core::asset::{AssetKey, AssetValue};

use crate::error::AssetError;

/// Lifecycle of a cache entry.
///
/// ```text
/// Init ──► Queued ──► Working ──► Complete
///   │                   ▲    └──► Failed
///   └───────────────────┘ (inline claim by block_get)
/// ```
///
/// `Complete` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Created, not yet handed to anyone. An entry stays here only while the
    /// `block_get` call that created it is about to load it inline.
    Init,
    /// Waiting for a worker or a stealing caller.
    Queued,
    /// A thread is running the loader.
    Working,
    /// The value is available.
    Complete,
    /// Loading failed; the entry will never hold a value.
    Failed,
}

impl EntryState {
    /// Returns `true` for `Complete` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, EntryState::Complete | EntryState::Failed)
    }

    /// Lower-case name, for logs and tooling output.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryState::Init => "init",
            EntryState::Queued => "queued",
            EntryState::Working => "working",
            EntryState::Complete => "complete",
            EntryState::Failed => "failed",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Slot {
    state: EntryState,
    value: Option<AssetValue>,
    error: Option<AssetError>,
}

/// The cache record for one key.
///
/// `slot` serializes every state transition together with the value it
/// publishes, so a reader that observes `Complete` always sees the value.
/// `permit` is the binary work permit: it is raised once when the entry is
/// queued and lowered by the single thread that commits to loading it.
pub(crate) struct CacheEntry {
    key: AssetKey,
    slot: Mutex<Slot>,
    permit: AtomicBool,
}

impl CacheEntry {
    pub(crate) fn new(key: AssetKey) -> Self {
        Self {
            key,
            slot: Mutex::new(Slot {
                state: EntryState::Init,
                value: None,
                error: None,
            }),
            permit: AtomicBool::new(false),
        }
    }

    pub(crate) fn key(&self) -> &AssetKey {
        &self.key
    }

    // Every mutation is a single assignment, so a poisoned slot is still consistent.
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> EntryState {
        self.slot().state
    }

    /// `Init → Queued`, raising the work permit.
    pub(crate) fn enqueue(&self) -> bool {
        let mut slot = self.slot();
        if slot.state != EntryState::Init {
            log::warn!("Cannot queue {} from state {}", self.key, slot.state);
            return false;
        }
        slot.state = EntryState::Queued;
        self.permit.store(true, Ordering::Release);
        true
    }

    /// Takes the work permit. Succeeds for exactly one caller per entry.
    pub(crate) fn try_claim(&self) -> bool {
        self.permit
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `Init | Queued → Working`. Called by the thread that owns the work.
    pub(crate) fn begin_work(&self) -> bool {
        let mut slot = self.slot();
        match slot.state {
            EntryState::Init | EntryState::Queued => {
                slot.state = EntryState::Working;
                true
            }
            other => {
                log::warn!("Cannot start work on {} in state {}", self.key, other);
                false
            }
        }
    }

    /// `Working → Complete`.
    pub(crate) fn complete(&self, value: AssetValue) -> bool {
        let mut slot = self.slot();
        if slot.state != EntryState::Working {
            log::warn!("Cannot complete {} in state {}", self.key, slot.state);
            return false;
        }
        slot.value = Some(value);
        slot.state = EntryState::Complete;
        true
    }

    /// `Working → Failed`.
    pub(crate) fn fail(&self, error: AssetError) -> bool {
        let mut slot = self.slot();
        if slot.state != EntryState::Working {
            log::warn!("Cannot fail {} in state {}", self.key, slot.state);
            return false;
        }
        slot.error = Some(error);
        slot.state = EntryState::Failed;
        true
    }

    /// The value, if the entry is `Complete`.
    pub(crate) fn value(&self) -> Option<AssetValue> {
        let slot = self.slot();
        match slot.state {
            EntryState::Complete => slot.value.clone(),
            _ => None,
        }
    }

    /// The failure, if the entry is `Failed`.
    pub(crate) fn error(&self) -> Option<AssetError> {
        let slot = self.slot();
        match slot.state {
            EntryState::Failed => slot.error.clone(),
            _ => None,
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("state", &self.state())
            .finish()
    }
}

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

//! # Whirled Assets
//!
//! A process-lifetime, in-memory memoization layer for immutable-once-loaded
//! game assets.
//!
//! ## Retrieval
//!
//! [`AssetManager`] implements [`AssetProvider`](whirled_core::asset::AssetProvider):
//!
//! - `queue` requests keys in the background and returns immediately.
//! - `try_get` returns whatever is already loaded and queues the rest.
//! - `block_get` waits until every requested key has loaded or failed. While
//!   waiting, the calling thread does useful work: it loads one brand-new key
//!   inline and steals queued keys it needs from the pool.
//!
//! Every operation first canonicalizes paths through the
//! [`FileSystem`](whirled_core::vfs::FileSystem), so case or separator
//! differences collapse onto one cache entry.
//!
//! ## Exactly-once loading
//!
//! Each key owns a cache entry with a small state machine
//! (`Init → Queued → Working → Complete | Failed`) and a single work permit.
//! Whoever wins the permit (a pool worker or a stealing caller) runs the
//! loader; everyone else waits for the entry to become terminal. Entries are
//! never evicted, so a key's loader runs at most once per manager.
//!
//! ## Dependencies and remaps
//!
//! Loaders receive the manager as a `&dyn AssetProvider` and may request
//! other keys while loading. A loader may also remap a key to another one;
//! the target is loaded through the cache and its value aliased onto the
//! original key.
//!
//! A key that waits on itself through a chain of loads on one thread is
//! reported as missing instead of deadlocking. Cycles spanning several
//! threads are not detected; loaders must keep their dependency graph
//! acyclic.

#![warn(missing_docs)]

mod config;
mod entry;
mod error;
mod manager;
mod metrics;
mod pool;
mod registry;
mod signal;
mod table;

pub use config::AssetManagerConfig;
pub use entry::EntryState;
pub use error::AssetError;
pub use manager::AssetManager;
pub use table::CacheStats;

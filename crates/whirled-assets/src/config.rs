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

//! Configuration for the asset manager.

use serde::Deserialize;
use std::thread;

/// Configuration for an [`AssetManager`](crate::AssetManager).
///
/// Every field has a default, so a RON document only needs the fields it
/// changes:
///
/// ```
/// use whirled_assets::AssetManagerConfig;
///
/// let config = AssetManagerConfig::from_ron_str("(worker_threads: Some(2))").unwrap();
/// assert_eq!(config.resolved_worker_threads(), 2);
/// assert_eq!(config.thread_name, "asset-worker");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssetManagerConfig {
    /// Number of background workers.
    ///
    /// `None` uses one less than the available parallelism, leaving a core
    /// for the thread driving the editor. `Some(0)` is valid: every load
    /// then happens on the calling thread inside `block_get`.
    pub worker_threads: Option<usize>,
    /// Prefix for worker thread names; workers are named `{prefix}-{index}`.
    pub thread_name: String,
}

impl Default for AssetManagerConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "asset-worker".to_string(),
        }
    }
}

impl AssetManagerConfig {
    /// Parses a configuration from RON.
    pub fn from_ron_str(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }

    /// The number of workers the pool will actually spawn.
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(0)
        })
    }
}

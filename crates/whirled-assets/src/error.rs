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

//! Per-key load failures.

use thiserror::Error;
use whirled_core::asset::AssetKey;

/// Why a key ended up without a value.
///
/// Failures are local to a key: they are stored in the key's cache entry,
/// logged once, and surface to callers as an empty slot. They are never
/// retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// No registered loader accepted the key.
    #[error("could not find a loader for {key}")]
    NoLoader {
        /// The key that was requested.
        key: AssetKey,
    },

    /// The loader returned an error.
    #[error("failed to load {key}: {message}")]
    LoadFailed {
        /// The key that was requested.
        key: AssetKey,
        /// The loader's error chain.
        message: String,
    },

    /// The loader remapped the key and the target did not load.
    #[error("{key} remaps to {target}, which did not load")]
    RemapFailed {
        /// The key that was requested.
        key: AssetKey,
        /// The key it was remapped to.
        target: AssetKey,
    },

    /// The loader panicked.
    #[error("loader {loader} panicked while loading {key}")]
    LoaderPanicked {
        /// The key that was requested.
        key: AssetKey,
        /// The loader's name.
        loader: String,
    },

    /// The key was requested while the same thread was already loading it.
    #[error("{key} depends on itself")]
    DependencyCycle {
        /// The key that was requested.
        key: AssetKey,
    },
}

impl AssetError {
    /// The key this error is about.
    pub fn key(&self) -> &AssetKey {
        match self {
            AssetError::NoLoader { key }
            | AssetError::LoadFailed { key, .. }
            | AssetError::RemapFailed { key, .. }
            | AssetError::LoaderPanicked { key, .. }
            | AssetError::DependencyCycle { key } => key,
        }
    }
}

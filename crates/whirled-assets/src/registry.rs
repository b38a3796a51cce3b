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

//! Ordered loader registry.

use std::sync::{Arc, PoisonError, RwLock};

use whirled_core::asset::{AssetKey, AssetLoader};
use whirled_core::vfs::FileSystem;

/// Loaders in registration order. Earlier registrations take priority.
#[derive(Default)]
pub(crate) struct LoaderRegistry {
    loaders: RwLock<Vec<Arc<dyn AssetLoader>>>,
}

impl LoaderRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, loader: Arc<dyn AssetLoader>) {
        let mut loaders = self.loaders.write().unwrap_or_else(PoisonError::into_inner);
        log::info!(
            "Registered asset loader '{}' at priority {}",
            loader.name(),
            loaders.len()
        );
        loaders.push(loader);
    }

    /// The first loader that accepts `key`.
    ///
    /// The returned `Arc` is cloned out so the lock is not held while the
    /// loader runs.
    pub(crate) fn find(&self, key: &AssetKey, fs: &dyn FileSystem) -> Option<Arc<dyn AssetLoader>> {
        let loaders = self.loaders.read().unwrap_or_else(PoisonError::into_inner);
        loaders.iter().find(|l| l.can_handle(key, fs)).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.loaders.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

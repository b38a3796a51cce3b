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

use super::{AssetKey, AssetProvider, AssetValue};
use crate::vfs::FileSystem;

/// A pluggable strategy that turns an [`AssetKey`] into an [`AssetValue`].
///
/// Loaders are registered with the cache manager in priority order; the first
/// one whose [`can_handle`](AssetLoader::can_handle) accepts a key is used for
/// it. A loader runs at most once per key, on whichever thread claimed the
/// key's work: a pool worker or a caller blocked in `block_get`.
pub trait AssetLoader: Send + Sync {
    /// A human readable name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Tests whether this loader can produce the key's requested type from
    /// its path. Must be side-effect free and cheap.
    fn can_handle(&self, key: &AssetKey, fs: &dyn FileSystem) -> bool;

    /// Redirects a key to the canonical key that should actually be loaded.
    ///
    /// Returning the key unchanged means "load it here". Returning another
    /// key makes the manager resolve that key through the cache and alias
    /// the result onto the original entry, so two logical names share one
    /// underlying load.
    fn remap_key(&self, key: &AssetKey, _fs: &dyn FileSystem) -> AssetKey {
        key.clone()
    }

    /// Decodes the asset.
    ///
    /// `assets` may be used to request dependencies; those requests go
    /// through the same deduplication and work-stealing rules as any other
    /// caller. Implementations must not assume a particular calling thread.
    fn load(
        &self,
        key: &AssetKey,
        fs: &dyn FileSystem,
        assets: &dyn AssetProvider,
    ) -> anyhow::Result<AssetValue>;
}

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

use super::{Asset, AssetHandle, AssetKey, AssetValue};

/// The retrieval side of the asset cache.
///
/// The vector operations are the primitives; the scalar ones are one-element
/// wrappers. Every returned vector has exactly one slot per requested key,
/// in request order, and a slot is `None` when its key is not (yet)
/// available.
///
/// This trait is object safe so loaders can receive `&dyn AssetProvider`
/// and recurse into the cache for their dependencies. Typed helpers live
/// in [`AssetProviderExt`].
pub trait AssetProvider: Send + Sync {
    /// Requests the keys in the background and returns immediately.
    fn vector_queue(&self, keys: &[AssetKey]);

    /// Returns the keys that are already loaded and queues the unknown ones.
    fn vector_try_get(&self, keys: &[AssetKey]) -> Vec<Option<AssetValue>>;

    /// Waits until every key has finished loading or failed.
    fn vector_block_get(&self, keys: &[AssetKey]) -> Vec<Option<AssetValue>>;

    /// Requests a single key in the background.
    fn queue(&self, key: &AssetKey) {
        self.vector_queue(std::slice::from_ref(key));
    }

    /// Non-blocking lookup of a single key.
    fn try_get(&self, key: &AssetKey) -> Option<AssetValue> {
        self.vector_try_get(std::slice::from_ref(key))
            .into_iter()
            .next()
            .flatten()
    }

    /// Blocking lookup of a single key.
    fn block_get(&self, key: &AssetKey) -> Option<AssetValue> {
        self.vector_block_get(std::slice::from_ref(key))
            .into_iter()
            .next()
            .flatten()
    }
}

/// Typed convenience methods available on every [`AssetProvider`].
///
/// Keys are built from [`Asset::TYPE_NAME`] and results are downcast to
/// [`AssetHandle<A>`]. A value of another concrete type is reported as
/// absent.
pub trait AssetProviderExt: AssetProvider {
    /// Queues `path` as an `A`.
    fn queue_as<A: Asset>(&self, path: &str) {
        self.queue(&AssetKey::of::<A>(path));
    }

    /// Queues every path as an `A`.
    fn vector_queue_as<A: Asset>(&self, paths: &[&str]) {
        self.vector_queue(&typed_keys::<A>(paths));
    }

    /// Non-blocking typed lookup.
    fn try_get_as<A: Asset>(&self, path: &str) -> Option<AssetHandle<A>> {
        self.try_get(&AssetKey::of::<A>(path))?.downcast::<A>()
    }

    /// Blocking typed lookup.
    fn block_get_as<A: Asset>(&self, path: &str) -> Option<AssetHandle<A>> {
        self.block_get(&AssetKey::of::<A>(path))?.downcast::<A>()
    }

    /// Blocking typed lookup of several paths.
    fn vector_block_get_as<A: Asset>(&self, paths: &[&str]) -> Vec<Option<AssetHandle<A>>> {
        self.vector_block_get(&typed_keys::<A>(paths))
            .into_iter()
            .map(|value| value.and_then(|v| v.downcast::<A>()))
            .collect()
    }
}

impl<P: AssetProvider + ?Sized> AssetProviderExt for P {}

fn typed_keys<A: Asset>(paths: &[&str]) -> Vec<AssetKey> {
    paths.iter().map(|p| AssetKey::of::<A>(*p)).collect()
}

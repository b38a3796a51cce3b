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

use super::{Asset, AssetHandle};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A type-erased, shared asset as stored in a cache entry.
///
/// Any number of readers may hold the same value concurrently; cloning only
/// bumps a reference count. The concrete type is recovered with
/// [`AssetValue::downcast`].
#[derive(Clone)]
pub struct AssetValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl AssetValue {
    /// Erases a freshly loaded asset.
    pub fn new<A: Asset>(asset: A) -> Self {
        Self {
            inner: Arc::new(asset),
            type_name: A::TYPE_NAME,
        }
    }

    /// Erases an asset that is already shared.
    pub fn from_handle<A: Asset>(handle: AssetHandle<A>) -> Self {
        Self {
            inner: handle.into_arc(),
            type_name: A::TYPE_NAME,
        }
    }

    /// The [`Asset::TYPE_NAME`] of the concrete value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the concrete value is an `A`.
    pub fn is<A: Asset>(&self) -> bool {
        self.inner.is::<A>()
    }

    /// Recovers a typed handle, or `None` if the value is not an `A`.
    pub fn downcast<A: Asset>(&self) -> Option<AssetHandle<A>> {
        self.inner
            .clone()
            .downcast::<A>()
            .ok()
            .map(AssetHandle::from_arc)
    }

    /// Returns `true` if both values share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for AssetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetValue")
            .field("type_name", &self.type_name)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}

impl<A: Asset> From<AssetHandle<A>> for AssetValue {
    fn from(handle: AssetHandle<A>) -> Self {
        Self::from_handle(handle)
    }
}

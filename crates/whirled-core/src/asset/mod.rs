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

//! Provides the foundational traits and primitive types for the asset cache.
//!
//! This module defines the "common language" for all asset-related operations.
//! It contains the contracts that loaders implement and that the cache manager
//! fulfils, but it has no knowledge of how assets are scheduled or stored.
//!
//! The key components are:
//! - The [`Asset`] trait: a marker for all types that can be cached.
//! - [`AssetKey`]: the `{path, type}` pair addressing a cache entry.
//! - [`AssetValue`] and [`AssetHandle`]: shared, type-erased and typed views of a loaded asset.
//! - [`AssetLoader`] and [`AssetProvider`]: the two sides of the loading contract.

mod handle;
mod key;
mod loader;
mod provider;
mod value;

pub use handle::*;
pub use key::*;
pub use loader::*;
pub use provider::*;
pub use value::*;

/// A marker trait for types that can be managed by the asset cache.
///
/// The supertraits enforce the guarantees the cache relies on:
/// - `Send` + `Sync`: a loaded asset is shared between the pool threads and
///   every caller holding a handle to it.
/// - `'static`: the asset owns its data, so it can live in the cache for the
///   whole session.
///
/// `TYPE_NAME` is the requested type half of an [`AssetKey`]. Loaders compare
/// against it to decide whether they can produce the requested kind of value.
///
/// # Examples
///
/// ```
/// use whirled_core::asset::{Asset, AssetKey};
///
/// struct Palette {
///     colors: Vec<[u8; 3]>,
/// }
///
/// impl Asset for Palette {
///     const TYPE_NAME: &'static str = "Palette";
/// }
///
/// let key = AssetKey::of::<Palette>("/GAMEDATA/COMMON/MENU.PAL");
/// assert_eq!(key.type_name(), "Palette");
/// ```
pub trait Asset: Send + Sync + 'static {
    /// The type name used in cache keys for this asset kind.
    const TYPE_NAME: &'static str;
}

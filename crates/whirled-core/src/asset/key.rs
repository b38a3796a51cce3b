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

use super::Asset;
use std::fmt;

/// The identifying pair used to address a cache entry: a logical path and the
/// requested type.
///
/// Two keys are equal iff both fields are byte-for-byte equal. Paths are not
/// normalized here; the cache manager canonicalizes them through the
/// filesystem before any lookup, so equivalent spellings collapse onto one
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey {
    path: String,
    type_name: String,
}

impl AssetKey {
    /// Creates a key from a path and a type name.
    pub fn new(path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            type_name: type_name.into(),
        }
    }

    /// Creates a key requesting the asset type `A` at `path`.
    pub fn of<A: Asset>(path: impl Into<String>) -> Self {
        Self::new(path, A::TYPE_NAME)
    }

    /// The logical path of the asset.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The requested type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns `true` if this key requests the asset type `A`.
    pub fn is<A: Asset>(&self) -> bool {
        self.type_name == A::TYPE_NAME
    }

    /// Returns a copy of this key pointing at another path.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self::new(path, self.type_name.clone())
    }

    /// Returns a copy of this key requesting another type.
    pub fn with_type(&self, type_name: impl Into<String>) -> Self {
        Self::new(self.path.clone(), type_name)
    }

    /// The lower-cased file extension of the path, without the dot.
    pub fn extension(&self) -> Option<String> {
        crate::vfs::path::extension(&self.path)
    }

    pub(crate) fn set_path(&mut self, path: String) {
        self.path = path;
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.path, self.type_name)
    }
}

/// Rewrites the path of every key in place.
///
/// Used by the manager to canonicalize a batch of requests before lookup.
pub fn map_key_paths(keys: &mut [AssetKey], mut f: impl FnMut(&str) -> String) {
    for key in keys {
        let path = f(&key.path);
        key.set_path(path);
    }
}

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

//! Loaders that hand out file contents without decoding them.
//!
//! Format-specific loaders usually build on these: a mesh loader requests the
//! [`RawFile`] for its path through the cache instead of reading the file
//! itself, so the bytes are read once no matter how many derived assets need
//! them.

use anyhow::Context;
use whirled_core::asset::{Asset, AssetKey, AssetLoader, AssetProvider, AssetValue};
use whirled_core::vfs::{path, FileSystem};

/// The raw bytes of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    /// Canonical path the bytes were read from.
    pub path: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl Asset for RawFile {
    const TYPE_NAME: &'static str = "RawFile";
}

/// The contents of a UTF-8 text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    /// Canonical path the text was read from.
    pub path: String,
    /// File contents.
    pub text: String,
}

impl Asset for TextFile {
    const TYPE_NAME: &'static str = "TextFile";
}

/// Restricts a loader to a set of lower-case extensions; empty accepts all.
#[derive(Debug, Clone, Default)]
struct ExtensionFilter(Vec<String>);

impl ExtensionFilter {
    fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        )
    }

    fn accepts(&self, key: &AssetKey) -> bool {
        if self.0.is_empty() {
            return true;
        }
        key.extension().is_some_and(|ext| self.0.contains(&ext))
    }
}

/// Loads [`RawFile`] assets.
///
/// A missing-file fallback can redirect a request to a sibling file with
/// another extension, e.g. a texture referenced as `.tga` that only ships as
/// `.mip`. The redirected key is loaded (and cached) under its own canonical
/// path, so both names share a single read.
#[derive(Debug, Clone, Default)]
pub struct RawFileLoader {
    filter: ExtensionFilter,
    fallbacks: Vec<(String, String)>,
}

impl RawFileLoader {
    /// A loader accepting every extension.
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader restricted to the given extensions.
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            filter: ExtensionFilter::new(extensions),
            fallbacks: Vec::new(),
        }
    }

    /// Redirects missing `from` files to an existing `to` sibling.
    ///
    /// The `to` extension is accepted by this loader from then on, so the
    /// redirected key always finds a loader.
    pub fn with_fallback(mut self, from: &str, to: &str) -> Self {
        let from = from.trim_start_matches('.').to_ascii_lowercase();
        let to = to.trim_start_matches('.').to_ascii_lowercase();
        if !self.filter.0.is_empty() && !self.filter.0.contains(&to) {
            self.filter.0.push(to.clone());
        }
        self.fallbacks.push((from, to));
        self
    }
}

impl AssetLoader for RawFileLoader {
    fn name(&self) -> &str {
        "RawFileLoader"
    }

    fn can_handle(&self, key: &AssetKey, _fs: &dyn FileSystem) -> bool {
        key.is::<RawFile>() && self.filter.accepts(key)
    }

    fn remap_key(&self, key: &AssetKey, fs: &dyn FileSystem) -> AssetKey {
        if fs.exists(key.path()) {
            return key.clone();
        }
        let Some(ext) = key.extension() else {
            return key.clone();
        };
        for (from, to) in &self.fallbacks {
            if *from != ext {
                continue;
            }
            let candidate = path::with_extension(key.path(), to);
            if fs.exists(&candidate) {
                log::debug!("RawFileLoader: {} falls back to {}", key.path(), candidate);
                return key.with_path(fs.canonicalize(&candidate));
            }
        }
        key.clone()
    }

    fn load(
        &self,
        key: &AssetKey,
        fs: &dyn FileSystem,
        _assets: &dyn AssetProvider,
    ) -> anyhow::Result<AssetValue> {
        let bytes = fs
            .read(key.path())
            .with_context(|| format!("failed to read {}", key.path()))?;
        Ok(AssetValue::new(RawFile {
            path: key.path().to_string(),
            bytes,
        }))
    }
}

/// Loads [`TextFile`] assets.
#[derive(Debug, Clone, Default)]
pub struct TextFileLoader {
    filter: ExtensionFilter,
}

impl TextFileLoader {
    /// A loader accepting every extension.
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader restricted to the given extensions.
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            filter: ExtensionFilter::new(extensions),
        }
    }
}

impl AssetLoader for TextFileLoader {
    fn name(&self) -> &str {
        "TextFileLoader"
    }

    fn can_handle(&self, key: &AssetKey, _fs: &dyn FileSystem) -> bool {
        key.is::<TextFile>() && self.filter.accepts(key)
    }

    fn load(
        &self,
        key: &AssetKey,
        fs: &dyn FileSystem,
        _assets: &dyn AssetProvider,
    ) -> anyhow::Result<AssetValue> {
        let text = fs
            .read_to_string(key.path())
            .with_context(|| format!("failed to read {} as text", key.path()))?;
        Ok(AssetValue::new(TextFile {
            path: key.path().to_string(),
            text,
        }))
    }
}

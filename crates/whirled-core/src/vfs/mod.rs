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

//! Filesystem abstraction consumed by loaders and by key canonicalization.
//!
//! The cache manager never touches storage itself. It only asks a
//! [`FileSystem`] to canonicalize request paths, so that equivalent logical
//! spellings (case differences, redundant separators) collapse onto a single
//! cache entry. Loaders use the same handle to read file contents.

pub mod path;

use std::io;

/// A read-only, thread-safe view over the game data.
pub trait FileSystem: Send + Sync {
    /// Resolves case and alias differences to one authoritative spelling.
    ///
    /// Must be deterministic: two paths naming the same file must produce
    /// the same string. Paths that do not resolve to anything are still
    /// returned in a normalized form.
    fn canonicalize(&self, path: &str) -> String;

    /// Returns `true` if `path` names an existing file.
    fn exists(&self, path: &str) -> bool;

    /// Reads the whole file.
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Reads the whole file as UTF-8 text.
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

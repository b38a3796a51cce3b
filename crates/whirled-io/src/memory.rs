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

//! An in-memory, case-insensitive filesystem.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

use whirled_core::vfs::{path, FileSystem};

/// A [`FileSystem`] backed by an in-memory map.
///
/// Lookups ignore case; [`canonicalize`](FileSystem::canonicalize) returns
/// the spelling the file was inserted with.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: RwLock<HashMap<String, (String, Arc<[u8]>)>>,
}

impl MemoryFs {
    /// Creates an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, builder style.
    pub fn with_file(self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Adds or replaces a file.
    pub fn insert(&self, path: &str, contents: impl Into<Vec<u8>>) {
        let canonical = path::normalize(path);
        let contents: Arc<[u8]> = contents.into().into();
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(canonical.to_lowercase(), (canonical, contents));
    }

    /// The number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no file is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, path: &str) -> Option<(String, Arc<[u8]>)> {
        let folded = path::normalize(path).to_lowercase();
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&folded)
            .cloned()
    }
}

impl FileSystem for MemoryFs {
    fn canonicalize(&self, path: &str) -> String {
        match self.lookup(path) {
            Some((canonical, _)) => canonical,
            None => path::normalize(path),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.lookup(path)
            .map(|(_, contents)| contents.to_vec())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))
    }
}

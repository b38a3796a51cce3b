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

//! On-disk filesystem with case-insensitive path resolution.
//!
//! Game data extracted from its original archives keeps whatever casing the
//! archive tool produced, while the data files reference each other with
//! arbitrary casing. Every lookup therefore first tries the path verbatim and
//! then matches it segment by segment against directory listings, ignoring
//! case.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use whirled_core::vfs::{path, FileSystem};

/// A [`FileSystem`] rooted at a host directory.
#[derive(Debug, Clone)]
pub struct DirectoryFs {
    root: PathBuf,
}

/// The outcome of resolving a logical path.
struct Resolved {
    canonical: String,
    host: Option<PathBuf>,
}

impl DirectoryFs {
    /// Opens `root`, which must be an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("game directory {} does not exist", root.display()),
            ));
        }
        log::info!("DirectoryFs: Serving assets from {}", root.display());
        Ok(Self { root })
    }

    /// Opens the directory named by the environment variable `var`.
    pub fn from_env(var: &str) -> io::Result<Self> {
        let root = std::env::var_os(var).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("environment variable {var} is not set"),
            )
        })?;
        Self::new(root)
    }

    /// The host directory backing this filesystem.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists every file below the root as canonical logical paths, sorted.
    pub fn list_files(&self) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("DirectoryFs: Skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(&self.root).ok()?;
                let segments: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                Some(format!("/{}", segments.join("/")))
            })
            .collect();
        files.sort();
        files
    }

    fn host_path(&self, normalized: &str) -> PathBuf {
        path::segments(normalized).fold(self.root.clone(), |acc, seg| acc.join(seg))
    }

    fn resolve(&self, logical: &str) -> Resolved {
        let normalized = path::normalize(logical);
        let verbatim = self.host_path(&normalized);
        if verbatim.exists() {
            return Resolved {
                canonical: normalized,
                host: Some(verbatim),
            };
        }

        let mut current = self.root.clone();
        let mut canonical = Vec::new();
        for segment in path::segments(&normalized) {
            match find_entry_ignoring_case(&current, segment) {
                Some(name) => {
                    current = current.join(&name);
                    canonical.push(name);
                }
                None => break,
            }
        }
        if canonical.len() < path::segments(&normalized).count() {
            return Resolved {
                canonical: normalized,
                host: None,
            };
        }
        Resolved {
            canonical: format!("/{}", canonical.join("/")),
            host: Some(current),
        }
    }
}

fn find_entry_ignoring_case(dir: &Path, segment: &str) -> Option<String> {
    let wanted = segment.to_lowercase();
    fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .find(|name| name.to_lowercase() == wanted)
}

impl FileSystem for DirectoryFs {
    fn canonicalize(&self, path: &str) -> String {
        self.resolve(path).canonical
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).host.is_some_and(|p| p.is_file())
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        match self.resolve(path).host {
            Some(host) => fs::read(host),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{path} not found"),
            )),
        }
    }
}

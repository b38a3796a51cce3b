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

//! # Whirled IO
//!
//! Concrete collaborators for the asset cache:
//! - [`DirectoryFs`]: a case-insensitive view over an extracted game directory.
//! - [`MemoryFs`]: the same contract backed by an in-memory map.
//! - [`loaders`]: loaders that hand out file contents without decoding them.

#![warn(missing_docs)]

pub mod loaders;

mod directory;
mod memory;

pub use directory::DirectoryFs;
pub use memory::MemoryFs;

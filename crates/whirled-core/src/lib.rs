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

//! # Whirled Core
//!
//! Foundational crate containing the types and interface contracts shared by
//! the asset cache and its collaborators: keys, type-erased values, the loader
//! and provider traits, the filesystem abstraction and metric primitives.
//!
//! Nothing in here knows how assets are cached or scheduled. That lives in
//! `whirled-assets`.

#![warn(missing_docs)]

pub mod asset;
pub mod telemetry;
pub mod vfs;

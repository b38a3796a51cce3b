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

// Loads files from a game directory through the asset cache and reports
// what was found. Run with: cargo run -p whirled-probe -- --root <DIR> <PATH>...

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use whirled_assets::{AssetManager, AssetManagerConfig};
use whirled_core::asset::AssetProviderExt;
use whirled_io::loaders::{RawFile, RawFileLoader, TextFile, TextFileLoader};
use whirled_io::DirectoryFs;

const GAME_ROOT_VAR: &str = "LR2_PATH";

/// Loads game files through the asset cache.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Game data directory. Defaults to `$LR2_PATH`.
    #[arg(long)]
    root: Option<PathBuf>,
    /// Number of background workers. Overrides the config file.
    #[arg(long)]
    workers: Option<usize>,
    /// RON file with an `AssetManagerConfig`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Load the paths as UTF-8 text instead of raw bytes.
    #[arg(long)]
    text: bool,
    /// Print every file under the root instead of loading anything.
    #[arg(long)]
    list: bool,
    /// Paths to load, relative to the root. Case does not matter.
    paths: Vec<String>,
}

fn load_config(cli: &Cli) -> Result<AssetManagerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            AssetManagerConfig::from_ron_str(&source)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => AssetManagerConfig::default(),
    };
    if cli.workers.is_some() {
        config.worker_threads = cli.workers;
    }
    Ok(config)
}

fn main() -> Result<()> {
    whirled_telemetry::init_logging("info");
    let cli = Cli::parse();

    let fs = match &cli.root {
        Some(root) => DirectoryFs::new(root)
            .with_context(|| format!("Cannot open game directory {}", root.display()))?,
        None => DirectoryFs::from_env(GAME_ROOT_VAR)
            .with_context(|| format!("Pass --root or set {}", GAME_ROOT_VAR))?,
    };
    log::debug!("Game directory: {}", fs.root().display());

    if cli.list {
        for path in fs.list_files() {
            println!("{}", path);
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    let manager = AssetManager::new(Arc::new(fs), config)?;
    manager.add_loader(RawFileLoader::new().with_fallback("tga", "mip"));
    manager.add_loader(TextFileLoader::new());

    let paths: Vec<&str> = cli.paths.iter().map(String::as_str).collect();
    let start = Instant::now();
    let sizes: Vec<Option<usize>> = if cli.text {
        manager
            .vector_block_get_as::<TextFile>(&paths)
            .into_iter()
            .map(|file| file.map(|f| f.text.len()))
            .collect()
    } else {
        manager
            .vector_block_get_as::<RawFile>(&paths)
            .into_iter()
            .map(|file| file.map(|f| f.bytes.len()))
            .collect()
    };
    log::info!(
        "Loaded {} paths in {:.2?} with {} workers",
        paths.len(),
        start.elapsed(),
        manager.worker_count()
    );

    for (path, size) in paths.iter().zip(&sizes) {
        match size {
            Some(bytes) => println!("{:>10}  {}", bytes, path),
            None => println!("{:>10}  {}", "missing", path),
        }
    }

    println!();
    println!("{}", manager.stats());
    for (id, value) in manager.metrics().namespace_snapshot("assets") {
        println!("{:<24} {}", id, value);
    }

    Ok(())
}

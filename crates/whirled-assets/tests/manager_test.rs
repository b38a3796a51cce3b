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

use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use whirled_assets::{AssetError, AssetManager, AssetManagerConfig, EntryState};
use whirled_core::asset::{
    Asset, AssetHandle, AssetKey, AssetLoader, AssetProvider, AssetProviderExt, AssetValue,
};
use whirled_core::vfs::{path, FileSystem};
use whirled_io::MemoryFs;
use whirled_telemetry::MetricsRegistry;

// --- Test assets ---

#[derive(Debug)]
struct Blob {
    path: String,
}
impl Asset for Blob {
    const TYPE_NAME: &'static str = "Blob";
}

/// A model and the texture it pulled in while loading.
#[derive(Debug)]
struct Model {
    texture: AssetHandle<Blob>,
}
impl Asset for Model {
    const TYPE_NAME: &'static str = "Model";
}

// --- Test loaders ---

/// Loads any `Blob` that exists in the filesystem and counts invocations per path.
#[derive(Default)]
struct CountingLoader {
    calls: Mutex<HashMap<String, usize>>,
    delay: Duration,
}

impl CountingLoader {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    fn calls(&self, path: &str) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    fn total(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl AssetLoader for CountingLoader {
    fn name(&self) -> &str {
        "counting"
    }

    fn can_handle(&self, key: &AssetKey, _fs: &dyn FileSystem) -> bool {
        key.is::<Blob>()
    }

    fn load(
        &self,
        key: &AssetKey,
        fs: &dyn FileSystem,
        _assets: &dyn AssetProvider,
    ) -> anyhow::Result<AssetValue> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(key.path().to_string())
            .or_default() += 1;
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        anyhow::ensure!(fs.exists(key.path()), "{} does not exist", key.path());
        Ok(AssetValue::new(Blob {
            path: key.path().to_string(),
        }))
    }
}

/// Loads `/x.mdl` as a model whose texture is the `Blob` at `/x.tex`.
struct ModelLoader;

impl AssetLoader for ModelLoader {
    fn can_handle(&self, key: &AssetKey, _fs: &dyn FileSystem) -> bool {
        key.is::<Model>()
    }

    fn load(
        &self,
        key: &AssetKey,
        _fs: &dyn FileSystem,
        assets: &dyn AssetProvider,
    ) -> anyhow::Result<AssetValue> {
        let texture_path = path::with_extension(key.path(), "tex");
        let texture = assets
            .block_get_as::<Blob>(&texture_path)
            .ok_or_else(|| anyhow::anyhow!("missing texture {}", texture_path))?;
        Ok(AssetValue::new(Model { texture }))
    }
}

/// Remaps every `/alias/*` blob onto `/real/*`.
struct AliasLoader;

impl AssetLoader for AliasLoader {
    fn can_handle(&self, key: &AssetKey, _fs: &dyn FileSystem) -> bool {
        key.is::<Blob>() && key.path().starts_with("/alias/")
    }

    fn remap_key(&self, key: &AssetKey, _fs: &dyn FileSystem) -> AssetKey {
        key.with_path(key.path().replacen("/alias/", "/real/", 1))
    }

    fn load(
        &self,
        _key: &AssetKey,
        _fs: &dyn FileSystem,
        _assets: &dyn AssetProvider,
    ) -> anyhow::Result<AssetValue> {
        anyhow::bail!("alias keys are never loaded directly")
    }
}

/// Accepts generic `Texture` requests and hands them to the concrete `Blob` loader.
struct TextureLoader;

impl AssetLoader for TextureLoader {
    fn can_handle(&self, key: &AssetKey, _fs: &dyn FileSystem) -> bool {
        key.type_name() == "Texture"
    }

    fn remap_key(&self, key: &AssetKey, _fs: &dyn FileSystem) -> AssetKey {
        key.with_type(Blob::TYPE_NAME)
    }

    fn load(
        &self,
        _key: &AssetKey,
        _fs: &dyn FileSystem,
        _assets: &dyn AssetProvider,
    ) -> anyhow::Result<AssetValue> {
        anyhow::bail!("textures are always remapped")
    }
}

/// `/ping` needs `/pong` and `/pong` needs `/ping`.
struct CycleLoader;

impl AssetLoader for CycleLoader {
    fn can_handle(&self, key: &AssetKey, _fs: &dyn FileSystem) -> bool {
        key.is::<Model>()
    }

    fn load(
        &self,
        key: &AssetKey,
        _fs: &dyn FileSystem,
        assets: &dyn AssetProvider,
    ) -> anyhow::Result<AssetValue> {
        let other = if key.path() == "/ping" { "/pong" } else { "/ping" };
        match assets.block_get_as::<Model>(other) {
            Some(_) => anyhow::bail!("cycle resolved unexpectedly"),
            None => anyhow::bail!("{} is unavailable", other),
        }
    }
}

struct PanickingLoader;

impl AssetLoader for PanickingLoader {
    fn name(&self) -> &str {
        "panicking"
    }

    fn can_handle(&self, key: &AssetKey, _fs: &dyn FileSystem) -> bool {
        key.path().ends_with(".bad")
    }

    fn load(
        &self,
        _key: &AssetKey,
        _fs: &dyn FileSystem,
        _assets: &dyn AssetProvider,
    ) -> anyhow::Result<AssetValue> {
        panic!("corrupt header");
    }
}

// --- Helpers ---

fn game_fs() -> Arc<MemoryFs> {
    let fs = MemoryFs::new()
        .with_file("/Textures/Grass.tex", "grass")
        .with_file("/Textures/Rock.tex", "rock")
        .with_file("/Models/Tree.tex", "bark")
        .with_file("/Models/Tree.mdl", "tree")
        .with_file("/real/Sky.tex", "sky");
    for i in 0..32 {
        fs.insert(&format!("/Bulk/{}.tex", i), "bulk");
    }
    Arc::new(fs)
}

fn manager(workers: usize, fs: Arc<MemoryFs>) -> Result<AssetManager> {
    let config = AssetManagerConfig {
        worker_threads: Some(workers),
        ..Default::default()
    };
    AssetManager::new(fs, config)
}

const WORKER_COUNTS: [usize; 2] = [0, 3];

// --- Tests ---

#[test]
fn test_concurrent_mixed_requests_load_each_key_once() -> Result<()> {
    for workers in WORKER_COUNTS {
        let manager = Arc::new(manager(workers, game_fs())?);
        let loader = Arc::new(CountingLoader::with_delay(Duration::from_millis(2)));
        manager.add_loader_arc(loader.clone());

        let paths: Vec<String> = (0..32).map(|i| format!("/Bulk/{}.tex", i)).collect();
        let barrier = Arc::new(Barrier::new(6));
        let handles: Vec<_> = (0..6)
            .map(|t| {
                let manager = manager.clone();
                let paths = paths.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
                    barrier.wait();
                    match t % 3 {
                        0 => manager.vector_queue_as::<Blob>(&refs),
                        1 => {
                            for p in &refs {
                                let _ = manager.try_get_as::<Blob>(p);
                            }
                        }
                        _ => {
                            let loaded = manager.vector_block_get_as::<Blob>(&refs);
                            assert!(loaded.iter().all(Option::is_some));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let all = manager.vector_block_get_as::<Blob>(
            &paths.iter().map(String::as_str).collect::<Vec<_>>(),
        );
        assert!(all.iter().all(Option::is_some));
        for p in &paths {
            assert_eq!(loader.calls(p), 1, "{} loaded more than once", p);
        }
        assert_eq!(loader.total(), 32);
    }
    Ok(())
}

#[test]
fn test_case_variants_share_one_value() -> Result<()> {
    for workers in WORKER_COUNTS {
        let manager = manager(workers, game_fs())?;
        let loader = Arc::new(CountingLoader::default());
        manager.add_loader_arc(loader.clone());

        let a = manager.block_get(&AssetKey::of::<Blob>("/textures/grass.TEX"));
        let b = manager.block_get(&AssetKey::of::<Blob>("TEXTURES\\Grass.tex"));
        let (a, b) = (a.expect("loaded"), b.expect("loaded"));
        assert!(a.ptr_eq(&b));
        assert_eq!(a.downcast::<Blob>().unwrap().path, "/Textures/Grass.tex");
        assert_eq!(loader.total(), 1);
        assert_eq!(manager.stats().total(), 1);
    }
    Ok(())
}

#[test]
fn test_remapped_key_aliases_target_value() -> Result<()> {
    for workers in WORKER_COUNTS {
        let manager = Arc::new(manager(workers, game_fs())?);
        let loader = Arc::new(CountingLoader::with_delay(Duration::from_millis(5)));
        manager.add_loader(AliasLoader);
        manager.add_loader_arc(loader.clone());

        let alias = AssetKey::of::<Blob>("/alias/Sky.tex");
        let real = AssetKey::of::<Blob>("/real/Sky.tex");
        let handles: Vec<_> = [alias.clone(), real.clone()]
            .into_iter()
            .map(|key| {
                let manager = manager.clone();
                thread::spawn(move || manager.block_get(&key))
            })
            .collect();
        let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let (a, b) = (values[0].clone().expect("alias"), values[1].clone().expect("real"));
        assert!(a.ptr_eq(&b));
        assert_eq!(loader.calls("/real/Sky.tex"), 1);
        assert_eq!(loader.calls("/alias/Sky.tex"), 0);
        assert!(manager.block_get(&alias).unwrap().ptr_eq(&a));
    }
    Ok(())
}

#[test]
fn test_remap_to_concrete_type_shares_value() -> Result<()> {
    for workers in WORKER_COUNTS {
        let manager = manager(workers, game_fs())?;
        let loader = Arc::new(CountingLoader::default());
        manager.add_loader(TextureLoader);
        manager.add_loader_arc(loader.clone());

        let generic = AssetKey::new("/textures/grass.tex", "Texture");
        let value = manager.block_get(&generic).expect("remapped to a Blob");
        assert!(value.is::<Blob>());
        assert_eq!(
            manager.state(&AssetKey::of::<Blob>("/Textures/Grass.tex")),
            Some(EntryState::Complete)
        );

        let concrete = manager.block_get_as::<Blob>("/Textures/Grass.tex").unwrap();
        assert!(AssetHandle::ptr_eq(&value.downcast::<Blob>().unwrap(), &concrete));
        assert_eq!(loader.calls("/Textures/Grass.tex"), 1);
        assert_eq!(manager.stats().total(), 2);
    }
    Ok(())
}

#[test]
fn test_remap_to_missing_target_fails_original() -> Result<()> {
    let manager = manager(2, game_fs())?;
    manager.add_loader(AliasLoader);
    manager.add_loader(CountingLoader::default());

    let alias = AssetKey::of::<Blob>("/alias/Nowhere.tex");
    assert!(manager.block_get(&alias).is_none());
    assert_eq!(manager.state(&alias), Some(EntryState::Failed));
    assert!(matches!(
        manager.failure(&alias),
        Some(AssetError::RemapFailed { ref target, .. }) if target.path() == "/real/Nowhere.tex"
    ));
    Ok(())
}

#[test]
fn test_recursive_dependency_completes() -> Result<()> {
    for workers in [0, 1, 3] {
        let manager = manager(workers, game_fs())?;
        manager.add_loader(ModelLoader);
        manager.add_loader(CountingLoader::default());

        let model = manager
            .block_get_as::<Model>("/models/tree.mdl")
            .expect("model with its texture");
        let texture = manager.block_get_as::<Blob>("/Models/Tree.tex").unwrap();
        assert!(AssetHandle::ptr_eq(&model.texture, &texture));
    }
    Ok(())
}

#[test]
fn test_recursive_dependencies_with_every_worker_blocked() -> Result<()> {
    let fs = game_fs();
    for i in 0..8 {
        fs.insert(&format!("/Forest/{}.mdl", i), "tree");
        fs.insert(&format!("/Forest/{}.tex", i), "bark");
    }
    let manager = manager(2, fs)?;
    manager.add_loader(ModelLoader);
    manager.add_loader(CountingLoader::with_delay(Duration::from_millis(3)));

    let paths: Vec<String> = (0..8).map(|i| format!("/Forest/{}.mdl", i)).collect();
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    manager.vector_queue_as::<Model>(&refs);
    let models = manager.vector_block_get_as::<Model>(&refs);
    assert!(models.iter().all(Option::is_some));
    Ok(())
}

#[test]
fn test_failures_are_isolated_per_key() -> Result<()> {
    for workers in WORKER_COUNTS {
        let manager = manager(workers, game_fs())?;
        manager.add_loader(CountingLoader::default());

        let keys = [
            AssetKey::of::<Blob>("/Textures/Rock.tex"),
            AssetKey::of::<Blob>("/Textures/Missing.tex"),
        ];
        let values = manager.vector_block_get(&keys);
        assert!(values[0].is_some());
        assert!(values[1].is_none());
        assert_eq!(manager.state(&keys[1]), Some(EntryState::Failed));
        assert!(matches!(
            manager.failure(&keys[1]),
            Some(AssetError::LoadFailed { ref message, .. }) if message.contains("does not exist")
        ));
    }
    Ok(())
}

#[test]
fn test_unhandled_key_fails_with_no_loader() -> Result<()> {
    let manager = manager(1, game_fs())?;
    manager.add_loader(CountingLoader::default());

    let key = AssetKey::new("/Textures/Rock.tex", "Sound");
    assert!(manager.block_get(&key).is_none());
    assert_eq!(manager.failure(&key), Some(AssetError::NoLoader { key: key.clone() }));
    Ok(())
}

#[test]
fn test_block_get_does_not_return_before_completion() -> Result<()> {
    let manager = Arc::new(manager(2, game_fs())?);
    let delay = Duration::from_millis(80);
    manager.add_loader(CountingLoader::with_delay(delay));

    let start = Instant::now();
    let first = {
        let manager = manager.clone();
        thread::spawn(move || manager.block_get_as::<Blob>("/Textures/Grass.tex"))
    };
    thread::sleep(Duration::from_millis(10));
    let second = manager.block_get_as::<Blob>("/Textures/Grass.tex");
    assert!(start.elapsed() >= delay);
    assert!(second.is_some());
    assert!(first.join().unwrap().is_some());
    Ok(())
}

#[test]
fn test_repeated_try_get_never_reloads() -> Result<()> {
    let manager = manager(2, game_fs())?;
    let loader = Arc::new(CountingLoader::default());
    manager.add_loader_arc(loader.clone());

    let key = AssetKey::of::<Blob>("/Textures/Rock.tex");
    let deadline = Instant::now() + Duration::from_secs(5);
    while manager.try_get(&key).is_none() {
        assert!(Instant::now() < deadline, "queued key never completed");
        thread::yield_now();
    }
    for _ in 0..10 {
        assert!(manager.try_get(&key).is_some());
    }

    let missing = AssetKey::of::<Blob>("/Textures/Missing.tex");
    assert!(manager.block_get(&missing).is_none());
    for _ in 0..10 {
        assert!(manager.try_get(&missing).is_none());
    }
    assert_eq!(loader.calls("/Textures/Rock.tex"), 1);
    assert_eq!(loader.calls("/Textures/Missing.tex"), 1);
    Ok(())
}

#[test]
fn test_try_get_without_workers_loads_synchronously() -> Result<()> {
    let manager = manager(0, game_fs())?;
    manager.add_loader(CountingLoader::default());
    assert!(manager.try_get_as::<Blob>("/Textures/Rock.tex").is_some());
    Ok(())
}

#[test]
fn test_queue_without_workers_returns_immediately() -> Result<()> {
    let manager = manager(0, game_fs())?;
    let delay = Duration::from_millis(200);
    let loader = Arc::new(CountingLoader::with_delay(delay));
    manager.add_loader_arc(loader.clone());

    let key = AssetKey::of::<Blob>("/Textures/Rock.tex");
    let start = Instant::now();
    manager.queue(&key);
    assert!(start.elapsed() < delay, "queue ran the loader");
    assert_eq!(manager.state(&key), Some(EntryState::Queued));
    assert_eq!(loader.total(), 0);

    // The next blocking request picks the queued entry up.
    assert!(manager.block_get(&key).is_some());
    assert_eq!(manager.state(&key), Some(EntryState::Complete));
    assert_eq!(loader.calls("/Textures/Rock.tex"), 1);
    Ok(())
}

#[test]
fn test_self_cycle_returns_empty_slot() -> Result<()> {
    for workers in WORKER_COUNTS {
        let manager = manager(workers, game_fs())?;
        manager.add_loader(CycleLoader);

        assert!(manager.block_get_as::<Model>("/ping").is_none());
        assert_eq!(
            manager.state(&AssetKey::of::<Model>("/ping")),
            Some(EntryState::Failed)
        );
        assert_eq!(
            manager.state(&AssetKey::of::<Model>("/pong")),
            Some(EntryState::Failed)
        );
    }
    Ok(())
}

#[test]
fn test_panicking_loader_fails_the_key() -> Result<()> {
    for workers in WORKER_COUNTS {
        let manager = manager(workers, game_fs())?;
        manager.add_loader(PanickingLoader);
        manager.add_loader(CountingLoader::default());

        let bad = AssetKey::of::<Blob>("/Textures/Grass.bad");
        assert!(manager.block_get(&bad).is_none());
        assert_eq!(
            manager.failure(&bad),
            Some(AssetError::LoaderPanicked {
                key: bad.clone(),
                loader: "panicking".to_string()
            })
        );
        // The manager keeps working afterwards.
        assert!(manager.block_get_as::<Blob>("/Textures/Grass.tex").is_some());
    }
    Ok(())
}

#[test]
fn test_first_registered_loader_wins() -> Result<()> {
    let manager = manager(1, game_fs())?;
    let first = Arc::new(CountingLoader::default());
    let second = Arc::new(CountingLoader::default());
    manager.add_loader_arc(first.clone());
    manager.add_loader_arc(second.clone());
    assert_eq!(manager.loader_count(), 2);

    assert!(manager.block_get_as::<Blob>("/Textures/Rock.tex").is_some());
    assert_eq!(first.total(), 1);
    assert_eq!(second.total(), 0);
    Ok(())
}

#[test]
fn test_value_of_another_type_is_reported_absent() -> Result<()> {
    /// Produces a `Blob` whatever type the key asks for.
    struct MislabelingLoader;

    impl AssetLoader for MislabelingLoader {
        fn can_handle(&self, _key: &AssetKey, _fs: &dyn FileSystem) -> bool {
            true
        }

        fn load(
            &self,
            key: &AssetKey,
            _fs: &dyn FileSystem,
            _assets: &dyn AssetProvider,
        ) -> anyhow::Result<AssetValue> {
            Ok(AssetValue::new(Blob {
                path: key.path().to_string(),
            }))
        }
    }

    let manager = manager(1, game_fs())?;
    manager.add_loader(MislabelingLoader);

    let key = AssetKey::of::<Model>("/Models/Tree.mdl");
    let value = manager.block_get(&key).expect("untyped lookup sees the value");
    assert!(value.is::<Blob>());
    assert!(manager.block_get_as::<Model>("/Models/Tree.mdl").is_none());
    assert!(manager.try_get_as::<Model>("/Models/Tree.mdl").is_none());
    Ok(())
}

#[test]
fn test_shutdown_leaves_manager_usable() -> Result<()> {
    let mut manager = manager(3, game_fs())?;
    let loader = Arc::new(CountingLoader::with_delay(Duration::from_millis(1)));
    manager.add_loader_arc(loader.clone());

    manager.vector_queue_as::<Blob>(&["/Bulk/0.tex", "/Bulk/1.tex", "/Bulk/2.tex", "/Bulk/3.tex"]);
    manager.shutdown();
    assert_eq!(manager.worker_count(), 0);

    let values = manager.vector_block_get_as::<Blob>(&[
        "/Bulk/0.tex",
        "/Bulk/1.tex",
        "/Bulk/2.tex",
        "/Bulk/3.tex",
        "/Bulk/4.tex",
    ]);
    assert!(values.iter().all(Option::is_some));
    assert_eq!(loader.total(), 5);
    Ok(())
}

#[test]
fn test_stats_and_metrics_track_loads() -> Result<()> {
    let registry = Arc::new(MetricsRegistry::new());
    let config = AssetManagerConfig {
        worker_threads: Some(0),
        ..Default::default()
    };
    let manager = AssetManager::with_metrics(game_fs(), config, registry.clone())?;
    manager.add_loader(AliasLoader);
    manager.add_loader(CountingLoader::default());

    manager.vector_block_get_as::<Blob>(&[
        "/Textures/Rock.tex",
        "/Textures/Grass.tex",
        "/Textures/Missing.tex",
        "/alias/Sky.tex",
    ]);

    let stats = manager.stats();
    assert_eq!(stats.complete, 4, "rock, grass, alias and its target");
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.total(), 5);

    let counter = |name: &str| {
        registry
            .get(&whirled_core::telemetry::MetricId::new("assets", name))
            .ok()
            .and_then(|v| v.as_counter())
    };
    assert_eq!(counter("loads_total"), Some(4));
    assert_eq!(counter("failures_total"), Some(1));
    assert_eq!(counter("remaps_total"), Some(1));
    assert_eq!(counter("inline_total"), Some(2), "first key and the remap target");
    assert_eq!(counter("steals_total"), Some(3));
    assert!(Arc::ptr_eq(manager.metrics(), &registry));
    Ok(())
}

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

//! The asset manager and its retrieval algorithms.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use ahash::AHashSet;
use anyhow::Context;
use log::{debug, error, trace};
use whirled_core::asset::{map_key_paths, AssetKey, AssetLoader, AssetProvider, AssetValue};
use whirled_core::vfs::FileSystem;
use whirled_telemetry::{MetricsRegistry, ScopedMetricTimer};

use crate::config::AssetManagerConfig;
use crate::entry::{CacheEntry, EntryState};
use crate::error::AssetError;
use crate::metrics::CacheMetrics;
use crate::pool::WorkerPool;
use crate::registry::LoaderRegistry;
use crate::signal::WakeSignal;
use crate::table::{CacheStats, CacheTable};

static NEXT_MANAGER_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// Keys this thread is currently loading, innermost last.
    static LOADING: RefCell<Vec<(usize, AssetKey)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a key as being loaded by the current thread until dropped.
struct LoadingGuard;

impl LoadingGuard {
    fn push(manager: usize, key: AssetKey) -> Self {
        LOADING.with(|stack| stack.borrow_mut().push((manager, key)));
        LoadingGuard
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        LOADING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

fn is_loading_here(manager: usize, key: &AssetKey) -> bool {
    LOADING.with(|stack| {
        stack
            .borrow()
            .iter()
            .any(|(id, loading)| *id == manager && loading == key)
    })
}

/// State shared between the manager handle and its worker threads.
pub(crate) struct ManagerCore {
    id: usize,
    fs: Arc<dyn FileSystem>,
    pub(crate) table: CacheTable,
    loaders: LoaderRegistry,
    pub(crate) wake: WakeSignal,
    workers: AtomicUsize,
    shutting_down: AtomicBool,
    metrics: CacheMetrics,
    registry: Arc<MetricsRegistry>,
}

impl ManagerCore {
    fn new(fs: Arc<dyn FileSystem>, metrics: CacheMetrics, registry: Arc<MetricsRegistry>) -> Self {
        Self {
            id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
            fs,
            table: CacheTable::new(),
            loaders: LoaderRegistry::new(),
            wake: WakeSignal::new(),
            workers: AtomicUsize::new(0),
            shutting_down: AtomicBool::new(false),
            metrics,
            registry,
        }
    }

    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Stops handing work to the pool. From here on every caller loads on
    /// its own thread.
    pub(crate) fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.workers.store(0, Ordering::SeqCst);
    }

    fn worker_count(&self) -> usize {
        self.workers.load(Ordering::SeqCst)
    }

    fn canonical_keys(&self, keys: &[AssetKey]) -> Vec<AssetKey> {
        let mut keys = keys.to_vec();
        map_key_paths(&mut keys, |path| self.fs.canonicalize(path));
        keys
    }

    fn canonical_key(&self, key: &AssetKey) -> AssetKey {
        key.with_path(self.fs.canonicalize(key.path()))
    }

    /// Runs the loader for an entry this thread owns, either through its
    /// work permit or as the inline claim of a `block_get`.
    pub(crate) fn execute(&self, entry: &CacheEntry) {
        if !entry.begin_work() {
            return;
        }
        let _loading = LoadingGuard::push(self.id, entry.key().clone());

        match self.resolve(entry.key()) {
            Ok(value) => {
                debug!("Loaded {}", entry.key());
                self.metrics.record_load();
                entry.complete(value);
            }
            Err(e) => {
                error!("{}", e);
                self.metrics.record_failure();
                entry.fail(e);
            }
        }
    }

    fn resolve(&self, key: &AssetKey) -> Result<AssetValue, AssetError> {
        let loader = self
            .loaders
            .find(key, self.fs.as_ref())
            .ok_or_else(|| AssetError::NoLoader { key: key.clone() })?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_loader(loader.as_ref(), key)));
        outcome.unwrap_or_else(|_| {
            Err(AssetError::LoaderPanicked {
                key: key.clone(),
                loader: loader.name().to_string(),
            })
        })
    }

    fn run_loader(&self, loader: &dyn AssetLoader, key: &AssetKey) -> Result<AssetValue, AssetError> {
        let target = self.canonical_key(&loader.remap_key(key, self.fs.as_ref()));
        if &target != key {
            trace!("{} remapped {} to {}", loader.name(), key, target);
            self.metrics.record_remap();
            return self.block_get(&target).ok_or_else(|| AssetError::RemapFailed {
                key: key.clone(),
                target,
            });
        }

        let _timer = ScopedMetricTimer::new(&self.metrics.load_time);
        loader
            .load(key, self.fs.as_ref(), self)
            .map_err(|e| AssetError::LoadFailed {
                key: key.clone(),
                message: format!("{:#}", e),
            })
    }

    /// Executes queued entries from `pending` on the calling thread.
    ///
    /// With a running pool a wake token is taken first, keeping the token
    /// count within the number of unclaimed queued entries. Without one
    /// there is nobody to keep the count for, so permits are taken directly.
    fn steal(&self, pending: &[Arc<CacheEntry>]) {
        if self.worker_count() == 0 {
            for entry in pending {
                if entry.try_claim() {
                    self.stolen(entry);
                }
            }
            return;
        }

        while self.wake.try_acquire() {
            match pending.iter().find(|entry| entry.try_claim()) {
                Some(entry) => self.stolen(entry),
                None => {
                    self.wake.release(1);
                    break;
                }
            }
        }
    }

    fn stolen(&self, entry: &CacheEntry) {
        trace!("Stealing {}", entry.key());
        self.metrics.record_steal();
        self.execute(entry);
    }

    /// Blocks until every entry is terminal, stealing their queued work
    /// while waiting.
    fn wait_for(&self, entries: &[Arc<CacheEntry>]) {
        let mut seen = AHashSet::new();
        let mut pending: Vec<Arc<CacheEntry>> = entries
            .iter()
            .filter(|entry| seen.insert(entry.key().clone()))
            .cloned()
            .collect();

        loop {
            pending.retain(|entry| {
                if entry.state().is_terminal() {
                    return false;
                }
                if is_loading_here(self.id, entry.key()) {
                    error!(
                        "{}",
                        AssetError::DependencyCycle {
                            key: entry.key().clone()
                        }
                    );
                    return false;
                }
                true
            });
            if pending.is_empty() {
                return;
            }
            self.steal(&pending);
            thread::yield_now();
        }
    }
}

impl AssetProvider for ManagerCore {
    fn vector_queue(&self, keys: &[AssetKey]) {
        let keys = self.canonical_keys(keys);
        let admission = self.table.admit(&keys, false);
        if admission.queued == 0 {
            return;
        }
        trace!("Queued {} new assets", admission.queued);
        // Without workers the entries wait for a `block_get` to claim them.
        if self.worker_count() > 0 {
            self.wake.release(admission.queued);
        }
    }

    fn vector_try_get(&self, keys: &[AssetKey]) -> Vec<Option<AssetValue>> {
        if self.worker_count() == 0 {
            return self.vector_block_get(keys);
        }
        let keys = self.canonical_keys(keys);
        let found = self.table.lookup(&keys);

        let unknown: Vec<AssetKey> = keys
            .iter()
            .zip(&found)
            .filter(|(_, entry)| entry.is_none())
            .map(|(key, _)| key.clone())
            .collect();
        if !unknown.is_empty() {
            let admission = self.table.admit(&unknown, false);
            self.wake.release(admission.queued);
        }

        found
            .iter()
            .map(|entry| entry.as_ref().and_then(|e| e.value()))
            .collect()
    }

    fn vector_block_get(&self, keys: &[AssetKey]) -> Vec<Option<AssetValue>> {
        let keys = self.canonical_keys(keys);
        let found = self.table.lookup(&keys);

        let entries: Vec<Arc<CacheEntry>> = if found.iter().all(Option::is_some) {
            found.into_iter().flatten().collect()
        } else {
            let admission = self.table.admit(&keys, true);
            self.wake.release(admission.queued);
            if let Some(entry) = admission.inline {
                trace!("Loading {} inline", entry.key());
                self.metrics.record_inline();
                self.execute(&entry);
            }
            admission.entries
        };

        if entries.iter().any(|e| e.state() != EntryState::Complete) {
            self.wait_for(&entries);
        }

        entries
            .iter()
            .map(|entry| {
                let value = entry.value();
                if value.is_none() {
                    if let Some(e) = entry.error() {
                        debug!("Returning no value for {}: {}", entry.key(), e);
                    }
                }
                value
            })
            .collect()
    }
}

/// A concurrent, deduplicating asset cache.
///
/// ```
/// use std::sync::Arc;
/// use whirled_assets::{AssetManager, AssetManagerConfig};
/// use whirled_core::asset::AssetProviderExt;
/// use whirled_io::loaders::{TextFile, TextFileLoader};
/// use whirled_io::MemoryFs;
///
/// let fs = Arc::new(MemoryFs::new().with_file("/Readme.txt", "hello"));
/// let config = AssetManagerConfig { worker_threads: Some(1), ..Default::default() };
/// let manager = AssetManager::new(fs, config).unwrap();
/// manager.add_loader(TextFileLoader::new());
///
/// let text = manager.block_get_as::<TextFile>("readme.TXT").unwrap();
/// assert_eq!(text.text, "hello");
/// ```
pub struct AssetManager {
    core: Arc<ManagerCore>,
    pool: WorkerPool,
}

impl AssetManager {
    /// Creates a manager with its own metrics registry and starts the pool.
    pub fn new(fs: Arc<dyn FileSystem>, config: AssetManagerConfig) -> anyhow::Result<Self> {
        Self::with_metrics(fs, config, Arc::new(MetricsRegistry::new()))
    }

    /// Creates a manager that records its metrics into `registry`.
    pub fn with_metrics(
        fs: Arc<dyn FileSystem>,
        config: AssetManagerConfig,
        registry: Arc<MetricsRegistry>,
    ) -> anyhow::Result<Self> {
        let metrics =
            CacheMetrics::new(&registry).context("Failed to register asset cache metrics")?;
        let core = Arc::new(ManagerCore::new(fs, metrics, registry));

        let count = config.resolved_worker_threads();
        let pool = WorkerPool::spawn(&core, count, &config.thread_name)
            .with_context(|| format!("Failed to spawn {} asset workers", count))?;
        core.workers.store(pool.len(), Ordering::SeqCst);

        Ok(Self { core, pool })
    }

    /// Appends a loader. Loaders registered earlier take priority.
    pub fn add_loader<L: AssetLoader + 'static>(&self, loader: L) {
        self.core.loaders.register(Arc::new(loader));
    }

    /// Appends a shared loader.
    pub fn add_loader_arc(&self, loader: Arc<dyn AssetLoader>) {
        self.core.loaders.register(loader);
    }

    /// Number of registered loaders.
    pub fn loader_count(&self) -> usize {
        self.core.loaders.len()
    }

    /// Number of running pool workers. Zero after [`shutdown`](Self::shutdown).
    pub fn worker_count(&self) -> usize {
        self.core.worker_count()
    }

    /// The registry this manager records its metrics into.
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.core.registry
    }

    /// The current state of a key, or `None` if it was never requested.
    pub fn state(&self, key: &AssetKey) -> Option<EntryState> {
        self.core
            .table
            .get(&self.core.canonical_key(key))
            .map(|entry| entry.state())
    }

    /// Why a key failed, if it did.
    pub fn failure(&self, key: &AssetKey) -> Option<AssetError> {
        self.core
            .table
            .get(&self.core.canonical_key(key))
            .and_then(|entry| entry.error())
    }

    /// Entry counts per state.
    pub fn stats(&self) -> CacheStats {
        self.core.table.stats()
    }

    /// Stops and joins the pool. Later requests load on the calling thread.
    /// Calling this more than once is harmless.
    pub fn shutdown(&mut self) {
        self.pool.shutdown(&self.core);
    }
}

impl AssetProvider for AssetManager {
    fn vector_queue(&self, keys: &[AssetKey]) {
        self.core.vector_queue(keys);
    }

    fn vector_try_get(&self, keys: &[AssetKey]) -> Vec<Option<AssetValue>> {
        self.core.vector_try_get(keys)
    }

    fn vector_block_get(&self, keys: &[AssetKey]) -> Vec<Option<AssetValue>> {
        self.core.vector_block_get(keys)
    }
}

impl Drop for AssetManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

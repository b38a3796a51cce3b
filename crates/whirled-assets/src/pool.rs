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

//! Background workers that drain the queue.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info};

use crate::manager::ManagerCore;

/// A fixed set of named worker threads.
#[derive(Debug)]
pub(crate) struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `count` workers named `{name}-{index}`.
    ///
    /// If any spawn fails, the workers already started are joined before
    /// the error is returned.
    pub(crate) fn spawn(core: &Arc<ManagerCore>, count: usize, name: &str) -> io::Result<Self> {
        let mut pool = WorkerPool {
            handles: Vec::with_capacity(count),
        };
        for index in 0..count {
            let worker_core = core.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(move || run_worker(worker_core));
            match spawned {
                Ok(handle) => pool.handles.push(handle),
                Err(e) => {
                    pool.shutdown(core);
                    return Err(e);
                }
            }
        }
        if count > 0 {
            info!("Started {} asset workers", count);
        }
        Ok(pool)
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    /// Signals every worker to exit and joins them.
    pub(crate) fn shutdown(&mut self, core: &ManagerCore) {
        if self.handles.is_empty() {
            return;
        }
        core.begin_shutdown();
        core.wake.release(self.handles.len());

        let count = self.handles.len();
        for handle in self.handles.drain(..) {
            // A stealing caller can swallow a shutdown token, so keep one
            // available until this worker has seen it.
            while !handle.is_finished() {
                if core.wake.available() == 0 {
                    core.wake.release(1);
                }
                thread::sleep(Duration::from_millis(1));
            }
            if handle.join().is_err() {
                error!("An asset worker panicked");
            }
        }
        info!("Stopped {} asset workers", count);
    }
}

fn run_worker(core: Arc<ManagerCore>) {
    let name = thread::current().name().unwrap_or("asset-worker").to_string();
    debug!("Worker '{}' waiting for work", name);

    while core.wake.acquire() {
        if core.is_shutting_down() {
            break;
        }
        match core.table.pop_claimable() {
            Some(entry) => core.execute(&entry),
            None => debug!("Worker '{}' woke with nothing to claim", name),
        }
    }

    debug!("Worker '{}' exiting", name);
}

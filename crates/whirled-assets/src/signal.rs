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

//! A counting wake signal for the worker pool.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Counting semaphore built on an unbounded channel of unit tokens.
///
/// One token is released per queued entry; workers block on [`acquire`]
/// and stealing callers take tokens with [`try_acquire`]. The number of
/// outstanding tokens never exceeds the number of queued entries still
/// waiting for a claimer.
///
/// [`acquire`]: WakeSignal::acquire
/// [`try_acquire`]: WakeSignal::try_acquire
#[derive(Debug, Clone)]
pub(crate) struct WakeSignal {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl WakeSignal {
    pub(crate) fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Adds `count` tokens.
    pub(crate) fn release(&self, count: usize) {
        for _ in 0..count {
            // Both ends live in `self`, so the channel cannot be disconnected here.
            let _ = self.tx.send(());
        }
    }

    /// Blocks until a token is available. Returns `false` if the channel
    /// was disconnected.
    pub(crate) fn acquire(&self) -> bool {
        self.rx.recv().is_ok()
    }

    /// Takes a token if one is available.
    pub(crate) fn try_acquire(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Tokens currently available.
    pub(crate) fn available(&self) -> usize {
        self.rx.len()
    }
}

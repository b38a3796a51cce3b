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

//! Cache counters recorded into a [`MetricsRegistry`].

use whirled_core::telemetry::MetricsResult;
use whirled_telemetry::{CounterHandle, HistogramHandle, MetricsRegistry};

/// Namespace under which every cache metric is registered.
pub(crate) const NAMESPACE: &str = "assets";

const LOAD_TIME_BUCKETS_MS: [f64; 6] = [1.0, 5.0, 16.0, 33.0, 100.0, 500.0];

/// Handles to the cache's metrics.
#[derive(Debug, Clone)]
pub(crate) struct CacheMetrics {
    loads_total: CounterHandle,
    failures_total: CounterHandle,
    remaps_total: CounterHandle,
    inline_total: CounterHandle,
    steals_total: CounterHandle,
    pub(crate) load_time: HistogramHandle,
}

impl CacheMetrics {
    pub(crate) fn new(registry: &MetricsRegistry) -> MetricsResult<Self> {
        Ok(Self {
            loads_total: registry.register_counter(NAMESPACE, "loads_total")?,
            failures_total: registry.register_counter(NAMESPACE, "failures_total")?,
            remaps_total: registry.register_counter(NAMESPACE, "remaps_total")?,
            inline_total: registry.register_counter(NAMESPACE, "inline_total")?,
            steals_total: registry.register_counter(NAMESPACE, "steals_total")?,
            load_time: registry.register_histogram(
                NAMESPACE,
                "load_time",
                LOAD_TIME_BUCKETS_MS.to_vec(),
            )?,
        })
    }

    pub(crate) fn record_load(&self) {
        bump(&self.loads_total);
    }

    pub(crate) fn record_failure(&self) {
        bump(&self.failures_total);
    }

    pub(crate) fn record_remap(&self) {
        bump(&self.remaps_total);
    }

    pub(crate) fn record_inline(&self) {
        bump(&self.inline_total);
    }

    pub(crate) fn record_steal(&self) {
        bump(&self.steals_total);
    }
}

fn bump(counter: &CounterHandle) {
    if let Err(e) = counter.increment() {
        log::warn!("Failed to update metric {}: {:?}", counter.id(), e);
    }
}

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

//! Registry for managing metrics.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use whirled_core::telemetry::{MetricId, MetricType, MetricValue, MetricsError, MetricsResult};

type Storage = Arc<RwLock<HashMap<MetricId, MetricValue>>>;

/// Central in-memory registry for cache metrics.
///
/// Producers register a metric once and keep the returned handle; updates
/// through a handle take the registry's write lock for the duration of a
/// single arithmetic update. Readers take snapshots.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    storage: Storage,
}

impl MetricsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a counter starting at zero.
    ///
    /// Registering an existing counter returns a handle to it without
    /// resetting its value, so several producers can share one metric.
    pub fn register_counter(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> MetricsResult<CounterHandle> {
        let id = MetricId::new(namespace, name);
        self.register(&id, MetricType::Counter, || MetricValue::Counter(0))?;
        Ok(CounterHandle {
            id,
            storage: self.storage.clone(),
        })
    }

    /// Registers a histogram over the given bucket bounds.
    pub fn register_histogram(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        buckets: Vec<f64>,
    ) -> MetricsResult<HistogramHandle> {
        let id = MetricId::new(namespace, name);
        self.register(&id, MetricType::Histogram, || MetricValue::histogram(buckets))?;
        Ok(HistogramHandle {
            id,
            storage: self.storage.clone(),
        })
    }

    fn register(
        &self,
        id: &MetricId,
        expected: MetricType,
        init: impl FnOnce() -> MetricValue,
    ) -> MetricsResult<()> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| MetricsError::StorageError("Failed to acquire write lock".to_string()))?;
        let value = storage.entry(id.clone()).or_insert_with(init);
        if value.metric_type() != expected {
            return Err(MetricsError::TypeMismatch {
                expected,
                found: value.metric_type(),
            });
        }
        Ok(())
    }

    /// Returns a copy of a metric's current value.
    pub fn get(&self, id: &MetricId) -> MetricsResult<MetricValue> {
        read(&self.storage, id)
    }

    /// Returns every metric in `namespace`, sorted by name.
    pub fn namespace_snapshot(&self, namespace: &str) -> Vec<(MetricId, MetricValue)> {
        let Ok(storage) = self.storage.read() else {
            return Vec::new();
        };
        let mut metrics: Vec<_> = storage
            .iter()
            .filter(|(id, _)| id.namespace == namespace)
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect();
        metrics.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        metrics
    }

    /// The number of registered metrics.
    pub fn metric_count(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }
}

fn read(storage: &Storage, id: &MetricId) -> MetricsResult<MetricValue> {
    let storage = storage
        .read()
        .map_err(|_| MetricsError::StorageError("Failed to acquire read lock".to_string()))?;
    storage
        .get(id)
        .cloned()
        .ok_or_else(|| MetricsError::NotFound(id.clone()))
}

fn update<T>(
    storage: &Storage,
    id: &MetricId,
    f: impl FnOnce(&mut MetricValue) -> Option<T>,
    expected: MetricType,
) -> MetricsResult<T> {
    let mut storage = storage
        .write()
        .map_err(|_| MetricsError::StorageError("Failed to acquire write lock".to_string()))?;
    let value = storage
        .get_mut(id)
        .ok_or_else(|| MetricsError::NotFound(id.clone()))?;
    let found = value.metric_type();
    f(value).ok_or(MetricsError::TypeMismatch { expected, found })
}

/// Handle for counter updates.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    id: MetricId,
    storage: Storage,
}

impl CounterHandle {
    /// Increments the counter by 1 and returns the new value.
    pub fn increment(&self) -> MetricsResult<u64> {
        self.increment_by(1)
    }

    /// Increments the counter by `amount` and returns the new value.
    pub fn increment_by(&self, amount: u64) -> MetricsResult<u64> {
        update(
            &self.storage,
            &self.id,
            |value| match value {
                MetricValue::Counter(v) => {
                    *v = v.saturating_add(amount);
                    Some(*v)
                }
                MetricValue::Histogram { .. } => None,
            },
            MetricType::Counter,
        )
    }

    /// The current counter value.
    pub fn get(&self) -> MetricsResult<u64> {
        let value = read(&self.storage, &self.id)?;
        value.as_counter().ok_or(MetricsError::TypeMismatch {
            expected: MetricType::Counter,
            found: value.metric_type(),
        })
    }

    /// The metric ID.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle for histogram updates.
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    id: MetricId,
    storage: Storage,
}

impl HistogramHandle {
    /// Records one sample.
    pub fn observe(&self, sample: f64) -> MetricsResult<()> {
        update(
            &self.storage,
            &self.id,
            |value| value.observe(sample).then_some(()),
            MetricType::Histogram,
        )
    }

    /// Number of samples recorded so far.
    pub fn count(&self) -> MetricsResult<u64> {
        match read(&self.storage, &self.id)? {
            MetricValue::Histogram { count, .. } => Ok(count),
            other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Histogram,
                found: other.metric_type(),
            }),
        }
    }

    /// The metric ID.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

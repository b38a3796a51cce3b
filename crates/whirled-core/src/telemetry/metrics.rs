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

//! Metric identifiers, values and errors shared by producers and the registry.

use std::fmt::{self, Display};

/// A structured identifier for a metric: a namespace and a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricId {
    /// The broad category of the metric (e.g. "assets").
    pub namespace: String,
    /// The specific name of the metric (e.g. "loads_total").
    pub name: String,
}

impl MetricId {
    /// Creates a new `MetricId`.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// The fundamental type of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// A value that only ever increases.
    Counter,
    /// A distribution of measurements over fixed buckets.
    Histogram,
}

/// The current value of a metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Monotonic count.
    Counter(u64),
    /// Bucketed distribution.
    Histogram {
        /// Upper bounds of the buckets, ascending.
        bucket_bounds: Vec<f64>,
        /// Number of samples per bucket; one extra trailing bucket collects
        /// samples above the last bound.
        bucket_counts: Vec<u64>,
        /// Number of recorded samples.
        count: u64,
        /// Sum of recorded samples.
        sum: f64,
    },
}

impl MetricValue {
    /// An empty histogram over the given bucket bounds.
    pub fn histogram(mut bucket_bounds: Vec<f64>) -> Self {
        bucket_bounds.sort_by(|a, b| a.total_cmp(b));
        let buckets = bucket_bounds.len() + 1;
        MetricValue::Histogram {
            bucket_bounds,
            bucket_counts: vec![0; buckets],
            count: 0,
            sum: 0.0,
        }
    }

    /// Returns the [`MetricType`] corresponding to this value.
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Histogram { .. } => MetricType::Histogram,
        }
    }

    /// Returns the value as a `u64` if it is a `Counter`.
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            MetricValue::Counter(v) => Some(*v),
            MetricValue::Histogram { .. } => None,
        }
    }

    /// Records one sample into a histogram. Returns `false` for counters.
    pub fn observe(&mut self, sample: f64) -> bool {
        match self {
            MetricValue::Histogram {
                bucket_bounds,
                bucket_counts,
                count,
                sum,
            } => {
                let bucket = bucket_bounds
                    .iter()
                    .position(|bound| sample <= *bound)
                    .unwrap_or(bucket_bounds.len());
                bucket_counts[bucket] += 1;
                *count += 1;
                *sum += sample;
                true
            }
            MetricValue::Counter(_) => false,
        }
    }
}

impl Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Counter(v) => write!(f, "{v}"),
            MetricValue::Histogram { count, sum, .. } => {
                let mean = if *count == 0 { 0.0 } else { sum / *count as f64 };
                write!(f, "count={count} mean={mean:.2}")
            }
        }
    }
}

/// Errors raised by metric storage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    /// The metric was never registered.
    #[error("metric not found: {0}")]
    NotFound(MetricId),
    /// The operation does not apply to the stored metric type.
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// The type the operation needs.
        expected: MetricType,
        /// The type actually stored.
        found: MetricType,
    },
    /// The storage lock could not be taken.
    #[error("metrics storage error: {0}")]
    StorageError(String),
}

/// Result alias for metric operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

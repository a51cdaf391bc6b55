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

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How far back the window looks.
pub const DEFAULT_HORIZON: Duration = Duration::from_secs(30);
/// Cycle duration (ms) above which a cycle counts as jank.
pub const DEFAULT_JANK_THRESHOLD_MS: f64 = 50.0;

/// The anomaly rate over the retained window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnomalyRate {
    /// `100 * count / retained`, or `0.0` for an empty window.
    pub percent: f64,
    /// Number of retained samples above the threshold.
    pub count: usize,
}

/// A time-bounded window of recent cycle durations.
///
/// Samples are kept in insertion order. Every sample enters and leaves the
/// window exactly once, and the anomaly count is maintained incrementally, so
/// both [`add`](Self::add) and [`anomaly_rate`](Self::anomaly_rate) are
/// amortized O(1).
#[derive(Debug, Clone)]
pub struct JankWindow {
    samples: VecDeque<(Instant, f64)>,
    horizon: Duration,
    threshold_ms: f64,
    anomalies: usize,
}

impl JankWindow {
    /// Creates an empty window with a custom horizon and jank threshold.
    pub fn new(horizon: Duration, threshold_ms: f64) -> Self {
        Self {
            samples: VecDeque::new(),
            horizon,
            threshold_ms,
            anomalies: 0,
        }
    }

    /// Appends a sample and evicts everything older than the horizon,
    /// measured from `timestamp`.
    pub fn add(&mut self, timestamp: Instant, duration_ms: f64) {
        if self.is_anomaly(duration_ms) {
            self.anomalies += 1;
        }
        self.samples.push_back((timestamp, duration_ms));
        self.evict(timestamp);
    }

    /// Evicts stale samples relative to `now`, then reports the anomaly rate.
    pub fn anomaly_rate(&mut self, now: Instant) -> AnomalyRate {
        self.evict(now);
        if self.samples.is_empty() {
            return AnomalyRate::default();
        }
        AnomalyRate {
            percent: 100.0 * self.anomalies as f64 / self.samples.len() as f64,
            count: self.anomalies,
        }
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if no samples are retained.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The configured horizon.
    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    /// Iterates over retained `(timestamp, duration_ms)` pairs, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &(Instant, f64)> {
        self.samples.iter()
    }

    fn is_anomaly(&self, duration_ms: f64) -> bool {
        duration_ms > self.threshold_ms
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&(timestamp, duration_ms)) = self.samples.front() {
            if now.saturating_duration_since(timestamp) <= self.horizon {
                break;
            }
            self.samples.pop_front();
            if self.is_anomaly(duration_ms) {
                self.anomalies -= 1;
            }
        }
    }
}

impl Default for JankWindow {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON, DEFAULT_JANK_THRESHOLD_MS)
    }
}

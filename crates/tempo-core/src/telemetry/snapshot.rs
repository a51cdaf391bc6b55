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

//! The immutable record published once per sampling cycle.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// One published summary of the sampling loop's state.
///
/// Snapshots are plain values: the loop builds one per completed cycle and
/// hands it to the publisher, which never mutates it again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// 1-based sequence number of the cycle that produced this snapshot.
    pub cycle: u64,
    /// Monotonic capture time, in milliseconds since the loop started.
    pub timestamp_ms: u64,
    /// Duration of the most recently completed work cycle.
    pub last_duration_ms: f64,
    /// Running mean of all cycle durations so far.
    pub moving_avg_ms: f64,
    /// Running sample standard deviation of all cycle durations so far.
    pub moving_std_ms: f64,
    /// Share of cycles in the recent window that exceeded the jank threshold, in `[0, 100]`.
    pub window_anomaly_percent: f64,
    /// Number of cycles in the recent window that exceeded the jank threshold.
    pub window_anomaly_count: usize,
    /// Cadence selected by the pacing controller for this cycle.
    pub target_rate_hz: u32,
    /// Number of work unit repetitions actually executed this cycle.
    pub effective_load: u32,
    /// Whether the host reported a reduced-power mode for this cycle.
    pub throttled: bool,
}

impl MetricsSnapshot {
    /// Returns the frame budget implied by `target_rate_hz`, in milliseconds.
    pub fn frame_budget_ms(&self) -> f64 {
        if self.target_rate_hz == 0 {
            return 0.0;
        }
        1000.0 / self.target_rate_hz as f64
    }
}

impl Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} last={:.2}ms avg={:.2}ms std={:.2}ms jank(30s)={:.1}% ({} frames) power_save={} hz={} load={}",
            self.cycle,
            self.last_duration_ms,
            self.moving_avg_ms,
            self.moving_std_ms,
            self.window_anomaly_percent,
            self.window_anomaly_count,
            if self.throttled { "on" } else { "off" },
            self.target_rate_hz,
            self.effective_load,
        )
    }
}

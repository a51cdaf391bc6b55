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

//! Unbounded running mean and standard deviation (Welford's algorithm).

/// Online mean/variance accumulator over every sample seen so far.
///
/// Each update is O(1) in time and space regardless of history length, and
/// the `m2` formulation avoids the cancellation of a naive sum of squares on
/// long-running streams.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a new sample into the running statistics.
    pub fn update(&mut self, sample: f64) {
        self.count += 1;
        let delta = sample - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (sample - self.mean);
    }

    /// Number of samples folded in so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean of all samples, or `0.0` before the first one.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance; defined as `0.0` while `count <= 1`.
    pub fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / (self.count - 1) as f64
        } else {
            0.0
        }
    }

    /// Sample standard deviation.
    pub fn stddev(&self) -> f64 {
        // m2 can dip a hair below zero through rounding on constant streams.
        self.variance().max(0.0).sqrt()
    }
}

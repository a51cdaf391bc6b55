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

use std::time::{Duration, Instant};

/// A monotonic stopwatch used to bracket the measured work region.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started_at: Instant,
}

impl Stopwatch {
    /// Creates a new stopwatch and starts it immediately.
    #[inline]
    pub fn start() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    /// The instant the stopwatch was started.
    #[inline]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Elapsed time since the stopwatch was started.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Elapsed time in fractional milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        duration_ms(self.elapsed())
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start()
    }
}

/// Converts a duration to fractional milliseconds.
#[inline]
pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SLEEP_DURATION_MS: u64 = 20;
    const SLEEP_MARGIN_MS: f64 = 500.0;

    #[test]
    fn stopwatch_elapsed_is_near_zero_initially() {
        let watch = Stopwatch::start();
        assert!(watch.elapsed_ms() < SLEEP_MARGIN_MS);
    }

    #[test]
    fn stopwatch_tracks_sleep() {
        let watch = Stopwatch::start();
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));
        let elapsed = watch.elapsed_ms();
        assert!(
            elapsed >= SLEEP_DURATION_MS as f64,
            "Elapsed {elapsed}ms should cover the {SLEEP_DURATION_MS}ms sleep"
        );
        assert!(elapsed < SLEEP_DURATION_MS as f64 + SLEEP_MARGIN_MS);
    }

    #[test]
    fn duration_ms_keeps_fractions() {
        assert!((duration_ms(Duration::from_micros(1500)) - 1.5).abs() < 1e-9);
    }
}

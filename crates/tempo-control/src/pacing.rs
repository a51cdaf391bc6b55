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

//! Cadence and intensity selection for the sampling loop.
//!
//! Under throttling the loop voluntarily lowers both its work and its
//! frequency, cooperating with the host's power policy.
//!
//! | Throttle | Cadence | Load |
//! |---|---|---|
//! | off | `normal_rate_hz` (20) | requested |
//! | on | `throttled_rate_hz` (10) | requested - 1, at least 1 |

use crate::config::SamplingConfig;
use std::time::{Duration, Instant};
use tempo_core::utils::timer::duration_ms;
use tempo_core::ComputeLoad;

/// What the loop should do during one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingDecision {
    /// Target cycles per second.
    pub target_rate_hz: u32,
    /// Work unit repetitions for this cycle.
    pub effective_load: u32,
}

/// How the loop should spend the rest of its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingAction {
    /// Suspend for the remaining frame budget, truncated to whole milliseconds.
    Sleep(Duration),
    /// The frame budget is spent: yield once without a timed delay.
    Yield,
}

/// Picks cadence and load from the throttle signal, and the pause needed to
/// hold that cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingController {
    normal_rate_hz: u32,
    throttled_rate_hz: u32,
}

impl PacingController {
    /// Creates a controller with explicit cadences. Zero rates are raised to 1 Hz.
    pub fn new(normal_rate_hz: u32, throttled_rate_hz: u32) -> Self {
        Self {
            normal_rate_hz: normal_rate_hz.max(1),
            throttled_rate_hz: throttled_rate_hz.max(1),
        }
    }

    /// Creates a controller from the loop configuration.
    pub fn from_config(config: &SamplingConfig) -> Self {
        Self::new(config.normal_rate_hz, config.throttled_rate_hz)
    }

    /// Chooses the cadence and effective load for the next cycle.
    pub fn decide(&self, throttled: bool, requested: ComputeLoad) -> PacingDecision {
        if throttled {
            PacingDecision {
                target_rate_hz: self.throttled_rate_hz,
                effective_load: requested.reduced(),
            }
        } else {
            PacingDecision {
                target_rate_hz: self.normal_rate_hz,
                effective_load: requested.get(),
            }
        }
    }

    /// Frame budget at `rate_hz`, in milliseconds.
    pub fn frame_duration_ms(rate_hz: u32) -> f64 {
        1000.0 / rate_hz.max(1) as f64
    }

    /// Decides how long to pause so that a cycle started at `cycle_start`
    /// and observed at `now` lands on the `target_rate_hz` cadence.
    ///
    /// A remainder shorter than one millisecond truncates to zero and yields.
    pub fn sleep_for(&self, cycle_start: Instant, now: Instant, target_rate_hz: u32) -> PacingAction {
        let elapsed_ms = duration_ms(now.saturating_duration_since(cycle_start));
        let remaining_ms = Self::frame_duration_ms(target_rate_hz) - elapsed_ms;
        if remaining_ms >= 1.0 {
            PacingAction::Sleep(Duration::from_millis(remaining_ms.trunc() as u64))
        } else {
            PacingAction::Yield
        }
    }
}

impl Default for PacingController {
    fn default() -> Self {
        Self::from_config(&SamplingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_throttled_reduces_rate_and_load() {
        let pacing = PacingController::default();
        assert_eq!(
            pacing.decide(true, ComputeLoad::new(3)),
            PacingDecision {
                target_rate_hz: 10,
                effective_load: 2
            }
        );
    }

    #[test]
    fn test_throttled_load_floors_at_one() {
        let pacing = PacingController::default();
        assert_eq!(
            pacing.decide(true, ComputeLoad::new(1)),
            PacingDecision {
                target_rate_hz: 10,
                effective_load: 1
            }
        );
    }

    #[test]
    fn test_unthrottled_keeps_requested_load() {
        let pacing = PacingController::default();
        assert_eq!(
            pacing.decide(false, ComputeLoad::new(4)),
            PacingDecision {
                target_rate_hz: 20,
                effective_load: 4
            }
        );
    }

    #[test]
    fn test_effective_load_is_never_zero() {
        let pacing = PacingController::default();
        for raw in -3..=8 {
            for throttled in [false, true] {
                assert!(pacing.decide(throttled, ComputeLoad::new(raw)).effective_load >= 1);
            }
        }
    }

    #[test]
    fn test_sleeps_for_truncated_remainder() {
        let pacing = PacingController::default();
        let start = Instant::now();
        // 20 Hz -> 50 ms frame; 12.6 ms spent -> 37.4 ms left -> 37 ms.
        let now = start + Duration::from_micros(12_600);
        assert_eq!(pacing.sleep_for(start, now, 20), PacingAction::Sleep(ms(37)));
        // 10 Hz -> 100 ms frame.
        assert_eq!(pacing.sleep_for(start, start, 10), PacingAction::Sleep(ms(100)));
    }

    #[test]
    fn test_yields_when_budget_is_spent() {
        let pacing = PacingController::default();
        let start = Instant::now();
        assert_eq!(pacing.sleep_for(start, start + ms(50), 20), PacingAction::Yield);
        assert_eq!(pacing.sleep_for(start, start + ms(80), 20), PacingAction::Yield);
        assert_eq!(
            pacing.sleep_for(start, start + Duration::from_micros(49_500), 20),
            PacingAction::Yield
        );
    }

    #[test]
    fn test_zero_rates_are_raised() {
        let pacing = PacingController::new(0, 0);
        let decision = pacing.decide(false, ComputeLoad::new(2));
        assert_eq!(decision.target_rate_hz, 1);
        assert_eq!(PacingController::frame_duration_ms(0), 1000.0);
    }
}

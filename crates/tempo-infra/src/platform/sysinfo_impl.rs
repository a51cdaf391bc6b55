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

//! sysinfo-based implementation of the ThrottleSignal trait.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{Components, System};
use tempo_core::platform::ThrottleSignal;

/// Coarse thermal state of the CPU package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThermalStatus {
    /// Below 60 °C, or no sensor available.
    Cool,
    /// 60 to 80 °C.
    Warm,
    /// 80 to 90 °C; the host is likely clocking down.
    Throttling,
    /// Above 90 °C.
    Critical,
}

impl ThermalStatus {
    /// Classifies the hottest CPU sensor reading in °C.
    pub fn from_celsius(max_temp: Option<f32>) -> Self {
        match max_temp {
            Some(t) if t > 90.0 => ThermalStatus::Critical,
            Some(t) if t > 80.0 => ThermalStatus::Throttling,
            Some(t) if t > 60.0 => ThermalStatus::Warm,
            _ => ThermalStatus::Cool,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Probe {
    taken_at: Instant,
    throttled: bool,
}

/// A throttle signal that engages when the CPU runs hot or busy.
///
/// Reading sensors is far more expensive than one sampling cycle, so the
/// verdict is cached and re-probed at most once per `refresh_interval`.
pub struct SysinfoThrottle {
    system: Mutex<System>,
    last_probe: Mutex<Option<Probe>>,
    cpu_load_limit: f32,
    refresh_interval: Duration,
}

impl SysinfoThrottle {
    /// Default fraction of global CPU usage (0.0..=1.0) above which the host
    /// counts as busy.
    pub const DEFAULT_CPU_LOAD_LIMIT: f32 = 0.9;
    /// Default minimum time between two sensor reads.
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

    /// Creates a new SysinfoThrottle with default thresholds.
    pub fn new() -> Self {
        Self::with_limits(Self::DEFAULT_CPU_LOAD_LIMIT, Self::DEFAULT_REFRESH_INTERVAL)
    }

    /// Creates a throttle with an explicit CPU load limit and refresh interval.
    pub fn with_limits(cpu_load_limit: f32, refresh_interval: Duration) -> Self {
        let mut system = System::new();
        // Seed the first usage delta.
        system.refresh_cpu_usage();
        Self {
            system: Mutex::new(system),
            last_probe: Mutex::new(None),
            cpu_load_limit: cpu_load_limit.clamp(0.0, 1.0),
            refresh_interval: refresh_interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    /// Current thermal state, read directly from the sensors.
    pub fn thermal_status(&self) -> ThermalStatus {
        let components = Components::new_with_refreshed_list();
        let mut max_temp: Option<f32> = None;

        for component in &components {
            let label = component.label().to_lowercase();
            if !(label.contains("cpu") || label.contains("core") || label.contains("package")) {
                continue;
            }
            if let Some(temp) = component.temperature().filter(|t| t.is_finite() && *t > 0.0) {
                max_temp = Some(max_temp.map_or(temp, |m| m.max(temp)));
            }
        }

        ThermalStatus::from_celsius(max_temp)
    }

    /// Global CPU usage in `0.0..=1.0`, refreshed on each call.
    pub fn cpu_load(&self) -> f32 {
        match self.system.lock() {
            Ok(mut system) => {
                system.refresh_cpu_usage();
                (system.global_cpu_usage() / 100.0).clamp(0.0, 1.0)
            }
            Err(_) => 0.0,
        }
    }

    fn verdict(&self, thermal: ThermalStatus, cpu_load: f32) -> bool {
        thermal >= ThermalStatus::Throttling || cpu_load > self.cpu_load_limit
    }

    fn probe(&self) -> bool {
        let thermal = self.thermal_status();
        let cpu_load = self.cpu_load();
        let throttled = self.verdict(thermal, cpu_load);
        log::trace!("Host probe: thermal={thermal:?} cpu_load={cpu_load:.2} -> {throttled}");
        throttled
    }
}

impl ThrottleSignal for SysinfoThrottle {
    fn is_throttled(&self) -> bool {
        let Ok(mut last) = self.last_probe.lock() else {
            return false;
        };
        let now = Instant::now();
        match *last {
            Some(p) if now.saturating_duration_since(p.taken_at) < self.refresh_interval => {
                p.throttled
            }
            previous => {
                let throttled = self.probe();
                if previous.map(|p| p.throttled) != Some(throttled) {
                    log::info!(
                        "Host power state: {}",
                        if throttled { "throttled" } else { "normal" }
                    );
                }
                *last = Some(Probe {
                    taken_at: now,
                    throttled,
                });
                throttled
            }
        }
    }
}

impl Default for SysinfoThrottle {
    fn default() -> Self {
        Self::new()
    }
}

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

//! JSON-backed configuration for the sampling loop.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating a [`SamplingConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid JSON for this schema.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field holds a value the loop cannot run with.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the sampling loop.
///
/// Every field has a default, so a config file only needs to name what it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    /// Width of the workload buffer.
    pub buffer_width: usize,
    /// Height of the workload buffer.
    pub buffer_height: usize,
    /// Cycle duration (ms) above which a cycle counts as jank.
    pub jank_threshold_ms: f64,
    /// How far back the jank window looks, in milliseconds.
    pub window_horizon_ms: u64,
    /// Target cadence while the host is not throttling.
    pub normal_rate_hz: u32,
    /// Target cadence while the host is throttling.
    pub throttled_rate_hz: u32,
    /// Consecutive failed iterations after which the loop stops itself.
    pub max_consecutive_failures: u32,
    /// Keep running unprivileged when the host denies foreground promotion.
    pub best_effort_on_denial: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            buffer_width: 256,
            buffer_height: 256,
            jank_threshold_ms: 50.0,
            window_horizon_ms: 30_000,
            normal_rate_hz: 20,
            throttled_rate_hz: 10,
            max_consecutive_failures: 3,
            best_effort_on_denial: true,
        }
    }
}

impl SamplingConfig {
    /// Load a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded sampling config from {}", path.as_ref().display());
        Self::from_json(&content)
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Rejects values the loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_width == 0 || self.buffer_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "buffer must be non-empty, got {}x{}",
                self.buffer_width, self.buffer_height
            )));
        }
        if self.buffer_width.checked_mul(self.buffer_height).is_none() {
            return Err(ConfigError::Invalid("buffer size overflows usize".into()));
        }
        if self.normal_rate_hz == 0 || self.throttled_rate_hz == 0 {
            return Err(ConfigError::Invalid("rates must be at least 1 Hz".into()));
        }
        if !self.jank_threshold_ms.is_finite() || self.jank_threshold_ms < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "jank threshold must be a non-negative number, got {}",
                self.jank_threshold_ms
            )));
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid(
                "failure budget must allow at least one failure".into(),
            ));
        }
        Ok(())
    }

    /// The jank window horizon as a `Duration`.
    pub fn window_horizon(&self) -> Duration {
        Duration::from_millis(self.window_horizon_ms)
    }
}

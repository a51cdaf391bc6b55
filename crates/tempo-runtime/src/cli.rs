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

//! Command-line surface of `tempo-lab`.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tempo_core::MetricsSnapshot;

#[derive(Parser, Debug)]
#[command(name = "tempo-lab", version, about = "Run the adaptive sampling loop and watch its metrics")]
pub struct Args {
    /// Work unit repetitions per cycle; clamped to 1..=5
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    pub load: i64,

    /// Stop after this many seconds (runs until Ctrl-C when omitted)
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Where the power-save signal comes from
    #[arg(long, value_enum, default_value_t = ThrottleMode::Auto)]
    pub throttle: ThrottleMode,

    /// JSON file overriding the sampling defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// How each snapshot is printed
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl Args {
    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleMode {
    /// Follow CPU temperature and load
    Auto,
    /// Always in power-save mode
    On,
    /// Never in power-save mode
    Off,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One human-readable line per snapshot
    Text,
    /// One JSON object per line
    Json,
}

impl OutputFormat {
    pub fn render(self, snapshot: &MetricsSnapshot) -> anyhow::Result<String> {
        Ok(match self {
            OutputFormat::Text => snapshot.to_string(),
            OutputFormat::Json => serde_json::to_string(snapshot)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("tempo-lab").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.load, 2);
        assert_eq!(args.duration(), None);
        assert_eq!(args.throttle, ThrottleMode::Auto);
        assert_eq!(args.format, OutputFormat::Text);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_all_flags() {
        let args = parse(&[
            "--load",
            "-3",
            "--duration-secs",
            "10",
            "--throttle",
            "on",
            "--config",
            "lab.json",
            "--format",
            "json",
        ]);
        assert_eq!(args.load, -3);
        assert_eq!(args.duration(), Some(Duration::from_secs(10)));
        assert_eq!(args.throttle, ThrottleMode::On);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.config, Some(PathBuf::from("lab.json")));
    }

    #[test]
    fn test_unknown_throttle_mode_is_rejected() {
        assert!(Args::try_parse_from(["tempo-lab", "--throttle", "maybe"]).is_err());
    }

    #[test]
    fn test_json_rendering_carries_every_field() {
        let snapshot = MetricsSnapshot {
            cycle: 7,
            timestamp_ms: 350,
            last_duration_ms: 12.5,
            moving_avg_ms: 11.0,
            moving_std_ms: 1.5,
            window_anomaly_percent: 0.0,
            window_anomaly_count: 0,
            target_rate_hz: 20,
            effective_load: 2,
            throttled: false,
        };
        let line = OutputFormat::Json.render(&snapshot).unwrap();
        let back: MetricsSnapshot = serde_json::from_str(&line).unwrap();
        assert_eq!(back, snapshot);
        assert!(!line.contains('\n'));

        let text = OutputFormat::Text.render(&snapshot).unwrap();
        assert!(text.starts_with("#7 "));
    }
}

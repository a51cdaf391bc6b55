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

// tempo-lab: starts the sampling loop, prints every snapshot it publishes
// and stops on Ctrl-C or when --duration-secs runs out.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, ThrottleMode};
use std::sync::Arc;
use std::time::Duration;
use tempo_control::{LoopState, SamplingConfig, SamplingLoop};
use tempo_core::{ComputeLoad, ThrottleSignal, ThrottleSwitch};
use tempo_infra::SysinfoThrottle;
use tempo_telemetry::MetricsPublisher;

/// How often the controller checks whether the loop gave up on its own.
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SamplingConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SamplingConfig::default(),
    };

    let throttle: Arc<dyn ThrottleSignal> = match args.throttle {
        ThrottleMode::Auto => Arc::new(SysinfoThrottle::new()),
        ThrottleMode::On => Arc::new(ThrottleSwitch::new(true)),
        ThrottleMode::Off => Arc::new(ThrottleSwitch::new(false)),
    };

    let publisher = MetricsPublisher::new();
    let mut subscription = publisher.subscribe();
    let mut sampling =
        SamplingLoop::new(config, throttle, publisher).context("invalid sampling config")?;

    let load = ComputeLoad::new(args.load);
    sampling
        .start(load)
        .context("failed to start the sampling loop")?;

    let deadline = async {
        match args.duration() {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let mut health = tokio::time::interval(HEALTH_CHECK_INTERVAL);

    loop {
        tokio::select! {
            snapshot = subscription.next() => match snapshot {
                Some(snapshot) => println!("{}", args.format.render(&snapshot)?),
                None => break,
            },
            _ = health.tick() => {
                if sampling.state() == LoopState::Stopped {
                    break;
                }
            }
            _ = &mut deadline => {
                log::info!("Run duration elapsed");
                break;
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                log::info!("Interrupted");
                break;
            }
        }
    }

    // Joining the sampling thread blocks for up to one frame.
    let outcome = tokio::task::spawn_blocking(move || sampling.stop())
        .await
        .context("sampling shutdown task failed")?
        .context("sampling loop ended with an error")?;

    if let Some(outcome) = outcome {
        log::info!(
            "{} snapshots published, {} cycles failed",
            outcome.cycles_published,
            outcome.cycles_failed
        );
    }
    Ok(())
}

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

//! The sampling loop: measure, aggregate, publish, pace.

use crate::config::SamplingConfig;
use crate::error::{ControlError, IterationError};
use crate::host::{ForegroundHost, ThreadHost};
use crate::pacing::{PacingAction, PacingController, PacingDecision};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tempo_core::lane::Workload;
use tempo_core::platform::ThrottleSignal;
use tempo_core::telemetry::MetricsSnapshot;
use tempo_core::{ComputeLoad, Stopwatch};
use tempo_lanes::ConvolutionWorkload;
use tempo_telemetry::{JankWindow, MetricsPublisher, RunningStats};

const THREAD_NAME: &str = "tempo-sampling";

/// Lifecycle of a [`SamplingLoop`]. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Created, not started yet.
    Idle,
    /// The background thread is cycling.
    Running,
    /// The loop has exited; a new instance is needed to run again.
    Stopped,
}

/// Summary of a loop run, returned by [`SamplingLoop::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopOutcome {
    /// Cycles that published a snapshot.
    pub cycles_published: u64,
    /// Cycles whose publish step was skipped because of a fault.
    pub cycles_failed: u64,
}

/// Drives the sampling cycle on a dedicated thread.
///
/// Statistics, the jank window and the work buffer are created when the loop
/// starts and dropped when it stops; nothing carries over to another run.
pub struct SamplingLoop {
    config: SamplingConfig,
    throttle: Arc<dyn ThrottleSignal>,
    publisher: MetricsPublisher,
    host: Arc<dyn ForegroundHost>,
    workload: Option<Box<dyn Workload>>,
    state: LoopState,
    load: Option<ComputeLoad>,
    stop_tx: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<Result<LoopOutcome, ControlError>>>,
}

impl SamplingLoop {
    /// Creates an idle loop that reads `throttle` and publishes into `publisher`.
    pub fn new(
        config: SamplingConfig,
        throttle: Arc<dyn ThrottleSignal>,
        publisher: MetricsPublisher,
    ) -> Result<Self, ControlError> {
        config.validate()?;
        let workload = ConvolutionWorkload::new(config.buffer_width, config.buffer_height);
        Ok(Self {
            config,
            throttle,
            publisher,
            host: Arc::new(ThreadHost),
            workload: Some(Box::new(workload)),
            state: LoopState::Idle,
            load: None,
            stop_tx: None,
            handle: None,
        })
    }

    /// Replaces the default convolution workload.
    pub fn with_workload(mut self, workload: Box<dyn Workload>) -> Self {
        self.workload = Some(workload);
        self
    }

    /// Replaces the default [`ThreadHost`].
    pub fn with_host(mut self, host: Arc<dyn ForegroundHost>) -> Self {
        self.host = host;
        self
    }

    /// Current lifecycle state.
    ///
    /// A loop that aborted on its own reports `Stopped` even before
    /// [`stop`](Self::stop) collects its outcome.
    pub fn state(&self) -> LoopState {
        match (&self.state, &self.handle) {
            (LoopState::Running, Some(handle)) if handle.is_finished() => LoopState::Stopped,
            (state, _) => *state,
        }
    }

    /// Returns true while the background thread is cycling.
    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// The load accepted at start, if the loop was started.
    pub fn requested_load(&self) -> Option<ComputeLoad> {
        self.load
    }

    /// Starts cycling at `load`.
    ///
    /// Starting a running loop is a no-op. A stopped loop cannot be restarted.
    pub fn start(&mut self, load: ComputeLoad) -> Result<(), ControlError> {
        match self.state() {
            LoopState::Running => {
                log::debug!("Sampling loop already running; ignoring start (load={load})");
                return Ok(());
            }
            LoopState::Stopped => return Err(ControlError::AlreadyStopped),
            LoopState::Idle => {}
        }

        if let Err(denial) = self.host.promote(load) {
            if !self.config.best_effort_on_denial {
                log::warn!("Sampling loop start denied by host: {denial}");
                return Err(ControlError::StartDenied(denial.reason));
            }
            log::warn!("Host denied promotion ({denial}); continuing best-effort");
        }

        let workload = self.workload.take().ok_or(ControlError::AlreadyStopped)?;
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let worker = LoopWorker::new(
            &self.config,
            load,
            Arc::clone(&self.throttle),
            self.publisher.clone(),
            workload,
            stop_rx,
        );

        let spawned = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                self.stop_tx = Some(stop_tx);
                self.load = Some(load);
                self.state = LoopState::Running;
                Ok(())
            }
            Err(e) => {
                // The workload went down with the closure; this instance is spent.
                self.host.demote();
                self.state = LoopState::Stopped;
                log::warn!("Could not spawn sampling thread: {e}");
                Err(ControlError::StartDenied(e.to_string()))
            }
        }
    }

    /// Stops the loop and waits for the background thread to exit.
    ///
    /// The thread notices the request at its next pacing point, so this
    /// returns within roughly one cycle. Returns `Ok(None)` when there was
    /// nothing to stop, and `Err(LoopAborted)` if the loop had already given
    /// up on its own.
    pub fn stop(&mut self) -> Result<Option<LoopOutcome>, ControlError> {
        let Some(handle) = self.handle.take() else {
            return Ok(None);
        };

        if let Some(stop_tx) = self.stop_tx.take() {
            // A full slot or a gone receiver both mean the thread is on its way out.
            let _ = stop_tx.try_send(());
        }

        let result = match handle.join() {
            Ok(result) => result,
            Err(payload) => Err(ControlError::LoopAborted {
                consecutive_failures: 0,
                last_error: IterationError::Panicked(panic_message(payload.as_ref())),
            }),
        };

        self.host.demote();
        self.state = LoopState::Stopped;

        match &result {
            Ok(outcome) => log::info!(
                "Sampling loop stopped after {} cycles ({} failed)",
                outcome.cycles_published,
                outcome.cycles_failed
            ),
            Err(e) => log::error!("Sampling loop ended with error: {e}"),
        }
        result.map(Some)
    }
}

impl Drop for SamplingLoop {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// State owned by the background thread for the lifetime of one run.
struct LoopWorker {
    load: ComputeLoad,
    max_consecutive_failures: u32,
    throttle: Arc<dyn ThrottleSignal>,
    publisher: MetricsPublisher,
    workload: Box<dyn Workload>,
    pacing: PacingController,
    stats: RunningStats,
    window: JankWindow,
    stop_rx: Receiver<()>,
    epoch: Instant,
    cycle: u64,
    last_decision: PacingDecision,
    last_throttled: Option<bool>,
}

/// Result of one successful cycle.
struct Cycle {
    started_at: Instant,
    decision: PacingDecision,
    snapshot: MetricsSnapshot,
}

impl LoopWorker {
    fn new(
        config: &SamplingConfig,
        load: ComputeLoad,
        throttle: Arc<dyn ThrottleSignal>,
        publisher: MetricsPublisher,
        workload: Box<dyn Workload>,
        stop_rx: Receiver<()>,
    ) -> Self {
        let pacing = PacingController::from_config(config);
        Self {
            load,
            max_consecutive_failures: config.max_consecutive_failures,
            throttle,
            publisher,
            workload,
            last_decision: pacing.decide(false, load),
            pacing,
            stats: RunningStats::new(),
            window: JankWindow::new(config.window_horizon(), config.jank_threshold_ms),
            stop_rx,
            epoch: Instant::now(),
            cycle: 0,
            last_throttled: None,
        }
    }

    fn run(mut self) -> Result<LoopOutcome, ControlError> {
        log::info!("Sampling loop thread started (load={}).", self.load);
        let mut outcome = LoopOutcome::default();
        let mut consecutive_failures = 0u32;

        loop {
            let anchor = Instant::now();

            let started_at = match self.guarded_iteration() {
                Ok(cycle) => {
                    consecutive_failures = 0;
                    outcome.cycles_published += 1;
                    self.last_decision = cycle.decision;
                    self.publisher.publish(cycle.snapshot);
                    cycle.started_at
                }
                Err(e) => {
                    consecutive_failures += 1;
                    outcome.cycles_failed += 1;
                    log::warn!(
                        "Sampling cycle failed ({consecutive_failures}/{}): {e}",
                        self.max_consecutive_failures
                    );
                    if consecutive_failures >= self.max_consecutive_failures {
                        log::error!("Sampling loop aborting: failure budget exhausted.");
                        return Err(ControlError::LoopAborted {
                            consecutive_failures,
                            last_error: e,
                        });
                    }
                    anchor
                }
            };

            if self.pace(started_at) {
                break;
            }
        }

        log::info!("Sampling loop thread stopped.");
        Ok(outcome)
    }

    /// Runs one cycle, turning a panic anywhere inside it into an error.
    fn guarded_iteration(&mut self) -> Result<Cycle, IterationError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.iterate())) {
            Ok(result) => result,
            Err(payload) => Err(IterationError::Panicked(panic_message(payload.as_ref()))),
        }
    }

    fn iterate(&mut self) -> Result<Cycle, IterationError> {
        // Poll the host and pick cadence/intensity.
        let throttled = self.throttle.is_throttled();
        let decision = self.pacing.decide(throttled, self.load);
        if self.last_throttled != Some(throttled) {
            log::debug!(
                "Throttle {} -> {} Hz, load {}",
                if throttled { "on" } else { "off" },
                decision.target_rate_hz,
                decision.effective_load
            );
            self.last_throttled = Some(throttled);
        }

        // Timed region: the work repetitions and nothing else.
        let stopwatch = Stopwatch::start();
        self.workload.run_cycle(decision.effective_load)?;
        let last_duration_ms = stopwatch.elapsed_ms();
        if !last_duration_ms.is_finite() {
            return Err(IterationError::NonFiniteDuration);
        }

        // Aggregate.
        let now = Instant::now();
        self.stats.update(last_duration_ms);
        self.window.add(now, last_duration_ms);
        let rate = self.window.anomaly_rate(now);

        // Assemble.
        self.cycle += 1;
        let snapshot = MetricsSnapshot {
            cycle: self.cycle,
            timestamp_ms: now.duration_since(self.epoch).as_millis() as u64,
            last_duration_ms,
            moving_avg_ms: self.stats.mean(),
            moving_std_ms: self.stats.stddev(),
            window_anomaly_percent: rate.percent,
            window_anomaly_count: rate.count,
            target_rate_hz: decision.target_rate_hz,
            effective_load: decision.effective_load,
            throttled,
        };

        Ok(Cycle {
            started_at: stopwatch.started_at(),
            decision,
            snapshot,
        })
    }

    /// Spends the rest of the frame. Returns `true` if a stop was requested.
    fn pace(&self, started_at: Instant) -> bool {
        let action = self.pacing.sleep_for(
            started_at,
            Instant::now(),
            self.last_decision.target_rate_hz,
        );
        match action {
            PacingAction::Sleep(remaining) => match self.stop_rx.recv_timeout(remaining) {
                Err(RecvTimeoutError::Timeout) => false,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            },
            PacingAction::Yield => {
                thread::yield_now();
                match self.stop_rx.try_recv() {
                    Err(TryRecvError::Empty) => false,
                    Ok(()) | Err(TryRecvError::Disconnected) => true,
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

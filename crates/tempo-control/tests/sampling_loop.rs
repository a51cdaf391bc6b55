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

//! End-to-end runs of the sampling loop against a live subscriber.

use approx::assert_relative_eq;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempo_control::{ControlError, IterationError, LoopState, SamplingConfig, SamplingLoop};
use tempo_core::lane::{WorkError, Workload};
use tempo_core::{ComputeLoad, ThrottleSignal, ThrottleSwitch};
use tempo_telemetry::MetricsPublisher;
use tokio::time::timeout;

const PATIENCE: Duration = Duration::from_secs(5);

fn fast_config() -> SamplingConfig {
    SamplingConfig {
        buffer_width: 32,
        buffer_height: 32,
        ..Default::default()
    }
}

/// A throttle probe that reports a fixed state.
struct FixedThrottle(bool);

impl ThrottleSignal for FixedThrottle {
    fn is_throttled(&self) -> bool {
        self.0
    }
}

/// Counts repetitions and fails from the given cycle onwards.
struct CountingWorkload {
    repetitions: Arc<AtomicU32>,
    fail_after: Option<u32>,
    cycles: u32,
}

impl Workload for CountingWorkload {
    fn run_cycle(&mut self, repetitions: u32) -> Result<(), WorkError> {
        self.cycles += 1;
        if self.fail_after.is_some_and(|n| self.cycles > n) {
            return Err(WorkError::ShapeMismatch {
                width: 1,
                height: 1,
                expected: 1,
                actual: 0,
            });
        }
        self.repetitions.store(repetitions, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unthrottled_run_publishes_requested_load_at_normal_rate() {
    let publisher = MetricsPublisher::new();
    let mut sub = publisher.subscribe();
    let mut sampling = SamplingLoop::new(
        fast_config(),
        Arc::new(FixedThrottle(false)),
        publisher.clone(),
    )
    .unwrap();

    sampling.start(ComputeLoad::new(2)).unwrap();
    let first = timeout(PATIENCE, sub.next()).await.unwrap().unwrap();
    sampling.stop().unwrap();

    assert_eq!(first.cycle, 1);
    assert_eq!(first.effective_load, 2);
    assert_eq!(first.target_rate_hz, 20);
    assert!(!first.throttled);
    // A single sample has no spread, and its mean is itself.
    assert_relative_eq!(first.moving_avg_ms, first.last_duration_ms);
    assert_eq!(first.moving_std_ms, 0.0);
    assert_relative_eq!(first.frame_budget_ms(), 50.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_throttled_run_halves_cadence_and_drops_one_repetition() {
    let repetitions = Arc::new(AtomicU32::new(0));
    let publisher = MetricsPublisher::new();
    let mut sub = publisher.subscribe();
    let mut sampling = SamplingLoop::new(
        fast_config(),
        Arc::new(FixedThrottle(true)),
        publisher.clone(),
    )
    .unwrap()
    .with_workload(Box::new(CountingWorkload {
        repetitions: repetitions.clone(),
        fail_after: None,
        cycles: 0,
    }));

    sampling.start(ComputeLoad::new(4)).unwrap();
    let snapshot = timeout(PATIENCE, sub.next()).await.unwrap().unwrap();
    sampling.stop().unwrap();

    assert!(snapshot.throttled);
    assert_eq!(snapshot.target_rate_hz, 10);
    assert_eq!(snapshot.effective_load, 3);
    assert_eq!(repetitions.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fast_cycles_report_no_jank() {
    let publisher = MetricsPublisher::new();
    let mut sub = publisher.subscribe();
    let mut sampling = SamplingLoop::new(
        SamplingConfig {
            normal_rate_hz: 200,
            ..fast_config()
        },
        Arc::new(ThrottleSwitch::new(false)),
        publisher.clone(),
    )
    .unwrap()
    .with_workload(Box::new(CountingWorkload {
        repetitions: Arc::new(AtomicU32::new(0)),
        fail_after: None,
        cycles: 0,
    }));

    sampling.start(ComputeLoad::default()).unwrap();
    let mut last_cycle = 0;
    for _ in 0..5 {
        let snapshot = timeout(PATIENCE, sub.next()).await.unwrap().unwrap();
        assert!(snapshot.cycle > last_cycle);
        last_cycle = snapshot.cycle;
        assert_eq!(snapshot.window_anomaly_count, 0);
        assert_eq!(snapshot.window_anomaly_percent, 0.0);
    }
    let outcome = sampling.stop().unwrap().unwrap();
    assert!(outcome.cycles_published >= 5);
    assert_eq!(outcome.cycles_failed, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failure_streak_aborts_and_subscriber_sees_last_good_snapshot() {
    let publisher = MetricsPublisher::new();
    let mut sub = publisher.subscribe();
    let mut sampling = SamplingLoop::new(
        SamplingConfig {
            normal_rate_hz: 200,
            ..fast_config()
        },
        Arc::new(FixedThrottle(false)),
        publisher.clone(),
    )
    .unwrap()
    .with_workload(Box::new(CountingWorkload {
        repetitions: Arc::new(AtomicU32::new(0)),
        fail_after: Some(2),
        cycles: 0,
    }));

    sampling.start(ComputeLoad::new(1)).unwrap();
    timeout(PATIENCE, async {
        while sampling.state() != LoopState::Stopped {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    match sampling.stop() {
        Err(ControlError::LoopAborted {
            consecutive_failures,
            last_error: IterationError::Work(_),
        }) => assert_eq!(consecutive_failures, 3),
        other => panic!("expected LoopAborted, got {other:?}"),
    }

    // The retained value is the last successful cycle.
    let last = sub.try_next().or_else(|| publisher.latest()).unwrap();
    assert_eq!(last.cycle, 2);
    assert!(matches!(
        sampling.start(ComputeLoad::new(1)),
        Err(ControlError::AlreadyStopped)
    ));
}

#[test]
fn test_dropping_a_running_loop_stops_it() {
    let publisher = MetricsPublisher::new();
    {
        let mut sampling = SamplingLoop::new(
            fast_config(),
            Arc::new(FixedThrottle(false)),
            publisher.clone(),
        )
        .unwrap();
        sampling.start(ComputeLoad::new(1)).unwrap();
        let deadline = std::time::Instant::now() + PATIENCE;
        while publisher.latest().is_none() {
            assert!(std::time::Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(5));
        }
    }
    let after_drop = publisher.latest().map(|s| s.cycle);
    std::thread::sleep(Duration::from_millis(120));
    assert_eq!(publisher.latest().map(|s| s.cycle), after_drop);
}

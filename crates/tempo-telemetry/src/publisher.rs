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

//! Single-slot, latest-value broadcast of [`MetricsSnapshot`]s.

use std::sync::Arc;
use tempo_core::telemetry::MetricsSnapshot;
use tokio::sync::watch;

/// Holds the most recent snapshot and hands it to any number of subscribers.
///
/// Publishing overwrites the retained value and never waits for readers, so
/// a slow subscriber simply skips intermediate snapshots. The publisher is an
/// explicit instance: whoever composes the system creates one and passes
/// clones to the loop and to consumers. Clones share the same slot.
#[derive(Debug, Clone)]
pub struct MetricsPublisher {
    slot: Arc<watch::Sender<Option<MetricsSnapshot>>>,
}

impl MetricsPublisher {
    /// Creates a publisher with an empty slot.
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
        }
    }

    /// Replaces the retained snapshot and wakes every subscriber.
    ///
    /// Succeeds whether or not anyone is subscribed.
    pub fn publish(&self, snapshot: MetricsSnapshot) {
        log::trace!("Publishing snapshot #{}", snapshot.cycle);
        self.slot.send_replace(Some(snapshot));
    }

    /// Returns the retained snapshot, if anything was published yet.
    pub fn latest(&self) -> Option<MetricsSnapshot> {
        *self.slot.borrow()
    }

    /// Opens a fresh subscription.
    ///
    /// Its first item is the currently retained snapshot (if any), followed
    /// by every snapshot published afterwards that it has not fallen behind on.
    pub fn subscribe(&self) -> Subscription {
        let mut rx = self.slot.subscribe();
        if rx.borrow().is_some() {
            rx.mark_changed();
        }
        Subscription { rx }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.slot.receiver_count()
    }
}

impl Default for MetricsPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// One consumer's view of a [`MetricsPublisher`].
///
/// Subscriptions are independent: dropping or stalling one never affects the
/// producer or other subscribers.
#[derive(Debug)]
pub struct Subscription {
    rx: watch::Receiver<Option<MetricsSnapshot>>,
}

impl Subscription {
    /// Waits for the next unseen snapshot.
    ///
    /// Returns `None` once every publisher handle has been dropped and the
    /// last value has been observed.
    pub async fn next(&mut self) -> Option<MetricsSnapshot> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            if let Some(snapshot) = *self.rx.borrow_and_update() {
                return Some(snapshot);
            }
        }
    }

    /// Returns the next unseen snapshot without waiting.
    pub fn try_next(&mut self) -> Option<MetricsSnapshot> {
        match self.rx.has_changed() {
            Ok(true) => *self.rx.borrow_and_update(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot(cycle: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            cycle,
            timestamp_ms: cycle * 50,
            last_duration_ms: 4.0,
            moving_avg_ms: 4.0,
            moving_std_ms: 0.0,
            window_anomaly_percent: 0.0,
            window_anomaly_count: 0,
            target_rate_hz: 20,
            effective_load: 2,
            throttled: false,
        }
    }

    #[test]
    fn test_publish_without_subscribers_retains_value() {
        let publisher = MetricsPublisher::new();
        assert_eq!(publisher.latest(), None);
        publisher.publish(snapshot(1));
        publisher.publish(snapshot(2));
        assert_eq!(publisher.latest().map(|s| s.cycle), Some(2));
    }

    #[test]
    fn test_fresh_subscription_before_any_publish_is_empty() {
        let publisher = MetricsPublisher::new();
        let mut sub = publisher.subscribe();
        assert_eq!(sub.try_next(), None);
        assert_eq!(publisher.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_late_subscriber_receives_last_value_first() {
        let publisher = MetricsPublisher::new();
        publisher.publish(snapshot(1));
        publisher.publish(snapshot(2));

        let mut late = publisher.subscribe();
        assert_eq!(late.next().await.map(|s| s.cycle), Some(2));

        publisher.publish(snapshot(3));
        assert_eq!(late.next().await.map(|s| s.cycle), Some(3));
    }

    #[tokio::test]
    async fn test_concurrent_subscribers_see_same_sequence() {
        let publisher = MetricsPublisher::new();
        let mut a = publisher.subscribe();
        let mut b = publisher.subscribe();

        let mut seen_a = Vec::new();
        let mut seen_b = Vec::new();
        for cycle in 1..=5 {
            publisher.publish(snapshot(cycle));
            seen_a.push(a.next().await.map(|s| s.cycle));
            seen_b.push(b.next().await.map(|s| s.cycle));
        }

        assert_eq!(seen_a, seen_b);
        assert_eq!(seen_a, (1..=5).map(Some).collect::<Vec<_>>());
    }

    #[test]
    fn test_slow_subscriber_only_sees_latest() {
        let publisher = MetricsPublisher::new();
        let mut slow = publisher.subscribe();
        for cycle in 1..=10 {
            publisher.publish(snapshot(cycle));
        }
        assert_eq!(slow.try_next().map(|s| s.cycle), Some(10));
        assert_eq!(slow.try_next(), None);
    }

    #[tokio::test]
    async fn test_subscription_ends_when_publisher_dropped() {
        let publisher = MetricsPublisher::new();
        let mut sub = publisher.subscribe();
        publisher.publish(snapshot(1));
        drop(publisher);

        assert_eq!(sub.next().await.map(|s| s.cycle), Some(1));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cross_thread_producer_wakes_subscriber() {
        let publisher = MetricsPublisher::new();
        let mut sub = publisher.subscribe();

        let producer = publisher.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            producer.publish(snapshot(7));
        });

        let received = tokio::time::timeout(Duration::from_secs(2), sub.next())
            .await
            .expect("subscriber should be woken by the producer thread");
        assert_eq!(received.map(|s| s.cycle), Some(7));
        handle.join().unwrap();
    }
}

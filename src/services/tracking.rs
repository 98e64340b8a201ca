// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live driver positions.
//!
//! Drivers push their position into a [`LocationRegistry`]. A rider following
//! a driver gets a [`TrackingHandle`] whose background task re-reads the
//! registry every few seconds while the rider is still allowed to see the
//! driver. The task lives at most as long as the handle.

use dashmap::DashMap;
use futures_util::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::models::DriverLocation;

/// How often a tracker re-reads a driver's position.
pub const TRACKING_INTERVAL: Duration = Duration::from_secs(5);

/// Last known position per driver. In memory only.
#[derive(Clone, Default)]
pub struct LocationRegistry {
    positions: Arc<DashMap<String, DriverLocation>>,
}

impl LocationRegistry {
    pub fn publish(&self, location: DriverLocation) {
        tracing::debug!(username = %location.username, "Driver location updated");
        self.positions.insert(location.username.clone(), location);
    }

    pub fn get(&self, username: &str) -> Option<DriverLocation> {
        self.positions.get(username).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, username: &str) {
        self.positions.remove(username);
    }
}

/// Owner of a running tracker. Dropping it stops the poller.
pub struct TrackingHandle {
    rx: watch::Receiver<Option<DriverLocation>>,
    task: JoinHandle<()>,
}

/// Start polling `registry` for `username` every `period`.
///
/// The first read happens immediately. `permitted` is asked before every
/// read; once it returns false the task ends and subscribers see the
/// channel close.
pub fn start_tracking<F>(
    registry: LocationRegistry,
    username: String,
    period: Duration,
    permitted: F,
) -> TrackingHandle
where
    F: Fn() -> bool + Send + 'static,
{
    let (tx, rx) = watch::channel(None);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }
            if !permitted() {
                tracing::info!(username = %username, "Tracking no longer permitted");
                break;
            }
            let latest = registry.get(&username);
            tx.send_if_modified(|current| {
                if *current == latest {
                    return false;
                }
                *current = latest;
                true
            });
        }
        tracing::debug!(username = %username, "Tracker stopped");
    });

    TrackingHandle { rx, task }
}

impl TrackingHandle {
    /// Most recent position seen by the poller.
    pub fn latest(&self) -> Option<DriverLocation> {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<DriverLocation>> {
        self.rx.clone()
    }

    /// Stop polling now. Same as dropping the handle, which aborts the task.
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Positions as they change. The stream owns the handle, so dropping the
    /// stream stops the poller. It ends when the poller stops.
    pub fn into_stream(self) -> impl Stream<Item = DriverLocation> + Send + 'static {
        futures_util::stream::unfold(self, |mut handle| async move {
            loop {
                handle.rx.changed().await.ok()?;
                let latest = handle.rx.borrow_and_update().clone();
                if let Some(location) = latest {
                    return Some((location, handle));
                }
            }
        })
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures_util::StreamExt;

    fn location(lat: f64) -> DriverLocation {
        DriverLocation {
            username: "juangarcia".to_string(),
            lat,
            lon: -15.41,
            address: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracker_polls_and_stops_on_drop() {
        let registry = LocationRegistry::default();
        registry.publish(location(28.10));

        let handle = start_tracking(
            registry.clone(),
            "juangarcia".to_string(),
            TRACKING_INTERVAL,
            || true,
        );
        let mut rx = handle.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().map(|l| l.lat), Some(28.10));

        registry.publish(location(28.11));
        tokio::time::advance(TRACKING_INTERVAL).await;
        rx.changed().await.unwrap();
        assert_eq!(handle.latest().map(|l| l.lat), Some(28.11));

        drop(handle);
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_skips_until_driver_reports() {
        let registry = LocationRegistry::default();
        let handle = start_tracking(
            registry.clone(),
            "juangarcia".to_string(),
            TRACKING_INTERVAL,
            || true,
        );
        let mut stream = Box::pin(handle.into_stream());

        let publisher = registry.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            publisher.publish(location(28.2));
        });

        let first = stream.next().await.unwrap();
        assert_eq!(first.lat, 28.2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_when_no_longer_permitted() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let registry = LocationRegistry::default();
        registry.publish(location(28.10));
        let allowed = Arc::new(AtomicBool::new(true));

        let flag = allowed.clone();
        let handle = start_tracking(
            registry.clone(),
            "juangarcia".to_string(),
            TRACKING_INTERVAL,
            move || flag.load(Ordering::SeqCst),
        );
        let mut stream = Box::pin(handle.into_stream());

        assert_eq!(stream.next().await.unwrap().lat, 28.10);

        allowed.store(false, Ordering::SeqCst);
        registry.publish(location(28.11));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_aborts_poller() {
        let handle = start_tracking(
            LocationRegistry::default(),
            "juangarcia".to_string(),
            TRACKING_INTERVAL,
            || true,
        );
        let mut rx = handle.subscribe();

        handle.stop();
        assert!(rx.changed().await.is_err());
    }

    #[test]
    fn test_registry_remove() {
        let registry = LocationRegistry::default();
        registry.publish(location(28.1));
        assert!(registry.get("juangarcia").is_some());

        registry.remove("juangarcia");
        assert!(registry.get("juangarcia").is_none());
    }
}

//! Watch manager for broadcasting tracker events.

use crate::types::{Stats, Subscription, SubscriptionId};
use chrono::NaiveDate;
use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use super::types::{DropReason, TrackerEvent, WatchConfig, WatchHandle, WatchId};

/// Internal watcher state.
struct Watcher {
    config: WatchConfig,
    sender: Sender<TrackerEvent>,
    /// Whether replay is complete.
    caught_up: bool,
}

impl Watcher {
    /// Try to send an event. Returns false if the buffer is full or the
    /// receiver is gone (the watcher will be dropped).
    fn try_send(&self, event: TrackerEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }

    fn matches_record(&self, id: SubscriptionId) -> bool {
        if !self.config.filter.include_records {
            return false;
        }

        if let Some(ref ids) = self.config.filter.ids {
            return ids.contains(&id);
        }

        true
    }

    fn wants_stats(&self) -> bool {
        self.config.filter.include_stats
    }

    fn wants_quota(&self) -> bool {
        self.config.filter.include_quota
    }
}

/// Manages watchers and broadcasts events.
pub struct WatchManager {
    /// Active watchers by ID.
    watchers: RwLock<HashMap<WatchId, Watcher>>,
    /// Counter for generating watcher IDs.
    next_id: AtomicU64,
}

impl WatchManager {
    pub fn new() -> Self {
        Self {
            watchers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a watcher.
    ///
    /// The watcher receives no live events until `mark_caught_up` is called.
    pub fn watch(&self, config: WatchConfig) -> WatchHandle {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size.max(1));

        let watcher = Watcher {
            config,
            sender,
            caught_up: false,
        };

        self.watchers.write().insert(id, watcher);

        WatchHandle { id, receiver }
    }

    /// Remove a watcher.
    pub fn unwatch(&self, id: WatchId) {
        if let Some(watcher) = self.watchers.write().remove(&id) {
            // Best effort
            let _ = watcher.sender.try_send(TrackerEvent::Dropped {
                reason: DropReason::Unwatched,
            });
        }
    }

    /// Mark a watcher as caught up. Returns false if it was dropped.
    pub fn mark_caught_up(&self, id: WatchId) -> bool {
        let mut watchers = self.watchers.write();
        let sent = match watchers.get_mut(&id) {
            Some(watcher) => {
                watcher.caught_up = true;
                watcher.try_send(TrackerEvent::CaughtUp)
            }
            None => return false,
        };
        if !sent {
            watchers.remove(&id);
        }
        sent
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.read().len()
    }

    // --- Broadcasting ---

    pub fn broadcast_added(&self, subscription: &Subscription) {
        let id = subscription.id;
        let event = TrackerEvent::Added {
            subscription: subscription.clone(),
        };
        self.broadcast(|w| w.caught_up && w.matches_record(id), event);
    }

    pub fn broadcast_updated(&self, subscription: &Subscription) {
        let id = subscription.id;
        let event = TrackerEvent::Updated {
            subscription: subscription.clone(),
        };
        self.broadcast(|w| w.caught_up && w.matches_record(id), event);
    }

    pub fn broadcast_removed(&self, id: SubscriptionId) {
        self.broadcast(
            |w| w.caught_up && w.matches_record(id),
            TrackerEvent::Removed { id },
        );
    }

    pub fn broadcast_stats(&self, stats: &Stats, today: NaiveDate) {
        let event = TrackerEvent::StatsChanged {
            stats: stats.clone(),
            today,
        };
        self.broadcast(|w| w.caught_up && w.wants_stats(), event);
    }

    pub fn broadcast_quota_reached(&self, limit: usize) {
        self.broadcast(
            |w| w.caught_up && w.wants_quota(),
            TrackerEvent::QuotaReached { limit },
        );
    }

    /// Internal broadcast helper. Drops watchers that fail to receive.
    fn broadcast<F>(&self, filter: F, event: TrackerEvent)
    where
        F: Fn(&Watcher) -> bool,
    {
        let mut to_remove = Vec::new();

        {
            let watchers = self.watchers.read();
            for (id, watcher) in watchers.iter() {
                if filter(watcher) && !watcher.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut watchers = self.watchers.write();
            for id in to_remove {
                if let Some(watcher) = watchers.remove(&id) {
                    warn!(watcher = id.0, "dropping slow watcher");
                    // Might fail too, the buffer is full.
                    let _ = watcher.sender.try_send(TrackerEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }

    // --- Replay Helpers ---

    /// Send an event directly to one watcher, regardless of its filter.
    /// Returns false if the watcher is gone.
    pub fn send_to(&self, id: WatchId, event: TrackerEvent) -> bool {
        let watchers = self.watchers.read();
        match watchers.get(&id) {
            Some(watcher) => watcher.try_send(event),
            None => false,
        }
    }
}

impl Default for WatchManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryId, SubscriptionInput};
    use crate::watch::WatchFilter;
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn make_subscription(id: u64) -> Subscription {
        Subscription::from_input(
            SubscriptionId(id),
            SubscriptionInput::new(
                "Test",
                Decimal::from(10),
                NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
                CategoryId(1),
            ),
        )
    }

    #[test]
    fn test_watch_unwatch() {
        let manager = WatchManager::new();

        let handle = manager.watch(WatchConfig::default());
        assert_eq!(manager.watcher_count(), 1);

        manager.unwatch(handle.id);
        assert_eq!(manager.watcher_count(), 0);
        assert!(matches!(
            handle.try_recv(),
            Ok(TrackerEvent::Dropped {
                reason: DropReason::Unwatched
            })
        ));
    }

    #[test]
    fn test_broadcast_to_matching_ids() {
        let manager = WatchManager::new();

        let config = WatchConfig {
            filter: WatchFilter::ids(vec![SubscriptionId(2)]),
            ..Default::default()
        };
        let handle = manager.watch(config);
        assert!(manager.mark_caught_up(handle.id));

        let caught_up = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        assert!(matches!(caught_up, TrackerEvent::CaughtUp));

        manager.broadcast_added(&make_subscription(1));
        manager.broadcast_added(&make_subscription(2));

        let event = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(event.subscription_id(), Some(SubscriptionId(2)));
        assert!(handle.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_stats_filter() {
        let manager = WatchManager::new();
        let handle = manager.watch(WatchConfig {
            filter: WatchFilter::stats(),
            ..Default::default()
        });
        manager.mark_caught_up(handle.id);
        handle.drain();

        let today = NaiveDate::from_ymd_opt(2023, 11, 25).unwrap();
        manager.broadcast_removed(SubscriptionId(1));
        manager.broadcast_stats(&Stats::default(), today);
        manager.broadcast_quota_reached(5);

        assert_eq!(
            handle.drain(),
            vec![TrackerEvent::StatsChanged {
                stats: Stats::default(),
                today
            }]
        );
    }

    #[test]
    fn test_drop_slow_watcher() {
        let manager = WatchManager::new();
        let config = WatchConfig {
            buffer_size: 2,
            filter: WatchFilter::records(),
            ..Default::default()
        };
        let handle = manager.watch(config);
        manager.mark_caught_up(handle.id);

        for i in 0..10 {
            manager.broadcast_removed(SubscriptionId(i));
        }

        assert_eq!(manager.watcher_count(), 0);
        drop(handle);
    }

    #[test]
    fn test_not_caught_up_doesnt_receive() {
        let manager = WatchManager::new();
        let handle = manager.watch(WatchConfig::default());

        manager.broadcast_added(&make_subscription(1));

        let result = handle.recv_timeout(Duration::from_millis(50));
        assert!(result.is_err());
    }

    #[test]
    fn test_send_to_ignores_filter() {
        let manager = WatchManager::new();
        let handle = manager.watch(WatchConfig {
            filter: WatchFilter::stats(),
            ..Default::default()
        });

        assert!(manager.send_to(handle.id, TrackerEvent::Removed { id: SubscriptionId(3) }));
        assert!(!manager.send_to(WatchId(99), TrackerEvent::CaughtUp));
        assert_eq!(
            handle.try_recv().unwrap(),
            TrackerEvent::Removed { id: SubscriptionId(3) }
        );
    }
}

//! Watch types for the tracker change feed.

use crate::types::{Stats, Subscription, SubscriptionId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Configuration for a watcher.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Max buffered events before dropping the watcher.
    /// Default: 256
    pub buffer_size: usize,

    /// Send the current collection and statistics before live events.
    pub replay: bool,

    /// Filter criteria.
    pub filter: WatchFilter,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            buffer_size: 256,
            replay: false,
            filter: WatchFilter::all(),
        }
    }
}

/// Filter criteria for watchers.
#[derive(Clone, Debug, Default)]
pub struct WatchFilter {
    /// Only these subscriptions (None = all).
    pub ids: Option<Vec<SubscriptionId>>,

    /// Include added/updated/removed events.
    pub include_records: bool,

    /// Include recomputed statistics.
    pub include_stats: bool,

    /// Include quota denials.
    pub include_quota: bool,
}

impl WatchFilter {
    /// Record changes only.
    pub fn records() -> Self {
        Self {
            include_records: true,
            ..Default::default()
        }
    }

    /// Changes to specific subscriptions.
    pub fn ids(ids: Vec<SubscriptionId>) -> Self {
        Self {
            ids: Some(ids),
            include_records: true,
            ..Default::default()
        }
    }

    /// Statistics only.
    pub fn stats() -> Self {
        Self {
            include_stats: true,
            ..Default::default()
        }
    }

    /// Everything.
    pub fn all() -> Self {
        Self {
            ids: None,
            include_records: true,
            include_stats: true,
            include_quota: true,
        }
    }
}

/// Events emitted to watchers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    // --- Record Events ---
    /// A subscription was added at the tail.
    Added { subscription: Subscription },

    /// A subscription's fields were replaced.
    Updated { subscription: Subscription },

    /// A subscription was deleted.
    Removed { id: SubscriptionId },

    // --- Derived Events ---
    /// Statistics recomputed after a mutation.
    StatsChanged { stats: Stats, today: NaiveDate },

    /// An add was refused by the free-tier quota.
    QuotaReached { limit: usize },

    // --- Lifecycle Events ---
    /// Finished replaying the current collection, now streaming live.
    CaughtUp,

    /// Watcher was dropped.
    Dropped { reason: DropReason },
}

impl TrackerEvent {
    /// Subscription the event is about, if any.
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        match self {
            TrackerEvent::Added { subscription } | TrackerEvent::Updated { subscription } => {
                Some(subscription.id)
            }
            TrackerEvent::Removed { id } => Some(*id),
            _ => None,
        }
    }
}

/// Why a watcher was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unwatched.
    Unwatched,
}

/// Unique identifier for a watcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Handle to receive events for one watcher.
pub struct WatchHandle {
    pub id: WatchId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<TrackerEvent>,
}

impl WatchHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<TrackerEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<TrackerEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<TrackerEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything currently buffered, without blocking.
    pub fn drain(&self) -> Vec<TrackerEvent> {
        self.receiver.try_iter().collect()
    }
}

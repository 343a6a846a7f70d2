//! Main Tracker struct tying all components together.

use crate::categories::CategoryRegistry;
use crate::error::{Result, TrackerError, ValidationError};
use crate::host::{Clock, IdentityProvider, Notice, NotificationSink, UserIdentity};
use crate::quota::{QuotaDecision, QuotaPolicy, FREE_SUBSCRIPTION_LIMIT};
use crate::reminders::{due_reminders, Reminder, ReminderSettings};
use crate::stats::{aggregate, breakdown_by_category, upcoming_renewals, CategorySpend};
use crate::status::classify;
use crate::store::{validate, Store, StoreSnapshot};
use crate::types::{HistoryEntry, Stats, Status, Subscription, SubscriptionId, SubscriptionInput};
use crate::view::View;
use crate::watch::{TrackerEvent, WatchConfig, WatchFilter, WatchHandle, WatchId, WatchManager};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Tracker configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Maximum subscriptions for users without premium.
    pub free_subscription_limit: usize,

    /// Lead time for renewal reminders, in days.
    pub reminder_days: i64,

    /// Lead time for trial-ending reminders, in days.
    pub trial_reminder_days: i64,

    /// Window for the upcoming renewals list, in days.
    pub renewal_window_days: i64,

    /// Buffer size used by `watch_all`.
    pub watch_buffer_size: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            free_subscription_limit: FREE_SUBSCRIPTION_LIMIT,
            reminder_days: 3,
            trial_reminder_days: 1,
            renewal_window_days: 30,
            watch_buffer_size: 256,
        }
    }
}

impl TrackerConfig {
    /// Parse a (possibly partial) JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn reminder_settings(&self) -> ReminderSettings {
        ReminderSettings {
            reminder_days: self.reminder_days,
            trial_reminder_days: self.trial_reminder_days,
        }
    }
}

/// A subscription prepared for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub subscription: Subscription,
    pub status: Status,
    pub category_label: Option<String>,
}

/// The subscription tracker.
///
/// Provides a unified interface for:
/// - Adding, editing and deleting subscriptions under the free-tier quota
/// - Deriving status, statistics, reminders and display views
/// - Streaming changes to watchers
pub struct Tracker {
    config: TrackerConfig,

    store: Store,

    categories: CategoryRegistry,

    quota: QuotaPolicy,

    watchers: WatchManager,

    clock: Arc<dyn Clock>,

    identity: Arc<dyn IdentityProvider>,

    sink: Arc<dyn NotificationSink>,

    /// Serializes a mutation with the events it publishes.
    write_lock: Mutex<()>,
}

impl Tracker {
    /// Create an empty tracker with the default category set.
    pub fn new(
        config: TrackerConfig,
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityProvider>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let quota = QuotaPolicy::new(config.free_subscription_limit);
        Self {
            config,
            store: Store::new(),
            categories: CategoryRegistry::default(),
            quota,
            watchers: WatchManager::new(),
            clock,
            identity,
            sink,
            write_lock: Mutex::new(()),
        }
    }

    /// Replace the category registry.
    pub fn with_categories(mut self, categories: CategoryRegistry) -> Self {
        self.categories = categories;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    pub fn user(&self) -> UserIdentity {
        self.identity.current_user()
    }

    // --- Mutations ---

    /// Add a subscription, subject to the quota.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub fn add(&self, input: SubscriptionInput) -> Result<Subscription> {
        let _lock = self.write_lock.lock();

        let user = self.identity.current_user();
        if let QuotaDecision::Denied { limit, .. } =
            self.quota.check(self.store.len(), user.is_premium)
        {
            warn!(limit, "subscription limit reached");
            self.sink.notify(Notice::upsell(
                "Upgrade to Premium",
                format!(
                    "You have reached the limit of {limit} subscriptions. \
                     Upgrade to Premium to track an unlimited number of subscriptions."
                ),
            ));
            self.watchers.broadcast_quota_reached(limit);
            return Err(TrackerError::QuotaExceeded { limit });
        }

        self.validate(&input)?;
        let record = self.store.add(input)?;

        info!(id = %record.id, "subscription added");
        self.sink.notify(Notice::success("Subscription added"));
        self.watchers.broadcast_added(&record);
        self.publish_stats();

        Ok(record)
    }

    /// Replace every mutable field of a subscription.
    #[instrument(skip(self, input))]
    pub fn update(&self, id: SubscriptionId, input: SubscriptionInput) -> Result<Subscription> {
        let _lock = self.write_lock.lock();

        self.require(id)?;
        self.validate(&input)?;
        let record = self.store.update(id, input)?;

        info!("subscription updated");
        self.sink.notify(Notice::success("Subscription updated"));
        self.watchers.broadcast_updated(&record);
        self.publish_stats();

        Ok(record)
    }

    /// Flip the active flag of a subscription.
    #[instrument(skip(self))]
    pub fn toggle_active(&self, id: SubscriptionId) -> Result<Subscription> {
        let _lock = self.write_lock.lock();

        self.require(id)?;
        let record = self.store.toggle_active(id)?;

        info!(is_active = record.is_active, "subscription toggled");
        self.watchers.broadcast_updated(&record);
        self.publish_stats();

        Ok(record)
    }

    /// Delete a subscription after the user confirms.
    ///
    /// Returns `Cancelled` without touching the collection when the prompt
    /// is declined.
    #[instrument(skip(self))]
    pub fn remove(&self, id: SubscriptionId) -> Result<Subscription> {
        let _lock = self.write_lock.lock();

        let record = self.require(id)?;
        let prompt = format!("Delete subscription \"{}\"?", record.name);
        if !self.sink.confirm(&prompt) {
            info!("delete cancelled");
            return Err(TrackerError::Cancelled);
        }

        let removed = self.store.remove(id)?;

        info!("subscription removed");
        self.sink.notify(Notice::success("Subscription deleted"));
        self.watchers.broadcast_removed(id);
        self.publish_stats();

        Ok(removed)
    }

    fn validate(&self, input: &SubscriptionInput) -> Result<()> {
        validate(input)?;
        if !self.categories.contains(input.category_id) {
            return Err(ValidationError::UnknownCategory(input.category_id).into());
        }
        Ok(())
    }

    /// Look up a record that the caller expects to exist.
    fn require(&self, id: SubscriptionId) -> Result<Subscription> {
        match self.store.get(id) {
            Some(record) => Ok(record),
            None => {
                warn!(id = %id, "unknown subscription");
                self.sink.notify(Notice::error("Something went wrong. Please try again."));
                Err(TrackerError::NotFound(id))
            }
        }
    }

    fn publish_stats(&self) -> Stats {
        let today = self.clock.today();
        let stats = aggregate(&self.store.list(), today);
        debug!(
            total = %stats.total_monthly_cost,
            upcoming = stats.upcoming_renewals,
            trials = stats.active_trials,
            "stats recomputed"
        );
        self.watchers.broadcast_stats(&stats, today);
        stats
    }

    // --- Reads ---

    /// Copy of the collection in insertion order.
    pub fn list(&self) -> Vec<Subscription> {
        self.store.list()
    }

    pub fn get(&self, id: SubscriptionId) -> Option<Subscription> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.store.history()
    }

    // --- Derived State ---

    pub fn status_of(&self, id: SubscriptionId) -> Result<Status> {
        let record = self.store.get(id).ok_or(TrackerError::NotFound(id))?;
        Ok(classify(&record, self.clock.today()))
    }

    pub fn stats(&self) -> Stats {
        aggregate(&self.store.list(), self.clock.today())
    }

    /// Filtered, sorted and classified entries for display.
    pub fn view(&self, view: &View) -> Vec<Entry> {
        let today = self.clock.today();
        view.apply(&self.store.list())
            .into_iter()
            .map(|subscription| Entry {
                status: classify(&subscription, today),
                category_label: self
                    .categories
                    .label(subscription.category_id)
                    .map(str::to_string),
                subscription,
            })
            .collect()
    }

    pub fn reminders(&self) -> Vec<Reminder> {
        due_reminders(
            &self.store.list(),
            self.clock.today(),
            &self.config.reminder_settings(),
        )
    }

    /// Push every due reminder to the notification sink.
    pub fn notify_due_reminders(&self) -> usize {
        let reminders = self.reminders();
        for reminder in &reminders {
            self.sink.notify(Notice::success(reminder.message()));
        }
        reminders.len()
    }

    pub fn upcoming_renewals(&self) -> Vec<Subscription> {
        upcoming_renewals(
            &self.store.list(),
            self.clock.today(),
            self.config.renewal_window_days,
        )
    }

    pub fn breakdown(&self) -> Vec<CategorySpend> {
        breakdown_by_category(&self.store.list())
    }

    /// Whether the current user may add another subscription.
    pub fn quota(&self) -> QuotaDecision {
        self.quota
            .check(self.store.len(), self.identity.current_user().is_premium)
    }

    // --- Watchers ---

    /// Register a watcher, replaying the current collection first if asked.
    pub fn watch(&self, config: WatchConfig) -> WatchHandle {
        let _lock = self.write_lock.lock();

        let replay = config.replay;
        let filter = config.filter.clone();
        let handle = self.watchers.watch(config);

        if replay {
            self.replay(handle.id, &filter);
        }
        self.watchers.mark_caught_up(handle.id);

        handle
    }

    /// Watch everything with the configured buffer size.
    pub fn watch_all(&self) -> WatchHandle {
        self.watch(WatchConfig {
            buffer_size: self.config.watch_buffer_size,
            replay: false,
            filter: WatchFilter::all(),
        })
    }

    pub fn unwatch(&self, id: WatchId) {
        self.watchers.unwatch(id);
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.watcher_count()
    }

    fn replay(&self, id: WatchId, filter: &WatchFilter) {
        if filter.include_records {
            for subscription in self.store.list() {
                let wanted = filter
                    .ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&subscription.id));
                if wanted && !self.watchers.send_to(id, TrackerEvent::Added { subscription }) {
                    return;
                }
            }
        }

        if filter.include_stats {
            let today = self.clock.today();
            let stats = aggregate(&self.store.list(), today);
            self.watchers
                .send_to(id, TrackerEvent::StatsChanged { stats, today });
        }
    }

    // --- Import / Export ---

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.store.snapshot())?)
    }

    /// Replace the collection with an exported snapshot.
    ///
    /// Non-premium users cannot import more records than the quota allows.
    pub fn import_json(&self, json: &str) -> Result<()> {
        let snapshot: StoreSnapshot = serde_json::from_str(json)?;
        self.restore(snapshot)
    }

    #[instrument(skip(self, snapshot), fields(count = snapshot.subscriptions.len()))]
    pub fn restore(&self, snapshot: StoreSnapshot) -> Result<()> {
        let _lock = self.write_lock.lock();

        let is_premium = self.identity.current_user().is_premium;
        if !is_premium && snapshot.subscriptions.len() > self.quota.limit {
            warn!(limit = self.quota.limit, "import exceeds subscription limit");
            return Err(TrackerError::QuotaExceeded {
                limit: self.quota.limit,
            });
        }
        if let Some(record) = snapshot
            .subscriptions
            .iter()
            .find(|r| !self.categories.contains(r.category_id))
        {
            return Err(ValidationError::UnknownCategory(record.category_id).into());
        }

        self.store.restore(snapshot)?;

        info!("subscriptions restored");
        self.publish_stats();
        Ok(())
    }
}

//! # Subscription Tracker
//!
//! Lifecycle and spending engine for a personal subscription tracker.
//! The host application renders; this crate owns the records and derives
//! everything shown about them.
//!
//! ## Core Concepts
//!
//! - **Subscriptions**: Records with a monthly amount, dates and a category
//! - **Status**: Expired / expiring soon / free trial / normal, derived from "today"
//! - **Statistics**: Total monthly cost, upcoming renewals, active trials
//! - **Quota**: Free users may track at most five subscriptions
//! - **Watchers**: In-process change feed for mutations and recomputed stats
//!
//! ## Example
//!
//! ```ignore
//! use subtrack::{SubscriptionInput, SystemClock, StaticIdentity, MemorySink, Tracker, TrackerConfig};
//!
//! let tracker = Tracker::new(
//!     TrackerConfig::default(),
//!     Arc::new(SystemClock),
//!     Arc::new(StaticIdentity::free("Ann")),
//!     Arc::new(MemorySink::new()),
//! );
//!
//! let netflix = tracker.add(SubscriptionInput::new("Netflix", Decimal::from(599), start, CategoryId(1)))?;
//! println!("{}", tracker.status_of(netflix.id)?);
//! println!("{:?}", tracker.stats());
//! ```

pub mod categories;
pub mod error;
pub mod host;
pub mod quota;
pub mod reminders;
pub mod stats;
pub mod status;
pub mod store;
pub mod tracker;
pub mod types;
pub mod view;
pub mod watch;

// Re-exports
pub use categories::CategoryRegistry;
pub use error::{Result, TrackerError, ValidationError};
pub use host::{
    Clock, IdentityProvider, ManualClock, MemorySink, Notice, NoticeKind, NotificationSink,
    StaticIdentity, SystemClock, UserIdentity,
};
pub use quota::{check_quota, QuotaDecision, QuotaPolicy, FREE_SUBSCRIPTION_LIMIT};
pub use reminders::{due_reminders, Reminder, ReminderKind, ReminderSettings};
pub use stats::{
    aggregate, breakdown_by_category, upcoming_renewals, CategorySpend, RENEWAL_WINDOW_DAYS,
};
pub use status::{classify, days_until, EXPIRING_SOON_DAYS};
pub use store::{validate, Store, StoreSnapshot};
pub use tracker::{Entry, Tracker, TrackerConfig};
pub use types::*;
pub use view::{filter, sort, View};
pub use watch::{DropReason, TrackerEvent, WatchConfig, WatchFilter, WatchHandle, WatchId, WatchManager};

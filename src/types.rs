//! Core types for the subscription tracker.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a tracked subscription (assigned by the store).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference into the externally supplied category list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position in the store's change history.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Sequence(pub u64);

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seq({})", self.0)
    }
}

impl Sequence {
    pub fn next(self) -> Self {
        Sequence(self.0 + 1)
    }
}

/// A single tracked subscription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier (assigned by store, never recomputed).
    pub id: SubscriptionId,

    /// Service name, never empty.
    pub name: String,

    /// Monthly cost, never negative.
    pub amount: Decimal,

    pub start_date: NaiveDate,

    /// Subscription end; not before `start_date` when set.
    pub end_date: Option<NaiveDate>,

    /// End of the free trial, independent of `end_date`.
    pub free_trial_end_date: Option<NaiveDate>,

    pub category_id: CategoryId,

    pub notes: Option<String>,

    /// User-controlled flag, unrelated to the temporal status.
    pub is_active: bool,
}

impl Subscription {
    /// Build a stored record from validated input.
    pub(crate) fn from_input(id: SubscriptionId, input: SubscriptionInput) -> Self {
        Self {
            id,
            name: input.name,
            amount: input.amount,
            start_date: input.start_date,
            end_date: input.end_date,
            free_trial_end_date: input.free_trial_end_date,
            category_id: input.category_id,
            notes: input.notes,
            is_active: input.is_active,
        }
    }

    /// The mutable fields of this record, as an input set.
    pub fn to_input(&self) -> SubscriptionInput {
        SubscriptionInput {
            name: self.name.clone(),
            amount: self.amount,
            start_date: self.start_date,
            end_date: self.end_date,
            free_trial_end_date: self.free_trial_end_date,
            category_id: self.category_id,
            notes: self.notes.clone(),
            is_active: self.is_active,
        }
    }
}

/// Input for creating or replacing a subscription (before an id is assigned).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInput {
    pub name: String,
    pub amount: Decimal,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub free_trial_end_date: Option<NaiveDate>,
    pub category_id: CategoryId,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl SubscriptionInput {
    /// Create an active subscription input with no end, trial or notes.
    pub fn new(
        name: impl Into<String>,
        amount: Decimal,
        start_date: NaiveDate,
        category_id: CategoryId,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            start_date,
            end_date: None,
            free_trial_end_date: None,
            category_id,
            notes: None,
            is_active: true,
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_free_trial_end(mut self, trial_end: NaiveDate) -> Self {
        self.free_trial_end_date = Some(trial_end);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Temporal status of a subscription relative to "today".
///
/// Never stored; always derived by [`crate::classify`]. The serialized form
/// matches the presentation class names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Expired,
    ExpiringSoon,
    FreeTrialActive,
    Normal,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Expired => "expired",
            Status::ExpiringSoon => "expiring-soon",
            Status::FreeTrialActive => "free-trial-active",
            Status::Normal => "normal",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary metrics over the whole collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Sum of `amount` over all records, regardless of status or active flag.
    pub total_monthly_cost: Decimal,

    /// Records whose end date is 0..=7 days away.
    pub upcoming_renewals: usize,

    /// Records whose free trial ends strictly after today.
    pub active_trials: usize,

    /// Every record in the collection.
    pub subscription_count: usize,

    /// Records with the active flag set.
    pub active_count: usize,
}

impl Stats {
    pub fn yearly_cost(&self) -> Decimal {
        self.total_monthly_cost * Decimal::from(12)
    }
}

/// Ordering applied by [`crate::sort`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Amount,
    #[default]
    EndDate,
}

/// What happened to a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

/// A change in the store's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sequence: Sequence,
    pub id: SubscriptionId,
    pub action: ChangeAction,
    /// Record before the change (None for creations).
    pub before: Option<Subscription>,
    /// Record after the change (None for deletions).
    pub after: Option<Subscription>,
}

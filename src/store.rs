//! In-memory collection store.
//!
//! The store exclusively owns subscription records. Every read hands out
//! copies, so a returned snapshot never changes under a later mutation.

use crate::error::{Result, TrackerError, ValidationError};
use crate::types::{
    ChangeAction, HistoryEntry, Sequence, Subscription, SubscriptionId, SubscriptionInput,
};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Check an input set against the record invariants.
pub fn validate(input: &SubscriptionInput) -> std::result::Result<(), ValidationError> {
    if input.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if input.amount < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount);
    }
    if let Some(end) = input.end_date {
        if end < input.start_date {
            return Err(ValidationError::EndBeforeStart {
                start: input.start_date,
                end,
            });
        }
    }
    Ok(())
}

/// Serializable copy of the store contents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Next id to assign.
    pub next_id: u64,
    /// Records in insertion order.
    pub subscriptions: Vec<Subscription>,
}

struct StoreInner {
    /// Records in insertion order.
    records: Vec<Subscription>,

    /// Change history, oldest first.
    history: Vec<HistoryEntry>,

    /// Counter for generating ids; never reused.
    next_id: u64,

    /// Last assigned history sequence.
    head: Sequence,
}

impl StoreInner {
    fn position(&self, id: SubscriptionId) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(TrackerError::NotFound(id))
    }

    fn record_change(
        &mut self,
        id: SubscriptionId,
        action: ChangeAction,
        before: Option<Subscription>,
        after: Option<Subscription>,
    ) {
        self.head = self.head.next();
        self.history.push(HistoryEntry {
            sequence: self.head,
            id,
            action,
            before,
            after,
        });
    }
}

/// Ordered, in-memory collection of subscriptions.
pub struct Store {
    inner: RwLock<StoreInner>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: Vec::new(),
                history: Vec::new(),
                next_id: 1,
                head: Sequence::default(),
            }),
        }
    }

    // --- Mutations ---

    /// Validate and append a new subscription at the tail.
    pub fn add(&self, input: SubscriptionInput) -> Result<Subscription> {
        validate(&input)?;

        let mut inner = self.inner.write();
        let id = SubscriptionId(inner.next_id);
        inner.next_id = inner
            .next_id
            .checked_add(1)
            .ok_or(TrackerError::IdSpaceExhausted)?;

        let record = Subscription::from_input(id, input);
        inner.records.push(record.clone());
        inner.record_change(id, ChangeAction::Created, None, Some(record.clone()));

        debug!(id = %id, count = inner.records.len(), "subscription added");
        Ok(record)
    }

    /// Replace every mutable field of an existing subscription.
    ///
    /// The id and the position in the collection are preserved.
    pub fn update(&self, id: SubscriptionId, input: SubscriptionInput) -> Result<Subscription> {
        let mut inner = self.inner.write();
        let pos = inner.position(id)?;
        validate(&input)?;

        let record = Subscription::from_input(id, input);
        let before = std::mem::replace(&mut inner.records[pos], record.clone());
        inner.record_change(id, ChangeAction::Updated, Some(before), Some(record.clone()));

        debug!(id = %id, "subscription updated");
        Ok(record)
    }

    /// Flip the user-controlled active flag.
    pub fn toggle_active(&self, id: SubscriptionId) -> Result<Subscription> {
        let mut inner = self.inner.write();
        let pos = inner.position(id)?;

        let before = inner.records[pos].clone();
        inner.records[pos].is_active = !before.is_active;
        let after = inner.records[pos].clone();
        inner.record_change(id, ChangeAction::Updated, Some(before), Some(after.clone()));

        debug!(id = %id, is_active = after.is_active, "subscription toggled");
        Ok(after)
    }

    /// Delete a subscription. Callers gate this behind a confirmation.
    pub fn remove(&self, id: SubscriptionId) -> Result<Subscription> {
        let mut inner = self.inner.write();
        let pos = inner.position(id)?;

        let removed = inner.records.remove(pos);
        inner.record_change(id, ChangeAction::Deleted, Some(removed.clone()), None);

        debug!(id = %id, count = inner.records.len(), "subscription removed");
        Ok(removed)
    }

    // --- Reads ---

    /// Copy of the collection in insertion order.
    pub fn list(&self) -> Vec<Subscription> {
        self.inner.read().records.clone()
    }

    pub fn get(&self, id: SubscriptionId) -> Option<Subscription> {
        self.inner.read().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.inner.read().records.iter().any(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    // --- History ---

    /// Every change since the store was created or last restored.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.read().history.clone()
    }

    /// Changes touching a single subscription.
    pub fn history_for(&self, id: SubscriptionId) -> Vec<HistoryEntry> {
        self.inner
            .read()
            .history
            .iter()
            .filter(|e| e.id == id)
            .cloned()
            .collect()
    }

    /// Sequence of the most recent change.
    pub fn head(&self) -> Sequence {
        self.inner.read().head
    }

    // --- Snapshots ---

    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.read();
        StoreSnapshot {
            next_id: inner.next_id,
            subscriptions: inner.records.clone(),
        }
    }

    /// Replace the whole collection with a snapshot.
    ///
    /// Every record is validated and ids must be unique; on failure the
    /// current contents are left untouched. History starts over.
    ///
    /// A snapshot that leaves no id free for the next `add` is rejected.
    pub fn restore(&self, snapshot: StoreSnapshot) -> Result<()> {
        let mut seen = HashSet::with_capacity(snapshot.subscriptions.len());
        for record in &snapshot.subscriptions {
            validate(&record.to_input())?;
            if !seen.insert(record.id) {
                return Err(TrackerError::DuplicateId(record.id));
            }
        }

        let max_id = snapshot
            .subscriptions
            .iter()
            .map(|r| r.id.0)
            .max()
            .unwrap_or(0);
        let next_id = match max_id.checked_add(1) {
            Some(next) => next.max(snapshot.next_id),
            None => return Err(TrackerError::IdSpaceExhausted),
        };
        if next_id == u64::MAX {
            return Err(TrackerError::IdSpaceExhausted);
        }

        let mut inner = self.inner.write();
        inner.next_id = next_id;
        inner.records = snapshot.subscriptions;
        inner.history.clear();
        inner.head = Sequence::default();

        debug!(count = inner.records.len(), next_id = inner.next_id, "store restored");
        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

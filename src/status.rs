//! Temporal status classification.
//!
//! Status is derived from the record's dates and an injected "today"; it is
//! never stored. Day deltas are whole calendar days, so a date equal to today
//! is 0 days away and classifies as expired.

use crate::types::{Status, Subscription};
use chrono::NaiveDate;

/// A record ending within this many days is expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 3;

/// Whole calendar days from `today` until `date` (negative once passed).
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    date.signed_duration_since(today).num_days()
}

/// Classify a subscription relative to `today`.
///
/// The free trial takes precedence: when `free_trial_end_date` is set the
/// result never depends on `end_date`.
pub fn classify(subscription: &Subscription, today: NaiveDate) -> Status {
    if let Some(trial_end) = subscription.free_trial_end_date {
        return by_days_left(days_until(trial_end, today), Status::FreeTrialActive);
    }

    if let Some(end) = subscription.end_date {
        return by_days_left(days_until(end, today), Status::Normal);
    }

    Status::Normal
}

fn by_days_left(days_left: i64, otherwise: Status) -> Status {
    if days_left <= 0 {
        Status::Expired
    } else if days_left <= EXPIRING_SOON_DAYS {
        Status::ExpiringSoon
    } else {
        otherwise
    }
}

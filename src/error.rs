//! Error types for the subscription tracker.

use crate::types::{CategoryId, SubscriptionId};
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid subscription: {0}")]
    Validation(#[from] ValidationError),

    #[error("Subscription not found: {0}")]
    NotFound(SubscriptionId),

    #[error("Subscription limit reached ({limit})")]
    QuotaExceeded { limit: usize },

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Duplicate subscription id: {0}")]
    DuplicateId(SubscriptionId),

    #[error("No subscription ids left to assign")]
    IdSpaceExhausted,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Why an input set was rejected. No state is touched when this is returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("amount must not be negative")]
    NegativeAmount,

    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("unknown category: {0}")]
    UnknownCategory(CategoryId),
}

impl From<serde_json::Error> for TrackerError {
    fn from(e: serde_json::Error) -> Self {
        TrackerError::Serialization(e.to_string())
    }
}

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

//! Free-tier quota policy.
//!
//! Privilege is supplied by the caller; the policy never derives it.

use serde::{Deserialize, Serialize};

/// Maximum number of subscriptions for non-privileged users.
pub const FREE_SUBSCRIPTION_LIMIT: usize = 5;

/// Outcome of a quota check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum QuotaDecision {
    Allowed,
    Denied { reason: String, limit: usize },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed)
    }
}

/// Quota check with the default free-tier limit.
pub fn check_quota(record_count: usize, is_privileged: bool) -> QuotaDecision {
    QuotaPolicy::default().check(record_count, is_privileged)
}

/// Record-count limit for non-privileged users.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub limit: usize,
}

impl QuotaPolicy {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Whether one more record may be added to a collection of `record_count`.
    pub fn check(&self, record_count: usize, is_privileged: bool) -> QuotaDecision {
        if is_privileged || record_count < self.limit {
            QuotaDecision::Allowed
        } else {
            QuotaDecision::Denied {
                reason: "limit reached".to_string(),
                limit: self.limit,
            }
        }
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::new(FREE_SUBSCRIPTION_LIMIT)
    }
}

//! Spending statistics.
//!
//! Everything here is recomputed from the structured records on each call;
//! no incremental state is kept.

use crate::status::days_until;
use crate::types::{CategoryId, Stats, Subscription};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// End dates within this many days count as upcoming renewals.
pub const RENEWAL_WINDOW_DAYS: i64 = 7;

/// Summary metrics for a collection.
///
/// The total includes every record, inactive and expired ones too.
pub fn aggregate(records: &[Subscription], today: NaiveDate) -> Stats {
    let mut stats = Stats::default();

    for record in records {
        stats.total_monthly_cost += record.amount;
        stats.subscription_count += 1;
        if record.is_active {
            stats.active_count += 1;
        }

        if let Some(end) = record.end_date {
            if (0..=RENEWAL_WINDOW_DAYS).contains(&days_until(end, today)) {
                stats.upcoming_renewals += 1;
            }
        }

        if let Some(trial_end) = record.free_trial_end_date {
            if trial_end > today {
                stats.active_trials += 1;
            }
        }
    }

    stats
}

/// Monthly spend in one category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category_id: CategoryId,
    pub monthly_cost: Decimal,
    pub count: usize,
    /// Percentage of active monthly spend, to one decimal place.
    pub share: Decimal,
}

/// Per-category spend over active records, largest first.
pub fn breakdown_by_category(records: &[Subscription]) -> Vec<CategorySpend> {
    let mut by_category: BTreeMap<CategoryId, CategorySpend> = BTreeMap::new();

    for record in records.iter().filter(|r| r.is_active) {
        let entry = by_category
            .entry(record.category_id)
            .or_insert_with(|| CategorySpend {
                category_id: record.category_id,
                monthly_cost: Decimal::ZERO,
                count: 0,
                share: Decimal::ZERO,
            });
        entry.monthly_cost += record.amount;
        entry.count += 1;
    }

    let total: Decimal = by_category.values().map(|s| s.monthly_cost).sum();
    if !total.is_zero() {
        for spend in by_category.values_mut() {
            spend.share = (spend.monthly_cost / total * Decimal::ONE_HUNDRED).round_dp(1);
        }
    }

    // BTreeMap yields ascending ids, and the sort is stable.
    let mut spends: Vec<_> = by_category.into_values().collect();
    spends.sort_by(|a, b| b.monthly_cost.cmp(&a.monthly_cost));
    spends
}

/// Active records ending within `days` days of today, soonest first.
pub fn upcoming_renewals(records: &[Subscription], today: NaiveDate, days: i64) -> Vec<Subscription> {
    let mut upcoming: Vec<_> = records
        .iter()
        .filter(|r| r.is_active)
        .filter(|r| {
            r.end_date
                .map(|end| (0..=days).contains(&days_until(end, today)))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    upcoming.sort_by_key(|r| r.end_date);
    upcoming
}

//! Ordered and filtered views over the collection.

use crate::types::{CategoryId, SortKey, Subscription};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Order records by `key`. The sort is stable.
///
/// Names compare case-insensitively, then by code point. This is not locale
/// collation: accented letters sort after `z`, and Cyrillic `ё` after `я`.
/// Records without an end date always go last when sorting by end date.
pub fn sort(records: &[Subscription], key: SortKey) -> Vec<Subscription> {
    let mut sorted = records.to_vec();
    match key {
        SortKey::Name => sorted.sort_by_cached_key(|r| name_key(&r.name)),
        SortKey::Amount => sorted.sort_by(|a, b| a.amount.cmp(&b.amount)),
        SortKey::EndDate => sorted.sort_by(|a, b| match (a.end_date, b.end_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
    }
    sorted
}

/// Case-folded sort key for names, ordered by code point.
fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Records in `category`, or all records when no category is selected.
pub fn filter(records: &[Subscription], category: Option<CategoryId>) -> Vec<Subscription> {
    match category {
        Some(category) => records
            .iter()
            .filter(|r| r.category_id == category)
            .cloned()
            .collect(),
        None => records.to_vec(),
    }
}

/// A presentation query: optional category filter, then an optional sort.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub category: Option<CategoryId>,
    pub sort: Option<SortKey>,
}

impl View {
    pub fn sorted_by(key: SortKey) -> Self {
        Self {
            sort: Some(key),
            ..Default::default()
        }
    }

    pub fn in_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn apply(&self, records: &[Subscription]) -> Vec<Subscription> {
        let filtered = filter(records, self.category);
        match self.sort {
            Some(key) => sort(&filtered, key),
            None => filtered,
        }
    }
}

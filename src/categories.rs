//! Category registry.
//!
//! Categories are managed elsewhere; the tracker only needs to resolve ids to
//! labels and reject ids it does not know.

use crate::types::CategoryId;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryRegistry {
    labels: BTreeMap<CategoryId, String>,
}

impl CategoryRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            labels: BTreeMap::new(),
        }
    }

    pub fn with_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = (CategoryId, S)>,
        S: Into<String>,
    {
        Self {
            labels: categories
                .into_iter()
                .map(|(id, label)| (id, label.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, id: CategoryId, label: impl Into<String>) {
        self.labels.insert(id, label.into());
    }

    pub fn label(&self, id: CategoryId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.labels.contains_key(&id)
    }

    /// Categories in id order.
    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, &str)> {
        self.labels.iter().map(|(id, label)| (*id, label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::with_categories([
            (CategoryId(1), "Entertainment"),
            (CategoryId(2), "Work"),
            (CategoryId(3), "Education"),
            (CategoryId(4), "VPN"),
            (CategoryId(5), "Other"),
        ])
    }
}

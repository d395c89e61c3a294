use serde::{Deserialize, Serialize};

/// Maximum number of entries kept per visitor
pub const HISTORY_CAPACITY: usize = 8;

/// A page the visitor has navigated to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NavigationHistoryItem {
    /// Route visited; unique within a history
    pub path: String,
    pub name: String,
    pub category: String,
    /// Visit time in epoch milliseconds
    pub timestamp: i64,
}

/// Most-recent-first, capped, path-unique navigation log
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct NavigationHistory {
    items: Vec<NavigationHistoryItem>,
}

impl NavigationHistory {
    /// Creates an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a visit, promoting an existing entry for the same path to the front
    pub fn record(&mut self, item: NavigationHistoryItem) {
        self.items.retain(|existing| existing.path != item.path);
        self.items.insert(0, item);
        self.items.truncate(HISTORY_CAPACITY);
    }

    pub fn items(&self) -> &[NavigationHistoryItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<NavigationHistoryItem> {
        self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

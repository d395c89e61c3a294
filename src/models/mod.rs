use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod history;
pub mod session;

pub use catalog::{Badge, CatalogItem, NavCategory, NavEntry, NavSection, Section};
pub use history::{NavigationHistory, NavigationHistoryItem, HISTORY_CAPACITY};
pub use session::SessionContext;

/// A catalog item ranked for a visitor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub score: u32,
}

/// A row of the search analytics table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchQueryRecord {
    /// Lower-cased query text
    pub search_query: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// API request types
// ============================================================================

/// Body of a visit recorded by the site
#[derive(Debug, Deserialize)]
pub struct RecordVisitRequest {
    pub path: String,
    pub name: String,
    pub category: String,
}

/// Body for scoring explicit inputs against the catalog
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub history: Vec<NavigationHistoryItem>,
    #[serde(default)]
    pub recent_search_queries: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchEventRequest {
    pub query: String,
}

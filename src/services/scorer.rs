use std::collections::HashSet;

use crate::models::{Badge, CatalogItem, NavigationHistoryItem, Recommendation};

/// Maximum number of recommendations returned per pass
pub const MAX_RECOMMENDATIONS: usize = 4;

const SEARCH_MATCH_POINTS: u32 = 3;
const HISTORY_CATEGORY_POINTS: u32 = 2;
const POPULAR_BADGE_POINTS: u32 = 1;

/// Ranks catalog items the visitor has not viewed yet
///
/// Scoring per item:
/// - +3 for every recent search query contained (case-insensitively) in the
///   item's name or category
/// - +2 once if any history entry shares the item's category
/// - +1 for a `popular` badge
///
/// Items already visited and items scoring zero are dropped. The rest are
/// ordered by score descending; equal scores keep catalog order. At most
/// [`MAX_RECOMMENDATIONS`] items are returned.
pub fn recommend(
    history: &[NavigationHistoryItem],
    recent_search_queries: &[String],
    catalog: &[CatalogItem],
) -> Vec<Recommendation> {
    let visited: HashSet<&str> = history.iter().map(|h| h.path.as_str()).collect();
    let history_categories: HashSet<&str> = history.iter().map(|h| h.category.as_str()).collect();
    let queries: Vec<String> = recent_search_queries
        .iter()
        .filter(|q| !q.is_empty())
        .map(|q| q.to_lowercase())
        .collect();

    let mut ranked: Vec<Recommendation> = catalog
        .iter()
        .filter(|item| !visited.contains(item.link.as_str()))
        .filter_map(|item| {
            let score = score_item(item, &queries, &history_categories);
            (score > 0).then(|| Recommendation {
                item: item.clone(),
                score,
            })
        })
        .collect();

    // sort_by is stable: ties stay in catalog order
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(MAX_RECOMMENDATIONS);
    ranked
}

fn score_item(item: &CatalogItem, queries: &[String], history_categories: &HashSet<&str>) -> u32 {
    let name = item.name.to_lowercase();
    let category = item.category.to_lowercase();

    let search_matches = queries
        .iter()
        .filter(|q| name.contains(q.as_str()) || category.contains(q.as_str()))
        .count() as u32;

    let mut score = search_matches * SEARCH_MATCH_POINTS;

    if history_categories.contains(item.category.as_str()) {
        score += HISTORY_CATEGORY_POINTS;
    }

    if item.badge == Some(Badge::Popular) {
        score += POPULAR_BADGE_POINTS;
    }

    score
}

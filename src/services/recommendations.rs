use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppResult,
    models::{CatalogItem, NavigationHistoryItem, Recommendation, SessionContext},
    services::{
        history::HistoryStore,
        scorer,
        search_analytics::{fetch_recent_queries, SearchAnalyticsStore},
    },
};

/// Tunables for a scoring pass
#[derive(Debug, Clone)]
pub struct RecommendationSettings {
    /// Window of search analytics considered, in days
    pub search_window_days: u32,
    /// Maximum number of search queries read
    pub search_query_limit: u32,
    /// Budget for the search analytics read before failing open
    pub search_timeout: Duration,
    /// How long a computed result may be reused for an unchanged history
    pub staleness: Duration,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            search_window_days: 14,
            search_query_limit: 20,
            search_timeout: Duration::from_millis(1500),
            staleness: Duration::from_secs(300),
        }
    }
}

impl From<&Config> for RecommendationSettings {
    fn from(config: &Config) -> Self {
        Self {
            search_window_days: config.search_window_days,
            search_query_limit: config.search_query_limit,
            search_timeout: Duration::from_millis(config.search_timeout_ms),
            staleness: Duration::from_secs(config.search_cache_ttl_secs),
        }
    }
}

/// Last result computed for a session
struct MemoEntry {
    /// (path, category) of every history entry, most recent first
    visits: Vec<(String, String)>,
    computed_at: Instant,
    recommendations: Vec<Recommendation>,
}

fn visit_key(history: &[NavigationHistoryItem]) -> Vec<(String, String)> {
    history
        .iter()
        .map(|h| (h.path.clone(), h.category.clone()))
        .collect()
}

impl MemoEntry {
    fn matches(&self, history: &[NavigationHistoryItem], staleness: Duration) -> bool {
        self.visits.len() == history.len()
            && self
                .visits
                .iter()
                .zip(history)
                .all(|((path, category), h)| *path == h.path && *category == h.category)
            && self.computed_at.elapsed() < staleness
    }
}

/// Combines navigation history, search analytics and the catalog into
/// per-session recommendations
pub struct RecommendationService {
    history: Arc<dyn HistoryStore>,
    search_analytics: Arc<dyn SearchAnalyticsStore>,
    catalog: Arc<Vec<CatalogItem>>,
    settings: RecommendationSettings,
    memo: RwLock<HashMap<Uuid, MemoEntry>>,
}

impl RecommendationService {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        search_analytics: Arc<dyn SearchAnalyticsStore>,
        catalog: Arc<Vec<CatalogItem>>,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            history,
            search_analytics,
            catalog,
            settings,
            memo: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &[CatalogItem] {
        &self.catalog
    }

    /// Recommendations for the session's current history
    ///
    /// Nothing is scored while the history is empty. A result is reused while
    /// the ordered visits are unchanged and the staleness window has not
    /// elapsed; reused results are still filtered against the current history.
    pub async fn recommendations_for(
        &self,
        session: &SessionContext,
    ) -> AppResult<Vec<Recommendation>> {
        let history = self.history.list(session).await?;

        if history.is_empty() {
            tracing::debug!(session_id = %session, "Empty history, skipping recommendations");
            return Ok(Vec::new());
        }

        if let Some(entry) = self.memo.read().await.get(&session.session_id) {
            if entry.matches(&history, self.settings.staleness) {
                tracing::debug!(session_id = %session, "Reusing memoized recommendations");
                return Ok(entry
                    .recommendations
                    .iter()
                    .filter(|r| history.iter().all(|h| h.path != r.item.link))
                    .cloned()
                    .collect());
            }
        }

        let queries = fetch_recent_queries(
            self.search_analytics.as_ref(),
            self.settings.search_window_days,
            self.settings.search_query_limit,
            self.settings.search_timeout,
        )
        .await;

        let recommendations = self.score(&history, &queries);

        tracing::info!(
            session_id = %session,
            history_len = history.len(),
            query_count = queries.len(),
            recommended = recommendations.len(),
            "Computed recommendations"
        );

        let mut memo = self.memo.write().await;
        let staleness = self.settings.staleness;
        memo.retain(|_, entry| entry.computed_at.elapsed() < staleness);
        memo.insert(
            session.session_id,
            MemoEntry {
                visits: visit_key(&history),
                computed_at: Instant::now(),
                recommendations: recommendations.clone(),
            },
        );

        Ok(recommendations)
    }

    /// Drops the session's memoized result, e.g. after its history is cleared
    pub async fn forget(&self, session: &SessionContext) {
        self.memo.write().await.remove(&session.session_id);
    }

    /// Scores explicit inputs against the catalog
    pub fn score(
        &self,
        history: &[NavigationHistoryItem],
        recent_search_queries: &[String],
    ) -> Vec<Recommendation> {
        scorer::recommend(history, recent_search_queries, &self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{Badge, Section, HISTORY_CAPACITY};
    use crate::services::history::{new_visit, MemoryHistoryStore};
    use crate::services::search_analytics::MockSearchAnalyticsStore;

    fn catalog() -> Arc<Vec<CatalogItem>> {
        Arc::new(vec![
            CatalogItem {
                name: "Waterproofing".to_string(),
                link: "/services/waterproofing".to_string(),
                category: "Building Envelope".to_string(),
                section: Section::Services,
                badge: None,
            },
            CatalogItem {
                name: "Roofing".to_string(),
                link: "/services/roofing".to_string(),
                category: "Building Envelope".to_string(),
                section: Section::Services,
                badge: Some(Badge::Popular),
            },
            CatalogItem {
                name: "Masonry".to_string(),
                link: "/services/masonry".to_string(),
                category: "Building Envelope".to_string(),
                section: Section::Services,
                badge: None,
            },
        ])
    }

    fn analytics_returning(
        queries: Vec<&'static str>,
        expected_calls: usize,
    ) -> Arc<MockSearchAnalyticsStore> {
        let mut store = MockSearchAnalyticsStore::new();
        store
            .expect_recent_queries()
            .times(expected_calls)
            .returning(move |_, _| Ok(queries.iter().map(|q| q.to_string()).collect()));
        store.expect_name().return_const("mock");
        Arc::new(store)
    }

    fn service(
        history: Arc<MemoryHistoryStore>,
        analytics: Arc<MockSearchAnalyticsStore>,
    ) -> RecommendationService {
        RecommendationService::new(history, analytics, catalog(), RecommendationSettings::default())
    }

    async fn visit(store: &MemoryHistoryStore, session: &SessionContext, path: &str) {
        store
            .record(session, new_visit(path, "Page", "Building Envelope").unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_history_skips_scoring() {
        let history = Arc::new(MemoryHistoryStore::new());
        let service = service(history, analytics_returning(vec!["roof"], 0));

        let recs = service.recommendations_for(&SessionContext::new()).await.unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn test_scores_history_and_search_queries() {
        let history = Arc::new(MemoryHistoryStore::new());
        let session = SessionContext::new();
        visit(&history, &session, "/services/masonry").await;

        let service = service(history, analytics_returning(vec!["waterproof"], 1));
        let recs = service.recommendations_for(&session).await.unwrap();

        let ranked: Vec<(&str, u32)> = recs.iter().map(|r| (r.item.name.as_str(), r.score)).collect();
        assert_eq!(ranked, vec![("Waterproofing", 5), ("Roofing", 3)]);
    }

    #[tokio::test]
    async fn test_unchanged_history_reuses_result() {
        let history = Arc::new(MemoryHistoryStore::new());
        let session = SessionContext::new();
        visit(&history, &session, "/services/masonry").await;

        let service = service(history, analytics_returning(vec!["roof"], 1));
        let first = service.recommendations_for(&session).await.unwrap();
        let second = service.recommendations_for(&session).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_new_visit_triggers_recompute() {
        let history = Arc::new(MemoryHistoryStore::new());
        let session = SessionContext::new();
        visit(&history, &session, "/services/masonry").await;

        let service = service(history.clone(), analytics_returning(vec!["waterproof"], 2));
        let before = service.recommendations_for(&session).await.unwrap();
        assert_eq!(before[0].item.name, "Waterproofing");

        visit(&history, &session, "/services/waterproofing").await;
        let after = service.recommendations_for(&session).await.unwrap();

        assert!(after.iter().all(|r| r.item.link != "/services/waterproofing"));
        assert_eq!(after[0].item.name, "Roofing");
    }

    #[tokio::test]
    async fn test_analytics_failure_degrades_to_history_and_badges() {
        let history = Arc::new(MemoryHistoryStore::new());
        let session = SessionContext::new();
        visit(&history, &session, "/services/masonry").await;

        let mut analytics = MockSearchAnalyticsStore::new();
        analytics
            .expect_recent_queries()
            .returning(|_, _| Err(AppError::ExternalApi("connection refused".to_string())));
        analytics.expect_name().return_const("mock");

        let service = service(history, Arc::new(analytics));
        let recs = service.recommendations_for(&session).await.unwrap();

        let ranked: Vec<(&str, u32)> = recs.iter().map(|r| (r.item.name.as_str(), r.score)).collect();
        assert_eq!(ranked, vec![("Roofing", 3), ("Waterproofing", 2)]);
    }

    fn assert_nothing_visited(recs: &[Recommendation], history: &[NavigationHistoryItem]) {
        for rec in recs {
            assert!(
                history.iter().all(|h| h.path != rec.item.link),
                "{} was already visited",
                rec.item.link
            );
        }
    }

    #[tokio::test]
    async fn test_full_history_with_same_latest_path_recomputes() {
        let history = Arc::new(MemoryHistoryStore::new());
        let session = SessionContext::new();
        for i in 1..=HISTORY_CAPACITY - 1 {
            visit(&history, &session, &format!("/p{}", i)).await;
        }
        visit(&history, &session, "/services/masonry").await;

        let service = service(history.clone(), analytics_returning(vec!["roof"], 2));
        let before = service.recommendations_for(&session).await.unwrap();
        assert!(before.iter().any(|r| r.item.link == "/services/roofing"));

        // Length stays at capacity and the latest path returns to /services/masonry
        visit(&history, &session, "/services/roofing").await;
        visit(&history, &session, "/services/masonry").await;

        let current = history.list(&session).await.unwrap();
        assert_eq!(current.len(), HISTORY_CAPACITY);
        assert_eq!(current[0].path, "/services/masonry");

        let after = service.recommendations_for(&session).await.unwrap();
        assert_nothing_visited(&after, &current);
        assert_eq!(after[0].item.name, "Waterproofing");
    }

    #[tokio::test]
    async fn test_cleared_and_rebuilt_history_does_not_reuse_result() {
        let history = Arc::new(MemoryHistoryStore::new());
        let session = SessionContext::new();
        visit(&history, &session, "/services/masonry").await;
        visit(&history, &session, "/a").await;

        let service = service(history.clone(), analytics_returning(vec!["roof"], 2));
        let before = service.recommendations_for(&session).await.unwrap();
        assert_eq!(before[0].item.link, "/services/roofing");

        history.clear(&session).await.unwrap();
        visit(&history, &session, "/services/roofing").await;
        visit(&history, &session, "/a").await;

        let current = history.list(&session).await.unwrap();
        let after = service.recommendations_for(&session).await.unwrap();
        assert_nothing_visited(&after, &current);
    }

    #[tokio::test]
    async fn test_forget_drops_memoized_result() {
        let history = Arc::new(MemoryHistoryStore::new());
        let session = SessionContext::new();
        visit(&history, &session, "/services/masonry").await;

        let service = service(history, analytics_returning(vec!["roof"], 2));
        service.recommendations_for(&session).await.unwrap();
        service.forget(&session).await;
        service.recommendations_for(&session).await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_staleness_always_recomputes() {
        let history = Arc::new(MemoryHistoryStore::new());
        let session = SessionContext::new();
        visit(&history, &session, "/services/masonry").await;

        let settings = RecommendationSettings {
            staleness: Duration::ZERO,
            ..RecommendationSettings::default()
        };
        let service = RecommendationService::new(
            history,
            analytics_returning(vec![], 2),
            catalog(),
            settings,
        );

        service.recommendations_for(&session).await.unwrap();
        service.recommendations_for(&session).await.unwrap();
    }
}

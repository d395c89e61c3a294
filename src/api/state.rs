use std::sync::Arc;

use crate::{
    models::CatalogItem,
    services::{
        history::HistoryStore,
        recommendations::{RecommendationService, RecommendationSettings},
        search_analytics::SearchAnalyticsStore,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub history: Arc<dyn HistoryStore>,
    pub search_analytics: Arc<dyn SearchAnalyticsStore>,
    pub recommendations: Arc<RecommendationService>,
}

impl AppState {
    /// Wires the stores and the flattened catalog into the recommendation service
    pub fn new(
        history: Arc<dyn HistoryStore>,
        search_analytics: Arc<dyn SearchAnalyticsStore>,
        catalog: Vec<CatalogItem>,
        settings: RecommendationSettings,
    ) -> Self {
        let recommendations = RecommendationService::new(
            history.clone(),
            search_analytics.clone(),
            Arc::new(catalog),
            settings,
        );

        Self {
            history,
            search_analytics,
            recommendations: Arc::new(recommendations),
        }
    }
}

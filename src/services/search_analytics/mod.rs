//! Search analytics backends
//!
//! Visitors' search queries are logged to a `search_analytics` table and the
//! most recent ones feed the recommendation scorer. The table can be reached
//! directly through PostgreSQL or through the hosted backend's REST API.
use std::sync::Arc;
use std::time::Duration;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::SessionContext,
};

pub mod postgres;
pub mod rest;

pub use postgres::PostgresSearchAnalytics;
pub use rest::RestSearchAnalytics;

/// Longest query accepted for logging
pub const MAX_QUERY_LENGTH: usize = 200;

/// Store of recent site-wide search queries
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SearchAnalyticsStore: Send + Sync {
    /// Up to `limit` most recent lower-cased queries from the last `since_days` days
    async fn recent_queries(&self, since_days: u32, limit: u32) -> AppResult<Vec<String>>;

    /// Logs a query made by a visitor; `query` is already normalized
    async fn record_query(&self, session: &SessionContext, query: &str) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Lower-cases and trims a raw search query, rejecting unusable input
pub fn normalize_query(raw: &str) -> AppResult<String> {
    let query = raw.trim().to_lowercase();

    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Search query exceeds {} characters",
            MAX_QUERY_LENGTH
        )));
    }

    Ok(query)
}

/// Reads recent queries, resolving to an empty list on any failure or timeout
///
/// Recommendations must never be blocked or failed by the analytics store.
pub async fn fetch_recent_queries(
    store: &dyn SearchAnalyticsStore,
    since_days: u32,
    limit: u32,
    timeout: Duration,
) -> Vec<String> {
    match tokio::time::timeout(timeout, store.recent_queries(since_days, limit)).await {
        Ok(Ok(queries)) => {
            tracing::debug!(backend = store.name(), count = queries.len(), "Recent search queries loaded");
            queries
        }
        Ok(Err(e)) => {
            tracing::warn!(backend = store.name(), error = %e, "Search analytics read failed, continuing without queries");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(
                backend = store.name(),
                timeout_ms = timeout.as_millis() as u64,
                "Search analytics read timed out, continuing without queries"
            );
            Vec::new()
        }
    }
}

/// Analytics turned off: nothing is read, logged queries are dropped
pub struct NoSearchAnalytics;

#[async_trait::async_trait]
impl SearchAnalyticsStore for NoSearchAnalytics {
    async fn recent_queries(&self, _since_days: u32, _limit: u32) -> AppResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn record_query(&self, _session: &SessionContext, _query: &str) -> AppResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Serves `recent_queries` from Redis for up to `ttl` seconds
///
/// Writes always go straight to the wrapped store.
pub struct CachedSearchAnalytics {
    inner: Arc<dyn SearchAnalyticsStore>,
    cache: Cache,
    ttl: u64,
}

impl CachedSearchAnalytics {
    pub fn new(inner: Arc<dyn SearchAnalyticsStore>, cache: Cache, ttl: u64) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait::async_trait]
impl SearchAnalyticsStore for CachedSearchAnalytics {
    async fn recent_queries(&self, since_days: u32, limit: u32) -> AppResult<Vec<String>> {
        let key = CacheKey::RecentQueries { since_days, limit };
        cached!(
            self.cache,
            key,
            self.ttl,
            self.inner.recent_queries(since_days, limit)
        )
    }

    async fn record_query(&self, session: &SessionContext, query: &str) -> AppResult<()> {
        self.inner.record_query(session, query).await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

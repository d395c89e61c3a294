use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::SessionContext,
    services::search_analytics::SearchAnalyticsStore,
};

/// `search_analytics` table read and written through a direct connection pool
#[derive(Clone)]
pub struct PostgresSearchAnalytics {
    pool: PgPool,
}

impl PostgresSearchAnalytics {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SearchAnalyticsStore for PostgresSearchAnalytics {
    async fn recent_queries(&self, since_days: u32, limit: u32) -> AppResult<Vec<String>> {
        let queries = sqlx::query_scalar::<_, String>(
            r#"
            SELECT search_query
            FROM search_analytics
            WHERE created_at >= NOW() - make_interval(days => $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(since_days as i32)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(queries)
    }

    async fn record_query(&self, session: &SessionContext, query: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO search_analytics (search_query, session_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(query)
        .bind(session.session_id)
        .execute(&self.pool)
        .await?;

        tracing::debug!(session_id = %session, "Search query recorded");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

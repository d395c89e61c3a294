//! Hosted backend REST provider
//!
//! The site's backend-as-a-service exposes tables over a PostgREST-style API:
//! `GET /rest/v1/<table>?select=...&<column>=<op>.<value>&order=...&limit=...`
//! for reads and `POST /rest/v1/<table>` for inserts, authenticated with the
//! project's public API key.
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client as HttpClient;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{SearchQueryRecord, SessionContext},
    services::search_analytics::SearchAnalyticsStore,
};

const TABLE_PATH: &str = "/rest/v1/search_analytics";

#[derive(Clone)]
pub struct RestSearchAnalytics {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct NewSearchQuery<'a> {
    search_query: &'a str,
    session_id: uuid::Uuid,
}

impl RestSearchAnalytics {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn table_url(&self) -> String {
        format!("{}{}", self.api_url, TABLE_PATH)
    }

    /// Query parameters selecting the newest rows since `since_days` days ago
    fn recent_params(since_days: u32, limit: u32) -> Vec<(&'static str, String)> {
        let since = Utc::now() - ChronoDuration::days(i64::from(since_days));
        vec![
            ("select", "search_query,created_at".to_string()),
            ("created_at", format!("gte.{}", since.to_rfc3339())),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]
    }

    async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Search analytics API returned status {}: {}",
                status, body
            )));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl SearchAnalyticsStore for RestSearchAnalytics {
    async fn recent_queries(&self, since_days: u32, limit: u32) -> AppResult<Vec<String>> {
        let response = self
            .http_client
            .get(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&Self::recent_params(since_days, limit))
            .send()
            .await?;

        let records: Vec<SearchQueryRecord> = Self::check_status(response).await?.json().await?;

        tracing::debug!(count = records.len(), "Fetched recent search queries");

        Ok(records.into_iter().map(|r| r.search_query).collect())
    }

    async fn record_query(&self, session: &SessionContext, query: &str) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(&self.api_key)
            .json(&NewSearchQuery {
                search_query: query,
                session_id: session.session_id,
            })
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_strips_trailing_slash() {
        let store = RestSearchAnalytics::new(
            "https://project.example.co/".to_string(),
            "anon".to_string(),
        );
        assert_eq!(
            store.table_url(),
            "https://project.example.co/rest/v1/search_analytics"
        );
    }

    #[test]
    fn test_recent_params_filter_order_and_limit() {
        let params = RestSearchAnalytics::recent_params(14, 20);

        assert_eq!(params[0], ("select", "search_query,created_at".to_string()));
        assert_eq!(params[1].0, "created_at");
        assert!(params[1].1.starts_with("gte."));
        assert_eq!(params[2], ("order", "created_at.desc".to_string()));
        assert_eq!(params[3], ("limit", "20".to_string()));
    }

    #[test]
    fn test_recent_params_window_starts_in_the_past() {
        let params = RestSearchAnalytics::recent_params(14, 20);
        let since = chrono::DateTime::parse_from_rfc3339(params[1].1.trim_start_matches("gte."))
            .unwrap()
            .with_timezone(&Utc);
        let age = Utc::now() - since;

        assert!(age >= ChronoDuration::days(14));
        assert!(age < ChronoDuration::days(14) + ChronoDuration::minutes(1));
    }

    #[test]
    fn test_rows_deserialize_from_rest_payload() {
        let payload = r#"[
            {"search_query": "waterproofing", "created_at": "2025-03-01T12:00:00.123456+00:00"},
            {"search_query": "roof repair", "created_at": "2025-02-28T08:30:00+00:00"}
        ]"#;
        let records: Vec<SearchQueryRecord> = serde_json::from_str(payload).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].search_query, "roof repair");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        let store = RestSearchAnalytics::new("http://127.0.0.1:9".to_string(), "anon".to_string());
        assert!(store.recent_queries(14, 20).await.is_err());
    }
}

use std::sync::{Arc, Mutex};

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use sitenav_api::{
    api::{create_router, AppState},
    error::AppResult,
    models::{Badge, CatalogItem, Section, SessionContext},
    services::{
        history::MemoryHistoryStore, search_analytics::SearchAnalyticsStore,
        RecommendationSettings,
    },
};

/// Analytics store backed by a shared list, recording writes in place
#[derive(Default)]
struct FakeAnalytics {
    queries: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl SearchAnalyticsStore for FakeAnalytics {
    async fn recent_queries(&self, _since_days: u32, limit: u32) -> AppResult<Vec<String>> {
        let queries = self.queries.lock().unwrap();
        Ok(queries.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn record_query(&self, _session: &SessionContext, query: &str) -> AppResult<()> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn catalog() -> Vec<CatalogItem> {
    vec![
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
            name: "Healthcare".to_string(),
            link: "/markets/healthcare".to_string(),
            category: "Market Sectors".to_string(),
            section: Section::Markets,
            badge: None,
        },
    ]
}

fn create_test_server() -> (TestServer, Arc<FakeAnalytics>) {
    let analytics = Arc::new(FakeAnalytics::default());
    let state = AppState::new(
        Arc::new(MemoryHistoryStore::new()),
        analytics.clone(),
        catalog(),
        RecommendationSettings::default(),
    );
    (TestServer::new(create_router(state)).unwrap(), analytics)
}

fn session_name() -> HeaderName {
    HeaderName::from_static("x-session-id")
}

fn session_header(id: Uuid) -> HeaderValue {
    HeaderValue::from_str(&id.to_string()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_session_header_is_generated_and_echoed() {
    let (server, _) = create_test_server();

    let response = server.get("/api/v1/history").await;
    response.assert_status_ok();
    let generated = response.header("x-session-id");
    assert!(Uuid::parse_str(generated.to_str().unwrap()).is_ok());

    let id = Uuid::new_v4();
    let response = server
        .get("/api/v1/history")
        .add_header(session_name(), session_header(id))
        .await;
    assert_eq!(response.header("x-session-id").to_str().unwrap(), id.to_string());
}

#[tokio::test]
async fn test_catalog_filter_by_section() {
    let (server, _) = create_test_server();

    let all: Vec<Value> = server.get("/api/v1/catalog").await.json();
    assert_eq!(all.len(), 3);

    let markets: Vec<Value> = server
        .get("/api/v1/catalog")
        .add_query_param("section", "Markets")
        .await
        .json();
    assert_eq!(markets.len(), 1);
    assert_eq!(markets[0]["name"], "Healthcare");
}

#[tokio::test]
async fn test_record_and_clear_history() {
    let (server, _) = create_test_server();
    let id = Uuid::new_v4();

    for path in ["/services/masonry", "/markets/healthcare", "/services/masonry"] {
        server
            .post("/api/v1/history")
            .add_header(session_name(), session_header(id))
            .json(&json!({ "path": path, "name": "Page", "category": "Building Envelope" }))
            .await
            .assert_status_ok();
    }

    let history: Vec<Value> = server
        .get("/api/v1/history")
        .add_header(session_name(), session_header(id))
        .await
        .json();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["path"], "/services/masonry");
    assert_eq!(history[1]["path"], "/markets/healthcare");

    server
        .delete("/api/v1/history")
        .add_header(session_name(), session_header(id))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let history: Vec<Value> = server
        .get("/api/v1/history")
        .add_header(session_name(), session_header(id))
        .await
        .json();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_record_visit_rejects_empty_path() {
    let (server, _) = create_test_server();

    let response = server
        .post("/api/v1/history")
        .json(&json!({ "path": "", "name": "Page", "category": "x" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_recommendations_empty_without_history() {
    let (server, _) = create_test_server();

    let response = server
        .get("/api/v1/recommendations")
        .add_header(session_name(), session_header(Uuid::new_v4()))
        .await;
    response.assert_status_ok();
    let recs: Vec<Value> = response.json();
    assert!(recs.is_empty());
}

#[tokio::test]
async fn test_recommendations_combine_history_and_searches() {
    let (server, analytics) = create_test_server();
    let id = Uuid::new_v4();

    server
        .post("/api/v1/search-events")
        .add_header(session_name(), session_header(id))
        .json(&json!({ "query": "  WaterProof " }))
        .await
        .assert_status(StatusCode::ACCEPTED);
    assert_eq!(*analytics.queries.lock().unwrap(), vec!["waterproof".to_string()]);

    server
        .post("/api/v1/history")
        .add_header(session_name(), session_header(id))
        .json(&json!({
            "path": "/services/masonry",
            "name": "Masonry",
            "category": "Building Envelope"
        }))
        .await
        .assert_status_ok();

    let recs: Vec<Value> = server
        .get("/api/v1/recommendations")
        .add_header(session_name(), session_header(id))
        .await
        .json();

    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0]["name"], "Waterproofing");
    assert_eq!(recs[0]["score"], 5);
    assert_eq!(recs[1]["name"], "Roofing");
    assert_eq!(recs[1]["score"], 3);
}

#[tokio::test]
async fn test_blank_search_event_is_rejected() {
    let (server, analytics) = create_test_server();

    server
        .post("/api/v1/search-events")
        .json(&json!({ "query": "   " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert!(analytics.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_score_endpoint_excludes_viewed_items() {
    let (server, _) = create_test_server();

    let recs: Vec<Value> = server
        .post("/api/v1/recommendations/score")
        .json(&json!({
            "history": [
                { "path": "/services/masonry", "name": "Masonry", "category": "Building Envelope", "timestamp": 1 },
                { "path": "/services/waterproofing", "name": "Waterproofing", "category": "Building Envelope", "timestamp": 2 }
            ],
            "recent_search_queries": ["waterproof"]
        }))
        .await
        .json();

    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0]["name"], "Roofing");
    assert_eq!(recs[0]["score"], 3);
    assert_eq!(recs[0]["badge"], "popular");
}

#[tokio::test]
async fn test_score_endpoint_rejects_oversized_history() {
    let (server, _) = create_test_server();

    let history: Vec<Value> = (0..9)
        .map(|i| json!({ "path": format!("/p{}", i), "name": "P", "category": "C", "timestamp": i }))
        .collect();

    server
        .post("/api/v1/recommendations/score")
        .json(&json!({ "history": history }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommendations_after_clear_exclude_new_visits() {
    let (server, _) = create_test_server();
    let id = Uuid::new_v4();

    let visit = |path: &'static str, category: &'static str| {
        server
            .post("/api/v1/history")
            .add_header(session_name(), session_header(id))
            .json(&json!({ "path": path, "name": "Page", "category": category }))
    };

    visit("/services/waterproofing", "Building Envelope").await.assert_status_ok();
    visit("/about", "About").await.assert_status_ok();

    let before: Vec<Value> = server
        .get("/api/v1/recommendations")
        .add_header(session_name(), session_header(id))
        .await
        .json();
    assert_eq!(before[0]["link"], "/services/roofing");

    server
        .delete("/api/v1/history")
        .add_header(session_name(), session_header(id))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    // Same length and same latest path as before the clear
    visit("/services/roofing", "Building Envelope").await.assert_status_ok();
    visit("/about", "About").await.assert_status_ok();

    let after: Vec<Value> = server
        .get("/api/v1/recommendations")
        .add_header(session_name(), session_header(id))
        .await
        .json();
    assert!(after.iter().all(|r| r["link"] != "/services/roofing"));
    assert_eq!(after[0]["name"], "Waterproofing");
    assert_eq!(after[0]["score"], 2);
}

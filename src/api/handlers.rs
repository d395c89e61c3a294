use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{
        CatalogItem, NavigationHistoryItem, Recommendation, RecordVisitRequest, ScoreRequest,
        SearchEventRequest, Section, SessionContext, HISTORY_CAPACITY,
    },
    services::{history::new_visit, search_analytics::normalize_query},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub section: Option<Section>,
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Flattened content catalog, optionally limited to one section
pub async fn get_catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogQuery>,
) -> Json<Vec<CatalogItem>> {
    let items = state
        .recommendations
        .catalog()
        .iter()
        .filter(|item| params.section.map_or(true, |s| item.section == s))
        .cloned()
        .collect();
    Json(items)
}

/// Navigation history of the calling session
pub async fn get_history(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> AppResult<Json<Vec<NavigationHistoryItem>>> {
    Ok(Json(state.history.list(&session).await?))
}

/// Records a page visit for the calling session
pub async fn record_visit(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<RecordVisitRequest>,
) -> AppResult<Json<Vec<NavigationHistoryItem>>> {
    let item = new_visit(&request.path, &request.name, &request.category)?;

    tracing::debug!(session_id = %session, path = %item.path, "Recording visit");

    let history = state.history.record(&session, item).await?;
    Ok(Json(history))
}

/// Clears the calling session's navigation history
pub async fn clear_history(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> AppResult<StatusCode> {
    state.history.clear(&session).await?;
    state.recommendations.forget(&session).await;
    tracing::info!(session_id = %session, "Navigation history cleared");
    Ok(StatusCode::NO_CONTENT)
}

/// Recommendations for the calling session
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let recommendations = state.recommendations.recommendations_for(&session).await?;

    tracing::info!(
        request_id = %request_id,
        session_id = %session,
        count = recommendations.len(),
        "Recommendations served"
    );

    Ok(Json(recommendations))
}

/// Scores caller-supplied history and queries against the catalog
pub async fn score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> AppResult<Json<Vec<Recommendation>>> {
    if request.history.len() > HISTORY_CAPACITY {
        return Err(AppError::InvalidInput(format!(
            "History is limited to {} entries",
            HISTORY_CAPACITY
        )));
    }

    Ok(Json(
        state
            .recommendations
            .score(&request.history, &request.recent_search_queries),
    ))
}

/// Logs a search made on the site
pub async fn record_search_event(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(request): Json<SearchEventRequest>,
) -> AppResult<StatusCode> {
    let query = normalize_query(&request.query)?;
    state.search_analytics.record_query(&session, &query).await?;
    Ok(StatusCode::ACCEPTED)
}

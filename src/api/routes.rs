use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{
    make_span_with_request_id, request_context_middleware, REQUEST_ID_HEADER, SESSION_ID_HEADER,
};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_context_middleware))
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(handlers::get_catalog))
        .route(
            "/history",
            get(handlers::get_history)
                .post(handlers::record_visit)
                .delete(handlers::clear_history),
        )
        .route("/recommendations", get(handlers::get_recommendations))
        .route("/recommendations/score", post(handlers::score))
        .route("/search-events", post(handlers::record_search_event))
}

/// CORS for the site's origins; the session header must be readable by the browser
pub fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let mut parsed = Vec::new();
    for origin in allowed_origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => parsed.push(value),
            Err(e) => tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin"),
        }
    }

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(SESSION_ID_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([
            HeaderName::from_static(SESSION_ID_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .allow_origin(parsed)
}

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::models::SessionContext;

/// HTTP header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP header carrying the visitor session
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Extension type for storing request ID in request extensions
#[derive(Clone, Debug)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn uuid_header(headers: &HeaderMap, name: &str) -> Option<Uuid> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

/// Resolves the request ID and visitor session for every request
///
/// Both are read from their headers when present and valid, otherwise
/// generated. They are stored in the request extensions for handlers and
/// echoed on the response so the site can persist the session.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let request_id = uuid_header(request.headers(), REQUEST_ID_HEADER)
        .map(RequestId)
        .unwrap_or_default();

    let session = match uuid_header(request.headers(), SESSION_ID_HEADER) {
        Some(id) => SessionContext::from_id(id),
        None => {
            let session = SessionContext::new();
            tracing::debug!(session_id = %session, "Started new visitor session");
            session
        }
    };

    request.extensions_mut().insert(request_id.clone());
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&session.to_string()) {
        headers.insert(SESSION_ID_HEADER, value);
    }

    response
}

/// Tracing span for a request, tagged with its request ID
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

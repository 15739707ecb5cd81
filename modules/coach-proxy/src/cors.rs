use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::routes::AppState;

const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const MAX_AGE: &str = "86400";

/// Origin to echo in `Access-Control-Allow-Origin`.
///
/// `*` when the allow-list has a wildcard, the request origin when it matches
/// an entry exactly, otherwise the first entry (which the browser will reject).
pub fn allowed_origin(allow_list: &[String], request_origin: Option<&str>) -> String {
    if allow_list.iter().any(|o| o == "*") {
        return "*".to_string();
    }
    if let Some(origin) = request_origin {
        if allow_list.iter().any(|o| o == origin) {
            return origin.to_string();
        }
    }
    allow_list.first().cloned().unwrap_or_else(|| "*".to_string())
}

/// Whether a request's `Origin` may call the proxy. Requests without an
/// origin (server-to-server, curl) are allowed.
pub fn origin_permitted(allow_list: &[String], request_origin: Option<&str>) -> bool {
    match request_origin {
        None => true,
        Some(origin) => allow_list.iter().any(|o| o == "*" || o == origin),
    }
}

pub fn request_origin(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::ORIGIN).and_then(|v| v.to_str().ok())
}

pub fn cors_headers(origin: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers
}

/// Answers every OPTIONS request as a preflight and stamps CORS headers on
/// every other response, including 404s.
pub async fn cors_middleware(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let origin = allowed_origin(
        &state.config.allowed_origins,
        request_origin(request.headers()),
    );
    let headers = cors_headers(&origin);

    if request.method() == Method::OPTIONS {
        return (StatusCode::NO_CONTENT, headers, Body::empty()).into_response();
    }

    let mut response = next.run(request).await;
    response.headers_mut().extend(headers);
    response
}

use std::sync::Arc;

use ai_client::{AiError, ChatClient, ChatGateway, ChatRequest, Message};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

use crate::config::ProxyConfig;
use crate::cors::{cors_middleware, origin_permitted, request_origin};
use crate::error::ProxyError;

pub struct AppState {
    pub config: ProxyConfig,
    /// `None` when no credential is configured.
    pub upstream: Option<Arc<dyn ChatGateway>>,
}

impl AppState {
    /// Upstream client with the configured key injected as a bearer token.
    pub fn from_config(config: ProxyConfig) -> Self {
        let upstream = config.api_key.as_ref().map(|key| {
            Arc::new(ChatClient::new(&config.upstream_url).with_api_key(key)) as Arc<dyn ChatGateway>
        });
        Self { config, upstream }
    }
}

#[derive(Deserialize)]
pub struct ChatBody {
    messages: Vec<Message>,
    model: Option<String>,
    temperature: Option<f32>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let chat_path = state.config.chat_path();

    Router::new()
        .route(&chat_path, post(chat).fallback(not_found))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), cors_middleware))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    if !origin_permitted(&state.config.allowed_origins, request_origin(&headers)) {
        warn!(origin = ?request_origin(&headers), "Rejected chat request from disallowed origin");
        return Err(ProxyError::OriginNotAllowed);
    }

    let upstream = state.upstream.as_ref().ok_or_else(|| {
        warn!("Chat request received but OPENAI_API_KEY is not configured");
        ProxyError::MissingCredential
    })?;

    let body: ChatBody =
        serde_json::from_slice(&body).map_err(|e| ProxyError::BadRequest(e.to_string()))?;

    let request = ChatRequest::new(
        body.model.unwrap_or_else(|| state.config.default_model.clone()),
        body.temperature.unwrap_or(state.config.default_temperature),
    )
    .messages(body.messages);

    info!(
        model = %request.model,
        messages = request.messages.len(),
        "Forwarding chat request"
    );

    match upstream.complete(&request).await {
        Ok(content) => Ok(Json(json!({ "content": content })).into_response()),
        Err(AiError::Upstream { status, body }) => {
            warn!(status, "Upstream returned an error");
            Err(ProxyError::Upstream { status, body })
        }
        Err(e) => {
            warn!(error = %e, "Upstream call failed");
            Err(ProxyError::Unreachable(e.to_string()))
        }
    }
}

async fn not_found() -> ProxyError {
    ProxyError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct MockUpstream {
        result: Mutex<Option<Result<String, AiError>>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl MockUpstream {
        fn returning(result: Result<String, AiError>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(result)),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatGateway for MockUpstream {
        async fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
            self.seen.lock().unwrap().push(request.clone());
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(AiError::Network("called twice".to_string())))
        }
    }

    fn app(config: ProxyConfig, upstream: Option<Arc<MockUpstream>>) -> Router {
        let upstream = upstream.map(|u| u as Arc<dyn ChatGateway>);
        build_router(Arc::new(AppState { config, upstream }))
    }

    fn post_chat(path: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .header("origin", "https://site.example")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: Response) -> serde_json::Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const BODY: &str = r#"{"messages": [{"role": "user", "content": "hi"}]}"#;

    #[tokio::test]
    async fn missing_credential_is_500_naming_the_key() {
        let res = app(ProxyConfig::default(), None)
            .oneshot(post_chat("/chat", BODY))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let json = json_body(res).await;
        assert!(json["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn options_anywhere_is_an_empty_preflight() {
        for path in ["/chat", "/nope", "/"] {
            let req = Request::builder()
                .method(Method::OPTIONS)
                .uri(path)
                .body(Body::empty())
                .unwrap();
            let res = app(ProxyConfig::default(), None).oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::NO_CONTENT);
            assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert!(res.headers().contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
            let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            assert!(bytes.is_empty());
        }
    }

    #[tokio::test]
    async fn success_returns_only_reply_content() {
        let upstream = MockUpstream::returning(Ok("Hello rep".to_string()));
        let res = app(ProxyConfig::default(), Some(upstream.clone()))
            .oneshot(post_chat("/chat", BODY))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(json_body(res).await, json!({ "content": "Hello rep" }));

        let seen = upstream.seen.lock().unwrap();
        assert_eq!(seen[0].model, "gpt-4o-mini");
        assert_eq!(seen[0].temperature, 0.7);
        assert_eq!(seen[0].messages, vec![Message::user("hi")]);
    }

    #[tokio::test]
    async fn body_model_and_temperature_override_defaults() {
        let upstream = MockUpstream::returning(Ok(String::new()));
        let body = r#"{"model": "gpt-4.1", "temperature": 0.2, "messages": []}"#;
        app(ProxyConfig::default(), Some(upstream.clone()))
            .oneshot(post_chat("/chat", body))
            .await
            .unwrap();
        let seen = upstream.seen.lock().unwrap();
        assert_eq!(seen[0].model, "gpt-4.1");
        assert_eq!(seen[0].temperature, 0.2);
    }

    #[tokio::test]
    async fn upstream_failure_relays_status_and_body() {
        let upstream = MockUpstream::returning(Err(AiError::Upstream {
            status: 429,
            body: "rate limited".to_string(),
        }));
        let res = app(ProxyConfig::default(), Some(upstream))
            .oneshot(post_chat("/chat", BODY))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let json = json_body(res).await;
        assert_eq!(json["error"], "Upstream error");
        assert_eq!(json["status"], 429);
        assert_eq!(json["detail"], "rate limited");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_502() {
        let upstream = MockUpstream::returning(Err(AiError::Network("connection refused".to_string())));
        let res = app(ProxyConfig::default(), Some(upstream))
            .oneshot(post_chat("/chat", BODY))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn invalid_json_is_400() {
        let upstream = MockUpstream::returning(Ok("unused".to_string()));
        let res = app(ProxyConfig::default(), Some(upstream.clone()))
            .oneshot(post_chat("/chat", "{not json"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(upstream.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_routes_and_methods_are_404_with_cors() {
        let config = ProxyConfig {
            allowed_origins: vec!["https://site.example".to_string()],
            ..ProxyConfig::default()
        };

        let get_chat = Request::builder()
            .method(Method::GET)
            .uri("/chat")
            .header("origin", "https://site.example")
            .body(Body::empty())
            .unwrap();
        let res = app(config.clone(), None).oneshot(get_chat).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://site.example"
        );

        let res = app(config, None)
            .oneshot(post_chat("/completions", BODY))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(res).await, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn disallowed_origin_is_403() {
        let config = ProxyConfig {
            allowed_origins: vec!["https://other.example".to_string()],
            ..ProxyConfig::default()
        };
        let upstream = MockUpstream::returning(Ok("unused".to_string()));
        let res = app(config, Some(upstream.clone()))
            .oneshot(post_chat("/chat", BODY))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://other.example"
        );
        assert!(upstream.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_is_mounted_under_prefix() {
        let config = ProxyConfig {
            path_prefix: "/api".to_string(),
            ..ProxyConfig::default()
        };
        let upstream = MockUpstream::returning(Ok("ok".to_string()));
        let res = app(config.clone(), Some(upstream))
            .oneshot(post_chat("/api/chat", BODY))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app(config, None).oneshot(post_chat("/chat", BODY)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn state_without_key_has_no_upstream() {
        assert!(AppState::from_config(ProxyConfig::default()).upstream.is_none());
        let config = ProxyConfig {
            api_key: Some("sk-test".to_string()),
            ..ProxyConfig::default()
        };
        assert!(AppState::from_config(config).upstream.is_some());
    }
}

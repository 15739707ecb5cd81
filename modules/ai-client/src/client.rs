use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, warn};

use crate::envelope::extract_reply;
use crate::error::AiError;
use crate::traits::{ChatGateway, ChatRequest};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a single chat-completion URL.
///
/// Points either at an upstream provider (with a bearer key) or at the coach
/// proxy (no key; the proxy injects its own).
#[derive(Clone)]
pub struct ChatClient {
    url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            url: url.into(),
            api_key: None,
            http,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        if let Some(ref key) = self.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|e| AiError::Config(format!("invalid API key header: {e}")))?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// POST the request and return the decoded JSON body.
    ///
    /// Non-success statuses become [`AiError::Upstream`] carrying the status and
    /// the raw body text. A success body that is not JSON decodes to `Null`.
    pub async fn send(&self, request: &ChatRequest) -> Result<Value, AiError> {
        debug!(
            url = %self.url,
            model = %request.model,
            messages = request.messages.len(),
            "Chat completion request"
        );

        let response = self
            .http
            .post(&self.url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(AiError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(error = %e, "Chat completion body was not JSON");
                Ok(Value::Null)
            }
        }
    }
}

#[async_trait]
impl ChatGateway for ChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
        let body = self.send(request).await?;
        Ok(extract_reply(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP response, reading the whole request first.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/chat")
    }

    fn request() -> ChatRequest {
        ChatRequest::new("gpt-4o-mini", 0.2).message(crate::Message::user("hi"))
    }

    #[test]
    fn headers_without_key_omit_authorization() {
        let client = ChatClient::new("http://localhost:8787/chat");
        let headers = client.headers().unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn headers_with_key_carry_bearer_token() {
        let client = ChatClient::new("https://api.example.com").with_api_key("sk-test");
        let headers = client.headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer sk-test");
    }

    #[test]
    fn key_with_newline_is_a_config_error() {
        let client = ChatClient::new("https://api.example.com").with_api_key("bad\nkey");
        assert!(matches!(client.headers(), Err(AiError::Config(_))));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let client = ChatClient::new("http://127.0.0.1:9/chat");
        let request = ChatRequest::new("gpt-4o-mini", 0.2);
        let err = client.send(&request).await.unwrap_err();
        assert!(matches!(err, AiError::Network(_)));
    }

    #[tokio::test]
    async fn non_success_status_carries_status_and_body() {
        let url = serve_once("429 Too Many Requests", "slow").await;
        let err = ChatClient::new(url).complete(&request()).await.unwrap_err();
        match err {
            AiError::Upstream { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_body_is_an_empty_reply() {
        let url = serve_once("200 OK", "hello").await;
        let reply = ChatClient::new(url).complete(&request()).await.unwrap();
        assert_eq!(reply, "");
    }

    #[tokio::test]
    async fn json_success_body_is_extracted() {
        let url = serve_once("200 OK", r#"{"content": "Make it quick."}"#).await;
        let reply = ChatClient::new(url).complete(&request()).await.unwrap();
        assert_eq!(reply, "Make it quick.");
    }
}

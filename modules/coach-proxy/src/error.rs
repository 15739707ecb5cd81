use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Missing OPENAI_API_KEY on the server")]
    MissingCredential,

    #[error("Origin not allowed")]
    OriginNotAllowed,

    #[error("Invalid JSON body: {0}")]
    BadRequest(String),

    #[error("Upstream error ({status})")]
    Upstream { status: u16, body: String },

    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    #[error("Not found")]
    NotFound,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ProxyError::MissingCredential => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
            ProxyError::OriginNotAllowed => {
                (StatusCode::FORBIDDEN, json!({ "error": self.to_string() }))
            }
            ProxyError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            ProxyError::Upstream { status, body } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                json!({ "error": "Upstream error", "status": status, "detail": body }),
            ),
            ProxyError::Unreachable(_) => {
                (StatusCode::BAD_GATEWAY, json!({ "error": self.to_string() }))
            }
            ProxyError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "Not found" })),
        };
        (status, Json(body)).into_response()
    }
}

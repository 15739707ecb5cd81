use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use coach_proxy::{build_router, AppState, ProxyConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = ProxyConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let chat_path = config.chat_path();

    let state = Arc::new(AppState::from_config(config));

    // Logging layer: method + path + status + latency only (no bodies, no IP)
    let app = build_router(state).layer(
        tower_http::trace::TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<axum::body::Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            },
        ),
    );

    info!("Coach proxy starting on {addr}");
    info!("Chat endpoint: POST http://{addr}{chat_path}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

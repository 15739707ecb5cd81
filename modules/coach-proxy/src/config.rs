use ai_client::truncate_to_char_boundary;
use anyhow::{Context, Result};

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Proxy configuration loaded from environment variables.
/// The API key is optional so the proxy can start and answer with a
/// missing-credential error instead of refusing to boot.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub api_key: Option<String>,
    pub allowed_origins: Vec<String>,
    pub upstream_url: String,
    pub default_model: String,
    pub default_temperature: f32,
    pub path_prefix: String,
    pub host: String,
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            allowed_origins: vec!["*".to_string()],
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            default_temperature: DEFAULT_TEMPERATURE,
            path_prefix: String::new(),
            host: "0.0.0.0".to_string(),
            port: 8787,
        }
    }
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match non_empty("PROXY_PORT") {
            Some(p) => p.parse().context("PROXY_PORT must be a number")?,
            None => defaults.port,
        };

        Ok(Self {
            api_key: non_empty("OPENAI_API_KEY"),
            allowed_origins: non_empty("ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.allowed_origins),
            upstream_url: non_empty("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            default_model: non_empty("DEFAULT_MODEL").unwrap_or(defaults.default_model),
            default_temperature: defaults.default_temperature,
            path_prefix: non_empty("CHAT_PATH_PREFIX")
                .map(|p| normalize_prefix(&p))
                .unwrap_or(defaults.path_prefix),
            host: non_empty("PROXY_HOST").unwrap_or(defaults.host),
            port,
        })
    }

    /// Route the chat handler is mounted on, e.g. `/api/chat`.
    pub fn chat_path(&self) -> String {
        format!("{}/chat", self.path_prefix)
    }

    fn log_keys(&self) {
        fn preview(val: &Option<String>) -> String {
            match val {
                Some(v) => format!("{}...({} chars)", truncate_to_char_boundary(v, 5), v.len()),
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  OPENAI_API_KEY: {}", preview(&self.api_key));
        tracing::info!("  ALLOWED_ORIGINS: {}", self.allowed_origins.join(","));
        tracing::info!("  UPSTREAM_URL: {}", self.upstream_url);
        tracing::info!("  CHAT_PATH: {}", self.chat_path());
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

//! Static content the widget runs on: settings, persona, scenario catalog and
//! the baseline system prompt.
//!
//! Every file is optional. A missing or malformed file is logged and replaced
//! with stub content; the user never sees the failure.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::CoachError;
use crate::rubric::RubricWeights;

pub const SETTINGS_FILE: &str = "config.json";
pub const PERSONA_FILE: &str = "persona.md";
pub const CATALOG_FILE: &str = "scenarios.json";
pub const SYSTEM_PROMPT_FILE: &str = "system-prompt.md";

const STUB_PERSONA: &str = "You are a practice partner for life-science field teams. \
Keep answers short and realistic.";

const STUB_SYSTEM_PROMPT: &str = "You help sales representatives rehearse compliant, \
evidence-based conversations. Never invent clinical data.";

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetSettings {
    pub title: String,
    /// Completion endpoint; normally the coach proxy's `/chat` route.
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub evaluator_temperature: f32,
    pub weights: RubricWeights,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            title: "Practice coach".to_string(),
            endpoint: "http://localhost:8787/chat".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            evaluator_temperature: 0.1,
            weights: RubricWeights::default(),
        }
    }
}

// =============================================================================
// Sources
// =============================================================================

/// Where static content files come from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, name: &str) -> Result<String, CoachError>;

    fn describe(&self) -> String;
}

/// Content files in a local directory.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentSource for DirSource {
    async fn fetch(&self, name: &str) -> Result<String, CoachError> {
        let path = self.root.join(name);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CoachError::Content(format!("{}: {e}", path.display())))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Content files served over HTTP under a base URL.
pub struct HttpSource {
    base_url: String,
    http: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn fetch(&self, name: &str) -> Result<String, CoachError> {
        let url = format!("{}/{}", self.base_url, name);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CoachError::Content(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            return Err(CoachError::Content(format!(
                "{url}: status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| CoachError::Content(format!("{url}: {e}")))
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

// =============================================================================
// Loading
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SiteContent {
    pub settings: WidgetSettings,
    pub persona: String,
    pub catalog: Catalog,
    pub system_prompt: String,
}

impl SiteContent {
    pub fn stub() -> Self {
        Self {
            settings: WidgetSettings::default(),
            persona: STUB_PERSONA.to_string(),
            catalog: Catalog::stub(),
            system_prompt: STUB_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Load all content files, substituting stubs for anything unavailable.
pub async fn load_content(source: &dyn ContentSource) -> SiteContent {
    let stub = SiteContent::stub();

    let settings = match fetch_text(source, SETTINGS_FILE).await {
        Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(file = SETTINGS_FILE, error = %e, "Malformed settings, using defaults");
            stub.settings.clone()
        }),
        None => stub.settings.clone(),
    };

    let catalog = match fetch_text(source, CATALOG_FILE).await {
        Some(raw) => match Catalog::from_json(&raw) {
            Ok(c) if !c.domains().is_empty() => c,
            Ok(_) => {
                warn!(file = CATALOG_FILE, "Catalog has no domains, using stub");
                stub.catalog.clone()
            }
            Err(e) => {
                warn!(file = CATALOG_FILE, error = %e, "Malformed catalog, using stub");
                stub.catalog.clone()
            }
        },
        None => stub.catalog.clone(),
    };

    let persona = fetch_text(source, PERSONA_FILE)
        .await
        .unwrap_or(stub.persona);
    let system_prompt = fetch_text(source, SYSTEM_PROMPT_FILE)
        .await
        .unwrap_or(stub.system_prompt);

    debug!(
        source = %source.describe(),
        domains = catalog.domains().len(),
        "Content loaded"
    );

    SiteContent {
        settings,
        persona,
        catalog,
        system_prompt,
    }
}

async fn fetch_text(source: &dyn ContentSource, name: &str) -> Option<String> {
    match source.fetch(name).await {
        Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Ok(_) => {
            warn!(file = name, "Content file is empty, using fallback");
            None
        }
        Err(e) => {
            warn!(file = name, error = %e, "Content file unavailable, using fallback");
            None
        }
    }
}

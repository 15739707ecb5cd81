// Test doubles for the widget.
//
// - ScriptedGateway (ChatGateway): pops canned replies in order, records every
//   request it receives.
// - sample_content(): two-domain catalog with fixed prompts.

use std::collections::VecDeque;
use std::sync::Mutex;

use ai_client::{AiError, ChatGateway, ChatRequest};
use async_trait::async_trait;

use crate::catalog::{Catalog, CatalogEntry, Domain};
use crate::content::{SiteContent, WidgetSettings};

pub const GOOD_RUBRIC: &str = r#"{"accuracy": 5, "compliance": 5, "discovery": 4, "objection": 3, "value": 4, "empathy": 5, "clarity": 4, "feedback": "Good open question."}"#;

pub const RISKY_RUBRIC: &str = r#"Scores: {"accuracy": 0, "compliance": 5, "discovery": 2, "objection": 2, "value": 2, "empathy": 3, "clarity": 3}"#;

pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, AiError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, status: u16) -> Self {
        self.replies.lock().unwrap().push_back(Err(AiError::Upstream {
            status,
            body: "upstream exploded".to_string(),
        }));
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatGateway for ScriptedGateway {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Network("script exhausted".to_string())))
    }
}

fn entry(id: &str, label: &str, brief: &str) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        label: label.to_string(),
        brief: brief.to_string(),
    }
}

pub fn sample_catalog() -> Catalog {
    Catalog::new(vec![
        Domain {
            key: "oncology".to_string(),
            label: "Oncology".to_string(),
            counterparts: vec![
                entry("onc-md", "Community oncologist", "Sees 30 patients a day."),
                entry("onc-pharm", "Oncology pharmacist", "Owns the formulary review."),
            ],
        },
        Domain {
            key: "cardio".to_string(),
            label: "Cardiology".to_string(),
            counterparts: vec![entry("cardio-np", "Cardiology NP", "Manages heart-failure clinic.")],
        },
    ])
}

pub fn sample_content() -> SiteContent {
    SiteContent {
        settings: WidgetSettings::default(),
        persona: "Persona: pragmatic and brief.".to_string(),
        catalog: sample_catalog(),
        system_prompt: "Baseline: stay compliant.".to_string(),
    }
}

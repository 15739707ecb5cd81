use std::sync::Arc;

use ai_client::{AiError, ChatGateway, ChatRequest, Message, StructuredOutput};
use thiserror::Error;
use tracing::{debug, warn};

use crate::content::WidgetSettings;
use crate::rubric::{parse_rubric, RubricParseError, RubricReport};

/// Attempts per evaluation: the first try plus one retry.
const MAX_ATTEMPTS: usize = 2;

const EVALUATOR_SYSTEM: &str = "You are a strict evaluator of pharmaceutical sales conversations. \
Score the representative's latest message only, not the customer's reply. Each dimension is an \
integer from 0 to 5. Score compliance 0 for any off-label, unbalanced or misleading claim, and \
accuracy 0 for any invented or wrong clinical fact. Respond with a single JSON object and nothing \
else.";

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Scored(RubricReport),
    /// Both attempts failed; rendered as a generic "could not score" notice.
    Unscored,
}

#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Gateway(#[from] AiError),

    #[error(transparent)]
    Parse(#[from] RubricParseError),
}

/// Second model call that grades a completed turn against the rubric.
#[derive(Clone)]
pub struct Evaluator {
    gateway: Arc<dyn ChatGateway>,
    model: String,
    temperature: f32,
}

impl Evaluator {
    pub fn new(gateway: Arc<dyn ChatGateway>, settings: &WidgetSettings) -> Self {
        Self {
            gateway,
            model: settings.model.clone(),
            temperature: settings.evaluator_temperature,
        }
    }

    pub fn request(&self, user: &str, reply: &str, brief: Option<&str>) -> ChatRequest {
        let schema = serde_json::to_string(&RubricReport::prompt_schema()).unwrap_or_default();
        let system = format!("{EVALUATOR_SYSTEM}\n\nJSON schema:\n{schema}");

        let mut prompt = String::new();
        if let Some(brief) = brief {
            prompt.push_str(&format!("Scenario brief:\n{brief}\n\n"));
        }
        prompt.push_str(&format!(
            "Representative said:\n{user}\n\nCustomer replied:\n{reply}\n\nReturn the rubric JSON."
        ));

        ChatRequest::new(&self.model, self.temperature)
            .message(Message::system(system))
            .message(Message::user(prompt))
    }

    /// Score one exchange. Retries the whole request once when the response
    /// cannot be parsed or the call fails; never returns an error.
    pub async fn evaluate(&self, user: &str, reply: &str, brief: Option<&str>) -> Evaluation {
        let request = self.request(user, reply, brief);

        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(&request).await {
                Ok(report) => {
                    debug!(attempt, "Turn evaluated");
                    return Evaluation::Scored(report);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Evaluation attempt failed");
                }
            }
        }

        Evaluation::Unscored
    }

    async fn attempt(&self, request: &ChatRequest) -> Result<RubricReport, AttemptError> {
        let raw = self.gateway.complete(request).await?;
        Ok(parse_rubric(&raw)?)
    }
}

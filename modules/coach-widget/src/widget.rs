use std::sync::Arc;

use ai_client::{ChatGateway, ChatRequest};
use tracing::{info, warn};

use crate::catalog::CatalogEntry;
use crate::content::SiteContent;
use crate::context::{active_brief, active_counterpart, outgoing_messages};
use crate::error::CoachError;
use crate::evaluator::{Evaluation, Evaluator};
use crate::preferences::Preferences;
use crate::rubric::TurnScore;
use crate::session::Session;
use crate::types::{Mode, Selection};

pub const UPSTREAM_ERROR_NOTICE: &str = "The coach is unavailable right now. Please try again.";
pub const UNSCORED_NOTICE: &str = "Could not parse a score for this turn.";
pub const COMPLIANCE_RISK_NOTICE: &str =
    "Compliance risk: this turn scored 0 on accuracy or compliance. Review it before using it with a customer.";

/// Something the front-end should render after a submit.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetMessage {
    Assistant(String),
    UpstreamError(String),
    Score(TurnScore),
    ComplianceRisk(String),
    Unscored(String),
}

/// Handlers for the coach widget.
///
/// Holds only immutable collaborators. All conversation state lives in the
/// [`Session`] passed to each handler, so several widgets can share one
/// `CoachWidget`.
pub struct CoachWidget {
    content: SiteContent,
    gateway: Arc<dyn ChatGateway>,
    evaluator: Evaluator,
}

impl CoachWidget {
    pub fn new(content: SiteContent, gateway: Arc<dyn ChatGateway>) -> Self {
        let evaluator = Evaluator::new(gateway.clone(), &content.settings);
        Self {
            content,
            gateway,
            evaluator,
        }
    }

    pub fn content(&self) -> &SiteContent {
        &self.content
    }

    /// Fresh session on the catalog's first domain, role-play, scoring on.
    pub fn new_session(&self) -> Session {
        Session::new(Mode::default(), true, Selection::initial(&self.content.catalog))
    }

    /// Session built from stored preferences, keeping only what the current
    /// catalog still offers.
    pub fn restore_session(&self, prefs: Option<&Preferences>) -> Session {
        match prefs {
            Some(p) => Session::new(p.mode, p.scoring_enabled, p.selection(&self.content.catalog)),
            None => self.new_session(),
        }
    }

    pub fn counterparts(&self, domain: &str) -> &[CatalogEntry] {
        self.content.catalog.counterparts(domain)
    }

    /// Switch domain: default counterpart is the domain's first entry and the
    /// conversation starts over. Returns the domain's counterparts.
    pub fn select_domain(&self, session: &mut Session, domain: &str) -> &[CatalogEntry] {
        session.set_selection(Selection::for_domain(&self.content.catalog, domain));
        info!(session_id = %session.id(), domain, "Domain selected");
        self.counterparts(domain)
    }

    pub fn select_counterpart(&self, session: &mut Session, id: &str) -> Result<(), CoachError> {
        let domain = session.selection().domain.clone();
        if self.content.catalog.entry(&domain, id).is_none() {
            return Err(CoachError::UnknownCounterpart {
                domain,
                id: id.to_string(),
            });
        }
        session.set_selection(Selection {
            domain,
            counterpart: Some(id.to_string()),
        });
        Ok(())
    }

    pub fn set_mode(&self, session: &mut Session, mode: Mode) {
        session.set_mode(mode);
    }

    pub fn set_scoring(&self, session: &mut Session, enabled: bool) {
        session.set_scoring(enabled);
    }

    pub fn counterpart<'a>(&'a self, session: &Session) -> Option<&'a CatalogEntry> {
        active_counterpart(&self.content, session)
    }

    pub fn brief<'a>(&'a self, session: &Session) -> Option<&'a str> {
        active_brief(&self.content, session)
    }

    /// Send a user message, then score the exchange when evaluation is on.
    ///
    /// Only the sending guard (`Busy`) and blank input are errors. Gateway and
    /// evaluator failures come back as notices in the returned messages.
    pub async fn submit(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<Vec<WidgetMessage>, CoachError> {
        session.begin_turn(text)?;
        let user = text.trim();

        let settings = &self.content.settings;
        let request = ChatRequest::new(&settings.model, settings.temperature)
            .messages(outgoing_messages(&self.content, session));

        let reply = match self.gateway.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id = %session.id(), error = %e, "Reply request failed");
                session.abort_turn();
                return Ok(vec![WidgetMessage::UpstreamError(
                    UPSTREAM_ERROR_NOTICE.to_string(),
                )]);
            }
        };

        session.complete_turn(&reply);
        let mut out = vec![WidgetMessage::Assistant(reply.clone())];

        if !session.evaluation_enabled() {
            return Ok(out);
        }

        let brief = self.brief(session);
        match self.evaluator.evaluate(user, &reply, brief).await {
            Evaluation::Scored(report) => {
                let rubric = report.rubric();
                let score = settings.weights.turn_score(&rubric);
                let average = session.record_score(score);
                let turn = TurnScore {
                    rubric,
                    score,
                    average,
                    turns: session.turn_scores().len(),
                    compliance_risk: rubric.compliance_risk(),
                    feedback: report.feedback().map(str::to_string),
                };
                info!(session_id = %session.id(), score, average, "Turn scored");

                let risk = turn.compliance_risk;
                out.push(WidgetMessage::Score(turn));
                if risk {
                    out.push(WidgetMessage::ComplianceRisk(COMPLIANCE_RISK_NOTICE.to_string()));
                }
            }
            Evaluation::Unscored => {
                out.push(WidgetMessage::Unscored(UNSCORED_NOTICE.to_string()));
            }
        }

        Ok(out)
    }
}

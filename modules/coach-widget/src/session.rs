use ai_client::Message;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CoachError;
use crate::rubric::running_average;
use crate::types::{Mode, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingReply,
    Scored,
}

/// One widget instance's conversation.
///
/// History never carries across a domain, counterpart or mode change. The id
/// changes only when the mode does.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    mode: Mode,
    scoring_enabled: bool,
    selection: Selection,
    messages: Vec<Message>,
    turn_scores: Vec<f64>,
    state: SessionState,
}

impl Session {
    pub fn new(mode: Mode, scoring_enabled: bool, selection: Selection) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            mode,
            scoring_enabled,
            selection,
            messages: Vec::new(),
            turn_scores: Vec::new(),
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scoring_enabled(&self) -> bool {
        self.scoring_enabled
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn turn_scores(&self) -> &[f64] {
        &self.turn_scores
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether completed turns get sent to the evaluator.
    pub fn evaluation_enabled(&self) -> bool {
        self.scoring_enabled && self.mode.allows_scoring()
    }

    pub fn average_score(&self) -> Option<f64> {
        running_average(&self.turn_scores)
    }

    /// Drop history and scores. Keeps id, mode and selection.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.turn_scores.clear();
        self.started_at = Utc::now();
        self.state = SessionState::Idle;
    }

    /// Switch mode. A real change resets history and issues a new id.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.id = Uuid::new_v4();
        self.reset();
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.reset();
    }

    /// Toggling scoring leaves the conversation in place.
    pub fn set_scoring(&mut self, enabled: bool) {
        self.scoring_enabled = enabled;
    }

    pub(crate) fn begin_turn(&mut self, text: &str) -> Result<(), CoachError> {
        if self.state == SessionState::AwaitingReply {
            return Err(CoachError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(CoachError::EmptyMessage);
        }
        self.messages.push(Message::user(text));
        self.state = SessionState::AwaitingReply;
        Ok(())
    }

    pub(crate) fn complete_turn(&mut self, reply: &str) {
        self.messages.push(Message::assistant(reply));
        self.state = SessionState::Idle;
    }

    /// The reply never arrived. The user turn stays in history.
    pub(crate) fn abort_turn(&mut self) {
        self.state = SessionState::Idle;
    }

    /// Record a turn score and return the new running average.
    pub(crate) fn record_score(&mut self, score: f64) -> f64 {
        self.turn_scores.push(score);
        self.state = SessionState::Scored;
        self.average_score().unwrap_or(score)
    }
}

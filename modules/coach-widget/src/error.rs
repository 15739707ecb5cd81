use ai_client::AiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoachError {
    #[error("A reply is already pending for this session")]
    Busy,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Counterpart '{id}' is not part of domain '{domain}'")]
    UnknownCounterpart { domain: String, id: String },

    #[error("Content error: {0}")]
    Content(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Gateway(#[from] AiError),
}

pub mod client;
pub mod envelope;
pub mod error;
pub mod schema;
pub mod traits;
pub mod util;

pub use client::ChatClient;
pub use envelope::extract_reply;
pub use error::AiError;
pub use schema::StructuredOutput;
pub use traits::{ChatGateway, ChatRequest, Message, MessageRole};
pub use util::{last_json_object, truncate_to_char_boundary};

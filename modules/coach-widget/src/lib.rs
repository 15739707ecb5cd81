pub mod catalog;
pub mod content;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod preferences;
pub mod rubric;
pub mod session;
pub mod types;
pub mod widget;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{Catalog, CatalogEntry, Domain};
pub use content::{load_content, ContentSource, DirSource, HttpSource, SiteContent, WidgetSettings};
pub use error::CoachError;
pub use evaluator::{Evaluation, Evaluator};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences};
pub use rubric::{Dimension, Rubric, RubricParseError, RubricReport, RubricWeights, TurnScore};
pub use session::{Session, SessionState};
pub use types::{Mode, Selection};
pub use widget::{CoachWidget, WidgetMessage};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// What the model does in a session.
///
/// In `Roleplay` the model plays the selected counterpart and turns may be
/// scored. In `Coach` it gives advice about the scenario and nothing is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Roleplay,
    Coach,
}

impl Mode {
    pub fn allows_scoring(self) -> bool {
        matches!(self, Mode::Roleplay)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Roleplay => write!(f, "roleplay"),
            Mode::Coach => write!(f, "coach"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "roleplay" | "role-play" | "practice" => Ok(Mode::Roleplay),
            "coach" | "coaching" => Ok(Mode::Coach),
            other => Err(format!("unknown mode '{other}' (expected roleplay or coach)")),
        }
    }
}

/// Current domain plus the counterpart chosen inside it.
///
/// `counterpart` is `None` only when the domain has no entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub domain: String,
    pub counterpart: Option<String>,
}

impl Selection {
    /// Select `domain` with its first catalog entry as the counterpart.
    pub fn for_domain(catalog: &Catalog, domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            counterpart: catalog.default_counterpart(domain).map(|e| e.id.clone()),
        }
    }

    /// Selection for the catalog's first domain, or an empty one.
    pub fn initial(catalog: &Catalog) -> Self {
        match catalog.first_domain() {
            Some(d) => Self::for_domain(catalog, &d.key),
            None => Self::default(),
        }
    }
}

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::CoachError;
use crate::session::Session;
use crate::types::{Mode, Selection};

/// Fixed key the preferences record is stored under.
pub const STORAGE_KEY: &str = "coach.preferences.v1";

/// The only durable widget state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub mode: Mode,
    pub scoring_enabled: bool,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub counterpart: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            scoring_enabled: true,
            domain: None,
            counterpart: None,
        }
    }
}

impl Preferences {
    pub fn from_session(session: &Session) -> Self {
        let selection = session.selection();
        Self {
            mode: session.mode(),
            scoring_enabled: session.scoring_enabled(),
            domain: Some(selection.domain.clone()).filter(|d| !d.is_empty()),
            counterpart: selection.counterpart.clone(),
        }
    }

    /// Selection these preferences point at, re-validated against `catalog`.
    ///
    /// An unknown domain falls back to the catalog's first domain; a
    /// counterpart that no longer exists in the domain falls back to the
    /// domain's first entry.
    pub fn selection(&self, catalog: &Catalog) -> Selection {
        let domain = match self.domain.as_deref().and_then(|d| catalog.domain(d)) {
            Some(d) => d,
            None => return Selection::initial(catalog),
        };

        let kept = self
            .counterpart
            .as_deref()
            .and_then(|id| catalog.entry(&domain.key, id));

        match kept {
            Some(entry) => Selection {
                domain: domain.key.clone(),
                counterpart: Some(entry.id.clone()),
            },
            None => Selection::for_domain(catalog, &domain.key),
        }
    }
}

// =============================================================================
// Stores
// =============================================================================

pub trait PreferenceStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Preferences>, CoachError>;

    fn save(&self, prefs: &Preferences) -> Result<(), CoachError>;
}

/// Key/value store in memory.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<Preferences>, CoachError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CoachError::Storage("preference store poisoned".to_string()))?;
        entries
            .get(STORAGE_KEY)
            .map(|raw| serde_json::from_str(raw).map_err(|e| CoachError::Storage(e.to_string())))
            .transpose()
    }

    fn save(&self, prefs: &Preferences) -> Result<(), CoachError> {
        let raw = serde_json::to_string(prefs).map_err(|e| CoachError::Storage(e.to_string()))?;
        self.entries
            .lock()
            .map_err(|_| CoachError::Storage("preference store poisoned".to_string()))?
            .insert(STORAGE_KEY.to_string(), raw);
        Ok(())
    }
}

/// JSON file holding a map of storage keys. Other keys in the file are kept.
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Result<Map<String, Value>, CoachError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.storage_error(e)),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&raw).map_err(|e| self.storage_error(e))
    }

    fn storage_error(&self, e: impl std::fmt::Display) -> CoachError {
        CoachError::Storage(format!("{}: {e}", self.path.display()))
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<Option<Preferences>, CoachError> {
        let map = self.read_map()?;
        map.get(STORAGE_KEY)
            .cloned()
            .map(|v| serde_json::from_value(v).map_err(|e| self.storage_error(e)))
            .transpose()
    }

    fn save(&self, prefs: &Preferences) -> Result<(), CoachError> {
        let mut map = self.read_map().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Overwriting unreadable preference file");
            Map::new()
        });
        let value = serde_json::to_value(prefs).map_err(|e| self.storage_error(e))?;
        map.insert(STORAGE_KEY.to_string(), value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.storage_error(e))?;
        }
        let raw = serde_json::to_string_pretty(&map).map_err(|e| self.storage_error(e))?;
        std::fs::write(&self.path, raw).map_err(|e| self.storage_error(e))?;

        debug!(path = %self.path.display(), "Preferences saved");
        Ok(())
    }
}

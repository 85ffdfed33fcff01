// src/reconcile/record.rs

//! The declared selection record.
//!
//! A persisted JSON document holding the profile ids the user last
//! confirmed plus the generated configuration key/value map. The engine
//! tolerates a missing file (fresh system), a missing `profiles.selected`
//! section (corrupted state), and unknown keys.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// `profiles` section of the record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilesSection {
    /// Selected ids; `None` when the section is absent or unreadable
    #[serde(default)]
    pub selected: Option<Vec<String>>,
}

/// Persisted declaration of what the user asked to install
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclaredRecord {
    #[serde(default)]
    pub profiles: ProfilesSection,

    #[serde(default)]
    pub configuration: HashMap<String, String>,
}

impl DeclaredRecord {
    /// Parse a record from JSON text. Unknown fields are ignored.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load a record from disk.
    ///
    /// A missing or unreadable file yields the empty record: the declared
    /// list is then unavailable and reconciliation falls back to the
    /// configuration-key heuristic.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => match Self::from_json_str(&text) {
                Ok(record) => record,
                Err(err) => {
                    warn!(path = %path.display(), %err, "state record unparseable, treating as absent");
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                warn!(path = %path.display(), %err, "state record unreadable, treating as absent");
                Self::default()
            }
        }
    }

    /// Whether the declared selection list is usable
    pub fn has_selection(&self) -> bool {
        self.profiles.selected.is_some()
    }

    pub fn selected(&self) -> &[String] {
        self.profiles.selected.as_deref().unwrap_or_default()
    }

    /// Whether any configuration key starts with the given prefix
    pub fn has_key_with_prefix(&self, prefix: &str) -> bool {
        self.configuration.keys().any(|k| k.starts_with(prefix))
    }
}

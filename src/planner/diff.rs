// src/planner/diff.rs

//! Configuration diff computation.
//!
//! Compares the current configuration map against a proposed one. Keys with
//! equal values are omitted; everything else is classified as added,
//! removed, or modified.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DiffKind {
    Added,
    Removed,
    Modified,
}

/// One changed configuration key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub key: String,
    pub kind: DiffKind,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// The set of effective changes between two configurations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDiff {
    pub entries: Vec<DiffEntry>,
}

impl ConfigDiff {
    /// Diff two configuration maps, entries ordered by key
    pub fn between(old: &HashMap<String, String>, new: &HashMap<String, String>) -> Self {
        let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        let mut entries = Vec::new();

        for key in keys {
            let entry = match (old.get(key), new.get(key)) {
                (None, Some(added)) => DiffEntry {
                    key: key.clone(),
                    kind: DiffKind::Added,
                    old: None,
                    new: Some(added.clone()),
                },
                (Some(removed), None) => DiffEntry {
                    key: key.clone(),
                    kind: DiffKind::Removed,
                    old: Some(removed.clone()),
                    new: None,
                },
                (Some(before), Some(after)) if before != after => DiffEntry {
                    key: key.clone(),
                    kind: DiffKind::Modified,
                    old: Some(before.clone()),
                    new: Some(after.clone()),
                },
                _ => continue,
            };
            entries.push(entry);
        }

        Self { entries }
    }

    pub fn has_changes(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Changed key names in diff order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }
}

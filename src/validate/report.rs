// src/validate/report.rs

//! Structured validation report types.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::resolver::ResolvedSelection;

/// Classification of a validation finding.
///
/// The first seven kinds are fatal when they appear in `errors`; the rest
/// only ever appear as warnings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    UnknownProfile,
    CircularDependency,
    ProfileConflict,
    MissingPrerequisite,
    PortCollision,
    EmptySelection,
    PlanningInconsistency,
    // warning-only kinds
    ResourceHeadroom,
    StrandedPrerequisite,
    StillRequired,
    StateMismatch,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Pass/fail report for a selection.
///
/// Invariant: `valid == errors.is_empty()`. Warnings never affect validity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub resolved: ResolvedSelection,
}

impl ValidationReport {
    pub fn new(
        errors: Vec<ValidationIssue>,
        warnings: Vec<ValidationIssue>,
        resolved: ResolvedSelection,
    ) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
            resolved,
        }
    }

    /// Report carrying only errors, with nothing resolved
    pub fn from_errors(errors: Vec<ValidationIssue>) -> Self {
        Self::new(errors, Vec::new(), ResolvedSelection::default())
    }

    pub fn has_error_kind(&self, kind: IssueKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    pub fn has_warning_kind(&self, kind: IssueKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tracks_errors_only() {
        let clean = ValidationReport::new(
            Vec::new(),
            vec![ValidationIssue::new(IssueKind::ResourceHeadroom, "tight")],
            ResolvedSelection::default(),
        );
        assert!(clean.valid, "warnings must not affect validity");

        let broken = ValidationReport::from_errors(vec![ValidationIssue::new(
            IssueKind::UnknownProfile,
            "no such profile",
        )]);
        assert!(!broken.valid);
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        assert_eq!(IssueKind::ProfileConflict.to_string(), "profile-conflict");
        assert_eq!(
            serde_json::to_string(&IssueKind::PortCollision).unwrap(),
            "\"port-collision\""
        );
    }
}

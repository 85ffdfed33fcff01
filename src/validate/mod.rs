// src/validate/mod.rs

//! Selection validation - the single entry point for every flow that needs
//! a selection checked.
//!
//! The install flow validates fresh selections; the reconfiguration planner
//! validates would-be selections after an add or remove. Both go through
//! [`Validator::validate`], which runs existence, cycle, base-profile,
//! prerequisite, conflict, port, and resource checks in that order.

mod report;

pub use report::{IssueKind, ValidationIssue, ValidationReport};

use tracing::debug;

use crate::catalog::{Catalog, ResourceLimits};
use crate::resolver::GraphResolver;

/// Validator borrowing an immutable catalog.
pub struct Validator<'a> {
    catalog: &'a Catalog,
    limits: ResourceLimits,
}

impl<'a> Validator<'a> {
    /// Create a validator using the catalog's declared limits
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            limits: catalog.limits(),
        }
    }

    /// Override the resource warning limits (mainly for tests)
    pub fn with_limits(catalog: &'a Catalog, limits: ResourceLimits) -> Self {
        Self { catalog, limits }
    }

    /// Validate a selection and produce a structured report.
    ///
    /// Legacy ids are expanded before any check so callers can hand in a
    /// selection recorded by an older release.
    pub fn validate(&self, selection: &[String]) -> ValidationReport {
        if selection.is_empty() {
            return ValidationReport::from_errors(vec![ValidationIssue::new(
                IssueKind::EmptySelection,
                "no profiles selected",
            )]);
        }

        let selection = self.catalog.expand_legacy(selection);
        let resolver = GraphResolver::new(self.catalog);
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Existence: every requested id must be in the catalog
        for id in &selection {
            if !self.catalog.contains(id) {
                errors.push(ValidationIssue::new(
                    IssueKind::UnknownProfile,
                    format!("unknown profile '{id}'"),
                ));
            }
        }

        let closure = resolver.resolve_closure(&selection);

        // 2. Cycles reachable from the requested roots
        for cycle in resolver.detect_cycles(&selection) {
            errors.push(ValidationIssue::new(
                IssueKind::CircularDependency,
                format!("circular dependency: {}", cycle.join(" -> ")),
            ));
        }

        // 3. Base-profile rule: the closure must contain a base runtime
        let has_base = self
            .catalog
            .profiles()
            .any(|p| p.base && closure.contains(&p.id));
        if !closure.is_empty() && !has_base {
            let bases: Vec<&str> = self
                .catalog
                .profiles()
                .filter(|p| p.base)
                .map(|p| p.id.as_str())
                .collect();
            errors.push(ValidationIssue::new(
                IssueKind::MissingPrerequisite,
                format!(
                    "selection contains no base profile (one of: {})",
                    bases.join(", ")
                ),
            ));
        }

        // 4. Disjunctive prerequisites: at least one of each group present
        for profile in self.catalog.profiles() {
            if !closure.contains(&profile.id) || profile.prerequisites.is_empty() {
                continue;
            }
            let satisfied = profile.prerequisites.iter().any(|p| closure.contains(p));
            if !satisfied {
                errors.push(ValidationIssue::new(
                    IssueKind::MissingPrerequisite,
                    format!(
                        "profile '{}' requires one of: {}",
                        profile.id,
                        profile.prerequisites.join(", ")
                    ),
                ));
            }
        }

        // 5. Pairwise conflicts
        for pair in resolver.detect_conflicts(&closure) {
            errors.push(ValidationIssue::new(
                IssueKind::ProfileConflict,
                pair.to_string(),
            ));
        }

        // 6. Port collisions
        for collision in resolver.detect_port_collisions(&closure) {
            errors.push(ValidationIssue::new(
                IssueKind::PortCollision,
                collision.to_string(),
            ));
        }

        // 7. Resource sanity: non-fatal, reported even alongside errors
        let resolved = resolver.resolve(&selection);
        if resolved.requirements.minimum.memory_mb > self.limits.memory_warn_mb {
            warnings.push(ValidationIssue::new(
                IssueKind::ResourceHeadroom,
                format!(
                    "selection needs at least {} MB memory (warning threshold {} MB); verify host capacity",
                    resolved.requirements.minimum.memory_mb, self.limits.memory_warn_mb
                ),
            ));
        }

        debug!(
            profiles = resolved.profiles.len(),
            errors = errors.len(),
            warnings = warnings.len(),
            "selection validated"
        );

        ValidationReport::new(errors, warnings, resolved)
    }
}

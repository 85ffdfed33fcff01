// src/planner/mod.rs

//! Reconfiguration planning.
//!
//! Given a proposed add/remove/configure action and the current reconciled
//! state, computes the blast radius before anything is applied: affected
//! services, restart tier, estimated downtime, and blocking validation
//! errors. Removal is never blocked outright - problems with the remaining
//! selection are surfaced as warnings instead.

mod diff;
mod routes;

pub use diff::{ConfigDiff, DiffEntry, DiffKind};
pub use routes::KeyRoutes;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::debug;

use crate::catalog::Catalog;
use crate::reconcile::{DeclaredRecord, ReconciliationPass};
use crate::resolver::GraphResolver;
use crate::validate::{IssueKind, ValidationIssue, ValidationReport, Validator};

/// A proposed reconfiguration action
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Add,
    Remove,
    Configure,
}

/// How much of the deployment a change forces down.
///
/// Ordered by severity; escalation always takes the maximum tier across
/// the changed keys.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum RestartType {
    Service,
    Container,
    Full,
}

impl RestartType {
    /// Estimated downtime for a restart of this tier.
    ///
    /// Policy constants; the invariant is that they increase strictly with
    /// the tier.
    pub fn downtime_secs(self) -> u64 {
        match self {
            RestartType::Service => 5,
            RestartType::Container => 30,
            RestartType::Full => 120,
        }
    }
}

/// Computed impact of a proposed action.
///
/// Built fresh per planning call; never cached, so it always reflects the
/// reconciliation pass it was given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconfigurationImpact {
    pub action: Action,
    pub affected_services: Vec<String>,
    pub restart_type: RestartType,
    pub estimated_downtime_secs: u64,
    pub requires_restart: bool,
    pub diff: ConfigDiff,
    pub warnings: Vec<ValidationIssue>,
}

/// Plans add/remove/configure operations against the current state.
pub struct ReconfigurationPlanner<'a> {
    catalog: &'a Catalog,
}

impl<'a> ReconfigurationPlanner<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Compute the impact of a proposed action.
    ///
    /// Blocking problems come back as `Err(ValidationReport)`; a successful
    /// plan may still carry warnings.
    pub fn plan(
        &self,
        action: Action,
        targets: &[String],
        proposed_config: Option<&HashMap<String, String>>,
        record: &DeclaredRecord,
        pass: &ReconciliationPass,
    ) -> Result<ReconfigurationImpact, ValidationReport> {
        let result = match action {
            Action::Add => self.plan_add(targets, record, pass),
            Action::Remove => self.plan_remove(targets, record, pass),
            Action::Configure => self.plan_configure(targets, proposed_config, record, pass),
        };

        if let Ok(impact) = &result {
            debug!(
                action = %impact.action,
                services = impact.affected_services.len(),
                restart = %impact.restart_type,
                "reconfiguration planned"
            );
        }
        result
    }

    fn plan_add(
        &self,
        targets: &[String],
        record: &DeclaredRecord,
        pass: &ReconciliationPass,
    ) -> Result<ReconfigurationImpact, ValidationReport> {
        if targets.is_empty() {
            return Err(ValidationReport::from_errors(vec![ValidationIssue::new(
                IssueKind::EmptySelection,
                "no profiles given to add",
            )]));
        }

        let current = self.catalog.expand_legacy(record.selected());
        let mut would_be = current.clone();
        for target in targets {
            if !would_be.contains(target) {
                would_be.push(target.clone());
            }
        }

        let mut report = Validator::new(self.catalog).validate(&would_be);
        for target in targets {
            if let Some(state) = pass.get(target) {
                if !state.can_add() {
                    report.errors.push(ValidationIssue::new(
                        IssueKind::PlanningInconsistency,
                        format!(
                            "profile '{}' is already {} and cannot be added",
                            target, state.installation
                        ),
                    ));
                }
            }
        }
        report.valid = report.errors.is_empty();
        if !report.valid {
            return Err(report);
        }

        let resolver = GraphResolver::new(self.catalog);
        let before = resolver.resolve_closure(&current);
        let after = resolver.resolve_closure(&would_be);
        let added: HashSet<&String> = after.difference(&before).collect();
        let affected_services = self.services_of(|id| added.contains(&id.to_string()));

        // New profiles start alongside the running stack; nothing restarts.
        Ok(ReconfigurationImpact {
            action: Action::Add,
            affected_services,
            restart_type: RestartType::Service,
            estimated_downtime_secs: 0,
            requires_restart: false,
            diff: ConfigDiff::default(),
            warnings: report.warnings,
        })
    }

    fn plan_remove(
        &self,
        targets: &[String],
        record: &DeclaredRecord,
        pass: &ReconciliationPass,
    ) -> Result<ReconfigurationImpact, ValidationReport> {
        if targets.is_empty() {
            return Err(ValidationReport::from_errors(vec![ValidationIssue::new(
                IssueKind::EmptySelection,
                "no profiles given to remove",
            )]));
        }

        let unknown: Vec<ValidationIssue> = targets
            .iter()
            .filter(|t| !self.catalog.contains(t))
            .map(|t| {
                ValidationIssue::new(IssueKind::UnknownProfile, format!("unknown profile '{t}'"))
            })
            .collect();
        if !unknown.is_empty() {
            return Err(ValidationReport::from_errors(unknown));
        }

        let current = self.catalog.expand_legacy(record.selected());
        let target_set: HashSet<&String> = targets.iter().collect();
        let remaining: Vec<String> = current
            .iter()
            .filter(|id| !target_set.contains(id))
            .cloned()
            .collect();

        // Removal is never blocked; everything below is advisory.
        let mut warnings = Vec::new();

        for target in targets {
            if let Some(state) = pass.get(target) {
                if !state.can_remove() {
                    warnings.push(ValidationIssue::new(
                        IssueKind::StateMismatch,
                        format!(
                            "profile '{}' is {}; removing it only updates the declared selection",
                            target, state.installation
                        ),
                    ));
                }
            }
        }

        if !remaining.is_empty() {
            let resolver = GraphResolver::new(self.catalog);
            let remaining_closure = resolver.resolve_closure(&remaining);
            for target in targets {
                if remaining_closure.contains(target.as_str()) {
                    warnings.push(ValidationIssue::new(
                        IssueKind::StillRequired,
                        format!(
                            "profile '{target}' is still required by the remaining selection and would be reinstalled on the next resolve"
                        ),
                    ));
                }
            }

            let report = Validator::new(self.catalog).validate(&remaining);
            for error in report.errors {
                let kind = match error.kind {
                    IssueKind::MissingPrerequisite => IssueKind::StrandedPrerequisite,
                    other => other,
                };
                warnings.push(ValidationIssue::new(
                    kind,
                    format!("after removal: {}", error.message),
                ));
            }
        }

        let affected_services = self.services_of(|id| target_set.contains(&id.to_string()));

        Ok(ReconfigurationImpact {
            action: Action::Remove,
            affected_services,
            restart_type: RestartType::Container,
            estimated_downtime_secs: RestartType::Container.downtime_secs(),
            requires_restart: true,
            diff: ConfigDiff::default(),
            warnings,
        })
    }

    fn plan_configure(
        &self,
        targets: &[String],
        proposed_config: Option<&HashMap<String, String>>,
        record: &DeclaredRecord,
        pass: &ReconciliationPass,
    ) -> Result<ReconfigurationImpact, ValidationReport> {
        let empty = HashMap::new();
        let proposed = proposed_config.unwrap_or(&empty);
        let diff = ConfigDiff::between(&record.configuration, proposed);

        if !diff.has_changes() {
            return Ok(ReconfigurationImpact {
                action: Action::Configure,
                affected_services: Vec::new(),
                restart_type: RestartType::Service,
                estimated_downtime_secs: 0,
                requires_restart: false,
                diff,
                warnings: Vec::new(),
            });
        }

        let mut warnings = Vec::new();
        for target in targets {
            if let Some(state) = pass.get(target) {
                if !state.can_modify() {
                    warnings.push(ValidationIssue::new(
                        IssueKind::StateMismatch,
                        format!(
                            "profile '{}' is {}; configuration changes take effect once it is installed and consistent",
                            target, state.installation
                        ),
                    ));
                }
            }
        }

        let routes = KeyRoutes::from_catalog(self.catalog);
        let mut affected_services = Vec::new();
        let mut restart_type = RestartType::Service;

        for key in diff.keys() {
            for service in routes.services_for_key(key) {
                if !affected_services.contains(&service) {
                    affected_services.push(service);
                }
            }
            restart_type = restart_type.max(routes.tier_for_key(key));
        }

        if affected_services.is_empty() {
            // No prefix matched: every service of the targeted profiles is
            // assumed affected.
            let target_set: HashSet<&String> = targets.iter().collect();
            affected_services = self.services_of(|id| target_set.contains(&id.to_string()));
        }

        if affected_services.is_empty() {
            // Pending changes with nobody to apply them to is a planning
            // error, not a no-op.
            return Err(ValidationReport::from_errors(vec![ValidationIssue::new(
                IssueKind::PlanningInconsistency,
                format!(
                    "{} configuration change(s) map to no services; check the routing table and targets",
                    diff.entries.len()
                ),
            )]));
        }

        Ok(ReconfigurationImpact {
            action: Action::Configure,
            affected_services,
            restart_type,
            estimated_downtime_secs: restart_type.downtime_secs(),
            requires_restart: true,
            diff,
            warnings,
        })
    }

    /// Services of every catalog profile matching the filter, in catalog
    /// and startup order
    fn services_of(&self, mut filter: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut services = Vec::new();
        for profile in self.catalog.profiles() {
            if !filter(&profile.id) {
                continue;
            }
            let mut specs: Vec<_> = profile.services.iter().collect();
            specs.sort_by_key(|s| s.startup_order);
            for spec in specs {
                if !services.contains(&spec.name) {
                    services.push(spec.name.clone());
                }
            }
        }
        services
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::reconcile::{LiveSnapshot, ServiceEntry, StateReconciler};

    fn catalog() -> Catalog {
        Catalog::from_toml_str(
            r#"
            [[profiles]]
            id = "node"
            base = true
            config_prefixes = ["node."]
            ports = [16111]

              [[profiles.services]]
              name = "node"

            [[profiles]]
            id = "explorer"
            dependencies = ["node"]
            config_prefixes = ["explorer."]
            ports = [3008]

              [[profiles.services]]
              name = "explorer-web"
              startup_order = 2

              [[profiles.services]]
              name = "explorer-api"
              startup_order = 1

            [[profiles]]
            id = "mining"
            prerequisites = ["node"]

              [[profiles.services]]
              name = "miner"

            [routing]
            volume_prefixes = ["data."]
            network_prefixes = ["network."]
            "#,
        )
        .unwrap()
    }

    fn record(selected: &[&str], config: &[(&str, &str)]) -> DeclaredRecord {
        let mut record = DeclaredRecord::default();
        record.profiles.selected =
            Some(selected.iter().map(|s| s.to_string()).collect());
        record.configuration = config
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        record
    }

    fn pass_for(catalog: &Catalog, record: &DeclaredRecord, running: &[&str]) -> ReconciliationPass {
        let snapshot = LiveSnapshot::from_entries(running.iter().map(|name| ServiceEntry {
            name: name.to_string(),
            running: true,
        }));
        StateReconciler::new(catalog).run_pass(record, &snapshot)
    }

    fn targets(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn config(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_downtime_strictly_increases_with_tier() {
        assert!(
            RestartType::Service.downtime_secs() < RestartType::Container.downtime_secs()
        );
        assert!(
            RestartType::Container.downtime_secs() < RestartType::Full.downtime_secs()
        );
    }

    #[test]
    fn test_configure_routed_key_hits_one_service() {
        let catalog = catalog();
        let planner = ReconfigurationPlanner::new(&catalog);
        let record = record(&["node"], &[("node.rpc_port", "16110")]);
        let pass = pass_for(&catalog, &record, &["node"]);

        let impact = planner
            .plan(
                Action::Configure,
                &targets(&["node"]),
                Some(&config(&[("node.rpc_port", "16210")])),
                &record,
                &pass,
            )
            .unwrap();

        assert_eq!(impact.affected_services, vec!["node"]);
        assert_eq!(impact.restart_type, RestartType::Service);
        assert!(impact.requires_restart);
        assert_eq!(impact.diff.entries.len(), 1);
    }

    #[test]
    fn test_configure_volume_key_escalates_to_container() {
        let catalog = catalog();
        let planner = ReconfigurationPlanner::new(&catalog);
        let record = record(
            &["node"],
            &[("node.rpc_port", "16110"), ("data.node_dir", "/var/a")],
        );
        let pass = pass_for(&catalog, &record, &["node"]);

        let impact = planner
            .plan(
                Action::Configure,
                &targets(&["node"]),
                Some(&config(&[
                    ("node.rpc_port", "16110"),
                    ("data.node_dir", "/var/b"),
                ])),
                &record,
                &pass,
            )
            .unwrap();

        assert_eq!(
            impact.restart_type,
            RestartType::Container,
            "volume-category key escalates even with port key unchanged"
        );
        assert_eq!(
            impact.estimated_downtime_secs,
            RestartType::Container.downtime_secs()
        );
    }

    #[test]
    fn test_configure_network_key_escalates_to_full() {
        let catalog = catalog();
        let planner = ReconfigurationPlanner::new(&catalog);
        let record = record(&["node"], &[]);
        let pass = pass_for(&catalog, &record, &["node"]);

        let impact = planner
            .plan(
                Action::Configure,
                &targets(&["node"]),
                Some(&config(&[("network.public_host", "node.example")])),
                &record,
                &pass,
            )
            .unwrap();

        assert_eq!(impact.restart_type, RestartType::Full);
    }

    #[test]
    fn test_configure_unrouted_key_falls_back_to_target_services() {
        let catalog = catalog();
        let planner = ReconfigurationPlanner::new(&catalog);
        let record = record(&["node", "explorer"], &[]);
        let pass = pass_for(&catalog, &record, &["node", "explorer-api", "explorer-web"]);

        let impact = planner
            .plan(
                Action::Configure,
                &targets(&["explorer"]),
                Some(&config(&[("misc.flag", "1")])),
                &record,
                &pass,
            )
            .unwrap();

        // fallback uses startup order within the profile
        assert_eq!(impact.affected_services, vec!["explorer-api", "explorer-web"]);
    }

    #[test]
    fn test_configure_with_changes_but_no_services_is_inconsistent() {
        let catalog = catalog();
        let planner = ReconfigurationPlanner::new(&catalog);
        let record = record(&["node"], &[]);
        let pass = pass_for(&catalog, &record, &["node"]);

        let report = planner
            .plan(
                Action::Configure,
                &[],
                Some(&config(&[("misc.flag", "1")])),
                &record,
                &pass,
            )
            .unwrap_err();

        assert!(report.has_error_kind(IssueKind::PlanningInconsistency));
    }

    #[test]
    fn test_configure_without_changes_is_noop() {
        let catalog = catalog();
        let planner = ReconfigurationPlanner::new(&catalog);
        let record = record(&["node"], &[("node.rpc_port", "16110")]);
        let pass = pass_for(&catalog, &record, &["node"]);

        let impact = planner
            .plan(
                Action::Configure,
                &targets(&["node"]),
                Some(&config(&[("node.rpc_port", "16110")])),
                &record,
                &pass,
            )
            .unwrap();

        assert!(!impact.requires_restart);
        assert_eq!(impact.estimated_downtime_secs, 0);
        assert!(impact.affected_services.is_empty());
    }

    #[test]
    fn test_add_validates_would_be_selection() {
        let catalog = catalog();
        let planner = ReconfigurationPlanner::new(&catalog);
        let record = record(&["node"], &[]);
        let pass = pass_for(&catalog, &record, &["node"]);

        let impact = planner
            .plan(Action::Add, &targets(&["explorer"]), None, &record, &pass)
            .unwrap();
        assert_eq!(impact.affected_services, vec!["explorer-api", "explorer-web"]);
        assert!(!impact.requires_restart);

        let report = planner
            .plan(Action::Add, &targets(&["ghost"]), None, &record, &pass)
            .unwrap_err();
        assert!(report.has_error_kind(IssueKind::UnknownProfile));
    }

    #[test]
    fn test_add_installed_profile_is_inconsistent() {
        let catalog = catalog();
        let planner = ReconfigurationPlanner::new(&catalog);
        let record = record(&["node"], &[]);
        let pass = pass_for(&catalog, &record, &["node"]);

        let report = planner
            .plan(Action::Add, &targets(&["node"]), None, &record, &pass)
            .unwrap_err();
        assert!(report.has_error_kind(IssueKind::PlanningInconsistency));
    }

    #[test]
    fn test_remove_is_flagged_never_blocked() {
        let catalog = catalog();
        let planner = ReconfigurationPlanner::new(&catalog);
        let record = record(&["node", "mining"], &[]);
        let pass = pass_for(&catalog, &record, &["node", "miner"]);

        // removing node strands mining's prerequisite group - warned, not
        // refused
        let impact = planner
            .plan(Action::Remove, &targets(&["node"]), None, &record, &pass)
            .unwrap();
        assert_eq!(impact.affected_services, vec!["node"]);
        assert!(impact.requires_restart);
        assert!(impact
            .warnings
            .iter()
            .any(|w| w.kind == IssueKind::StrandedPrerequisite));
    }

    #[test]
    fn test_remove_still_required_dependency_is_flagged() {
        let catalog = catalog();
        let planner = ReconfigurationPlanner::new(&catalog);
        let record = record(&["node", "explorer"], &[]);
        let pass = pass_for(&catalog, &record, &["node", "explorer-api", "explorer-web"]);

        let impact = planner
            .plan(Action::Remove, &targets(&["node"]), None, &record, &pass)
            .unwrap();
        assert!(impact
            .warnings
            .iter()
            .any(|w| w.kind == IssueKind::StillRequired));
    }

    #[test]
    fn test_remove_not_installed_profile_is_flagged() {
        let catalog = catalog();
        let planner = ReconfigurationPlanner::new(&catalog);
        let record = record(&["node"], &[]);
        let pass = pass_for(&catalog, &record, &["node"]);

        let impact = planner
            .plan(Action::Remove, &targets(&["explorer"]), None, &record, &pass)
            .unwrap();
        assert!(impact
            .warnings
            .iter()
            .any(|w| w.kind == IssueKind::StateMismatch));
    }
}

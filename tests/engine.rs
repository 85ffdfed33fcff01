// tests/engine.rs

//! End-to-end engine tests: selection validation, state reconciliation,
//! and reconfiguration planning against one realistic catalog.

use std::collections::HashMap;

use stevedore::{
    Action, Catalog, DeclaredRecord, InstallationState, IssueKind, LiveSnapshot,
    ReconfigurationPlanner, RestartType, ServiceEntry, ServiceStatus, StateReconciler,
    Validator,
};

const CATALOG: &str = r#"
[[profiles]]
id = "node"
display_name = "Node"
base = true
ports = [16111]
config_prefixes = ["node."]

  [[profiles.services]]
  name = "node"
  startup_order = 1

  [profiles.resources.minimum]
  cpu_cores = 2.0
  memory_mb = 4096
  disk_gb = 100

  [profiles.resources.recommended]
  cpu_cores = 4.0
  memory_mb = 8192
  disk_gb = 250

[[profiles]]
id = "explorer"
display_name = "Explorer"
dependencies = ["node"]
ports = [3008]
config_prefixes = ["explorer."]

  [[profiles.services]]
  name = "explorer-api"
  startup_order = 1

  [[profiles.services]]
  name = "explorer-web"
  startup_order = 2

  [profiles.resources.minimum]
  cpu_cores = 1.0
  memory_mb = 2048
  disk_gb = 20

[[profiles]]
id = "archive"
display_name = "Archive Node"
base = true
conflicts = ["node"]
ports = [16111]

  [[profiles.services]]
  name = "archive"

  [profiles.resources.minimum]
  cpu_cores = 4.0
  memory_mb = 16384
  disk_gb = 2000

[[profiles]]
id = "mining"
display_name = "Mining"
prerequisites = ["node", "archive"]

  [[profiles.services]]
  name = "miner"

[[profiles]]
id = "indexer"
display_name = "Indexer"
dependencies = ["node"]
config_prefixes = ["indexer."]

  [[profiles.services]]
  name = "indexer"

  [[profiles.services]]
  name = "postgres"

[legacy]
full-node = ["node", "indexer"]

[routing]
volume_prefixes = ["data."]
network_prefixes = ["network."]

[limits]
memory_warn_mb = 16000
"#;

fn catalog() -> Catalog {
    Catalog::from_toml_str(CATALOG).expect("catalog must load")
}

fn sel(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn record(selected: &[&str]) -> DeclaredRecord {
    let mut record = DeclaredRecord::default();
    record.profiles.selected = Some(sel(selected));
    record
}

fn snapshot(entries: &[(&str, bool)]) -> LiveSnapshot {
    LiveSnapshot::from_entries(entries.iter().map(|(name, running)| ServiceEntry {
        name: name.to_string(),
        running: *running,
    }))
}

#[test]
fn test_explorer_selection_pulls_in_node() {
    let catalog = catalog();
    let report = Validator::new(&catalog).validate(&sel(&["explorer"]));

    assert!(report.valid, "errors: {:?}", report.errors);
    assert_eq!(report.resolved.profiles, vec!["node", "explorer"]);
    assert_eq!(report.resolved.ports, vec![3008, 16111]);
    // memory sums, cpu maxes
    assert_eq!(report.resolved.requirements.minimum.memory_mb, 4096 + 2048);
    assert_eq!(report.resolved.requirements.minimum.cpu_cores, 2.0);
}

#[test]
fn test_archive_and_node_conflict() {
    let catalog = catalog();
    let report = Validator::new(&catalog).validate(&sel(&["archive", "node"]));

    assert!(!report.valid);
    let conflicts: Vec<_> = report
        .errors
        .iter()
        .filter(|e| e.kind == IssueKind::ProfileConflict)
        .collect();
    assert_eq!(conflicts.len(), 1, "one error of kind profile-conflict");
}

#[test]
fn test_mining_prerequisite_group() {
    let catalog = catalog();

    let alone = Validator::new(&catalog).validate(&sel(&["mining"]));
    assert!(alone.has_error_kind(IssueKind::MissingPrerequisite));

    let with_node = Validator::new(&catalog).validate(&sel(&["mining", "node"]));
    assert!(with_node.valid, "errors: {:?}", with_node.errors);
}

#[test]
fn test_reconcile_installed_running_and_stopped() {
    let catalog = catalog();
    let reconciler = StateReconciler::new(&catalog);
    let record = record(&["indexer", "node"]);

    let up = reconciler.reconcile(
        &record,
        &snapshot(&[("node", true), ("indexer", true), ("postgres", true)]),
    );
    let indexer = &up["indexer"];
    assert_eq!(indexer.installation, InstallationState::Installed);
    assert_eq!(indexer.status, ServiceStatus::Running);
    assert!(indexer.can_modify() && indexer.can_remove() && !indexer.can_add());

    let down = reconciler.reconcile(
        &record,
        &snapshot(&[("node", true), ("indexer", false), ("postgres", false)]),
    );
    assert_eq!(down["indexer"].installation, InstallationState::Installed);
    assert_eq!(down["indexer"].status, ServiceStatus::Stopped);

    let half = reconciler.reconcile(
        &record,
        &snapshot(&[("node", true), ("indexer", true), ("postgres", false)]),
    );
    assert_eq!(half["indexer"].installation, InstallationState::Partial);
}

#[test]
fn test_reconcile_survives_unreachable_runtime() {
    let catalog = catalog();
    let reconciler = StateReconciler::new(&catalog);
    let states = reconciler.reconcile(&record(&["indexer"]), &LiveSnapshot::unavailable());

    assert_eq!(
        states["indexer"].installation,
        InstallationState::Installed,
        "declared installations never regress to not-installed on probe failure"
    );
    assert_eq!(states["indexer"].status, ServiceStatus::Unknown);
}

#[test]
fn test_configure_port_key_then_volume_key_escalates() {
    let catalog = catalog();
    let planner = ReconfigurationPlanner::new(&catalog);
    let mut record = record(&["node", "explorer"]);
    record
        .configuration
        .insert("explorer.port".to_string(), "3008".to_string());
    let pass = StateReconciler::new(&catalog).run_pass(
        &record,
        &snapshot(&[("node", true), ("explorer-api", true), ("explorer-web", true)]),
    );

    // port-only change routes to the explorer services, service tier
    let mut proposed: HashMap<String, String> = record.configuration.clone();
    proposed.insert("explorer.port".to_string(), "3009".to_string());
    let impact = planner
        .plan(
            Action::Configure,
            &sel(&["explorer"]),
            Some(&proposed),
            &record,
            &pass,
        )
        .unwrap();
    assert_eq!(impact.affected_services, vec!["explorer-api", "explorer-web"]);
    assert_eq!(impact.restart_type, RestartType::Service);

    // adding a data-directory change escalates to container
    proposed.insert("data.explorer_dir".to_string(), "/srv/explorer".to_string());
    let impact = planner
        .plan(
            Action::Configure,
            &sel(&["explorer"]),
            Some(&proposed),
            &record,
            &pass,
        )
        .unwrap();
    assert_eq!(impact.restart_type, RestartType::Container);
    assert!(
        impact.estimated_downtime_secs > RestartType::Service.downtime_secs(),
        "downtime grows with the restart tier"
    );
}

#[test]
fn test_remove_base_profile_warns_but_plans() {
    let catalog = catalog();
    let planner = ReconfigurationPlanner::new(&catalog);
    let record = record(&["node", "mining"]);
    let pass = StateReconciler::new(&catalog)
        .run_pass(&record, &snapshot(&[("node", true), ("miner", true)]));

    let impact = planner
        .plan(Action::Remove, &sel(&["node"]), None, &record, &pass)
        .expect("removal is never blocked");

    assert!(impact.requires_restart);
    assert!(impact
        .warnings
        .iter()
        .any(|w| w.kind == IssueKind::StrandedPrerequisite));
}

#[test]
fn test_legacy_record_reconciles_through_aliases() {
    let catalog = catalog();
    let reconciler = StateReconciler::new(&catalog);

    // an old record declaring the retired bundle id claims both targets
    let states = reconciler.reconcile(
        &record(&["full-node"]),
        &snapshot(&[("node", true), ("indexer", true), ("postgres", false)]),
    );
    assert_eq!(states["node"].installation, InstallationState::Installed);
    assert_eq!(states["indexer"].installation, InstallationState::Partial);

    // all targets must be installed for the legacy id to count as installed
    assert_eq!(
        reconciler.legacy_state("full-node", &states),
        Some(InstallationState::Partial)
    );
}

#[test]
fn test_validation_report_shape_is_stable_json() {
    let catalog = catalog();
    let report = Validator::new(&catalog).validate(&sel(&["archive", "node"]));
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["valid"], serde_json::json!(false));
    assert_eq!(json["errors"][0]["kind"], "profile-conflict");
    assert!(json["resolved"]["profiles"].is_array());
}

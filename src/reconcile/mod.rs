// src/reconcile/mod.rs

//! Installation-state reconciliation.
//!
//! Merges three signals per profile - the declared selection record, the
//! configuration-key heuristic, and the live service snapshot - into one
//! classification. Live status always wins over the declared record when
//! they disagree; the declared record wins over the key heuristic whenever
//! it is available. A live match alone never promotes a profile to
//! installed.
//!
//! Every public call computes a fresh result from its explicit inputs.
//! There is no process-wide state cache: callers hold a
//! [`ReconciliationPass`] per operation and refresh it for a new view.

pub mod record;
pub mod snapshot;
pub mod state;

pub use record::DeclaredRecord;
pub use snapshot::{FixedProbe, LiveSnapshot, ServiceEntry, ServiceProbe, SnapshotFetcher};
pub use state::{InstallationState, ProfileState, ServiceStatus};

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::catalog::{Catalog, Profile};

/// One completed reconciliation pass.
///
/// Immutable once built; a cancelled refresh publishes nothing, so readers
/// only ever observe fully-completed passes.
#[derive(Debug, Clone)]
pub struct ReconciliationPass {
    pub id: Uuid,
    pub taken_at: DateTime<Utc>,
    /// Whether the live snapshot behind this pass was trustworthy
    pub snapshot_usable: bool,
    pub states: BTreeMap<String, ProfileState>,
}

impl ReconciliationPass {
    pub fn get(&self, profile_id: &str) -> Option<&ProfileState> {
        self.states.get(profile_id)
    }

    /// Profile ids currently classified as installed or partial
    pub fn present_ids(&self) -> Vec<String> {
        self.states
            .values()
            .filter(|s| s.can_remove())
            .map(|s| s.profile_id.clone())
            .collect()
    }
}

/// Classifies every catalog profile against declared and live state.
pub struct StateReconciler<'a> {
    catalog: &'a Catalog,
}

impl<'a> StateReconciler<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Classify every catalog profile.
    ///
    /// The snapshot is shared read-only across all classifications so the
    /// whole map reflects one consistent view of the runtime.
    pub fn reconcile(
        &self,
        record: &DeclaredRecord,
        snapshot: &LiveSnapshot,
    ) -> BTreeMap<String, ProfileState> {
        let declared: Option<HashSet<String>> = if record.has_selection() {
            Some(
                self.catalog
                    .expand_legacy(record.selected())
                    .into_iter()
                    .collect(),
            )
        } else {
            None
        };

        self.catalog
            .profiles()
            .map(|profile| {
                let state = self.classify(profile, declared.as_ref(), record, snapshot);
                (profile.id.clone(), state)
            })
            .collect()
    }

    /// Run a full pass and publish it as one immutable value
    pub fn run_pass(&self, record: &DeclaredRecord, snapshot: &LiveSnapshot) -> ReconciliationPass {
        let states = self.reconcile(record, snapshot);
        let installed = states
            .values()
            .filter(|s| s.installation == InstallationState::Installed)
            .count();
        let partial = states
            .values()
            .filter(|s| s.installation == InstallationState::Partial)
            .count();
        info!(
            profiles = states.len(),
            installed,
            partial,
            snapshot_usable = snapshot.is_usable(),
            "reconciliation pass complete"
        );
        ReconciliationPass {
            id: Uuid::new_v4(),
            taken_at: snapshot.taken_at(),
            snapshot_usable: snapshot.is_usable(),
            states,
        }
    }

    /// Fetch a fresh snapshot and run a pass against it.
    ///
    /// The fetch is the only await point; cancelling the future before it
    /// resolves leaves no partial state behind.
    pub async fn refresh(
        &self,
        record: &DeclaredRecord,
        fetcher: &SnapshotFetcher,
    ) -> ReconciliationPass {
        let snapshot = fetcher.fetch().await;
        self.run_pass(record, &snapshot)
    }

    fn classify(
        &self,
        profile: &Profile,
        declared: Option<&HashSet<String>>,
        record: &DeclaredRecord,
        snapshot: &LiveSnapshot,
    ) -> ProfileState {
        // Declared record wins when available; the key heuristic is the
        // fallback for a missing or corrupted record.
        let claimed = match declared {
            Some(set) => set.contains(&profile.id),
            None => profile
                .config_prefixes
                .iter()
                .any(|p| record.has_key_with_prefix(p)),
        };

        let total = profile.services.len();
        let usable = snapshot.is_usable();

        if !claimed {
            let stray_services: Vec<String> = if usable {
                profile
                    .service_names()
                    .filter(|n| snapshot.is_running(n) == Some(true))
                    .map(str::to_string)
                    .collect()
            } else {
                Vec::new()
            };
            return ProfileState {
                profile_id: profile.id.clone(),
                installation: InstallationState::NotInstalled,
                status: if usable {
                    ServiceStatus::Stopped
                } else {
                    ServiceStatus::Unknown
                },
                running_services: usable.then_some(stray_services.len()),
                total_services: total,
                stray_services,
            };
        }

        if total == 0 {
            // Claimed installed but the catalog defines no services for it:
            // nothing can be probed, nothing can be classified.
            return ProfileState {
                profile_id: profile.id.clone(),
                installation: InstallationState::Error,
                status: ServiceStatus::Unknown,
                running_services: None,
                total_services: 0,
                stray_services: Vec::new(),
            };
        }

        if !usable {
            // Probe failure or unreachable runtime: never demote a claimed
            // installation because of missing information.
            return ProfileState {
                profile_id: profile.id.clone(),
                installation: InstallationState::Installed,
                status: ServiceStatus::Unknown,
                running_services: None,
                total_services: total,
                stray_services: Vec::new(),
            };
        }

        let running = profile
            .service_names()
            .filter(|n| snapshot.is_running(n) == Some(true))
            .count();

        let (installation, status) = if running == total {
            (InstallationState::Installed, ServiceStatus::Running)
        } else if running > 0 {
            (InstallationState::Partial, ServiceStatus::Partial)
        } else {
            // Present but not started: consistent-but-inactive, not partial
            (InstallationState::Installed, ServiceStatus::Stopped)
        };

        ProfileState {
            profile_id: profile.id.clone(),
            installation,
            status,
            running_services: Some(running),
            total_services: total,
            stray_services: Vec::new(),
        }
    }

    /// Report a legacy id's state under the all-targets policy: installed
    /// only when every mapped target is installed, not-installed when every
    /// target is, partial otherwise.
    pub fn legacy_state(
        &self,
        legacy_id: &str,
        states: &BTreeMap<String, ProfileState>,
    ) -> Option<InstallationState> {
        let targets = self.catalog.legacy_targets(legacy_id)?;
        let target_states: Vec<InstallationState> = targets
            .iter()
            .filter_map(|t| states.get(t).map(|s| s.installation))
            .collect();
        if target_states.is_empty() {
            return None;
        }

        if target_states.iter().any(|s| *s == InstallationState::Error) {
            Some(InstallationState::Error)
        } else if target_states
            .iter()
            .all(|s| *s == InstallationState::Installed)
        {
            Some(InstallationState::Installed)
        } else if target_states
            .iter()
            .all(|s| *s == InstallationState::NotInstalled)
        {
            Some(InstallationState::NotInstalled)
        } else {
            Some(InstallationState::Partial)
        }
    }
}

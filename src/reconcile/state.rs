// src/reconcile/state.rs

//! Per-profile installation state.
//!
//! `Partial` specifically means inconsistency between declared and live
//! state; `Stopped` means consistent-but-inactive. The distinction drives
//! which operations the UI may offer.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Reconciled installation state of a profile
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum InstallationState {
    NotInstalled,
    Installed,
    Partial,
    Error,
}

/// Observed run status of a profile's services
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ServiceStatus {
    Running,
    Stopped,
    Partial,
    Unknown,
}

/// The reconciled state of a single profile.
///
/// Recomputed on demand from the declared record and a live snapshot;
/// never persisted as authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileState {
    pub profile_id: String,
    pub installation: InstallationState,
    pub status: ServiceStatus,

    /// Running service count, `None` when live status is unavailable
    pub running_services: Option<usize>,
    pub total_services: usize,

    /// Live services matching this profile while it is not installed.
    /// Informational for the operator; never affects classification.
    pub stray_services: Vec<String>,
}

impl ProfileState {
    /// Whether the profile can be reconfigured in place
    pub fn can_modify(&self) -> bool {
        self.installation == InstallationState::Installed
    }

    /// Whether the profile can be removed
    pub fn can_remove(&self) -> bool {
        matches!(
            self.installation,
            InstallationState::Installed | InstallationState::Partial
        )
    }

    /// Whether the profile can be added to the selection
    pub fn can_add(&self) -> bool {
        self.installation == InstallationState::NotInstalled
    }
}

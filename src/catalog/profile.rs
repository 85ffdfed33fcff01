// src/catalog/profile.rs

//! Profile definitions.
//!
//! A profile is a named bundle of services a user can select as an
//! installable unit. Profiles are defined once at process start and are
//! immutable for the process lifetime.

use serde::{Deserialize, Serialize};

/// A service provided by a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Service name as reported by the container runtime
    pub name: String,

    /// Whether the profile is unusable without this service
    #[serde(default = "default_true")]
    pub required: bool,

    /// Relative startup position within the profile (lower starts first)
    #[serde(default)]
    pub startup_order: u32,
}

/// A single resource allocation tier
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(default)]
    pub cpu_cores: f64,
    #[serde(default)]
    pub memory_mb: u64,
    #[serde(default)]
    pub disk_gb: u64,
}

/// Minimum and recommended resource allocations for a profile
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub minimum: ResourceSpec,
    #[serde(default)]
    pub recommended: ResourceSpec,
}

/// A named installable unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique key, referenced by dependency/conflict/prerequisite lists
    pub id: String,

    /// Human-readable name shown by the UI layer
    #[serde(default)]
    pub display_name: String,

    /// Marks a base runtime profile; every valid selection closure must
    /// contain at least one base profile
    #[serde(default)]
    pub base: bool,

    /// Services started when the profile is installed, in startup order
    #[serde(default)]
    pub services: Vec<ServiceSpec>,

    /// Profile ids that must also be selected
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Profile ids that must NOT be selected together with this one
    #[serde(default)]
    pub conflicts: Vec<String>,

    /// Profile ids of which at least one must be present (disjunctive)
    #[serde(default)]
    pub prerequisites: Vec<String>,

    #[serde(default)]
    pub resources: ResourceRequirements,

    /// Host ports bound by the profile's services
    #[serde(default)]
    pub ports: Vec<u16>,

    /// Configuration-key prefixes owned by this profile, used for the
    /// installed-state heuristic and for key-to-service routing
    #[serde(default)]
    pub config_prefixes: Vec<String>,
}

impl Profile {
    /// Service names in catalog order
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|s| s.name.as_str())
    }

    /// Whether a configuration key falls under one of this profile's prefixes
    pub fn owns_key(&self, key: &str) -> bool {
        self.config_prefixes.iter().any(|p| key.starts_with(p))
    }
}

fn default_true() -> bool {
    true
}

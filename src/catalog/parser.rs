// src/catalog/parser.rs

//! Catalog file parsing.
//!
//! The catalog is a TOML document listing every installable profile plus
//! catalog-level tables: legacy id aliases, configuration-key routing rules
//! for the planner, and resource warning limits.
//!
//! # Example catalog.toml
//!
//! ```toml
//! [[profiles]]
//! id = "node"
//! display_name = "Node"
//! base = true
//! ports = [16111]
//! config_prefixes = ["node."]
//!
//!   [[profiles.services]]
//!   name = "node"
//!   startup_order = 1
//!
//!   [profiles.resources.minimum]
//!   cpu_cores = 2.0
//!   memory_mb = 4096
//!   disk_gb = 100
//!
//! [[profiles]]
//! id = "explorer"
//! dependencies = ["node"]
//! ports = [3008]
//!
//! [legacy]
//! full-node = ["node", "indexer"]
//!
//! [routing]
//! volume_prefixes = ["data."]
//! network_prefixes = ["network."]
//!
//!   [[routing.routes]]
//!   prefix = "explorer."
//!   services = ["explorer-web"]
//!
//! [limits]
//! memory_warn_mb = 32768
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::profile::Profile;

/// An explicit configuration-key route: keys under `prefix` affect `services`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRoute {
    pub prefix: String,
    pub services: Vec<String>,
}

/// Planner routing rules declared in the catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingRules {
    /// Extra key-prefix routes beyond the per-profile config prefixes
    #[serde(default)]
    pub routes: Vec<KeyRoute>,

    /// Key prefixes that relocate data directories or volumes; changes
    /// require container recreation
    #[serde(default)]
    pub volume_prefixes: Vec<String>,

    /// Key prefixes that change network identity; changes require a full
    /// stack restart
    #[serde(default)]
    pub network_prefixes: Vec<String>,
}

/// Thresholds for non-fatal resource warnings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Aggregated minimum memory above which validation emits a warning
    #[serde(default = "default_memory_warn_mb")]
    pub memory_warn_mb: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_warn_mb: default_memory_warn_mb(),
        }
    }
}

fn default_memory_warn_mb() -> u64 {
    32 * 1024
}

/// The complete parsed catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub profiles: Vec<Profile>,

    /// Retired profile id -> current profile ids (one-to-many)
    #[serde(default)]
    pub legacy: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub routing: RoutingRules,

    #[serde(default)]
    pub limits: ResourceLimits,
}

impl CatalogFile {
    /// Parse a catalog document from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

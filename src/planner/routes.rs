// src/planner/routes.rs

//! Configuration-key routing.
//!
//! Maps changed keys to the services they affect and to a restart tier.
//! Both tables are catalog data: per-profile `config_prefixes` route to that
//! profile's services, explicit routing rules add cross-cutting prefixes,
//! and the volume/network categories drive restart escalation. Nothing in
//! here is specific to any particular catalog.

use crate::catalog::Catalog;

use super::RestartType;

/// Resolved key-prefix routing table
pub struct KeyRoutes {
    routes: Vec<(String, Vec<String>)>,
    volume_prefixes: Vec<String>,
    network_prefixes: Vec<String>,
}

impl KeyRoutes {
    /// Build the routing table from catalog data
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut routes = Vec::new();

        for profile in catalog.profiles() {
            let services: Vec<String> =
                profile.service_names().map(str::to_string).collect();
            if services.is_empty() {
                continue;
            }
            for prefix in &profile.config_prefixes {
                routes.push((prefix.clone(), services.clone()));
            }
        }

        let routing = catalog.routing();
        for route in &routing.routes {
            routes.push((route.prefix.clone(), route.services.clone()));
        }

        Self {
            routes,
            volume_prefixes: routing.volume_prefixes.clone(),
            network_prefixes: routing.network_prefixes.clone(),
        }
    }

    /// Services affected by a key, in table order, de-duplicated
    pub fn services_for_key(&self, key: &str) -> Vec<String> {
        let mut services = Vec::new();
        for (prefix, routed) in &self.routes {
            if key.starts_with(prefix.as_str()) {
                for service in routed {
                    if !services.contains(service) {
                        services.push(service.clone());
                    }
                }
            }
        }
        services
    }

    /// Restart tier a key change requires.
    ///
    /// Network-identity keys force a full restart, data-directory/volume
    /// keys force container recreation, everything else is a service
    /// restart.
    pub fn tier_for_key(&self, key: &str) -> RestartType {
        if self.network_prefixes.iter().any(|p| key.starts_with(p)) {
            RestartType::Full
        } else if self.volume_prefixes.iter().any(|p| key.starts_with(p)) {
            RestartType::Container
        } else {
            RestartType::Service
        }
    }
}

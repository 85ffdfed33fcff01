// src/resolver/mod.rs

//! Dependency resolution over the profile catalog.
//!
//! Computes transitive closures, detects cycles and pairwise conflicts,
//! scans for port collisions, and aggregates resource requirements into a
//! [`ResolvedSelection`].

mod conflict;
mod graph;
mod requirements;

pub use conflict::{ConflictPair, PortCollision};
pub use graph::GraphResolver;
pub use requirements::{
    aggregate_resources, shared_services, ResolvedRequirements, SharedService,
};

use serde::{Deserialize, Serialize};

/// The result of resolving a selection: closure, aggregated requirements,
/// de-duplicated ports, and shared-service annotations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedSelection {
    /// Closure members in catalog order
    pub profiles: Vec<String>,

    pub requirements: ResolvedRequirements,

    /// Every port bound by the closure, de-duplicated and sorted
    pub ports: Vec<u16>,

    pub shared_services: Vec<SharedService>,
}

impl GraphResolver<'_> {
    /// Expand a selection to its closure and aggregate everything the
    /// validation and planning layers need from it.
    pub fn resolve(&self, selection: &[String]) -> ResolvedSelection {
        let closure = self.resolve_closure(selection);

        let mut ports: Vec<u16> = self
            .catalog()
            .profiles()
            .filter(|p| closure.contains(&p.id))
            .flat_map(|p| p.ports.iter().copied())
            .collect();
        ports.sort_unstable();
        ports.dedup();

        ResolvedSelection {
            profiles: self.in_catalog_order(&closure),
            requirements: aggregate_resources(self.catalog(), &closure),
            ports,
            shared_services: shared_services(self.catalog(), &closure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_resolve_produces_ordered_closure_and_ports() {
        let catalog = Catalog::from_toml_str(
            r#"
            [[profiles]]
            id = "node"
            ports = [16111]

            [[profiles]]
            id = "explorer"
            dependencies = ["node"]
            ports = [3008, 16111]
            "#,
        )
        .unwrap();
        let resolver = GraphResolver::new(&catalog);

        let resolved = resolver.resolve(&["explorer".to_string()]);
        assert_eq!(resolved.profiles, vec!["node", "explorer"]);
        assert_eq!(resolved.ports, vec![3008, 16111]);
    }
}

// src/catalog/mod.rs

//! Profile catalog - the immutable registry of installable units.
//!
//! The catalog is loaded once at process start and validated for referential
//! integrity: any profile whose dependency, conflict, or prerequisite lists
//! reference an unknown id is rejected at load time. A dangling reference in
//! static data is a configuration error, not a runtime condition.

pub mod parser;
pub mod profile;

pub use parser::{CatalogFile, KeyRoute, ResourceLimits, RoutingRules};
pub use profile::{Profile, ResourceRequirements, ResourceSpec, ServiceSpec};

use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a catalog. All of these are startup-fatal.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse catalog file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("duplicate profile id '{id}'")]
    DuplicateProfile { id: String },

    #[error("profile '{profile}' references unknown id '{target}' in its {field} list")]
    DanglingReference {
        profile: String,
        field: &'static str,
        target: String,
    },

    #[error("legacy alias '{alias}' maps to unknown profile '{target}'")]
    DanglingLegacyTarget { alias: String, target: String },

    #[error("routing rule for prefix '{prefix}' names unknown service '{service}'")]
    DanglingRouteService { prefix: String, service: String },
}

/// Read-only profile registry with stable iteration order
#[derive(Debug, Clone)]
pub struct Catalog {
    profiles: Vec<Profile>,
    index: HashMap<String, usize>,
    legacy: HashMap<String, Vec<String>>,
    routing: RoutingRules,
    limits: ResourceLimits,
}

impl Catalog {
    /// Build a catalog from a parsed document, enforcing integrity
    pub fn new(file: CatalogFile) -> Result<Self, CatalogError> {
        let mut index = HashMap::new();
        for (pos, profile) in file.profiles.iter().enumerate() {
            if index.insert(profile.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateProfile {
                    id: profile.id.clone(),
                });
            }
        }

        for profile in &file.profiles {
            for (field, ids) in [
                ("dependencies", &profile.dependencies),
                ("conflicts", &profile.conflicts),
                ("prerequisites", &profile.prerequisites),
            ] {
                for target in ids {
                    if !index.contains_key(target) {
                        return Err(CatalogError::DanglingReference {
                            profile: profile.id.clone(),
                            field,
                            target: target.clone(),
                        });
                    }
                }
            }
        }

        for (alias, targets) in &file.legacy {
            for target in targets {
                if !index.contains_key(target) {
                    return Err(CatalogError::DanglingLegacyTarget {
                        alias: alias.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        let known_services: HashSet<&str> = file
            .profiles
            .iter()
            .flat_map(|p| p.service_names())
            .collect();
        for route in &file.routing.routes {
            for service in &route.services {
                if !known_services.contains(service.as_str()) {
                    return Err(CatalogError::DanglingRouteService {
                        prefix: route.prefix.clone(),
                        service: service.clone(),
                    });
                }
            }
        }

        Ok(Self {
            profiles: file.profiles,
            index,
            legacy: file.legacy,
            routing: file.routing,
            limits: file.limits,
        })
    }

    /// Parse and validate a catalog from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        Self::new(CatalogFile::from_toml_str(text)?)
    }

    /// Load and validate a catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Look up a profile by id. Unknown ids return `None`, never panic.
    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.index.get(id).map(|&pos| &self.profiles[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All profiles in catalog (file) order
    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Current profile ids a legacy id maps to, if any
    pub fn legacy_targets(&self, id: &str) -> Option<&[String]> {
        self.legacy.get(id).map(|v| v.as_slice())
    }

    /// Expand legacy aliases in a selection; current ids pass through.
    ///
    /// One legacy id may expand to several current ids. Ids unknown to both
    /// the catalog and the alias table are kept as-is for the existence
    /// check downstream.
    pub fn expand_legacy(&self, ids: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for id in ids {
            match self.legacy.get(id) {
                Some(targets) => {
                    for target in targets {
                        if seen.insert(target.clone()) {
                            out.push(target.clone());
                        }
                    }
                }
                None => {
                    if seen.insert(id.clone()) {
                        out.push(id.clone());
                    }
                }
            }
        }
        out
    }

    pub fn routing(&self) -> &RoutingRules {
        &self.routing
    }

    pub fn limits(&self) -> ResourceLimits {
        self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn catalog_toml() -> &'static str {
        r#"
        [[profiles]]
        id = "node"
        base = true
        ports = [16111]

          [[profiles.services]]
          name = "node"

        [[profiles]]
        id = "explorer"
        dependencies = ["node"]
        ports = [3008]

        [legacy]
        full-node = ["node", "explorer"]
        "#
    }

    #[test]
    fn test_lookup_and_order() {
        let catalog = Catalog::from_toml_str(catalog_toml()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("node").is_some());
        assert!(catalog.get("missing").is_none());

        let order: Vec<&str> = catalog.profiles().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["node", "explorer"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(catalog_toml().as_bytes()).unwrap();
        let catalog = Catalog::load(file.path()).unwrap();
        assert!(catalog.contains("explorer"));
    }

    #[test]
    fn test_rejects_dangling_dependency() {
        let err = Catalog::from_toml_str(
            r#"
            [[profiles]]
            id = "explorer"
            dependencies = ["node"]
            "#,
        )
        .unwrap_err();

        match err {
            CatalogError::DanglingReference { profile, field, target } => {
                assert_eq!(profile, "explorer");
                assert_eq!(field, "dependencies");
                assert_eq!(target, "node");
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let err = Catalog::from_toml_str(
            r#"
            [[profiles]]
            id = "node"
            [[profiles]]
            id = "node"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateProfile { .. }));
    }

    #[test]
    fn test_rejects_dangling_legacy_target() {
        let err = Catalog::from_toml_str(
            r#"
            [[profiles]]
            id = "node"

            [legacy]
            old = ["gone"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DanglingLegacyTarget { .. }));
    }

    #[test]
    fn test_rejects_dangling_route_service() {
        let err = Catalog::from_toml_str(
            r#"
            [[profiles]]
            id = "node"

              [[profiles.services]]
              name = "node"

            [routing]
              [[routing.routes]]
              prefix = "x."
              services = ["ghost"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DanglingRouteService { .. }));
    }

    #[test]
    fn test_expand_legacy_one_to_many() {
        let catalog = Catalog::from_toml_str(catalog_toml()).unwrap();
        let expanded = catalog.expand_legacy(&["full-node".to_string()]);
        assert_eq!(expanded, vec!["node".to_string(), "explorer".to_string()]);

        // current ids pass through, duplicates collapse
        let expanded =
            catalog.expand_legacy(&["node".to_string(), "full-node".to_string()]);
        assert_eq!(expanded, vec!["node".to_string(), "explorer".to_string()]);
    }
}

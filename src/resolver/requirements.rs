// src/resolver/requirements.rs

//! Resource aggregation across a resolved closure.
//!
//! Memory and disk are summed (each profile is assumed to need its own
//! allocation); CPU is maxed, reflecting burst capacity sharing rather than
//! additive reservation. Services referenced by more than one profile are
//! annotated for the UI but do not reduce the totals.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ResourceSpec};

/// Aggregated minimum and recommended requirements for a closure
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedRequirements {
    pub minimum: ResourceSpec,
    pub recommended: ResourceSpec,
}

/// A service name referenced by more than one profile in the closure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedService {
    pub service: String,
    pub profiles: Vec<String>,
}

/// Sum memory/disk and max CPU over the closure members
pub fn aggregate_resources(catalog: &Catalog, closure: &HashSet<String>) -> ResolvedRequirements {
    let mut total = ResolvedRequirements::default();

    for profile in catalog.profiles() {
        if !closure.contains(&profile.id) {
            continue;
        }
        accumulate(&mut total.minimum, &profile.resources.minimum);
        accumulate(&mut total.recommended, &profile.resources.recommended);
    }

    total
}

fn accumulate(into: &mut ResourceSpec, spec: &ResourceSpec) {
    into.cpu_cores = into.cpu_cores.max(spec.cpu_cores);
    into.memory_mb += spec.memory_mb;
    into.disk_gb += spec.disk_gb;
}

/// Annotate service names claimed by more than one closure member.
///
/// Informational only: callers use this to explain that the aggregated
/// totals over-count shared services, not to correct them.
pub fn shared_services(catalog: &Catalog, closure: &HashSet<String>) -> Vec<SharedService> {
    let mut claims: HashMap<String, Vec<String>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for profile in catalog.profiles() {
        if !closure.contains(&profile.id) {
            continue;
        }
        for name in profile.service_names() {
            let owners = claims.entry(name.to_string()).or_insert_with(|| {
                order.push(name.to_string());
                Vec::new()
            });
            if !owners.contains(&profile.id) {
                owners.push(profile.id.clone());
            }
        }
    }

    order
        .into_iter()
        .filter_map(|service| {
            let profiles = claims.remove(&service)?;
            (profiles.len() > 1).then_some(SharedService { service, profiles })
        })
        .collect()
}

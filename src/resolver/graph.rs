// src/resolver/graph.rs

//! Dependency graph algorithms over the catalog.
//!
//! Provides transitive closure expansion, cycle detection, conflict
//! detection, and port collision scanning. Only `dependencies` edges are
//! expansion edges; conflicts and prerequisites constrain but never pull
//! profiles into a selection.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::catalog::Catalog;

use super::conflict::{ConflictPair, PortCollision};

/// Graph resolver borrowing an immutable catalog.
///
/// All methods are pure reads; the resolver is safe to share across callers.
pub struct GraphResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> GraphResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    /// Compute the transitive dependency closure of a selection.
    ///
    /// Breadth-first expansion over `dependencies` edges. Unknown ids are
    /// silently skipped; existence is checked by the validation layer.
    /// Idempotent: resolving a closure again yields the same set.
    pub fn resolve_closure(&self, selection: &[String]) -> HashSet<String> {
        let mut closure = HashSet::new();
        let mut queue = VecDeque::new();

        for id in selection {
            if self.catalog.contains(id) && closure.insert(id.clone()) {
                queue.push_back(id.clone());
            }
        }

        while let Some(id) = queue.pop_front() {
            if let Some(profile) = self.catalog.get(&id) {
                for dep in &profile.dependencies {
                    if self.catalog.contains(dep) && closure.insert(dep.clone()) {
                        queue.push_back(dep.clone());
                    }
                }
            }
        }

        closure
    }

    /// Members of a closure in stable catalog order
    pub fn in_catalog_order(&self, closure: &HashSet<String>) -> Vec<String> {
        self.catalog
            .profiles()
            .filter(|p| closure.contains(&p.id))
            .map(|p| p.id.clone())
            .collect()
    }

    /// Find every dependency cycle reachable from the given roots.
    ///
    /// Depth-first traversal maintaining the current path as a recursion
    /// stack. A cycle is reported as the ordered sequence of ids from the
    /// first repeated node back to itself. Distinct cycles are deduplicated
    /// by rotation, so `a -> b -> a` and `b -> a -> b` report once.
    /// Catalogs are tens of profiles at most; exhaustive path enumeration
    /// is fine at that scale.
    pub fn detect_cycles(&self, roots: &[String]) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut seen_keys = HashSet::new();
        let mut path = Vec::new();
        let mut on_path = HashSet::new();

        for root in roots {
            if self.catalog.contains(root) {
                self.dfs_cycles(root, &mut path, &mut on_path, &mut cycles, &mut seen_keys);
            }
        }

        cycles
    }

    fn dfs_cycles(
        &self,
        id: &str,
        path: &mut Vec<String>,
        on_path: &mut HashSet<String>,
        cycles: &mut Vec<Vec<String>>,
        seen_keys: &mut HashSet<String>,
    ) {
        if on_path.contains(id) {
            let start = path.iter().position(|p| p.as_str() == id).unwrap();
            let mut cycle: Vec<String> = path[start..].to_vec();
            cycle.push(id.to_string());
            if seen_keys.insert(cycle_key(&path[start..])) {
                cycles.push(cycle);
            }
            return;
        }

        path.push(id.to_string());
        on_path.insert(id.to_string());

        if let Some(profile) = self.catalog.get(id) {
            for dep in &profile.dependencies {
                if self.catalog.contains(dep) {
                    self.dfs_cycles(dep, path, on_path, cycles, seen_keys);
                }
            }
        }

        path.pop();
        on_path.remove(id);
    }

    /// Check every closure member's conflict list against the rest of the
    /// closure. Each unordered pair is reported once.
    pub fn detect_conflicts(&self, closure: &HashSet<String>) -> Vec<ConflictPair> {
        let mut pairs = Vec::new();
        let mut seen = HashSet::new();

        for profile in self.catalog.profiles() {
            if !closure.contains(&profile.id) {
                continue;
            }
            for other in &profile.conflicts {
                if !closure.contains(other) {
                    continue;
                }
                let key = if profile.id < *other {
                    (profile.id.clone(), other.clone())
                } else {
                    (other.clone(), profile.id.clone())
                };
                if seen.insert(key) {
                    pairs.push(ConflictPair {
                        profile_a: profile.id.clone(),
                        profile_b: other.clone(),
                        reason: format!(
                            "'{}' declares a conflict with '{}'",
                            profile.id, other
                        ),
                    });
                }
            }
        }

        pairs
    }

    /// Scan the closure for host ports claimed by more than one profile.
    ///
    /// Profiles are visited in catalog order; the first claimant of a port
    /// wins and every later claimant turns the port into a collision entry.
    pub fn detect_port_collisions(&self, closure: &HashSet<String>) -> Vec<PortCollision> {
        let mut claims: HashMap<u16, Vec<String>> = HashMap::new();
        let mut order: Vec<u16> = Vec::new();

        for profile in self.catalog.profiles() {
            if !closure.contains(&profile.id) {
                continue;
            }
            for &port in &profile.ports {
                let claimants = claims.entry(port).or_insert_with(|| {
                    order.push(port);
                    Vec::new()
                });
                // A profile listing the same port twice is a single claim
                if !claimants.contains(&profile.id) {
                    claimants.push(profile.id.clone());
                }
            }
        }

        order
            .into_iter()
            .filter_map(|port| {
                let profiles = claims.remove(&port)?;
                (profiles.len() > 1).then_some(PortCollision { port, profiles })
            })
            .collect()
    }
}

fn cycle_key(body: &[String]) -> String {
    // Canonical rotation: start the cycle at its smallest id
    let min = body
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated: Vec<&str> = Vec::with_capacity(body.len());
    for i in 0..body.len() {
        rotated.push(body[(min + i) % body.len()].as_str());
    }
    rotated.join("\u{1f}")
}

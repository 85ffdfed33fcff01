// src/resolver/conflict.rs

//! Conflict types reported by graph resolution.

use serde::{Deserialize, Serialize};

/// A pair of profiles that declare each other incompatible.
///
/// Each unordered pair is reported once, with the side that declared the
/// conflict named in `reason`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPair {
    pub profile_a: String,
    pub profile_b: String,
    pub reason: String,
}

impl std::fmt::Display for ConflictPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <-> {}: {}", self.profile_a, self.profile_b, self.reason)
    }
}

/// A host port claimed by more than one profile in the closure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortCollision {
    pub port: u16,
    /// Every claimant of the port; the first entry holds the claim
    pub profiles: Vec<String>,
}

impl std::fmt::Display for PortCollision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "port {} claimed by {}", self.port, self.profiles.join(", "))
    }
}

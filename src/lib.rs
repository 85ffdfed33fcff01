// src/lib.rs

//! Stevedore - profile dependency resolution and installation-state
//! reconciliation for multi-service deployments.
//!
//! The engine behind a setup/reconfiguration assistant: it models
//! installable profiles and the constraints between them, resolves a
//! requested selection into a consistent closure, and reconciles declared
//! intent against what is actually running to drive safe add/remove/modify
//! operations.
//!
//! # Architecture
//!
//! - Catalog: immutable profile registry, validated at load time
//! - Resolver: closure expansion, cycle/conflict/port detection, resource
//!   aggregation
//! - Validate: the single validation entry point for every flow
//! - Reconcile: declared record + key heuristics + live snapshot merged
//!   into per-profile installation states
//! - Planner: impact computation for add/remove/configure actions
//!
//! Deployment itself - containers, artifact generation, persistence - is
//! handled by external collaborators behind the seams in `reconcile`.

pub mod catalog;
mod error;
pub mod planner;
pub mod reconcile;
pub mod resolver;
pub mod validate;

pub use catalog::{Catalog, CatalogError, Profile, ResourceLimits, ServiceSpec};
pub use error::{Error, Result};
pub use planner::{
    Action, ConfigDiff, DiffEntry, DiffKind, ReconfigurationImpact, ReconfigurationPlanner,
    RestartType,
};
pub use reconcile::{
    DeclaredRecord, InstallationState, LiveSnapshot, ProfileState, ReconciliationPass,
    ServiceEntry, ServiceProbe, ServiceStatus, SnapshotFetcher, StateReconciler,
};
pub use resolver::{GraphResolver, ResolvedSelection};
pub use validate::{IssueKind, ValidationIssue, ValidationReport, Validator};

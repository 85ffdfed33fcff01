// src/reconcile/snapshot.rs

//! Live service snapshots.
//!
//! A snapshot is an immutable view of the services the container runtime
//! reports, fetched once per reconciliation pass and shared read-only by
//! every classification in that pass. A failed or timed-out probe degrades
//! to an unavailable snapshot - "live status unknown" is never conflated
//! with "not running".

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

/// One service as reported by the container runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: String,
    pub running: bool,
}

/// Wire form of a snapshot entry; entries without a name are dropped
#[derive(Debug, Deserialize)]
struct RawServiceEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    running: bool,
}

/// Immutable view of the runtime's service list at one point in time
#[derive(Debug, Clone)]
pub struct LiveSnapshot {
    services: BTreeMap<String, bool>,
    reachable: bool,
    taken_at: DateTime<Utc>,
}

impl LiveSnapshot {
    /// Snapshot from probe results
    pub fn from_entries(entries: impl IntoIterator<Item = ServiceEntry>) -> Self {
        let services = entries
            .into_iter()
            .map(|e| (e.name, e.running))
            .collect();
        Self {
            services,
            reachable: true,
            taken_at: Utc::now(),
        }
    }

    /// Snapshot from the runtime's JSON list; malformed entries (missing
    /// name) are skipped, not fatal.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<RawServiceEntry> = serde_json::from_str(text)?;
        Ok(Self::from_entries(raw.into_iter().filter_map(|e| {
            Some(ServiceEntry {
                name: e.name?,
                running: e.running,
            })
        })))
    }

    /// Snapshot standing in for an unreachable runtime
    pub fn unavailable() -> Self {
        Self {
            services: BTreeMap::new(),
            reachable: false,
            taken_at: Utc::now(),
        }
    }

    /// Whether classifications may trust this snapshot.
    ///
    /// An empty service list is treated like an unreachable runtime, not
    /// as everything-stopped.
    pub fn is_usable(&self) -> bool {
        self.reachable && !self.services.is_empty()
    }

    pub fn is_running(&self, name: &str) -> Option<bool> {
        self.services.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.taken_at
    }
}

/// The seam to the container-runtime collaborator.
///
/// Implementations query whatever runtime is in use; the engine only ever
/// sees the entry list.
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    async fn list_services(&self) -> anyhow::Result<Vec<ServiceEntry>>;
}

/// A probe returning a fixed entry list (test/staging use)
pub struct FixedProbe {
    entries: Vec<ServiceEntry>,
}

impl FixedProbe {
    pub fn new(entries: Vec<ServiceEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl ServiceProbe for FixedProbe {
    async fn list_services(&self) -> anyhow::Result<Vec<ServiceEntry>> {
        Ok(self.entries.clone())
    }
}

/// Bounded snapshot fetcher.
///
/// The probe is the engine's only suspension point. Both probe errors and
/// timeouts degrade to [`LiveSnapshot::unavailable`].
pub struct SnapshotFetcher {
    probe: Arc<dyn ServiceProbe>,
    timeout: Duration,
}

impl SnapshotFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(probe: Arc<dyn ServiceProbe>) -> Self {
        Self {
            probe,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(probe: Arc<dyn ServiceProbe>, timeout: Duration) -> Self {
        Self { probe, timeout }
    }

    pub async fn fetch(&self) -> LiveSnapshot {
        match tokio::time::timeout(self.timeout, self.probe.list_services()).await {
            Ok(Ok(entries)) => LiveSnapshot::from_entries(entries),
            Ok(Err(err)) => {
                warn!(%err, "service probe failed, live status unknown");
                LiveSnapshot::unavailable()
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "service probe timed out, live status unknown");
                LiveSnapshot::unavailable()
            }
        }
    }
}

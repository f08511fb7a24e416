// ABOUTME: Shared per-service state table owned by the executor.
// ABOUTME: Writes go through the executor; readers take the read lock.

use crate::types::ServiceName;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle state of one service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Not issued yet (or never issued, when a dependency failed).
    Pending,
    /// Launch in progress: pulling, creating, starting.
    Starting,
    /// Container is up; no health check declared or not yet passed.
    Running,
    /// Container is up and its declared health check passed.
    Healthy,
    /// Launch failed, the container died, or a one-shot exited nonzero.
    Failed,
    /// Stopped: torn down, or a one-shot that exited 0.
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Pending => "pending",
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Healthy => "healthy",
            ServiceState::Failed => "failed",
            ServiceState::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// One row of the state table, as seen by readers.
#[derive(Debug, Clone)]
pub struct ServiceRow {
    pub service: ServiceName,
    pub state: ServiceState,
    pub detail: Option<String>,
    pub since: DateTime<Utc>,
}

#[derive(Debug)]
struct Entry {
    state: ServiceState,
    detail: Option<String>,
    since: DateTime<Utc>,
}

/// The per-service state table.
///
/// Mutation is crate-private: only the lifecycle executor writes. Readers
/// (the status reporter) take snapshots under the read lock.
#[derive(Debug)]
pub struct StateTable {
    inner: RwLock<BTreeMap<ServiceName, Entry>>,
}

impl StateTable {
    /// Create a table with every service Pending.
    pub fn new(services: impl IntoIterator<Item = ServiceName>) -> Self {
        let now = Utc::now();
        let inner = services
            .into_iter()
            .map(|name| {
                (
                    name,
                    Entry {
                        state: ServiceState::Pending,
                        detail: None,
                        since: now,
                    },
                )
            })
            .collect();
        Self {
            inner: RwLock::new(inner),
        }
    }

    pub(crate) fn set(&self, service: &ServiceName, state: ServiceState, detail: Option<String>) {
        let mut table = self.inner.write();
        if let Some(entry) = table.get_mut(service) {
            entry.state = state;
            entry.detail = detail;
            entry.since = Utc::now();
        }
    }

    /// Current state of one service.
    pub fn state_of(&self, service: &ServiceName) -> Option<ServiceState> {
        self.inner.read().get(service).map(|e| e.state)
    }

    /// Read-only snapshot of every row, name ascending.
    pub fn snapshot(&self) -> Vec<ServiceRow> {
        self.inner
            .read()
            .iter()
            .map(|(name, entry)| ServiceRow {
                service: name.clone(),
                state: entry.state,
                detail: entry.detail.clone(),
                since: entry.since,
            })
            .collect()
    }

    /// Services currently in the given state.
    pub fn in_state(&self, state: ServiceState) -> Vec<ServiceName> {
        self.inner
            .read()
            .iter()
            .filter(|(_, entry)| entry.state == state)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

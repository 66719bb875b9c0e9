//! Sync status shared between the network worker and the frame loop

use super::protocol::Role;
use crate::physics::PhysicalState;
use parking_lot::RwLock;
use std::sync::Arc;

/// What the client currently knows about its session
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SyncStatus {
    /// Role as last confirmed by the server
    pub role: Role,
    /// Whether a socket is currently open
    pub connected: bool,
    /// Last state received from the server (`init-sync` / `state-sync`)
    pub shadow: Option<PhysicalState>,
    /// Bumped on every shadow replacement
    pub generation: u64,
}

impl SyncStatus {
    pub fn is_master(&self) -> bool {
        self.role.is_master()
    }
}

/// Thread-safe handle to a [`SyncStatus`]
#[derive(Clone, Debug, Default)]
pub struct SharedSyncState {
    inner: Arc<RwLock<SyncStatus>>,
}

impl SharedSyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current status (no lock held after return)
    pub fn snapshot(&self) -> SyncStatus {
        *self.inner.read()
    }

    pub fn role(&self) -> Role {
        self.inner.read().role
    }

    pub fn is_connected(&self) -> bool {
        self.inner.read().connected
    }

    /// Overwrite the whole status
    pub fn store(&self, status: SyncStatus) {
        *self.inner.write() = status;
    }
}
